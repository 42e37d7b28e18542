// Pinnacle IO - Treatment planning record codec
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property and file-backed tests for the grid codec.

use std::fs::File;
use std::io::Write;

use pinn_grid::{
    decode, decode_with, encode, encode_with, read_volume, ByteOrder, GridDims, GridError,
    GridOptions, SlabReader,
};
use proptest::prelude::*;

fn dims_and_samples() -> impl Strategy<Value = (GridDims, Vec<f32>)> {
    (1usize..6, 1usize..6, 1usize..6).prop_flat_map(|(nx, ny, nz)| {
        let dims = GridDims::new(nx, ny, nz);
        prop::collection::vec(any::<f32>(), nx * ny * nz).prop_map(move |s| (dims, s))
    })
}

fn bits(samples: &[f32]) -> Vec<u32> {
    samples.iter().map(|f| f.to_bits()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_binary_roundtrip((dims, samples) in dims_and_samples()) {
        let bytes = encode(&samples, dims).unwrap();
        prop_assert_eq!(bytes.len(), dims.byte_len().unwrap());
        let decoded = decode(&bytes, dims).unwrap();
        // Compare bit patterns so NaN payloads count as equal.
        prop_assert_eq!(bits(&decoded), bits(&samples));
    }

    #[test]
    fn prop_big_endian_roundtrip((dims, samples) in dims_and_samples()) {
        let opts = GridOptions::default().with_byte_order(ByteOrder::BigEndian);
        let bytes = encode_with(&samples, dims, &opts).unwrap();
        prop_assert_eq!(bits(&decode_with(&bytes, dims, &opts).unwrap()), bits(&samples));
    }

    #[test]
    fn prop_wrong_length_rejected((dims, samples) in dims_and_samples(), cut in 1usize..8) {
        let mut bytes = encode(&samples, dims).unwrap();
        let keep = bytes.len().saturating_sub(cut);
        bytes.truncate(keep);
        let err = decode(&bytes, dims).unwrap_err();
        let is_length = matches!(err, GridError::Length { .. });
        prop_assert!(is_length);
    }

    #[test]
    fn prop_slab_matches_full_decode((dims, samples) in dims_and_samples()) {
        let bytes = encode(&samples, dims).unwrap();
        let mut reader = SlabReader::new(std::io::Cursor::new(bytes), dims, GridOptions::default()).unwrap();
        let slice = dims.nx * dims.ny;
        for z in 0..dims.nz {
            let got = reader.read_slice(z).unwrap();
            prop_assert_eq!(bits(&got), bits(&samples[z * slice..(z + 1) * slice]));
        }
    }
}

#[test]
fn test_slab_reader_over_file() {
    let dims = GridDims::new(4, 4, 3);
    let samples: Vec<f32> = (0..48).map(|i| i as f32 * 0.5).collect();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&encode(&samples, dims).unwrap()).unwrap();

    let mut reader = SlabReader::new(file, dims, GridOptions::default()).unwrap();
    assert_eq!(reader.read_slice(2).unwrap(), samples[32..48].to_vec());
}

#[test]
fn test_read_volume_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.Trial.binary.001");
    let dims = GridDims::new(2, 3, 2);
    let samples: Vec<f32> = (0..12).map(|i| i as f32).collect();
    std::fs::write(&path, encode(&samples, dims).unwrap()).unwrap();

    let volume = read_volume(File::open(&path).unwrap(), dims, &GridOptions::default()).unwrap();
    assert_eq!(volume.samples(), samples.as_slice());
    assert_eq!(volume.get(1, 2, 1), Some(11.0));
}

#[test]
fn test_read_volume_short_file() {
    let dims = GridDims::new(2, 2, 2);
    let err = read_volume(&[0u8; 30][..], dims, &GridOptions::default()).unwrap_err();
    assert!(matches!(err, GridError::Length { expected: 32, actual: 30 }));
}
