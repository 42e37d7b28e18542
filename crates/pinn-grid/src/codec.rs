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

//! Flat float32 payload codec.
//!
//! Samples are 4-byte IEEE-754 floats laid out voxel-major with x varying
//! fastest, then y, then z. There is no header; the shape always comes from
//! the companion dose grid record.

use crate::error::{GridError, GridResult};

/// Size in bytes of one sample.
pub const SAMPLE_SIZE: usize = 4;

/// Grid shape in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDims {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridDims {
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> GridResult<usize> {
        self.nx
            .checked_mul(self.ny)
            .and_then(|n| n.checked_mul(self.nz))
            .ok_or_else(|| self.overflow())
    }

    /// Voxels in one z-slice.
    pub fn slice_len(&self) -> GridResult<usize> {
        self.nx.checked_mul(self.ny).ok_or_else(|| self.overflow())
    }

    /// Expected payload length in bytes.
    pub fn byte_len(&self) -> GridResult<usize> {
        self.voxel_count()?
            .checked_mul(SAMPLE_SIZE)
            .ok_or_else(|| self.overflow())
    }

    /// Flat index of voxel `(x, y, z)`, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.nx && y < self.ny && z < self.nz {
            Some((z * self.ny + y) * self.nx + x)
        } else {
            None
        }
    }

    fn overflow(&self) -> GridError {
        GridError::Overflow {
            nx: self.nx,
            ny: self.ny,
            nz: self.nz,
        }
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Byte order of stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    /// Files produced by older planning workstations.
    BigEndian,
}

/// Codec options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridOptions {
    pub byte_order: ByteOrder,
}

impl GridOptions {
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/// Decodes a little-endian payload.
///
/// The length is checked against `dims` before any byte is interpreted.
///
/// ```
/// use pinn_grid::{decode, encode, GridDims};
///
/// let dims = GridDims::new(2, 1, 1);
/// let bytes = encode(&[1.5, -2.0], dims).unwrap();
/// assert_eq!(decode(&bytes, dims).unwrap(), vec![1.5, -2.0]);
/// assert!(decode(&bytes[..7], dims).is_err());
/// ```
pub fn decode(bytes: &[u8], dims: GridDims) -> GridResult<Vec<f32>> {
    decode_with(bytes, dims, &GridOptions::default())
}

/// Decodes a payload with explicit options.
pub fn decode_with(bytes: &[u8], dims: GridDims, options: &GridOptions) -> GridResult<Vec<f32>> {
    let expected = dims.byte_len()?;
    if bytes.len() != expected {
        return Err(GridError::Length {
            expected: expected as u64,
            actual: bytes.len() as u64,
        });
    }
    Ok(decode_samples(bytes, options.byte_order))
}

/// Encodes samples as a little-endian payload.
pub fn encode(samples: &[f32], dims: GridDims) -> GridResult<Vec<u8>> {
    encode_with(samples, dims, &GridOptions::default())
}

/// Encodes samples with explicit options.
pub fn encode_with(samples: &[f32], dims: GridDims, options: &GridOptions) -> GridResult<Vec<u8>> {
    let expected = dims.voxel_count()?;
    if samples.len() != expected {
        return Err(GridError::SampleCount {
            expected,
            actual: samples.len(),
        });
    }
    let mut out = Vec::with_capacity(dims.byte_len()?);
    for &sample in samples {
        let raw = match options.byte_order {
            ByteOrder::LittleEndian => sample.to_le_bytes(),
            ByteOrder::BigEndian => sample.to_be_bytes(),
        };
        out.extend_from_slice(&raw);
    }
    Ok(out)
}

/// Decodes whole samples from a buffer whose length is already validated.
pub(crate) fn decode_samples(bytes: &[u8], order: ByteOrder) -> Vec<f32> {
    bytes
        .chunks_exact(SAMPLE_SIZE)
        .map(|chunk| {
            let raw = [chunk[0], chunk[1], chunk[2], chunk[3]];
            match order {
                ByteOrder::LittleEndian => f32::from_le_bytes(raw),
                ByteOrder::BigEndian => f32::from_be_bytes(raw),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== GridDims tests ====================

    #[test]
    fn test_voxel_count() {
        let dims = GridDims::new(3, 4, 5);
        assert_eq!(dims.voxel_count().unwrap(), 60);
        assert_eq!(dims.byte_len().unwrap(), 240);
        assert_eq!(dims.slice_len().unwrap(), 12);
    }

    #[test]
    fn test_overflow() {
        let dims = GridDims::new(usize::MAX, 2, 1);
        assert!(matches!(dims.voxel_count(), Err(GridError::Overflow { .. })));
    }

    #[test]
    fn test_index_x_fastest() {
        let dims = GridDims::new(3, 2, 2);
        assert_eq!(dims.index(0, 0, 0), Some(0));
        assert_eq!(dims.index(1, 0, 0), Some(1));
        assert_eq!(dims.index(0, 1, 0), Some(3));
        assert_eq!(dims.index(0, 0, 1), Some(6));
        assert_eq!(dims.index(2, 1, 1), Some(11));
        assert_eq!(dims.index(3, 0, 0), None);
    }

    // ==================== Decode tests ====================

    #[test]
    fn test_decode_little_endian() {
        let bytes = [0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0];
        let samples = decode(&bytes, GridDims::new(2, 1, 1)).unwrap();
        assert_eq!(samples, vec![1.0, -2.0]);
    }

    #[test]
    fn test_decode_big_endian() {
        let bytes = [0x3f, 0x80, 0x00, 0x00];
        let opts = GridOptions::default().with_byte_order(ByteOrder::BigEndian);
        assert_eq!(decode_with(&bytes, GridDims::new(1, 1, 1), &opts).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_decode_not_multiple_of_four() {
        let err = decode(&[0u8; 7], GridDims::new(2, 1, 1)).unwrap_err();
        assert!(matches!(err, GridError::Length { expected: 8, actual: 7 }));
    }

    #[test]
    fn test_decode_wrong_size() {
        let err = decode(&[0u8; 12], GridDims::new(2, 1, 1)).unwrap_err();
        assert!(matches!(err, GridError::Length { expected: 8, actual: 12 }));
    }

    #[test]
    fn test_decode_empty_grid() {
        assert!(decode(&[], GridDims::new(0, 4, 4)).unwrap().is_empty());
    }

    // ==================== Encode tests ====================

    #[test]
    fn test_encode_sample_count() {
        let err = encode(&[1.0, 2.0, 3.0], GridDims::new(2, 1, 1)).unwrap_err();
        assert!(matches!(err, GridError::SampleCount { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_encode_big_endian_roundtrip() {
        let opts = GridOptions::default().with_byte_order(ByteOrder::BigEndian);
        let dims = GridDims::new(2, 2, 1);
        let samples = [0.5, 1.25, -3.0, 1.0e-6];
        let bytes = encode_with(&samples, dims, &opts).unwrap();
        assert_eq!(&bytes[..4], &0.5f32.to_be_bytes());
        assert_eq!(decode_with(&bytes, dims, &opts).unwrap(), samples);
    }
}
