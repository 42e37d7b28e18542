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

//! Decode throughput for realistic dose grid sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pinn_grid::{decode, encode, GridDims, GridOptions, SlabReader};
use std::io::Cursor;

fn sample_grid(dims: GridDims) -> Vec<u8> {
    let n = dims.voxel_count().unwrap();
    let samples: Vec<f32> = (0..n).map(|i| (i % 997) as f32 * 0.01).collect();
    encode(&samples, dims).unwrap()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_decode");
    for &(nx, ny, nz) in &[(64, 64, 32), (128, 128, 64), (256, 256, 96)] {
        let dims = GridDims::new(nx, ny, nz);
        let bytes = sample_grid(dims);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("full", dims), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes), dims).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("one_slice", dims), &bytes, |b, bytes| {
            b.iter(|| {
                let mut reader =
                    SlabReader::new(Cursor::new(bytes.as_slice()), dims, GridOptions::default())
                        .unwrap();
                reader.read_slice(black_box(nz / 2)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
