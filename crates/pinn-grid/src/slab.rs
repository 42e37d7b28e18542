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

//! Bounded-memory access to z-slabs of a large grid file.
//!
//! Full dose grids can run to hundreds of megabytes. [`SlabReader`] checks
//! the stream length once up front, then reads only the byte range of the
//! slices asked for.

use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use crate::codec::{decode_samples, GridDims, GridOptions, SAMPLE_SIZE};
use crate::error::{GridError, GridResult};

/// Reads axis-aligned z-slabs from a seekable payload stream.
///
/// ```
/// use std::io::Cursor;
/// use pinn_grid::{encode, GridDims, GridOptions, SlabReader};
///
/// let dims = GridDims::new(2, 2, 2);
/// let bytes = encode(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], dims).unwrap();
/// let mut reader = SlabReader::new(Cursor::new(bytes), dims, GridOptions::default()).unwrap();
/// assert_eq!(reader.read_slice(1).unwrap(), vec![4.0, 5.0, 6.0, 7.0]);
/// ```
#[derive(Debug)]
pub struct SlabReader<R> {
    inner: R,
    dims: GridDims,
    options: GridOptions,
    slice_bytes: usize,
}

impl<R: Read + Seek> SlabReader<R> {
    /// Wraps a stream, validating its total length against `dims`.
    pub fn new(mut inner: R, dims: GridDims, options: GridOptions) -> GridResult<Self> {
        let expected = dims.byte_len()? as u64;
        let actual = inner.seek(SeekFrom::End(0))?;
        if actual != expected {
            return Err(GridError::Length { expected, actual });
        }
        let slice_bytes = dims.slice_len()? * SAMPLE_SIZE;
        Ok(Self {
            inner,
            dims,
            options,
            slice_bytes,
        })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Reads one z-slice.
    pub fn read_slice(&mut self, z: usize) -> GridResult<Vec<f32>> {
        let end = z.checked_add(1).ok_or(GridError::SliceOutOfRange {
            z,
            nz: self.dims.nz,
        })?;
        self.read_slab(z..end)
    }

    /// Reads a contiguous run of z-slices.
    pub fn read_slab(&mut self, range: Range<usize>) -> GridResult<Vec<f32>> {
        if range.start >= range.end {
            return Ok(Vec::new());
        }
        if range.end > self.dims.nz {
            return Err(GridError::SliceOutOfRange {
                z: range.end - 1,
                nz: self.dims.nz,
            });
        }
        let offset = (range.start * self.slice_bytes) as u64;
        let mut buf = vec![0u8; range.len() * self.slice_bytes];
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut buf)?;
        Ok(decode_samples(&buf, self.options.byte_order))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use std::io::Cursor;

    fn reader(dims: GridDims) -> SlabReader<Cursor<Vec<u8>>> {
        let n = dims.voxel_count().unwrap();
        let samples: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let bytes = encode(&samples, dims).unwrap();
        SlabReader::new(Cursor::new(bytes), dims, GridOptions::default()).unwrap()
    }

    #[test]
    fn test_read_slice() {
        let mut r = reader(GridDims::new(3, 2, 4));
        assert_eq!(r.read_slice(0).unwrap(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(r.read_slice(3).unwrap()[0], 18.0);
    }

    #[test]
    fn test_read_slab() {
        let mut r = reader(GridDims::new(2, 1, 4));
        assert_eq!(r.read_slab(1..3).unwrap(), vec![2.0, 3.0, 4.0, 5.0]);
        assert!(r.read_slab(2..2).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let mut r = reader(GridDims::new(2, 2, 2));
        assert!(matches!(
            r.read_slice(2),
            Err(GridError::SliceOutOfRange { z: 2, nz: 2 })
        ));
    }

    #[test]
    fn test_last_index_out_of_range() {
        let mut r = reader(GridDims::new(2, 2, 2));
        assert!(matches!(
            r.read_slice(usize::MAX),
            Err(GridError::SliceOutOfRange { z: usize::MAX, nz: 2 })
        ));
        assert!(matches!(
            r.read_slab(1..usize::MAX),
            Err(GridError::SliceOutOfRange { nz: 2, .. })
        ));
    }

    #[test]
    fn test_length_validated_up_front() {
        let err = SlabReader::new(Cursor::new(vec![0u8; 10]), GridDims::new(2, 2, 1), GridOptions::default())
            .unwrap_err();
        assert!(matches!(err, GridError::Length { expected: 16, actual: 10 }));
    }
}
