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

//! Decoded dose volume.

use crate::codec::{decode_with, encode_with, GridDims, GridOptions};
use crate::error::{GridError, GridResult};

/// A decoded volumetric payload: samples plus the shape they were read with.
///
/// The sample count always equals `dims.voxel_count()`; every constructor
/// checks it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Volume {
    dims: GridDims,
    samples: Vec<f32>,
}

impl Volume {
    pub fn new(dims: GridDims, samples: Vec<f32>) -> GridResult<Self> {
        let expected = dims.voxel_count()?;
        if samples.len() != expected {
            return Err(GridError::SampleCount {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self { dims, samples })
    }

    /// A volume of zeros.
    pub fn zeros(dims: GridDims) -> GridResult<Self> {
        Ok(Self {
            dims,
            samples: vec![0.0; dims.voxel_count()?],
        })
    }

    pub fn from_bytes(bytes: &[u8], dims: GridDims, options: &GridOptions) -> GridResult<Self> {
        let samples = decode_with(bytes, dims, options)?;
        Ok(Self { dims, samples })
    }

    pub fn to_bytes(&self, options: &GridOptions) -> GridResult<Vec<u8>> {
        encode_with(&self.samples, self.dims, options)
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.dims.index(x, y, z).map(|i| self.samples[i])
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) -> bool {
        match self.dims.index(x, y, z) {
            Some(i) => {
                self.samples[i] = value;
                true
            }
            None => false,
        }
    }

    /// Samples of one z-slice, x fastest.
    pub fn slice(&self, z: usize) -> Option<&[f32]> {
        if z >= self.dims.nz {
            return None;
        }
        let len = self.dims.nx * self.dims.ny;
        Some(&self.samples[z * len..(z + 1) * len])
    }

    /// Largest finite sample, if any.
    pub fn max(&self) -> Option<f32> {
        self.samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
    }

    /// Sum of all samples.
    pub fn sum(&self) -> f64 {
        self.samples.iter().map(|&v| f64::from(v)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dims: GridDims) -> Volume {
        let n = dims.voxel_count().unwrap();
        Volume::new(dims, (0..n).map(|i| i as f32).collect()).unwrap()
    }

    #[test]
    fn test_new_checks_count() {
        assert!(Volume::new(GridDims::new(2, 2, 1), vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_get_set() {
        let mut volume = ramp(GridDims::new(3, 2, 2));
        assert_eq!(volume.get(2, 1, 1), Some(11.0));
        assert!(volume.set(0, 0, 1, -1.0));
        assert_eq!(volume.get(0, 0, 1), Some(-1.0));
        assert!(!volume.set(3, 0, 0, 1.0));
        assert_eq!(volume.get(0, 2, 0), None);
    }

    #[test]
    fn test_slice() {
        let volume = ramp(GridDims::new(2, 2, 3));
        assert_eq!(volume.slice(1).unwrap(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(volume.slice(3).is_none());
    }

    #[test]
    fn test_max_and_sum() {
        let volume = Volume::new(GridDims::new(3, 1, 1), vec![1.0, f32::NAN, 4.0]).unwrap();
        assert_eq!(volume.max(), Some(4.0));
        let zeros = Volume::zeros(GridDims::new(2, 2, 2)).unwrap();
        assert_eq!(zeros.sum(), 0.0);
        assert_eq!(Volume::zeros(GridDims::new(0, 0, 0)).unwrap().max(), None);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let volume = ramp(GridDims::new(4, 3, 2));
        let opts = GridOptions::default();
        let bytes = volume.to_bytes(&opts).unwrap();
        assert_eq!(bytes.len(), 4 * 3 * 2 * 4);
        assert_eq!(Volume::from_bytes(&bytes, volume.dims(), &opts).unwrap(), volume);
    }
}
