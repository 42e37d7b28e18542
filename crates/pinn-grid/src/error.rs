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

//! Error types for the binary grid codec.

use thiserror::Error;

/// Errors raised while decoding or encoding a volumetric payload.
#[derive(Error, Debug)]
pub enum GridError {
    /// Payload length disagrees with the declared dimensions. Nothing was
    /// decoded.
    #[error("binary grid length mismatch: expected {expected} bytes, found {actual}")]
    Length { expected: u64, actual: u64 },

    /// Sample count handed to the encoder disagrees with the dimensions.
    #[error("sample count mismatch: expected {expected} samples, found {actual}")]
    SampleCount { expected: usize, actual: usize },

    /// `nx * ny * nz * 4` does not fit in memory addressing.
    #[error("grid dimensions {nx}x{ny}x{nz} overflow")]
    Overflow { nx: usize, ny: usize, nz: usize },

    /// Requested slice lies outside the grid.
    #[error("slice {z} out of range (grid has {nz} slices)")]
    SliceOutOfRange { z: usize, nz: usize },

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Returns `true` for payload shape violations (as opposed to I/O).
    pub fn is_format_error(&self) -> bool {
        matches!(self, GridError::Length { .. } | GridError::SampleCount { .. })
    }
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
