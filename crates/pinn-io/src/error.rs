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

//! Error types for loading and saving.

use thiserror::Error;

/// Errors that abort a whole load or save.
///
/// Everything that only affects one entity, grid or file is reported as a
/// diagnostic instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the file provider, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch was cancelled before every document was issued.
    #[error("load cancelled")]
    Cancelled,

    /// A document failed to parse under strict options.
    #[error("parse error: {0}")]
    Parse(#[from] pinn_core::PinnError),

    /// Grid encoding failed in a way that is not a per-beam format issue.
    #[error("grid error: {0}")]
    Grid(#[from] pinn_grid::GridError),

    /// JSON rendering failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or an unusable target layout.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for load and save.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` when the error came from the provider or filesystem.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
