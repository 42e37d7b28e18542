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

//! Binary dose grid codec.
//!
//! A dose payload is a headerless run of 32-bit IEEE-754 floats, one per
//! voxel, x varying fastest. Its shape comes from the dose grid record that
//! accompanies it, so every entry point here takes a [`GridDims`].
//!
//! # Guarantees
//!
//! - Length is validated before decoding; a mismatch yields
//!   [`GridError::Length`] and no samples.
//! - `decode(encode(s, d), d) == s` for every `s` of length `d.voxel_count()`.
//!
//! # Streaming
//!
//! [`SlabReader`] reads individual z-slices from a seekable stream without
//! loading the whole payload.

mod codec;
mod error;
mod slab;
mod volume;

pub use codec::{
    decode, decode_with, encode, encode_with, ByteOrder, GridDims, GridOptions, SAMPLE_SIZE,
};
pub use error::{GridError, GridResult};
pub use slab::SlabReader;
pub use volume::Volume;

use std::io::Read;

/// Reads and decodes a whole payload from a stream.
///
/// The stream is read to its end first; a length mismatch is reported
/// before any sample is decoded.
pub fn read_volume<R: Read>(mut reader: R, dims: GridDims, options: &GridOptions) -> GridResult<Volume> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Volume::from_bytes(&bytes, dims, options)
}
