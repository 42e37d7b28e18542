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

//! Canonical serializer for planning records.
//!
//! The inverse of [`pinn_core::parse`]: given a [`Document`], produce text
//! that parses back into an equal document. Output is deterministic
//! (consistent indentation, a `;` after every statement, quoting decided by
//! value rather than by how the source happened to look) but it is not a
//! byte-for-byte copy of the original formatting.
//!
//! ```
//! use pinn_core::parse;
//! use pinn_c14n::canonicalize;
//!
//! let parsed = parse(b"Beam={Name=\"B1\";Gantry=180;};").unwrap();
//! let text = canonicalize(&parsed.document).unwrap();
//! assert_eq!(text, "Beam ={\n  Name = \"B1\";\n  Gantry = 180;\n};\n");
//! assert_eq!(parse(text.as_bytes()).unwrap().document, parsed.document);
//! ```

mod config;
mod writer;

pub use config::{CanonicalConfig, CanonicalConfigBuilder, QuotingStrategy};
pub use writer::{quote, CanonicalWriter};

use pinn_core::{Document, PinnError};

/// Canonicalize a document with the default configuration.
pub fn canonicalize(doc: &Document) -> Result<String, PinnError> {
    canonicalize_with_config(doc, &CanonicalConfig::default())
}

/// Canonicalize a document with a custom configuration.
pub fn canonicalize_with_config(
    doc: &Document,
    config: &CanonicalConfig,
) -> Result<String, PinnError> {
    CanonicalWriter::new(config.clone()).write_document(doc)
}
