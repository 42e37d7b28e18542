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

//! Shared test fixtures for the Pinnacle record codec.
//!
//! - [`fixtures`]: the text of each record file of a small, complete
//!   patient, plus malformed samples.
//! - [`tree`]: whole patient and institution directories as in-memory file
//!   lists, with encoded dose binaries, that tests can write to disk or
//!   serve from memory.
//!
//! ```rust
//! use pinn_test::{fixtures, parse_fixture};
//!
//! let doc = parse_fixture(fixtures::plan_trial());
//! assert!(doc.get("Trial").is_some());
//! ```

pub mod fixtures;
pub mod tree;

pub use tree::{FixtureFile, FixtureTree};

use pinn_core::Document;

/// Type alias for a list of fixture functions (name, text).
pub type FixtureList = Vec<(&'static str, fn() -> &'static str)>;

/// Parses fixture text that is known to be well formed.
///
/// # Panics
///
/// Panics when the text does not parse cleanly; fixtures are expected to.
pub fn parse_fixture(text: &str) -> Document {
    let parsed = pinn_core::parse(text.as_bytes()).expect("fixture parses");
    assert!(
        parsed.diagnostics.is_empty(),
        "fixture produced diagnostics: {:?}",
        parsed.diagnostics
    );
    parsed.document
}
