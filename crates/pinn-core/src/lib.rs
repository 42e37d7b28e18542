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

//! Lexer, block parser and generic node tree for Pinnacle planning records.
//!
//! Planning records are plain text made of nested `Key = value;` statements
//! and `Key ={ ... };` blocks. This crate turns such bytes into a
//! schema-agnostic [`Document`] and reports every recoverable problem as a
//! [`Diagnostic`] rather than failing the whole parse.
//!
//! ```
//! use pinn_core::{parse, Node};
//!
//! let parsed = parse(b"Trial ={ Name = \"Trial_1\"; };").unwrap();
//! assert!(parsed.diagnostics.is_empty());
//! assert!(matches!(parsed.document.get("Trial"), Some(Node::Block(_))));
//! ```
//!
//! See the [`lex`] module for the tokenizer.

mod diagnostics;
mod document;
mod error;
pub mod lex;
mod limits;
mod parser;
mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};
pub use document::{Block, Document, Entry, Node};
pub use error::{ErrorKind, PinnError, PinnResult};
pub use lex::SourcePos;
pub use limits::Limits;
pub use parser::{parse, parse_with_options, ParseOptions, ParseOptionsBuilder, Parsed};
pub use value::{Scalar, Value};
