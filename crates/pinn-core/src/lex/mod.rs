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

//! Lexical analysis for the nested record grammar.
//!
//! # Module Structure
//!
//! - [`error`] - Lexer error type
//! - [`span`] - Source positions for diagnostics
//! - [`tokens`] - Token kinds and classification helpers
//! - [`lexer`] - The lazy, checkpointable tokenizer
//!
//! # Examples
//!
//! ```
//! use pinn_core::lex::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new(b"Name = \"Trial_1\";");
//! let key = lexer.next_token().unwrap();
//! assert_eq!(key.kind, TokenKind::Ident);
//! assert_eq!(key.text, "Name");
//! ```

pub mod error;
pub mod lexer;
pub mod span;
pub mod tokens;

pub use error::LexError;
pub use lexer::{decode_text, Checkpoint, Lexer};
pub use span::SourcePos;
pub use tokens::{is_bareword_safe, is_number_literal, Token, TokenKind};
