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

//! Error types for record parsing.

use std::fmt;
use thiserror::Error;

use crate::lex::LexError;

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token.
    Lex,
    /// Grammar violation.
    Syntax,
    /// Missing or mistyped entity field.
    Schema,
    /// Dangling named reference.
    Reference,
    /// Binary payload does not match its declared shape.
    BinaryFormat,
    /// I/O error from the byte-stream provider.
    Io,
    /// Resource limit exceeded.
    Limit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "LexError"),
            Self::Syntax => write!(f, "SyntaxError"),
            Self::Schema => write!(f, "SchemaError"),
            Self::Reference => write!(f, "ReferenceError"),
            Self::BinaryFormat => write!(f, "BinaryFormatError"),
            Self::Io => write!(f, "IOError"),
            Self::Limit => write!(f, "LimitError"),
        }
    }
}

/// An error raised while reading or writing a record document.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} at line {line}: {message}")]
pub struct PinnError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number (1-based, 0 when unknown).
    pub line: usize,
    /// Column number (1-based, optional).
    pub column: Option<usize>,
    /// Additional context (e.g., "in block BeamList started at line 12").
    pub context: Option<String>,
}

impl PinnError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column: None,
            context: None,
        }
    }

    /// Add column information.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Add context information.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Convenience constructors for each error kind
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, line)
    }

    pub fn schema(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Schema, message, line)
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message, 0)
    }

    pub fn binary_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BinaryFormat, message, 0)
    }

    pub fn limit(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Limit, message, line)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message, 0)
    }
}

impl From<LexError> for PinnError {
    fn from(err: LexError) -> Self {
        let pos = err.position();
        Self::new(ErrorKind::Lex, err.to_string(), pos.line()).with_column(pos.column())
    }
}

/// Result type for record operations.
pub type PinnResult<T> = Result<T, PinnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::SourcePos;

    // ==================== ErrorKind Display tests ====================

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Lex.to_string(), "LexError");
        assert_eq!(ErrorKind::Syntax.to_string(), "SyntaxError");
        assert_eq!(ErrorKind::Schema.to_string(), "SchemaError");
        assert_eq!(ErrorKind::Reference.to_string(), "ReferenceError");
        assert_eq!(ErrorKind::BinaryFormat.to_string(), "BinaryFormatError");
        assert_eq!(ErrorKind::Io.to_string(), "IOError");
        assert_eq!(ErrorKind::Limit.to_string(), "LimitError");
    }

    // ==================== PinnError tests ====================

    #[test]
    fn test_error_display() {
        let err = PinnError::syntax("expected ';'", 12);
        assert_eq!(err.to_string(), "SyntaxError at line 12: expected ';'");
    }

    #[test]
    fn test_builders() {
        let err = PinnError::schema("bad", 3)
            .with_column(5)
            .with_context("in Beam");
        assert_eq!(err.kind, ErrorKind::Schema);
        assert_eq!(err.column, Some(5));
        assert_eq!(err.context.as_deref(), Some("in Beam"));
    }

    #[test]
    fn test_from_lex_error() {
        let lex = LexError::UnterminatedString {
            pos: SourcePos::new(7, 3),
        };
        let err: PinnError = lex.into();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.line, 7);
        assert_eq!(err.column, Some(3));
    }
}
