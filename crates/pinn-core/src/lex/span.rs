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

//! Source position tracking for lexical analysis.
//!
//! Every token and every scalar in the generic tree carries a [`SourcePos`]
//! so that diagnostics can point at the exact line and column of a record.
//!
//! # Examples
//!
//! ```
//! use pinn_core::lex::SourcePos;
//!
//! let pos = SourcePos::new(10, 25);
//! assert_eq!(pos.line(), 10);
//! assert_eq!(pos.column(), 25);
//! ```

use std::fmt;

/// A position in source text.
///
/// Line and column numbers are 1-indexed. `offset` is the byte offset into
/// the input and is what the lexer rewinds to when restoring a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourcePos {
    line: usize,
    column: usize,
    offset: usize,
}

impl SourcePos {
    /// Creates a new source position with an unknown byte offset.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            offset: 0,
        }
    }

    /// Creates a position with an explicit byte offset.
    #[inline]
    pub const fn with_offset(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Creates a position at the start of the input (line 1, column 1).
    #[inline]
    pub const fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Returns the line number.
    #[inline]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the column number.
    #[inline]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Returns the byte offset.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Advances past one byte on the current line.
    #[inline]
    pub(crate) fn advance_col(&mut self) {
        self.column += 1;
        self.offset += 1;
    }

    /// Advances past a newline byte.
    #[inline]
    pub(crate) fn next_line(&mut self) {
        self.line += 1;
        self.column = 1;
        self.offset += 1;
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let pos = SourcePos::new(3, 7);
        assert_eq!(pos.line(), 3);
        assert_eq!(pos.column(), 7);
        assert_eq!(pos.offset(), 0);
    }

    #[test]
    fn test_advance() {
        let mut pos = SourcePos::start();
        pos.advance_col();
        pos.advance_col();
        assert_eq!(pos, SourcePos::with_offset(1, 3, 2));
        pos.next_line();
        assert_eq!(pos, SourcePos::with_offset(2, 1, 3));
    }

    #[test]
    fn test_display() {
        assert_eq!(SourcePos::new(4, 2).to_string(), "line 4, column 2");
    }
}
