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

//! Lexical error types.

use thiserror::Error;

pub use crate::lex::span::SourcePos;

/// Error produced while scanning a single token.
///
/// A lex error never leaves the lexer wedged: after reporting it the lexer
/// has already moved past the offending input, so the caller can keep
/// pulling tokens while it resynchronizes at a statement boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    // ==================== String errors ====================
    /// A quoted string ran to end of input.
    #[error("line {}, column {}: unterminated string", .pos.line(), .pos.column())]
    UnterminatedString { pos: SourcePos },

    /// Backslash followed by a byte that is not a known escape.
    #[error("line {}, column {}: invalid escape sequence '\\{}'", .pos.line(), .pos.column(), char::from(*.byte))]
    InvalidEscape { pos: SourcePos, byte: u8 },

    // ==================== Structural errors ====================
    /// A `/* ... */` comment ran to end of input.
    #[error("line {}, column {}: unterminated block comment", .pos.line(), .pos.column())]
    UnterminatedComment { pos: SourcePos },

    /// A control byte outside of any token.
    #[error("line {}, column {}: unexpected byte 0x{:02x}", .pos.line(), .pos.column(), .byte)]
    UnexpectedByte { pos: SourcePos, byte: u8 },
}

impl LexError {
    /// Get the position where this error occurred.
    #[inline]
    pub fn position(&self) -> SourcePos {
        match self {
            LexError::UnterminatedString { pos }
            | LexError::InvalidEscape { pos, .. }
            | LexError::UnterminatedComment { pos }
            | LexError::UnexpectedByte { pos, .. } => *pos,
        }
    }

    /// The offending byte, when one can be named.
    #[inline]
    pub fn offending_byte(&self) -> Option<u8> {
        match self {
            LexError::InvalidEscape { byte, .. } | LexError::UnexpectedByte { byte, .. } => {
                Some(*byte)
            }
            _ => None,
        }
    }
}
