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

//! Token kinds and lexical classification helpers.

use crate::lex::span::SourcePos;

/// The kind of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A bareword: `Name`, `#0`, `\XDR:8\`, `Points[]`.
    Ident,
    /// A double-quoted string; the token text is the unescaped content.
    Str,
    /// An integer or float literal, text kept verbatim.
    Number,
    Equals,
    LBrace,
    RBrace,
    Semi,
    Comma,
    /// A `//` or `/* */` comment; the text excludes the delimiters.
    Comment,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Str => "string",
            TokenKind::Number => "number",
            TokenKind::Equals => "'='",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A scanned token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: SourcePos,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Returns `true` for tokens that can stand as a scalar value.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Ident | TokenKind::Str | TokenKind::Number
        )
    }
}

/// Bytes that terminate a bareword.
#[inline]
pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(b, b'=' | b'{' | b'}' | b';' | b',' | b'"')
}

#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

/// Returns `true` if `s` is a numeric literal: optional sign, digits with an
/// optional fraction (either side of the dot may be empty, not both), and an
/// optional exponent.
pub fn is_number_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Returns `true` if `s` can be written without quotes and read back as the
/// same bareword.
pub fn is_bareword_safe(s: &str) -> bool {
    !s.is_empty()
        && s != "null"
        && !is_number_literal(s)
        && !s.contains("//")
        && !s.contains("/*")
        && s
            .bytes()
            .all(|b| !is_delimiter(b) && !is_space(b) && b >= 0x20 && b != 0x7f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_literals() {
        for s in ["0", "-3", "+7", "1.5", "-0.25", ".5", "5.", "1e10", "-2.5E-3", "0.0986838"] {
            assert!(is_number_literal(s), "{s} should be a number");
        }
    }

    #[test]
    fn test_non_number_literals() {
        for s in ["", "-", ".", "e5", "1e", "1.2.3", "12a", "0x10", "1e+", "Gy"] {
            assert!(!is_number_literal(s), "{s} should not be a number");
        }
    }

    #[test]
    fn test_bareword_safe() {
        assert!(is_bareword_safe("ON"));
        assert!(is_bareword_safe("\\XDR:8\\"));
        assert!(is_bareword_safe("#3"));
        assert!(!is_bareword_safe(""));
        assert!(!is_bareword_safe("null"));
        assert!(!is_bareword_safe("12"));
        assert!(!is_bareword_safe("two words"));
        assert!(!is_bareword_safe("a;b"));
        assert!(!is_bareword_safe("http://x"));
    }

    #[test]
    fn test_token_kind_display() {
        assert_eq!(TokenKind::Semi.to_string(), "';'");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
