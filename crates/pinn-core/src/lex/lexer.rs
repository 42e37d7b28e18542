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

//! Byte-stream lexer.
//!
//! The lexer is lazy: it scans one token per call and holds no state beyond
//! the current position, so a [`Checkpoint`] is just a saved position and
//! restoring it replays the input from there.

use memchr::{memchr, memchr2, memchr_iter, memmem};

use crate::lex::error::LexError;
use crate::lex::span::SourcePos;
use crate::lex::tokens::{is_delimiter, is_number_literal, is_space, Token, TokenKind};

/// Saved lexer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(SourcePos);

impl Checkpoint {
    pub fn position(&self) -> SourcePos {
        self.0
    }
}

/// Tokenizer over a borrowed byte slice.
///
/// # Examples
///
/// ```
/// use pinn_core::lex::{Lexer, TokenKind};
///
/// let kinds: Vec<TokenKind> = Lexer::new(b"Gantry = 180.0;")
///     .map(|t| t.unwrap().kind)
///     .collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::Ident, TokenKind::Equals, TokenKind::Number, TokenKind::Semi, TokenKind::Eof]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: SourcePos,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: SourcePos::start(),
            finished: false,
        }
    }

    /// Current position (start of the next unscanned byte).
    #[inline]
    pub fn position(&self) -> SourcePos {
        self.pos
    }

    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    /// Rewinds to a previously taken checkpoint.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
        self.finished = false;
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        let input = self.input;
        &input[self.pos.offset().min(input.len())..]
    }

    /// Moves forward `n` bytes, keeping line and column in step.
    fn bump(&mut self, n: usize) {
        let slice = &self.rest()[..n];
        let mut last_newline = None;
        let mut newlines = 0;
        for idx in memchr_iter(b'\n', slice) {
            newlines += 1;
            last_newline = Some(idx);
        }
        match last_newline {
            Some(idx) => {
                self.pos = SourcePos::with_offset(
                    self.pos.line() + newlines,
                    n - idx,
                    self.pos.offset() + n,
                );
            }
            None => {
                self.pos = SourcePos::with_offset(
                    self.pos.line(),
                    self.pos.column() + n,
                    self.pos.offset() + n,
                );
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.rest().first() {
            match b {
                b'\n' => self.pos.next_line(),
                b if is_space(b) => self.pos.advance_col(),
                _ => break,
            }
        }
    }

    /// Scans the next token, comments included.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();
        let Some(&b) = rest.first() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        let single = |kind| Token::new(kind, "", start);
        match b {
            b'=' => {
                self.bump(1);
                Ok(single(TokenKind::Equals))
            }
            b'{' => {
                self.bump(1);
                Ok(single(TokenKind::LBrace))
            }
            b'}' => {
                self.bump(1);
                Ok(single(TokenKind::RBrace))
            }
            b';' => {
                self.bump(1);
                Ok(single(TokenKind::Semi))
            }
            b',' => {
                self.bump(1);
                Ok(single(TokenKind::Comma))
            }
            b'"' => self.scan_string(start),
            b'/' if rest.get(1) == Some(&b'/') => {
                let len = memchr(b'\n', rest).unwrap_or(rest.len());
                let text = decode_text(&rest[2..len]);
                self.bump(len);
                Ok(Token::new(TokenKind::Comment, text, start))
            }
            b'/' if rest.get(1) == Some(&b'*') => match memmem::find(&rest[2..], b"*/") {
                Some(end) => {
                    let text = decode_text(&rest[2..2 + end]);
                    self.bump(end + 4);
                    Ok(Token::new(TokenKind::Comment, text, start))
                }
                None => {
                    self.bump(rest.len());
                    Err(LexError::UnterminatedComment { pos: start })
                }
            },
            b if b < 0x20 || b == 0x7f => {
                self.bump(1);
                Err(LexError::UnexpectedByte { pos: start, byte: b })
            }
            _ => Ok(self.scan_word(start)),
        }
    }

    fn scan_word(&mut self, start: SourcePos) -> Token {
        let rest = self.rest();
        let mut len = 0;
        while len < rest.len() {
            let b = rest[len];
            if is_delimiter(b) || is_space(b) || b < 0x20 || b == 0x7f {
                break;
            }
            if b == b'/' && matches!(rest.get(len + 1), Some(b'/') | Some(b'*')) {
                break;
            }
            len += 1;
        }
        let text = decode_text(&rest[..len]);
        self.bump(len);
        let kind = if is_number_literal(&text) {
            TokenKind::Number
        } else {
            TokenKind::Ident
        };
        Token::new(kind, text, start)
    }

    fn scan_string(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.bump(1);
        let mut buf = Vec::new();
        let mut bad_escape = None;
        loop {
            let rest = self.rest();
            let Some(i) = memchr2(b'"', b'\\', rest) else {
                self.bump(rest.len());
                return Err(LexError::UnterminatedString { pos: start });
            };
            buf.extend_from_slice(&rest[..i]);
            self.bump(i);
            if rest[i] == b'"' {
                self.bump(1);
                break;
            }
            let escape_pos = self.pos;
            let Some(&escaped) = rest.get(i + 1) else {
                self.bump(1);
                return Err(LexError::UnterminatedString { pos: start });
            };
            self.bump(2);
            match escaped {
                b'"' => buf.push(b'"'),
                b'\\' => buf.push(b'\\'),
                b'n' => buf.push(b'\n'),
                b't' => buf.push(b'\t'),
                b'r' => buf.push(b'\r'),
                other => {
                    // Keep scanning to the closing quote so the caller resumes
                    // after the whole string.
                    bad_escape.get_or_insert(LexError::InvalidEscape {
                        pos: escape_pos,
                        byte: other,
                    });
                }
            }
        }
        match bad_escape {
            Some(err) => Err(err),
            None => Ok(Token::new(TokenKind::Str, decode_text(&buf), start)),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if matches!(&token, Ok(t) if t.kind == TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}

/// Decodes token bytes as UTF-8, falling back to Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.unwrap().kind).collect()
    }

    fn tokens(input: &[u8]) -> Vec<Token> {
        Lexer::new(input).map(|t| t.unwrap()).collect()
    }

    // ==================== Basic token tests ====================

    #[test]
    fn test_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds(b"Name = \"Trial_1\";"),
            vec![Ident, Equals, Str, Semi, Eof]
        );
    }

    #[test]
    fn test_block() {
        use TokenKind::*;
        assert_eq!(
            kinds(b"Trial ={ Gantry = 0; };"),
            vec![Ident, Equals, LBrace, Ident, Equals, Number, Semi, RBrace, Semi, Eof]
        );
    }

    #[test]
    fn test_array_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds(b"Points[] ={ -1.5,2, 3e2 };"),
            vec![Ident, Equals, LBrace, Number, Comma, Number, Comma, Number, RBrace, Semi, Eof]
        );
    }

    #[test]
    fn test_number_text_preserved() {
        let toks = tokens(b"-2.50E+03 .5 007");
        assert_eq!(toks[0].text, "-2.50E+03");
        assert_eq!(toks[1].text, ".5");
        assert_eq!(toks[2].text, "007");
        assert!(toks[..3].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_barewords() {
        let toks = tokens(br"DoseVolume = \XDR:8\; #0 = x;");
        assert_eq!(toks[2].kind, TokenKind::Ident);
        assert_eq!(toks[2].text, "\\XDR:8\\");
        assert_eq!(toks[4].text, "#0");
    }

    // ==================== String tests ====================

    #[test]
    fn test_string_escapes() {
        let toks = tokens(br#""a\"b\\c\nd""#);
        assert_eq!(toks[0].kind, TokenKind::Str);
        assert_eq!(toks[0].text, "a\"b\\c\nd");
    }

    #[test]
    fn test_string_with_braces_and_spaces() {
        let toks = tokens(b"\"On back (supine) {x};\"");
        assert_eq!(toks[0].text, "On back (supine) {x};");
    }

    #[test]
    fn test_latin1_fallback() {
        let toks = tokens(b"\"M\xfcller\"");
        assert_eq!(toks[0].text, "M\u{fc}ller");
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new(b"Name = \"abc");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { pos: SourcePos::with_offset(1, 8, 7) });
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_invalid_escape_resumes_after_string() {
        let mut lexer = Lexer::new(b"\"a\\qb\"; X");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, LexError::InvalidEscape { byte: b'q', .. }));
        assert_eq!(err.position().column(), 3);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semi);
        assert_eq!(lexer.next_token().unwrap().text, "X");
    }

    // ==================== Comment tests ====================

    #[test]
    fn test_line_comment() {
        let toks = tokens(b"// header\nA = 1;");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].text, " header");
        assert_eq!(toks[1].pos.line(), 2);
    }

    #[test]
    fn test_block_comment() {
        let toks = tokens(b"/* a\nb */ A");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[1].pos, SourcePos::with_offset(2, 6, 10));
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new(b"/* never closed");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedComment { .. })
        ));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_word_stops_at_comment() {
        let toks = tokens(b"abc// tail");
        assert_eq!(toks[0].text, "abc");
        assert_eq!(toks[1].kind, TokenKind::Comment);
    }

    // ==================== Position and checkpoint tests ====================

    #[test]
    fn test_positions() {
        let toks = tokens(b"A = 1;\n  B ={\n};");
        assert_eq!(toks[0].pos, SourcePos::with_offset(1, 1, 0));
        assert_eq!(toks[4].pos, SourcePos::with_offset(2, 3, 9));
        assert_eq!(toks[7].pos.line(), 3);
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut lexer = Lexer::new(b"A = 1; B = 2;");
        lexer.next_token().unwrap();
        let cp = lexer.checkpoint();
        let first: Vec<_> = (0..3).map(|_| lexer.next_token().unwrap()).collect();
        lexer.restore(cp);
        let second: Vec<_> = (0..3).map(|_| lexer.next_token().unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_control_byte() {
        let mut lexer = Lexer::new(b"\x01A");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnexpectedByte { byte: 0x01, .. })
        ));
        assert_eq!(lexer.next_token().unwrap().text, "A");
    }

    #[test]
    fn test_iterator_ends_after_eof() {
        let mut lexer = Lexer::new(b"");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Eof);
        assert!(lexer.next().is_none());
    }
}
