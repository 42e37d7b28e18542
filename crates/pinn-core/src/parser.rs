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

//! Block parser for the nested record grammar.
//!
//! ```text
//! document  := statement*
//! statement := IDENT EQUALS value SEMI
//! value     := scalar | block | array | (empty)
//! block     := LBRACE statement* RBRACE
//! array     := LBRACE NUMBER (COMMA NUMBER)* COMMA? RBRACE
//! scalar    := STRING | NUMBER | bareword
//! ```
//!
//! The parser keeps one explicit frame per open block instead of recursing,
//! so nesting depth costs heap, not native stack.
//!
//! # Recovery
//!
//! A malformed statement yields a single diagnostic anchored at the start of
//! that statement. Inside a block the parser then skips to the `}` closing
//! that block and drops the block, and with it the statement that opened it.
//! At top level it skips to the next `;` outside any braces. Either way the
//! rest of the document is still parsed. Only resource-limit violations are
//! fatal.
//!
//! # Security
//!
//! Input size, nesting depth, statement count and array length are bounded
//! by [`Limits`].

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::{Block, Document, Node};
use crate::error::{PinnError, PinnResult};
use crate::lex::{LexError, Lexer, SourcePos, Token, TokenKind};
use crate::limits::Limits;
use crate::value::{Scalar, Value};

/// Parsing options.
///
/// # Examples
///
/// ```
/// use pinn_core::ParseOptions;
///
/// let opts = ParseOptions::builder()
///     .max_depth(64)
///     .strict(true)
///     .build();
/// assert_eq!(opts.limits.max_depth, 64);
/// assert!(opts.strict);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Security limits.
    pub limits: Limits,
    /// Fail on the first diagnostic instead of recovering.
    pub strict: bool,
}

impl ParseOptions {
    /// Create a new builder for ParseOptions.
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::new()
    }
}

/// Builder for ergonomic construction of ParseOptions.
#[derive(Debug, Clone, Default)]
pub struct ParseOptionsBuilder {
    limits: Limits,
    strict: bool,
}

impl ParseOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all limits at once.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum block nesting depth (default: 1000).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.limits.max_depth = depth;
        self
    }

    /// Set the maximum input size in bytes (default: 1GB).
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.limits.max_file_size = size;
        self
    }

    /// Set the maximum number of statements (default: 10M).
    pub fn max_statements(mut self, count: usize) -> Self {
        self.limits.max_statements = count;
        self
    }

    /// Set the maximum numeric array length (default: 100M).
    pub fn max_array_len(mut self, len: usize) -> Self {
        self.limits.max_array_len = len;
        self
    }

    /// Fail on the first diagnostic (default: false).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build the ParseOptions.
    pub fn build(self) -> ParseOptions {
        ParseOptions {
            limits: self.limits,
            strict: self.strict,
        }
    }
}

/// A parsed document together with the issues recovered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub document: Document,
    pub diagnostics: Diagnostics,
}

/// Parse a document with default options.
pub fn parse(input: &[u8]) -> PinnResult<Parsed> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse a document with explicit options.
pub fn parse_with_options(input: &[u8], options: &ParseOptions) -> PinnResult<Parsed> {
    if input.len() > options.limits.max_file_size {
        return Err(PinnError::limit(
            format!(
                "input size {} exceeds maximum {}",
                input.len(),
                options.limits.max_file_size
            ),
            0,
        ));
    }
    let parsed = Parser::new(input, &options.limits).run()?;
    if options.strict {
        if let Some(first) = parsed.diagnostics.first() {
            return Err(PinnError::from(first));
        }
    }
    Ok(parsed)
}

/// An open block awaiting its `}`.
struct Frame {
    key: String,
    start: SourcePos,
    block: Block,
}

/// Why a statement could not be completed.
enum Failure {
    Recoverable {
        diagnostic: Diagnostic,
        /// Braces opened by the failed statement that are still unclosed.
        open: usize,
        /// The token that triggered the failure, already consumed.
        offending: Option<TokenKind>,
    },
    Fatal(PinnError),
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    limits: &'a Limits,
    stack: Vec<Frame>,
    diagnostics: Diagnostics,
    statements: usize,
    /// Recovery already ran into end of input.
    truncated: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], limits: &'a Limits) -> Self {
        Self {
            lexer: Lexer::new(input),
            limits,
            stack: vec![Frame {
                key: String::new(),
                start: SourcePos::start(),
                block: Block::new(),
            }],
            diagnostics: Diagnostics::new(),
            statements: 0,
            truncated: false,
        }
    }

    fn run(mut self) -> PinnResult<Parsed> {
        loop {
            let token = match self.next() {
                Ok(token) => token,
                Err(err) => {
                    self.record_lex(err, None);
                    self.recover(0, None);
                    continue;
                }
            };
            let result = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Semi => continue,
                TokenKind::RBrace => {
                    self.close_block(token.pos);
                    continue;
                }
                TokenKind::Ident => self.statement(token),
                _ => Err(self.unexpected(&token, "a key", token.pos, None, 0)),
            };
            match result {
                Ok(()) => {}
                Err(Failure::Fatal(err)) => return Err(err),
                Err(Failure::Recoverable {
                    diagnostic,
                    open,
                    offending,
                }) => {
                    self.diagnostics.push(diagnostic);
                    self.recover(open, offending);
                }
            }
        }
        Ok(self.finish())
    }

    /// Next non-comment token.
    fn next(&mut self) -> Result<Token, LexError> {
        loop {
            let token = self.lexer.next_token()?;
            if token.kind != TokenKind::Comment {
                return Ok(token);
            }
        }
    }

    fn statement(&mut self, mut key: Token) -> Result<(), Failure> {
        let start = key.pos;
        self.statements += 1;
        if self.statements > self.limits.max_statements {
            return Err(Failure::Fatal(PinnError::limit(
                format!(
                    "statement count exceeds maximum {}",
                    self.limits.max_statements
                ),
                start.line(),
            )));
        }

        if key.text.len() > 1 && key.text.ends_with(':') {
            key.text.pop();
            return self.colon_statement(key, start);
        }
        let equals = self.next().map_err(|e| self.lex_failure(e, &key.text, 0))?;
        if equals.kind == TokenKind::Ident && equals.text == ":" {
            return self.colon_statement(key, start);
        }
        if equals.kind != TokenKind::Equals {
            return Err(self.unexpected(&equals, "'='", start, Some(&key.text), 0));
        }

        let value = self.next().map_err(|e| self.lex_failure(e, &key.text, 0))?;
        let node = match value.kind {
            TokenKind::Semi => {
                self.commit(key.text, Node::Scalar(Scalar::null().with_pos(value.pos)), start);
                return Ok(());
            }
            TokenKind::Str | TokenKind::Number | TokenKind::Ident => {
                Node::Scalar(scalar_from_token(value))
            }
            TokenKind::LBrace => match self.try_array(start, &key.text)? {
                Some(values) => Node::Array(values),
                None => return self.open_block(key.text, start),
            },
            _ => return Err(self.unexpected(&value, "a value", start, Some(&key.text), 0)),
        };

        let semi = self.next().map_err(|e| self.lex_failure(e, &key.text, 0))?;
        if semi.kind != TokenKind::Semi {
            return Err(self.unexpected(&semi, "';'", start, Some(&key.text), 0));
        }
        self.commit(key.text, node, start);
        Ok(())
    }

    /// `key : words ... ;`, the header form. A single token keeps its
    /// scalar type; several are joined with single spaces into text.
    fn colon_statement(&mut self, key: Token, start: SourcePos) -> Result<(), Failure> {
        let mut words: Vec<Token> = Vec::new();
        loop {
            let token = self.next().map_err(|e| self.lex_failure(e, &key.text, 0))?;
            match token.kind {
                TokenKind::Semi => break,
                TokenKind::Ident | TokenKind::Str | TokenKind::Number => words.push(token),
                _ => return Err(self.unexpected(&token, "';'", start, Some(&key.text), 0)),
            }
        }
        let scalar = match words.len() {
            0 => Scalar::null().with_pos(start),
            1 => scalar_from_token(words.remove(0)),
            _ => {
                let pos = words[0].pos;
                let text: Vec<&str> = words.iter().map(|t| t.text.as_str()).collect();
                Scalar::new(Value::Text(text.join(" "))).with_pos(pos)
            }
        };
        self.commit(key.text, Node::Scalar(scalar), start);
        Ok(())
    }

    /// Called just after an opening brace. Returns the array items if the
    /// group is a numeric array, or rewinds and returns `None` if it is a
    /// block.
    fn try_array(&mut self, start: SourcePos, key: &str) -> Result<Option<Vec<Scalar>>, Failure> {
        let checkpoint = self.lexer.checkpoint();
        let first = match self.next() {
            Ok(token) if token.kind == TokenKind::Number => token,
            _ => {
                self.lexer.restore(checkpoint);
                return Ok(None);
            }
        };
        let mut separator = match self.next() {
            Ok(token) if matches!(token.kind, TokenKind::Comma | TokenKind::RBrace) => token,
            _ => {
                self.lexer.restore(checkpoint);
                return Ok(None);
            }
        };

        let mut values = vec![Scalar::number(&first.text, first.pos)];
        loop {
            match separator.kind {
                TokenKind::RBrace => return Ok(Some(values)),
                TokenKind::Comma => {
                    let item = self.next().map_err(|e| self.lex_failure(e, key, 1))?;
                    match item.kind {
                        TokenKind::Number => {
                            if values.len() >= self.limits.max_array_len {
                                return Err(Failure::Fatal(PinnError::limit(
                                    format!(
                                        "array length exceeds maximum {}",
                                        self.limits.max_array_len
                                    ),
                                    item.pos.line(),
                                )));
                            }
                            values.push(Scalar::number(&item.text, item.pos));
                        }
                        // Trailing comma before the closing brace.
                        TokenKind::RBrace => return Ok(Some(values)),
                        _ => return Err(self.unexpected(&item, "a number", start, Some(key), 1)),
                    }
                    separator = self.next().map_err(|e| self.lex_failure(e, key, 1))?;
                }
                _ => {
                    return Err(self.unexpected(&separator, "',' or '}'", start, Some(key), 1));
                }
            }
        }
    }

    /// Pushes a frame for `key`.
    ///
    /// A record never directly contains a record of its own key, so
    /// `K ={` arriving while `K` is the innermost open block means that
    /// block lost its `};`. It is closed as corrupt and the new record
    /// becomes its sibling.
    fn open_block(&mut self, key: String, start: SourcePos) -> Result<(), Failure> {
        if self.stack.len() > 1 && self.stack.last().is_some_and(|f| f.key == key) {
            if let Some(corrupt) = self.stack.pop() {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::Syntax,
                    format!("missing '}}' for block '{}'", corrupt.key),
                )
                .at(corrupt.start)
                .with_path(self.path(Some(&corrupt.key)));
                self.diagnostics.push(diagnostic);
            }
        }
        if self.stack.len() > self.limits.max_depth {
            return Err(Failure::Fatal(PinnError::limit(
                format!("nesting depth exceeds maximum {}", self.limits.max_depth),
                start.line(),
            )));
        }
        self.stack.push(Frame {
            key,
            start,
            block: Block::new(),
        });
        Ok(())
    }

    fn close_block(&mut self, pos: SourcePos) {
        if self.stack.len() == 1 {
            let diagnostic = Diagnostic::new(DiagnosticKind::Syntax, "unexpected '}' at top level")
                .at(pos);
            self.diagnostics.push(diagnostic);
            return;
        }
        let checkpoint = self.lexer.checkpoint();
        let terminated = matches!(self.next(), Ok(t) if t.kind == TokenKind::Semi);
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if terminated {
            self.commit(frame.key, Node::Block(frame.block), frame.start);
        } else {
            self.lexer.restore(checkpoint);
            let diagnostic = Diagnostic::new(
                DiagnosticKind::Syntax,
                format!("expected ';' after block '{}'", frame.key),
            )
            .at(frame.start)
            .with_path(self.path(Some(&frame.key)));
            self.diagnostics.push(diagnostic);
        }
    }

    fn commit(&mut self, key: String, node: Node, start: SourcePos) {
        if let Some(frame) = self.stack.last_mut() {
            frame.block.push(key, node, start);
        }
    }

    /// Skips the rest of a failed statement.
    ///
    /// At top level this stops after the next `;` outside any braces. Inside
    /// a block it stops after the `}` that closes the block and discards it.
    fn recover(&mut self, mut open: usize, offending: Option<TokenKind>) {
        let at_root = self.stack.len() == 1;
        let mut pending = offending;
        loop {
            let kind = match pending.take() {
                Some(kind) => kind,
                None => match self.next() {
                    Ok(token) => token.kind,
                    Err(_) => continue,
                },
            };
            match kind {
                TokenKind::Eof => {
                    self.truncated = true;
                    return;
                }
                TokenKind::LBrace => open += 1,
                TokenKind::RBrace if open > 0 => open -= 1,
                TokenKind::RBrace => {
                    if !at_root {
                        self.stack.pop();
                    }
                    return;
                }
                TokenKind::Semi if open == 0 && at_root => return,
                _ => {}
            }
        }
    }

    /// Unwinds blocks still open at end of input.
    ///
    /// An unterminated block is kept when it already holds complete child
    /// blocks, so the records that did close survive; one holding only
    /// scalars is a partial record and is dropped.
    fn finish(mut self) -> Parsed {
        while self.stack.len() > 1 {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            if !self.truncated {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::Syntax,
                    format!("missing '}}' for block '{}'", frame.key),
                )
                .at(frame.start)
                .with_path(self.path(Some(&frame.key)));
                self.diagnostics.push(diagnostic);
            }
            let complete = frame
                .block
                .iter()
                .any(|e| matches!(e.node, Node::Block(_) | Node::List(_)));
            if complete {
                self.commit(frame.key, Node::Block(frame.block), frame.start);
            }
        }
        let root = self.stack.pop().map(|f| f.block).unwrap_or_default();
        Parsed {
            document: Document::from_block(root),
            diagnostics: self.diagnostics,
        }
    }

    /// Dotted path of the open blocks, optionally followed by `leaf`.
    fn path(&self, leaf: Option<&str>) -> String {
        self.stack
            .iter()
            .skip(1)
            .map(|f| f.key.as_str())
            .chain(leaf)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn unexpected(
        &self,
        found: &Token,
        expected: &str,
        start: SourcePos,
        key: Option<&str>,
        open: usize,
    ) -> Failure {
        let message = format!(
            "expected {}, found {} at {}",
            expected, found.kind, found.pos
        );
        Failure::Recoverable {
            diagnostic: Diagnostic::new(DiagnosticKind::Syntax, message)
                .at(start)
                .with_path(self.path(key)),
            open,
            offending: Some(found.kind),
        }
    }

    fn lex_failure(&self, err: LexError, key: &str, open: usize) -> Failure {
        Failure::Recoverable {
            diagnostic: Diagnostic::new(DiagnosticKind::Lex, err.to_string())
                .at(err.position())
                .with_path(self.path(Some(key))),
            open,
            offending: None,
        }
    }

    fn record_lex(&mut self, err: LexError, key: Option<&str>) {
        let diagnostic = Diagnostic::new(DiagnosticKind::Lex, err.to_string())
            .at(err.position())
            .with_path(self.path(key));
        self.diagnostics.push(diagnostic);
    }
}

fn scalar_from_token(token: Token) -> Scalar {
    match token.kind {
        TokenKind::Number => Scalar::number(&token.text, token.pos),
        TokenKind::Ident if token.text == "null" => {
            Scalar::null().with_raw("null").with_pos(token.pos)
        }
        TokenKind::Ident => Scalar::word(token.text).with_pos(token.pos),
        _ => Scalar::new(Value::Text(token.text)).with_pos(token.pos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Parsed {
        parse(input.as_bytes()).unwrap()
    }

    fn root(input: &str) -> Block {
        let parsed = parse_ok(input);
        assert!(
            parsed.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            parsed.diagnostics
        );
        parsed.document.root
    }

    fn scalar<'a>(block: &'a Block, key: &str) -> &'a Value {
        &block.get(key).unwrap().as_scalar().unwrap().value
    }

    // ==================== Basic statement tests ====================

    #[test]
    fn test_scalars() {
        let root = root(
            r#"Name = "Trial_1";
Gantry = 180.5;
Count = 3;
Mode = ON;
DoseVolume = \XDR:8\;"#,
        );
        assert_eq!(scalar(&root, "Name"), &Value::Text("Trial_1".into()));
        assert_eq!(scalar(&root, "Gantry"), &Value::Float(180.5));
        assert_eq!(scalar(&root, "Count"), &Value::Int(3));
        assert_eq!(scalar(&root, "Mode"), &Value::Word("ON".into()));
        assert_eq!(scalar(&root, "DoseVolume"), &Value::Word("\\XDR:8\\".into()));
    }

    #[test]
    fn test_null_forms() {
        let root = root("Missing = ;\nExplicit = null;\n");
        assert_eq!(scalar(&root, "Missing"), &Value::Null);
        assert_eq!(scalar(&root, "Explicit"), &Value::Null);
        let raw = root.get("Explicit").unwrap().as_scalar().unwrap().raw.clone();
        assert_eq!(raw.as_deref(), Some("null"));
    }

    #[test]
    fn test_raw_number_kept() {
        let root = root("X = 1.50;");
        let s = root.get("X").unwrap().as_scalar().unwrap();
        assert_eq!(s.raw.as_deref(), Some("1.50"));
        assert_eq!(s.pos, SourcePos::with_offset(1, 5, 4));
    }

    #[test]
    fn test_comments_skipped() {
        let root = root("// header\nA = 1; /* inline */ B = 2;\n");
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_key_order_preserved() {
        let root = root("Z = 1; A = 2; M = 3;");
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_colon_statements() {
        let root = root(
            "x_dim = 512;\ndb_name : PATIENT;\ndate : 20200101;\ncomment : head and neck;\nvoxel_type : ;\n",
        );
        assert_eq!(scalar(&root, "x_dim"), &Value::Int(512));
        assert_eq!(scalar(&root, "db_name"), &Value::Word("PATIENT".into()));
        assert_eq!(scalar(&root, "date"), &Value::Int(20200101));
        assert_eq!(scalar(&root, "comment"), &Value::Text("head and neck".into()));
        assert_eq!(scalar(&root, "voxel_type"), &Value::Null);

        let attached = self::root("scanner_id: CT1;\nbitpix: 16;\n");
        assert_eq!(scalar(&attached, "scanner_id"), &Value::Word("CT1".into()));
        assert_eq!(scalar(&attached, "bitpix"), &Value::Int(16));
    }

    // ==================== Block tests ====================

    #[test]
    fn test_nested_blocks() {
        let root = root("Trial ={\n  Name = \"T\";\n  DoseGrid ={\n    VoxelSize ={ X = 0.4; };\n  };\n};\n");
        let trial = root.get("Trial").unwrap().as_block().unwrap();
        let grid = trial.get("DoseGrid").unwrap().as_block().unwrap();
        let voxel = grid.get("VoxelSize").unwrap().as_block().unwrap();
        assert_eq!(scalar(voxel, "X"), &Value::Float(0.4));
    }

    #[test]
    fn test_empty_block() {
        let root = root("Empty ={\n};");
        assert!(root.get("Empty").unwrap().as_block().unwrap().is_empty());
    }

    #[test]
    fn test_repeated_key_becomes_list() {
        let root = root("Point ={ Name = \"a\"; };\nPoint ={ Name = \"b\"; };\n");
        match root.get("Point").unwrap() {
            Node::List(items) => {
                assert_eq!(items.len(), 2);
                let names: Vec<_> = items
                    .iter()
                    .map(|n| scalar(n.as_block().unwrap(), "Name").clone())
                    .collect();
                assert_eq!(names, vec![Value::Text("a".into()), Value::Text("b".into())]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_single_key_is_not_list() {
        let root = root("Point ={ Name = \"a\"; };");
        assert!(matches!(root.get("Point"), Some(Node::Block(_))));
    }

    #[test]
    fn test_indexed_items() {
        let root = root("ControlPointList ={\n  #0 ={ Gantry = 0; };\n  #1 ={ Gantry = 10; };\n};");
        let list = root.get("ControlPointList").unwrap().as_block().unwrap();
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["#0", "#1"]);
    }

    // ==================== Array tests ====================

    #[test]
    fn test_array() {
        let root = root("Points[] ={\n  -12.0066,-12.6974,\n  0.0986838,5.19737\n};");
        let values = root.get("Points[]").unwrap().as_array().unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0].raw.as_deref(), Some("-12.0066"));
        assert_eq!(values[3].value, Value::Float(5.19737));
    }

    #[test]
    fn test_array_trailing_comma_and_single() {
        let root = root("A ={ 1, 2, };\nB ={ 5 };");
        assert_eq!(root.get("A").unwrap().as_array().unwrap().len(), 2);
        assert_eq!(root.get("B").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_array_recovers() {
        let parsed = parse_ok("P[] ={ 1, 2 3 };\nQ = 1;");
        assert_eq!(parsed.diagnostics.count(DiagnosticKind::Syntax), 1);
        assert!(parsed.document.root.get("P[]").is_none());
        assert!(parsed.document.root.get("Q").is_some());
    }

    // ==================== Recovery tests ====================

    #[test]
    fn test_top_level_recovery() {
        let parsed = parse_ok("A = 1;\nB = = 2;\nC = 3;");
        let root = &parsed.document.root;
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(parsed.diagnostics.len(), 1);
        let diag = parsed.diagnostics.first().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Syntax);
        assert_eq!((diag.location.line, diag.location.column), (2, 1));
    }

    #[test]
    fn test_block_recovery_discards_block() {
        let parsed = parse_ok("P ={ N = 1; X = 2 Y = 3; };\nQ = 4;");
        let root = &parsed.document.root;
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["Q"]);
        assert_eq!(parsed.diagnostics.len(), 1);
        let diag = parsed.diagnostics.first().unwrap();
        assert_eq!((diag.location.line, diag.location.column), (1, 13));
        assert_eq!(diag.location.path.as_deref(), Some("P.X"));
    }

    #[test]
    fn test_nested_recovery_keeps_siblings() {
        let input = "BeamList ={\n  Beam ={ Name = \"A\"; };\n  Beam ={ Name = \"B\" Gantry = 1; };\n  Beam ={ Name = \"C\"; };\n};\n";
        let parsed = parse_ok(input);
        assert_eq!(parsed.diagnostics.len(), 1);
        let list = parsed.document.root.get("BeamList").unwrap().as_block().unwrap();
        match list.get("Beam").unwrap() {
            Node::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_load_nine_of_ten() {
        let mut input = String::new();
        for i in 0..10 {
            if i == 4 {
                input.push_str("Poi ={ Name = \"P4\" XCoord = 1; };\n");
            } else {
                input.push_str(&format!("Poi ={{ Name = \"P{i}\"; XCoord = {i}; }};\n"));
            }
        }
        let parsed = parse_ok(&input);
        assert_eq!(parsed.document.root.get("Poi").unwrap().items().count(), 9);
        assert_eq!(parsed.diagnostics.count(DiagnosticKind::Syntax), 1);
    }

    #[test]
    fn test_missing_rbrace_at_eof() {
        let parsed = parse_ok("A = 1;\nB ={ C = 2;\n");
        assert_eq!(parsed.document.root.keys().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(parsed.diagnostics.len(), 1);
        let diag = parsed.diagnostics.first().unwrap();
        assert_eq!(diag.location.line, 2);
        assert!(diag.message.contains("missing '}'"));
    }

    #[test]
    fn test_missing_rbrace_mid_file_keeps_nine() {
        let mut input = String::new();
        for i in 0..10 {
            if i == 4 {
                input.push_str("Poi ={\n  Name = \"P4\";\n  XCoord = 4;\n");
            } else {
                input.push_str(&format!("Poi ={{\n  Name = \"P{i}\";\n  XCoord = {i};\n}};\n"));
            }
        }
        let parsed = parse_ok(&input);
        let items: Vec<_> = parsed.document.root.get("Poi").unwrap().items().collect();
        assert_eq!(items.len(), 9);
        let names: Vec<_> = items
            .iter()
            .map(|n| scalar(n.as_block().unwrap(), "Name").clone())
            .collect();
        assert!(!names.contains(&Value::Text("P4".into())));
        assert_eq!(names[4], Value::Text("P5".into()));
        assert_eq!(parsed.diagnostics.count(DiagnosticKind::Syntax), 1);
        let diag = parsed.diagnostics.first().unwrap();
        assert!(diag.message.contains("missing '}'"));
        assert_eq!(diag.location.line, 17);
    }

    #[test]
    fn test_missing_rbrace_inside_wrapper() {
        let input = "BeamList ={\n  Beam ={ Name = \"A\";\n  Beam ={ Name = \"B\"; };\n};\nNext = 1;\n";
        let parsed = parse_ok(input);
        assert_eq!(parsed.diagnostics.count(DiagnosticKind::Syntax), 1);
        let list = parsed.document.root.get("BeamList").unwrap().as_block().unwrap();
        assert_eq!(list.get("Beam").unwrap().items().count(), 1);
        assert!(parsed.document.root.contains_key("Next"));
    }

    #[test]
    fn test_unterminated_wrapper_keeps_complete_records() {
        let parsed = parse_ok("PoiList ={\n  Poi ={ Name = \"a\"; };\n  Poi ={ Name = \"b\"; };\n");
        assert_eq!(parsed.diagnostics.len(), 1);
        let list = parsed.document.root.get("PoiList").unwrap().as_block().unwrap();
        assert_eq!(list.get("Poi").unwrap().items().count(), 2);
    }

    #[test]
    fn test_unterminated_last_record_dropped() {
        let parsed = parse_ok("Poi ={ Name = \"a\"; };\nPoi ={ Name = \"b\";\n");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(matches!(parsed.document.root.get("Poi"), Some(Node::Block(_))));
    }

    #[test]
    fn test_missing_semi_after_block() {
        let parsed = parse_ok("A ={ B = 1; }\nC = 2;");
        assert_eq!(parsed.document.root.keys().collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_stray_rbrace() {
        let parsed = parse_ok("};\nA = 1;");
        assert!(parsed.document.root.contains_key("A"));
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_lex_error_recovers() {
        let parsed = parse_ok("A = \"bad\\q\";\nB = 2;");
        assert_eq!(parsed.diagnostics.count(DiagnosticKind::Lex), 1);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(parsed.document.root.contains_key("B"));
        assert!(!parsed.document.root.contains_key("A"));
    }

    #[test]
    fn test_key_must_be_identifier() {
        let parsed = parse_ok("\"A\" = 1;\nB = 2;");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.document.root.keys().collect::<Vec<_>>(), vec!["B"]);
    }

    // ==================== Options and limits tests ====================

    #[test]
    fn test_strict_mode_fails() {
        let opts = ParseOptions::builder().strict(true).build();
        let err = parse_with_options(b"A = = 1;", &opts).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Syntax);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_max_depth() {
        let opts = ParseOptions::builder().max_depth(2).build();
        assert!(parse_with_options(b"A ={ B ={ C = 1; }; };", &opts).is_ok());
        let err = parse_with_options(b"A ={ B ={ C ={ }; }; };", &opts).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Limit);
    }

    #[test]
    fn test_max_file_size() {
        let opts = ParseOptions::builder().max_file_size(4).build();
        let err = parse_with_options(b"A = 1;", &opts).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Limit);
    }

    #[test]
    fn test_max_statements() {
        let opts = ParseOptions::builder().max_statements(2).build();
        assert!(parse_with_options(b"A = 1; B = 2; C = 3;", &opts).is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let opts = ParseOptions::builder().build();
        assert_eq!(opts, ParseOptions::default());
        assert!(!opts.strict);
    }
}
