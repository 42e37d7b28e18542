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

//! Canonical record writer.

use std::fmt::Write;

use crate::config::{CanonicalConfig, QuotingStrategy};
use pinn_core::lex::is_bareword_safe;
use pinn_core::{Block, Document, Node, PinnError, Scalar, Value};

/// Initial buffer capacity for output string.
const INITIAL_OUTPUT_BUFFER_CAPACITY: usize = 4096;

/// Maximum nesting depth for recursive block structures.
const MAX_NESTING_DEPTH: usize = 1000;

/// Line number used for errors without a source location.
const ERROR_LINE_UNKNOWN: usize = 0;

/// Writer for canonical record text.
///
/// Every statement ends in `;`, every block opens with `Key ={` and closes
/// with `};` on its own line, and each nesting level indents by
/// [`CanonicalConfig::indent`] spaces. A [`Node::List`] is written back as
/// one statement per item under the same key.
pub struct CanonicalWriter {
    config: CanonicalConfig,
    output: String,
}

impl CanonicalWriter {
    pub fn new(config: CanonicalConfig) -> Self {
        Self {
            config,
            output: String::with_capacity(INITIAL_OUTPUT_BUFFER_CAPACITY),
        }
    }

    /// Writes a document and returns the text.
    pub fn write_document(&mut self, doc: &Document) -> Result<String, PinnError> {
        self.write_block(&doc.root, 0)?;
        Ok(std::mem::take(&mut self.output))
    }

    fn write_block(&mut self, block: &Block, depth: usize) -> Result<(), PinnError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(PinnError::limit(
                format!("nesting depth exceeds maximum {}", MAX_NESTING_DEPTH),
                ERROR_LINE_UNKNOWN,
            ));
        }
        for entry in block {
            self.write_statement(&entry.key, &entry.node, depth)?;
        }
        Ok(())
    }

    fn write_statement(&mut self, key: &str, node: &Node, depth: usize) -> Result<(), PinnError> {
        match node {
            Node::List(items) => {
                for item in items {
                    self.write_statement(key, item, depth)?;
                }
                Ok(())
            }
            Node::Scalar(scalar) => {
                let value = self.format_scalar(scalar)?;
                self.indent(depth);
                if value.is_empty() {
                    writeln!(self.output, "{} = ;", key).map_err(write_error)
                } else {
                    writeln!(self.output, "{} = {};", key, value).map_err(write_error)
                }
            }
            Node::Block(block) => {
                self.indent(depth);
                writeln!(self.output, "{} ={{", key).map_err(write_error)?;
                self.write_block(block, depth + 1)?;
                self.indent(depth);
                self.output.push_str("};\n");
                Ok(())
            }
            Node::Array(values) => {
                self.indent(depth);
                writeln!(self.output, "{} ={{", key).map_err(write_error)?;
                self.write_array(values, depth + 1)?;
                self.indent(depth);
                self.output.push_str("};\n");
                Ok(())
            }
        }
    }

    fn write_array(&mut self, values: &[Scalar], depth: usize) -> Result<(), PinnError> {
        let formatted = values
            .iter()
            .map(|v| self.format_number(v))
            .collect::<Result<Vec<_>, _>>()?;
        let per_line = match self.config.array_values_per_line {
            0 => formatted.len().max(1),
            n => n,
        };
        let lines: Vec<String> = formatted.chunks(per_line).map(|c| c.join(",")).collect();
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            self.indent(depth);
            self.output.push_str(line);
            if i < last {
                self.output.push(',');
            }
            self.output.push('\n');
        }
        Ok(())
    }

    fn indent(&mut self, depth: usize) {
        let width = depth * self.config.indent;
        self.output.extend(std::iter::repeat(' ').take(width));
    }

    fn format_scalar(&self, scalar: &Scalar) -> Result<String, PinnError> {
        match &scalar.value {
            Value::Null => Ok(scalar.raw.clone().unwrap_or_default()),
            Value::Int(_) | Value::Float(_) => self.format_number(scalar),
            Value::Text(s) => Ok(quote(s)),
            Value::Word(w) => {
                if self.config.quoting == QuotingStrategy::Preserve && is_bareword_safe(w) {
                    Ok(w.clone())
                } else {
                    Ok(quote(w))
                }
            }
        }
    }

    /// Numbers keep their source literal while it still denotes the same
    /// value; otherwise they are formatted so floats stay floats.
    fn format_number(&self, scalar: &Scalar) -> Result<String, PinnError> {
        if let Some(raw) = &scalar.raw {
            if Scalar::number(raw, scalar.pos).value == scalar.value {
                return Ok(raw.clone());
            }
        }
        match scalar.value {
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) if !f.is_finite() => Err(PinnError::syntax(
                format!("cannot write non-finite number {}", f),
                ERROR_LINE_UNKNOWN,
            )),
            Value::Float(f) if f.fract() == 0.0 => Ok(format!("{:.1}", f)),
            Value::Float(f) => Ok(f.to_string()),
            ref other => Err(PinnError::syntax(
                format!("expected a number in array, found {}", other.type_name()),
                ERROR_LINE_UNKNOWN,
            )),
        }
    }
}

/// Quotes and escapes a string value.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_error(e: std::fmt::Error) -> PinnError {
    PinnError::syntax(format!("Write error: {}", e), ERROR_LINE_UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinn_core::SourcePos;

    fn write(doc: &Document) -> String {
        CanonicalWriter::new(CanonicalConfig::default())
            .write_document(doc)
            .unwrap()
    }

    // ==================== Scalar formatting tests ====================

    #[test]
    fn test_scalar_statements() {
        let mut root = Block::new();
        root.insert("Name", Scalar::new("Trial 1"));
        root.insert("Count", Scalar::new(3_i64));
        root.insert("Gantry", Scalar::new(180.0));
        root.insert("Weight", Scalar::new(0.25));
        root.insert("Mode", Scalar::word("ON"));
        root.insert("Missing", Scalar::null());
        assert_eq!(
            write(&Document::from_block(root)),
            "Name = \"Trial 1\";\nCount = 3;\nGantry = 180.0;\nWeight = 0.25;\nMode = ON;\nMissing = ;\n"
        );
    }

    #[test]
    fn test_raw_literal_preserved() {
        let mut root = Block::new();
        root.insert("X", Scalar::number("1.50", SourcePos::start()));
        root.insert("N", Scalar::null().with_raw("null"));
        assert_eq!(write(&Document::from_block(root)), "X = 1.50;\nN = null;\n");
    }

    #[test]
    fn test_stale_raw_ignored() {
        let mut scalar = Scalar::number("1.50", SourcePos::start());
        scalar.value = Value::Float(2.0);
        let mut root = Block::new();
        root.insert("X", scalar);
        assert_eq!(write(&Document::from_block(root)), "X = 2.0;\n");
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
        assert_eq!(quote("{x};"), "\"{x};\"");
    }

    #[test]
    fn test_unsafe_word_quoted() {
        let mut root = Block::new();
        root.insert("A", Scalar::word("two words"));
        root.insert("B", Scalar::word("123"));
        root.insert("C", Scalar::word("\\XDR:8\\"));
        assert_eq!(
            write(&Document::from_block(root)),
            "A = \"two words\";\nB = \"123\";\nC = \\XDR:8\\;\n"
        );
    }

    #[test]
    fn test_always_quote() {
        let mut root = Block::new();
        root.insert("Mode", Scalar::word("ON"));
        let config = CanonicalConfig::new().with_quoting(QuotingStrategy::Always);
        let out = CanonicalWriter::new(config)
            .write_document(&Document::from_block(root))
            .unwrap();
        assert_eq!(out, "Mode = \"ON\";\n");
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut root = Block::new();
        root.insert("X", Scalar::new(f64::NAN));
        let result = CanonicalWriter::new(CanonicalConfig::default())
            .write_document(&Document::from_block(root));
        assert!(result.is_err());
    }

    // ==================== Structure tests ====================

    #[test]
    fn test_nested_block_indentation() {
        let mut voxel = Block::new();
        voxel.insert("X", Scalar::new(0.4));
        let mut grid = Block::new();
        grid.insert("VoxelSize", voxel);
        let mut root = Block::new();
        root.insert("DoseGrid", grid);
        assert_eq!(
            write(&Document::from_block(root)),
            "DoseGrid ={\n  VoxelSize ={\n    X = 0.4;\n  };\n};\n"
        );
    }

    #[test]
    fn test_list_expands_to_repeated_keys() {
        let mut root = Block::new();
        let mut a = Block::new();
        a.insert("Name", Scalar::new("a"));
        let mut b = Block::new();
        b.insert("Name", Scalar::new("b"));
        root.insert("Point", Node::List(vec![a.into(), b.into()]));
        assert_eq!(
            write(&Document::from_block(root)),
            "Point ={\n  Name = \"a\";\n};\nPoint ={\n  Name = \"b\";\n};\n"
        );
    }

    #[test]
    fn test_interleaved_keys_written_grouped() {
        let parsed = pinn_core::parse(b"A = 1;\nB = 2;\nA = 3;\n").unwrap();
        assert_eq!(write(&parsed.document), "A = 1;\nA = 3;\nB = 2;\n");
    }

    #[test]
    fn test_single_item_list_writes_one_statement() {
        let mut root = Block::new();
        let mut a = Block::new();
        a.insert("Name", Scalar::new("a"));
        root.insert("Point", Node::List(vec![a.into()]));
        let out = write(&Document::from_block(root));
        assert_eq!(out.matches("Point ={").count(), 1);
    }

    #[test]
    fn test_array_wrapping() {
        let values = ["-12.0066", "-12.6974", "0.0986838", "5.19737", "1"]
            .iter()
            .map(|s| Scalar::number(s, SourcePos::start()))
            .collect();
        let mut root = Block::new();
        root.insert("Points[]", Node::Array(values));
        assert_eq!(
            write(&Document::from_block(root)),
            "Points[] ={\n  -12.0066,-12.6974,\n  0.0986838,5.19737,\n  1\n};\n"
        );
    }

    #[test]
    fn test_empty_block() {
        let mut root = Block::new();
        root.insert("Empty", Block::new());
        assert_eq!(write(&Document::from_block(root)), "Empty ={\n};\n");
    }
}
