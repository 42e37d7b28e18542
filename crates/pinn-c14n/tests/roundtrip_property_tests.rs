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

//! Property-based tests for document → canonicalize → parse round trips.
//!
//! # Properties Tested
//!
//! 1. **Semantic Preservation**: canonical text parses back to an equal document
//! 2. **Idempotency**: canonicalizing canonical output changes nothing
//! 3. **Clean Output**: canonical text never produces diagnostics

use pinn_c14n::{canonicalize, canonicalize_with_config, CanonicalConfig, QuotingStrategy};
use pinn_core::{parse, Block, Document, Node, Scalar, Value};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9_]{0,8}(\\[\\])?"
}

fn number() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i64>().prop_map(Scalar::new),
        (-1.0e9_f64..1.0e9).prop_map(Scalar::new),
        Just(Scalar::new(0.0)),
    ]
}

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        number(),
        "[ -~]{0,16}".prop_map(|s| Scalar::new(Value::Text(s))),
        "[a-zA-Z\\\\#][a-zA-Z0-9:_\\\\]{0,10}"
            .prop_filter("null is a keyword", |w| w != "null")
            .prop_map(Scalar::word),
        Just(Scalar::null()),
    ]
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => scalar().prop_map(Node::Scalar),
        1 => prop::collection::vec(number(), 1..8).prop_map(Node::Array),
    ]
}

fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            3 => prop::collection::vec((key(), inner.clone()), 0..6).prop_map(|entries| {
                let mut block = Block::new();
                for (k, v) in entries {
                    block.insert(k, v);
                }
                Node::Block(block)
            }),
            1 => prop::collection::vec(inner, 2..4).prop_map(Node::List),
        ]
    })
}

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec((key(), node()), 0..8).prop_map(|entries| {
        let mut root = Block::new();
        for (k, v) in entries {
            root.insert(k, v);
        }
        Document::from_block(root)
    })
}

/// Lists nested directly in lists have no textual form of their own; they
/// flatten into the enclosing run of statements.
fn flatten(node: &Node) -> Node {
    match node {
        Node::List(items) => {
            let mut flat = Vec::new();
            for item in items {
                match flatten(item) {
                    Node::List(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            Node::List(flat)
        }
        Node::Block(block) => {
            let mut out = Block::new();
            for entry in block {
                out.insert(entry.key.clone(), flatten(&entry.node));
            }
            Node::Block(out)
        }
        other => other.clone(),
    }
}

fn normalize(doc: &Document) -> Document {
    match flatten(&Node::Block(doc.root.clone())) {
        Node::Block(root) => Document::from_block(root),
        _ => unreachable!(),
    }
}

/// Barewords that need quoting come back as quoted text.
fn same_text(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Word(x) | Value::Text(x), Value::Word(y) | Value::Text(y)) => x == y,
        _ => a == b,
    }
}

fn equivalent(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Scalar(x), Node::Scalar(y)) => same_text(&x.value, &y.value),
        (Node::Block(x), Node::Block(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|(p, q)| p.key == q.key && equivalent(&p.node, &q.node))
        }
        (Node::List(x), Node::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equivalent(p, q))
        }
        (Node::Array(x), Node::Array(y)) => x == y,
        _ => false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_roundtrip_preserves_document(doc in document()) {
        let text = canonicalize(&doc).unwrap();
        let parsed = parse(text.as_bytes()).unwrap();
        prop_assert!(parsed.diagnostics.is_empty(), "diagnostics: {:?}\n{}", parsed.diagnostics, text);
        let expected = normalize(&doc);
        prop_assert!(
            equivalent(&Node::Block(expected.root), &Node::Block(parsed.document.root)),
            "round trip changed document:\n{}", text
        );
    }

    #[test]
    fn prop_canonicalization_idempotent(doc in document()) {
        let first = canonicalize(&doc).unwrap();
        let reparsed = parse(first.as_bytes()).unwrap().document;
        let second = canonicalize(&reparsed).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_always_quoting_roundtrips(doc in document()) {
        let config = CanonicalConfig::new().with_quoting(QuotingStrategy::Always).with_indent(4);
        let text = canonicalize_with_config(&doc, &config).unwrap();
        let parsed = parse(text.as_bytes()).unwrap();
        prop_assert!(parsed.diagnostics.is_empty());
        prop_assert!(equivalent(
            &Node::Block(normalize(&doc).root),
            &Node::Block(parsed.document.root)
        ));
    }
}
