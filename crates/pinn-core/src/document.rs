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

//! Generic, schema-agnostic document tree.

use std::collections::HashMap;

use crate::lex::SourcePos;
use crate::value::Scalar;

/// A parsed document: the statements at top level form its root block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub root: Block,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_block(root: Block) -> Self {
        Self { root }
    }

    /// Get a top-level node by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    /// Counts every statement in the tree, nested ones included.
    pub fn statement_count(&self) -> usize {
        self.root.statement_count()
    }
}

/// A node of the generic tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Block(Block),
    /// Two or more statements with the same key under one parent, in
    /// encounter order.
    List(Vec<Node>),
    /// A brace group of comma-separated numbers (`Points[] ={ 1,2, 3,4 };`).
    Array(Vec<Scalar>),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Views the node as a sequence: a List yields its items, anything else
    /// yields itself once.
    pub fn items(&self) -> std::slice::Iter<'_, Node> {
        match self {
            Self::List(items) => items.iter(),
            other => std::slice::from_ref(other).iter(),
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Block(_) => "block",
            Self::List(_) => "list",
            Self::Array(_) => "array",
        }
    }

    fn statement_count(&self) -> usize {
        match self {
            Self::Block(b) => b.statement_count(),
            Self::List(items) => items.iter().map(Node::statement_count).sum(),
            _ => 0,
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<Block> for Node {
    fn from(b: Block) -> Self {
        Self::Block(b)
    }
}

/// One keyed entry of a block. `pos` is where the key first appeared.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub node: Node,
    pub pos: SourcePos,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.node == other.node
    }
}

/// An ordered mapping from key to node.
///
/// Keys are unique within a block: pushing a key that already exists turns
/// its entry into a [`Node::List`] at the position of the first occurrence,
/// so entry order is the order in which each key was first read.
#[derive(Debug, Clone, Default)]
pub struct Block {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement, collapsing repeated keys into a list.
    ///
    /// A repeated key joins the list at the position of its first
    /// occurrence, so interleaved keys are regrouped: `A; B; A;` becomes
    /// `A` (two items) followed by `B`, and is written back as `A; A; B;`.
    /// Only the first occurrence's position is kept. Record files repeat
    /// a key only for sibling records, where the regrouping loses nothing.
    pub fn push(&mut self, key: impl Into<String>, node: Node, pos: SourcePos) {
        let key = key.into();
        match self.index.get(&key).copied() {
            Some(idx) => {
                let slot = &mut self.entries[idx].node;
                let existing = std::mem::replace(slot, Node::List(Vec::new()));
                let mut items = match existing {
                    Node::List(items) => items,
                    single => vec![single],
                };
                match node {
                    Node::List(more) => items.extend(more),
                    single => items.push(single),
                }
                *slot = Node::List(items);
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Entry { key, node, pos });
            }
        }
    }

    /// Convenience for builders that have no source position.
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<Node>) {
        self.push(key, node.into(), SourcePos::default());
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&idx| &self.entries[idx].node)
    }

    pub fn get_entry(&self, key: &str) -> Option<&Entry> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes an entry, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        let idx = self.index.remove(key)?;
        let entry = self.entries.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(entry)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn statement_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| {
                let own = match &e.node {
                    Node::List(items) => items.len(),
                    _ => 1,
                };
                own + e.node.statement_count()
            })
            .sum()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
