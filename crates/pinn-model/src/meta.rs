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

//! Identity, ownership back-reference and unknown-field side table shared by
//! every entity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use pinn_core::{Node, SourcePos};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unknown key kept verbatim, with the known key it followed.
#[derive(Debug, Clone, PartialEq)]
pub struct Extra {
    pub key: String,
    pub node: Node,
    /// Nearest preceding schema key in the source block; `None` when the
    /// entry came before every known key.
    pub anchor: Option<String>,
}

/// Keys the schema does not know, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extras {
    entries: Vec<Extra>,
}

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, node: Node, anchor: Option<&str>) {
        self.entries.push(Extra {
            key: key.into(),
            node,
            anchor: anchor.map(str::to_owned),
        });
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.node)
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(idx).node)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extra> {
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
}

/// Bookkeeping embedded in every entity.
///
/// Equality looks at `extras` only, so two entities compare by field value
/// regardless of identity or where they were read from.
///
/// A clone is a new entity: it gets a fresh id and has no owner until a
/// container adopts it.
#[derive(Debug)]
pub struct EntityMeta {
    id: EntityId,
    parent: Option<EntityId>,
    pub extras: Extras,
    pub pos: Option<SourcePos>,
}

impl EntityMeta {
    pub fn new() -> Self {
        Self {
            id: EntityId::next(),
            parent: None,
            extras: Extras::new(),
            pos: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Owner of this entity, if it is held by one.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Only owning containers stamp the back-reference.
    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }
}

impl Clone for EntityMeta {
    fn clone(&self) -> Self {
        Self {
            id: EntityId::next(),
            parent: None,
            extras: self.extras.clone(),
            pos: self.pos,
        }
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        self.extras == other.extras
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinn_core::Scalar;

    #[test]
    fn test_ids_are_unique() {
        let a = EntityMeta::new();
        let b = EntityMeta::new();
        assert_ne!(a.id(), b.id());
        assert!(a.parent().is_none());
    }

    #[test]
    fn test_clone_is_a_new_entity() {
        let owner = EntityMeta::new();
        let mut a = EntityMeta::new();
        a.set_parent(Some(owner.id()));
        a.extras.push("Color", Node::Scalar(Scalar::word("red")), None);
        a.pos = Some(SourcePos::new(4, 1));

        let b = a.clone();
        assert_ne!(b.id(), a.id());
        assert!(b.parent().is_none());
        assert_eq!(b.extras, a.extras);
        assert_eq!(b.pos, a.pos);
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_ignores_identity() {
        let mut a = EntityMeta::new();
        let mut b = EntityMeta::new();
        b.set_parent(Some(a.id()));
        assert_eq!(a, b);

        a.extras.push("Color", Node::Scalar(Scalar::word("red")), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_extras_order_and_remove() {
        let mut extras = Extras::new();
        extras.push("A", Node::Scalar(Scalar::new(1i64)), None);
        extras.push("B", Node::Scalar(Scalar::new(2i64)), Some("Name"));
        assert_eq!(extras.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(extras.remove("A").is_some());
        assert_eq!(extras.len(), 1);
        assert_eq!(extras.iter().next().and_then(|e| e.anchor.as_deref()), Some("Name"));
    }
}
