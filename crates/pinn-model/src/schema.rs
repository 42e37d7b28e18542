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

//! Declarative per-entity schemas.
//!
//! A schema lists every key an entity understands, in the order the entity
//! is written back, together with the expected kind and whether the key is
//! required. Keys not listed are kept verbatim as extras.

/// Expected shape of a field's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    /// 0/1 integer decoded as a bool.
    Flag,
    Text,
    /// Text written bare when it is bareword-safe.
    Word,
    /// `{ X = ..; Y = ..; Z = ..; }` of floats.
    Vec3,
    /// `{ X = ..; Y = ..; Z = ..; }` of non-negative integers.
    Dims,
    /// A `{ 1.0, 2.0, ... }` numeric array.
    FloatArray,
    /// One owned child entity.
    Child(&'static str),
    /// Owned children gathered under a container block.
    ChildList { item: ItemKey, entity: &'static str },
    /// Text that names an entity owned elsewhere.
    Reference(&'static str),
    /// A reference whose text carries a `: version` suffix after the name.
    VersionedReference(&'static str),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Float => "number",
            Self::Flag => "flag",
            Self::Text => "text",
            Self::Word => "word",
            Self::Vec3 => "vector",
            Self::Dims => "dimensions",
            Self::FloatArray => "array",
            Self::Child(_) => "child",
            Self::ChildList { .. } => "child list",
            Self::Reference(_) | Self::VersionedReference(_) => "reference",
        }
    }
}

/// How the items of a child list are keyed inside their container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKey {
    /// Every item repeats the same key (`Beam ={..}; Beam ={..};`).
    Named(&'static str),
    /// Items are keyed `#0`, `#1`, ...
    Indexed,
}

impl ItemKey {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Named(name) => key == *name,
            Self::Indexed => key
                .strip_prefix('#')
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        }
    }

    /// Key of the item at `index` when writing.
    pub fn key_for(&self, index: usize) -> String {
        match self {
            Self::Named(name) => (*name).to_owned(),
            Self::Indexed => format!("#{}", index),
        }
    }
}

/// Default applied when a required field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Float(f64),
    Flag(bool),
    Text(&'static str),
    Vec3(f64, f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    pub const fn optional(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            required: false,
            default: None,
        }
    }

    pub const fn required(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            required: true,
            default: None,
        }
    }

    /// A required field that falls back to `default` when absent.
    pub const fn defaulted(key: &'static str, kind: FieldKind, default: DefaultValue) -> Self {
        Self {
            key,
            kind,
            required: true,
            default: Some(default),
        }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Index of `key` in write order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: EntitySchema = EntitySchema {
        name: "Sample",
        fields: &[
            FieldSpec::required("Name", FieldKind::Text),
            FieldSpec::optional("Weight", FieldKind::Float),
            FieldSpec::defaulted("Gantry", FieldKind::Float, DefaultValue::Float(0.0)),
        ],
    };

    #[test]
    fn test_lookup() {
        assert!(SAMPLE.is_known("Weight"));
        assert!(!SAMPLE.is_known("Color"));
        assert_eq!(SAMPLE.position("Gantry"), Some(2));
        assert_eq!(SAMPLE.field("Name").map(|f| f.kind), Some(FieldKind::Text));
        assert_eq!(SAMPLE.required_fields().count(), 2);
        assert_eq!(FieldKind::VersionedReference("Machine").name(), "reference");
    }

    #[test]
    fn test_item_keys() {
        assert!(ItemKey::Indexed.matches("#12"));
        assert!(!ItemKey::Indexed.matches("#"));
        assert!(!ItemKey::Indexed.matches("#a"));
        assert!(ItemKey::Named("Beam").matches("Beam"));
        assert_eq!(ItemKey::Indexed.key_for(3), "#3");
        assert_eq!(ItemKey::Named("Poi").key_for(3), "Poi");
    }
}
