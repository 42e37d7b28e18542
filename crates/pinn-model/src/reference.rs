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

//! Named references: non-owning links resolved by key.

use crate::meta::EntityId;

/// A field that names an entity owned elsewhere.
///
/// The text read from the document is kept as `raw`; the resolver fills in
/// `target` once the named entity has been found. Equality compares `raw`.
#[derive(Debug, Clone, Default)]
pub struct NamedRef {
    raw: String,
    /// `raw` is `Name: Version` and only the name is looked up.
    versioned: bool,
    target: Option<EntityId>,
}

impl NamedRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            versioned: false,
            target: None,
        }
    }

    /// A reference written as `Name: Version`, as in
    /// `MachineNameAndVersion = "Linac1: 2020-01-01 10:00:00";`.
    pub fn versioned(raw: impl Into<String>) -> Self {
        Self {
            versioned: true,
            ..Self::new(raw)
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lookup key: the trimmed raw text, cut at the first `:` for a
    /// versioned reference.
    pub fn key(&self) -> &str {
        let name = if self.versioned {
            self.raw.split(':').next().unwrap_or_default()
        } else {
            &self.raw
        };
        name.trim()
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn resolve(&mut self, target: EntityId) {
        self.target = Some(target);
    }

    pub(crate) fn unlink(&mut self) {
        self.target = None;
    }
}

impl PartialEq for NamedRef {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl From<&str> for NamedRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strips_version() {
        assert_eq!(NamedRef::versioned("Linac2: 2019-03-04").key(), "Linac2");
        assert_eq!(NamedRef::versioned("Linac2").key(), "Linac2");
        assert_eq!(NamedRef::new(" iso ").key(), "iso");
        assert_eq!(NamedRef::new("").key(), "");
    }

    #[test]
    fn test_plain_key_keeps_colon() {
        assert_eq!(NamedRef::new("PTV: boost").key(), "PTV: boost");
    }

    #[test]
    fn test_equality_ignores_link() {
        let mut a = NamedRef::new("Linac1");
        let b = NamedRef::new("Linac1");
        a.resolve(EntityId::next());
        assert_eq!(a, b);
        assert!(a.is_resolved());
        a.unlink();
        assert!(!a.is_resolved());
    }
}
