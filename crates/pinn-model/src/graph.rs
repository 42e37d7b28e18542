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

//! The entity graph and structural operations over it.

use std::collections::HashSet;

use tracing::debug;

use crate::entities::{Beam, Institution, Patient, Plan, Trial};
use crate::mapper::Entity;
use crate::meta::EntityId;
use crate::reference::NamedRef;
use crate::resolver::resolve;

/// Object-safe view of an entity for walks over the ownership tree.
pub trait EntityNode {
    fn type_name(&self) -> &'static str;

    fn id(&self) -> EntityId;

    fn parent(&self) -> Option<EntityId>;

    /// Name an entity is looked up by, if it has one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Directly owned children.
    fn children(&self) -> Vec<&dyn EntityNode> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        Vec::new()
    }

    /// Detaches the direct child `id`. Returns false when it is not a
    /// direct child.
    fn remove_child(&mut self, _id: EntityId) -> bool {
        false
    }

    /// Named references held by this entity.
    fn refs_mut(&mut self) -> Vec<&mut NamedRef> {
        Vec::new()
    }
}

/// Calls `f` on `node` and every entity it owns, parents first.
pub fn walk<'a>(node: &'a dyn EntityNode, f: &mut dyn FnMut(&'a dyn EntityNode)) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        f(current);
        let mut children = current.children();
        children.reverse();
        stack.extend(children);
    }
}

fn walk_mut(node: &mut dyn EntityNode, f: &mut dyn FnMut(&mut dyn EntityNode)) {
    f(&mut *node);
    for child in node.children_mut() {
        walk_mut(child, f);
    }
}

fn remove_below(node: &mut dyn EntityNode, id: EntityId) -> bool {
    if node.remove_child(id) {
        return true;
    }
    node.children_mut()
        .into_iter()
        .any(|child| remove_below(child, id))
}

/// All patients of a load, each owning its subtree, and the institution
/// index when the load covered an institution directory.
///
/// A clone holds copies of every entity under fresh ids, with its named
/// references linked to its own entities.
#[derive(Debug, Default, PartialEq)]
pub struct EntityGraph {
    pub institution: Option<Institution>,
    pub patients: Vec<Patient>,
}

impl Clone for EntityGraph {
    fn clone(&self) -> Self {
        let mut copy = Self {
            institution: self.institution.clone(),
            patients: self.patients.clone(),
        };
        // Links in the copy still hold the original's ids until relinked.
        if self.beams().any(has_links) {
            let _ = resolve(&mut copy);
        }
        copy
    }
}

fn has_links(beam: &Beam) -> bool {
    [&beam.isocenter, &beam.prescription, &beam.machine]
        .into_iter()
        .any(|r| r.as_ref().is_some_and(NamedRef::is_resolved))
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patient_by_id(&self, patient_id: i64) -> Option<&Patient> {
        self.patients.iter().find(|p| p.patient_id == patient_id)
    }

    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.patients.iter().flat_map(|p| p.plans().iter())
    }

    pub fn trials(&self) -> impl Iterator<Item = &Trial> {
        self.plans().flat_map(|p| p.trials().iter())
    }

    pub fn beams(&self) -> impl Iterator<Item = &Beam> {
        self.trials().flat_map(|t| t.beams().iter())
    }

    fn roots(&self) -> impl Iterator<Item = &dyn EntityNode> {
        let institution = self.institution.iter().map(|i| i as &dyn EntityNode);
        institution.chain(self.patients.iter().map(|p| p as &dyn EntityNode))
    }

    /// Finds any entity by id.
    pub fn find(&self, id: EntityId) -> Option<&dyn EntityNode> {
        let mut found = None;
        for root in self.roots() {
            walk(root, &mut |node| {
                if found.is_none() && node.id() == id {
                    found = Some(node);
                }
            });
            if found.is_some() {
                break;
            }
        }
        found
    }

    /// Number of entities in the graph.
    pub fn entity_count(&self) -> usize {
        let mut count = 0;
        for root in self.roots() {
            walk(root, &mut |_| count += 1);
        }
        count
    }

    /// Removes `id` and everything it owns.
    ///
    /// Named references elsewhere in the graph that pointed into the removed
    /// subtree are unlinked; the entities they named through other owners
    /// are left alone. Returns the number of entities removed.
    pub fn destroy(&mut self, id: EntityId) -> usize {
        let Some(target) = self.find(id) else {
            return 0;
        };
        let mut doomed = HashSet::new();
        walk(target, &mut |node| {
            doomed.insert(node.id());
        });

        let removed = if self.institution.as_ref().is_some_and(|i| i.meta().id() == id) {
            self.institution = None;
            true
        } else if let Some(index) = self.patients.iter().position(|p| p.meta().id() == id) {
            self.patients.remove(index);
            true
        } else {
            self.institution
                .as_mut()
                .is_some_and(|i| remove_below(i, id))
                || self.patients.iter_mut().any(|p| remove_below(p, id))
        };
        if !removed {
            return 0;
        }

        let mut unlinked = 0;
        for patient in &mut self.patients {
            walk_mut(patient, &mut |node| {
                for r in node.refs_mut() {
                    if r.target().is_some_and(|t| doomed.contains(&t)) {
                        r.unlink();
                        unlinked += 1;
                    }
                }
            });
        }
        debug!(entity = %id, removed = doomed.len(), unlinked, "destroyed subtree");
        doomed.len()
    }
}
