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

//! Reference resolution.
//!
//! Runs once per load, after every document of the batch has been mapped.
//! Beams name their isocenter point and machine (owned by the plan) and
//! their prescription (owned by the trial). Machines are looked up in the
//! beam's own plan first, then across every plan of the batch.

use std::collections::HashMap;

use pinn_core::{Diagnostic, DiagnosticKind, Diagnostics};
use tracing::{debug, info};

use crate::graph::EntityGraph;
use crate::mapper::Entity;
use crate::meta::EntityId;
use crate::reference::NamedRef;

/// Name to id lookup for one kind of addressable entity.
#[derive(Debug, Default)]
pub struct NameIndex {
    by_name: HashMap<String, EntityId>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`. The first registration of a name wins; returns
    /// false for a duplicate.
    pub fn register(&mut self, name: &str, id: EntityId) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_owned(), id);
        true
    }

    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, EntityId)> for NameIndex {
    fn from_iter<I: IntoIterator<Item = (&'a str, EntityId)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (name, id) in iter {
            if !index.register(name, id) {
                debug!(name, "duplicate name, keeping the first");
            }
        }
        index
    }
}

struct Site<'a> {
    beam: &'a str,
    path: &'a str,
}

#[derive(Default)]
struct Tally {
    resolved: usize,
    dangling: usize,
}

fn link(
    field: &'static str,
    target: &'static str,
    reference: Option<&mut NamedRef>,
    indices: &[&NameIndex],
    site: &Site<'_>,
    tally: &mut Tally,
    diagnostics: &mut Diagnostics,
) {
    let Some(reference) = reference else {
        return;
    };
    let key = reference.key();
    if key.is_empty() {
        reference.unlink();
        return;
    }
    match indices.iter().find_map(|index| index.get(key)) {
        Some(id) => {
            reference.resolve(id);
            tally.resolved += 1;
        }
        None => {
            let message = format!(
                "Beam '{}' field {}: no {} named '{}'",
                site.beam, field, target, key
            );
            diagnostics.push(Diagnostic::new(DiagnosticKind::Reference, message).with_path(site.path));
            reference.unlink();
            tally.dangling += 1;
        }
    }
}

/// Links every named reference in `graph`. Dangling references are left
/// unresolved and reported; nothing else in the graph changes.
pub fn resolve(graph: &mut EntityGraph) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let mut tally = Tally::default();

    let all_machines: NameIndex = graph
        .plans()
        .flat_map(|p| p.machines().iter())
        .map(|m| (m.name.as_str(), m.meta().id()))
        .collect();

    for patient in &mut graph.patients {
        let patient_id = patient.patient_id;
        for mut plan in patient.plans_mut().iter_mut() {
            let machines: NameIndex = plan
                .machines()
                .iter()
                .map(|m| (m.name.as_str(), m.meta().id()))
                .collect();
            let points: NameIndex = plan
                .points()
                .iter()
                .map(|p| (p.name.as_str(), p.meta().id()))
                .collect();
            let folder = plan.folder_name();

            for (ti, mut trial) in plan.trials_mut().iter_mut().enumerate() {
                let prescriptions: NameIndex = trial
                    .prescriptions()
                    .iter()
                    .map(|p| (p.name.as_str(), p.meta().id()))
                    .collect();

                for (bi, mut beam) in trial.beams_mut().iter_mut().enumerate() {
                    let path = format!(
                        "Patient[{}].{}.Trial[{}].BeamList.Beam[{}]",
                        patient_id, folder, ti, bi
                    );
                    let name = beam.name.clone();
                    let site = Site {
                        beam: &name,
                        path: &path,
                    };
                    link(
                        "IsocenterName",
                        "Poi",
                        beam.isocenter.as_mut(),
                        &[&points],
                        &site,
                        &mut tally,
                        &mut diagnostics,
                    );
                    link(
                        "PrescriptionName",
                        "Prescription",
                        beam.prescription.as_mut(),
                        &[&prescriptions],
                        &site,
                        &mut tally,
                        &mut diagnostics,
                    );
                    link(
                        "MachineNameAndVersion",
                        "Machine",
                        beam.machine.as_mut(),
                        &[&machines, &all_machines],
                        &site,
                        &mut tally,
                        &mut diagnostics,
                    );
                }
            }
        }
    }

    info!(
        resolved = tally.resolved,
        dangling = tally.dangling,
        "resolved references"
    );
    diagnostics
}
