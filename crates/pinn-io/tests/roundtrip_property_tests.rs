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

//! Property tests: whole patient graphs survive save and load.

use std::collections::BTreeMap;

use pinn_core::{Node, Scalar};
use pinn_io::{load, save, LoadConfig, SaveConfig};
use pinn_model::{
    resolve, Beam, ControlPoint, CpManager, Entity, EntityGraph, Extras, Machine, NamedRef,
    Patient, Plan, Point, Prescription, Trial,
};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,11}"
}

/// Unknown keys with int or word values. The `Custom` prefix keeps them
/// clear of every schema key.
fn extras() -> impl Strategy<Value = BTreeMap<String, Node>> {
    let value = prop_oneof![
        any::<i32>().prop_map(|n| Node::Scalar(Scalar::new(i64::from(n)))),
        "w[a-z0-9_]{0,7}".prop_map(|w| Node::Scalar(Scalar::word(w))),
    ];
    prop::collection::btree_map("Custom[A-Z][a-z]{0,5}", value, 0..3)
}

fn attach(extras: &mut Extras, entries: BTreeMap<String, Node>) {
    for (key, node) in entries {
        extras.push(key, node, None);
    }
}

fn control_point() -> impl Strategy<Value = ControlPoint> {
    (
        0.0f64..360.0,
        prop::option::of(0.0f64..1.0),
        prop::collection::vec(-200.0f64..200.0, 0..8),
    )
        .prop_map(|(gantry, weight, leaves)| {
            let mut cp = ControlPoint::new(gantry, 0.0, 0.0);
            cp.weight = weight;
            if !leaves.is_empty() {
                cp.set_leaf_positions(leaves);
            }
            cp
        })
}

#[derive(Debug, Clone)]
struct BeamCase {
    name: String,
    weight: Option<f64>,
    isocenter: Option<usize>,
    machine: Option<usize>,
    prescription: bool,
    control_points: Vec<ControlPoint>,
    extras: BTreeMap<String, Node>,
}

fn beam_case() -> impl Strategy<Value = BeamCase> {
    (
        name(),
        prop::option::of(0.0f64..100.0),
        prop::option::of(0usize..4),
        prop::option::of(0usize..4),
        any::<bool>(),
        prop::collection::vec(control_point(), 0..4),
        extras(),
    )
        .prop_map(
            |(name, weight, isocenter, machine, prescription, control_points, extras)| BeamCase {
                name,
                weight,
                isocenter,
                machine,
                prescription,
                control_points,
                extras,
            },
        )
}

#[derive(Debug, Clone)]
struct PlanCase {
    points: Vec<String>,
    machines: Vec<(String, String)>,
    trials: Vec<(String, Vec<BeamCase>, BTreeMap<String, Node>)>,
}

fn plan_case() -> impl Strategy<Value = PlanCase> {
    let stamp = "20[0-9]{2}-[0-9]{2}-[0-9]{2}";
    let trial = (name(), prop::collection::vec(beam_case(), 0..4), extras());
    (
        prop::collection::vec(name(), 1..4),
        prop::collection::vec((name(), stamp), 1..3),
        prop::collection::vec(trial, 1..3),
    )
        .prop_map(|(points, machines, trials)| PlanCase {
            points,
            machines,
            trials,
        })
}

fn build(case: &PlanCase) -> EntityGraph {
    let mut plan = Plan::new(0);
    for name in &case.points {
        plan.points_mut().push(Point::new(name.clone()));
    }
    for (name, _) in &case.machines {
        plan.machines_mut().push(Machine::new(name.clone()));
    }
    for (trial_name, beams, trial_extras) in &case.trials {
        let mut trial = Trial::new(trial_name.clone());
        trial.prescriptions_mut().push(Prescription::new("Rx"));
        attach(&mut trial.meta_mut().extras, trial_extras.clone());
        for case_beam in beams {
            let mut beam = Beam::new(case_beam.name.clone());
            beam.weight = case_beam.weight;
            beam.isocenter = case_beam
                .isocenter
                .map(|i| NamedRef::new(case.points[i % case.points.len()].clone()));
            beam.machine = case_beam.machine.map(|i| {
                let (name, stamp) = &case.machines[i % case.machines.len()];
                NamedRef::versioned(format!("{}: {}", name, stamp))
            });
            beam.prescription = case_beam.prescription.then(|| NamedRef::new("Rx"));
            if !case_beam.control_points.is_empty() {
                let mut manager = CpManager::new();
                for cp in &case_beam.control_points {
                    manager.control_points_mut().push(cp.clone());
                }
                beam.cp_manager_slot().set(manager);
            }
            attach(&mut beam.meta_mut().extras, case_beam.extras.clone());
            trial.beams_mut().push(beam);
        }
        plan.trials_mut().push(trial);
    }

    let mut patient = Patient::new(1001);
    patient.plans_mut().push(plan);
    let mut graph = EntityGraph::new();
    graph.patients.push(patient);
    resolve(&mut graph);
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_graph_survives_save_and_load(case in plan_case()) {
        let graph = build(&case);
        let dir = tempfile::tempdir().unwrap();
        let diags = save(&graph, dir.path(), &SaveConfig::default()).unwrap();
        prop_assert!(diags.is_empty(), "{:?}", diags);

        let (again, diags) = load(dir.path(), &LoadConfig::default()).unwrap();
        prop_assert!(diags.is_empty(), "{:?}", diags);
        prop_assert_eq!(&again.patients, &graph.patients);
        prop_assert_eq!(again.entity_count(), graph.entity_count());

        // Every reference that linked before the save links again, and to
        // an entity of the reloaded graph.
        for (before, after) in graph.beams().zip(again.beams()) {
            let pairs = [
                (&before.isocenter, &after.isocenter),
                (&before.machine, &after.machine),
                (&before.prescription, &after.prescription),
            ];
            for (b, a) in pairs {
                let (Some(b), Some(a)) = (b, a) else {
                    prop_assert!(b.is_none() && a.is_none());
                    continue;
                };
                prop_assert_eq!(a.is_resolved(), b.is_resolved());
                if let Some(target) = a.target() {
                    prop_assert!(again.find(target).is_some());
                }
            }
        }
    }
}
