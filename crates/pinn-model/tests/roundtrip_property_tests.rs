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

//! Property tests: typed entities survive write, canonical text and re-read.

use pinn_c14n::canonicalize;
use pinn_core::{parse, Diagnostics};
use pinn_model::{map_root, root_document, ControlPoint, Entity, Machine, Point};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _.:-]{0,15}"
}

fn coord() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

fn round_trip<T: Entity>(entity: &T) -> T {
    let text = canonicalize(&root_document(entity)).unwrap();
    let parsed = parse(text.as_bytes()).unwrap();
    assert!(parsed.diagnostics.is_empty(), "{}: {:?}", text, parsed.diagnostics);
    let mut diags = Diagnostics::new();
    let out = map_root(&parsed.document, &mut diags).unwrap();
    assert!(diags.is_empty(), "{:?}", diags);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_point_round_trip(
        name in name(),
        x in coord(),
        y in coord(),
        z in prop::option::of(coord()),
        locked in prop::option::of(any::<bool>()),
    ) {
        let mut point = Point::new(name);
        point.x_coord = Some(x);
        point.y_coord = Some(y);
        point.z_coord = z;
        point.is_locked = locked;
        prop_assert_eq!(round_trip(&point), point);
    }

    #[test]
    fn prop_machine_round_trip(
        name in name(),
        stamp in prop::option::of("[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9:]{8}"),
        tolerate in prop::option::of(any::<bool>()),
    ) {
        let mut machine = Machine::new(name);
        machine.version_time_stamp = stamp;
        machine.tolerate_mus = tolerate;
        prop_assert_eq!(round_trip(&machine), machine);
    }

    #[test]
    fn prop_control_point_round_trip(
        gantry in 0.0f64..360.0,
        leaves in prop::collection::vec(coord(), 0..12),
        weight in prop::option::of(0.0f64..1.0),
    ) {
        let mut cp = ControlPoint::new(gantry, 0.0, 0.0);
        cp.weight = weight;
        if !leaves.is_empty() {
            cp.set_leaf_positions(leaves);
        }
        prop_assert_eq!(round_trip(&cp), cp);
    }
}
