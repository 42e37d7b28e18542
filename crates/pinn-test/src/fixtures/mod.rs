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

//! Record file fixtures.
//!
//! Each function returns the text of one file of patient 1001, plan 0,
//! its CT image set 0, or the institution index above it. The plan has one
//! trial with two beams on machine `Linac1`, an isocenter point and a
//! head-first supine setup. Several records carry keys the
//! model does not know, to exercise preservation.

mod documents;
pub mod errors;

pub use documents::*;

use crate::FixtureList;

/// Every well-formed fixture, by file name.
pub fn all() -> FixtureList {
    vec![
        ("Institution", institution),
        ("Patient", patient),
        ("ImageSet_0.header", image_set_header),
        ("ImageSet_0.ImageInfo", image_set_info),
        ("plan.Trial", plan_trial),
        ("plan.Points", plan_points),
        ("plan.PatientSetup", plan_setup),
        ("plan.Pinnacle.Machines", plan_machines),
    ]
}
