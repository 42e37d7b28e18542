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

//! JSON summary of a loaded graph.

use pinn_model::{Beam, EntityGraph, ImageSet, Institution, Patient, Plan, Trial};
use serde_json::{json, Value as JsonValue};

use crate::error::Result;

/// Renders a summary of the institution index and of every patient, image
/// set, plan, trial and beam.
///
/// Reference fields show the raw key and whether it resolved. Dose volumes
/// are summarized by maximum and sum, never dumped.
pub fn to_json(graph: &EntityGraph) -> JsonValue {
    json!({
        "institution": graph.institution.as_ref().map(institution_json),
        "patients": graph.patients.iter().map(patient_json).collect::<Vec<_>>(),
    })
}

/// [`to_json`], pretty-printed.
pub fn to_json_string(graph: &EntityGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json(graph))?)
}

fn institution_json(institution: &Institution) -> JsonValue {
    let patients = institution.patients().iter().map(|lite| {
        let summary = lite.summary();
        json!({
            "patient_id": lite.patient_id,
            "path": lite.patient_path,
            "last_name": summary.last_name,
            "first_name": summary.first_name,
            "medical_record_number": summary.medical_record_number,
        })
    });
    json!({
        "name": institution.name,
        "patients": patients.collect::<Vec<_>>(),
    })
}

fn patient_json(patient: &Patient) -> JsonValue {
    json!({
        "patient_id": patient.patient_id,
        "name": patient.full_name(),
        "medical_record_number": patient.medical_record_number,
        "image_sets": patient.image_sets().iter().map(image_set_json).collect::<Vec<_>>(),
        "plans": patient.plans().iter().map(plan_json).collect::<Vec<_>>(),
    })
}

fn image_set_json(image_set: &ImageSet) -> JsonValue {
    json!({
        "image_set_id": image_set.image_set_id,
        "dims": image_set.dims().map(|(x, y, z)| [x, y, z]),
        "voxel_size": [image_set.x_pixdim, image_set.y_pixdim, image_set.z_pixdim],
        "patient_position": image_set.patient_position,
        "slices": image_set.image_info().len(),
    })
}

fn plan_json(plan: &Plan) -> JsonValue {
    json!({
        "plan_id": plan.plan_id,
        "name": plan.name,
        "setup": plan.setup().map(|s| s.setup_code().as_str()),
        "trials": plan.trials().iter().map(trial_json).collect::<Vec<_>>(),
        "points": plan
            .points()
            .iter()
            .map(|p| json!({ "name": p.name, "x": p.x_coord, "y": p.y_coord, "z": p.z_coord }))
            .collect::<Vec<_>>(),
        "machines": plan.machines().iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
    })
}

fn trial_json(trial: &Trial) -> JsonValue {
    let grid = trial.dose_grid().map(|g| {
        json!({
            "dimension": [g.dimension.nx, g.dimension.ny, g.dimension.nz],
            "voxel_size": [g.voxel_size.x, g.voxel_size.y, g.voxel_size.z],
            "origin": [g.origin.x, g.origin.y, g.origin.z],
        })
    });
    json!({
        "name": trial.name,
        "dose_grid": grid,
        "prescriptions": trial.prescriptions().iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "beams": trial.beams().iter().map(beam_json).collect::<Vec<_>>(),
    })
}

fn beam_json(beam: &Beam) -> JsonValue {
    let reference = |r: Option<&pinn_model::NamedRef>| {
        r.map(|r| json!({ "key": r.key(), "resolved": r.is_resolved() }))
    };
    json!({
        "name": beam.name,
        "number": beam.beam_number,
        "machine": reference(beam.machine.as_ref()),
        "isocenter": reference(beam.isocenter.as_ref()),
        "prescription": reference(beam.prescription.as_ref()),
        "control_points": beam.control_points().len(),
        "dose": beam.dose.as_ref().map(|v| json!({ "max": v.max(), "sum": v.sum() })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinn_model::Machine;

    #[test]
    fn test_summary_shape() {
        let mut plan = Plan::new(3);
        plan.machines_mut().push(Machine::new("Linac1"));
        let mut trial = Trial::new("T1");
        trial.beams_mut().push(Beam::new("AP"));
        plan.trials_mut().push(trial);
        let mut patient = Patient::new(42);
        patient.last_name = Some("DOE".into());
        patient.plans_mut().push(plan);
        let mut graph = EntityGraph::new();
        graph.patients.push(patient);

        let value = to_json(&graph);
        let plan = &value["patients"][0]["plans"][0];
        assert_eq!(value["patients"][0]["patient_id"], 42);
        assert_eq!(plan["plan_id"], 3);
        assert_eq!(plan["machines"][0], "Linac1");
        assert_eq!(plan["trials"][0]["beams"][0]["name"], "AP");
        assert!(plan["trials"][0]["beams"][0]["machine"].is_null());
        assert!(plan["setup"].is_null());
    }

    #[test]
    fn test_string_is_pretty() {
        let text = to_json_string(&EntityGraph::new()).unwrap();
        assert_eq!(text, "{\n  \"institution\": null,\n  \"patients\": []\n}");
    }
}
