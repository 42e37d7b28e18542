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

use pinn_grid::Volume;

use super::ControlPoint;
use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::{OwnedList, OwnedSlot};
use crate::reference::NamedRef;
use crate::schema::{EntitySchema, FieldKind, FieldSpec, ItemKey};

static BEAM_SCHEMA: EntitySchema = EntitySchema {
    name: "Beam",
    fields: &[
        FieldSpec::required("Name", FieldKind::Text),
        FieldSpec::optional("BeamNumber", FieldKind::Int),
        FieldSpec::optional("IsocenterName", FieldKind::Reference("Poi")),
        FieldSpec::optional("PrescriptionName", FieldKind::Reference("Prescription")),
        FieldSpec::optional("MachineNameAndVersion", FieldKind::VersionedReference("Machine")),
        FieldSpec::optional("Modality", FieldKind::Text),
        FieldSpec::optional("MachineEnergyName", FieldKind::Text),
        FieldSpec::optional("SetBeamType", FieldKind::Text),
        FieldSpec::optional("DoseVolume", FieldKind::Word),
        FieldSpec::optional("Weight", FieldKind::Float),
        FieldSpec::optional("MonitorUnitInfo", FieldKind::Child("MonitorUnitInfo")),
        FieldSpec::optional("CPManager", FieldKind::Child("CPManager")),
    ],
};

static MONITOR_UNIT_SCHEMA: EntitySchema = EntitySchema {
    name: "MonitorUnitInfo",
    fields: &[
        FieldSpec::optional("PrescriptionDose", FieldKind::Float),
        FieldSpec::optional("NormalizedDose", FieldKind::Float),
        FieldSpec::optional("CollimatorOutputFactor", FieldKind::Float),
        FieldSpec::optional("TotalTransmissionFraction", FieldKind::Float),
    ],
};

const CONTROL_POINT_ITEM: ItemKey = ItemKey::Indexed;

static CP_MANAGER_SCHEMA: EntitySchema = EntitySchema {
    name: "CPManager",
    fields: &[
        FieldSpec::optional("IsGantryStartStopSet", FieldKind::Flag),
        FieldSpec::optional("NumberOfControlPoints", FieldKind::Int),
        FieldSpec::optional(
            "ControlPointList",
            FieldKind::ChildList {
                item: CONTROL_POINT_ITEM,
                entity: "ControlPoint",
            },
        ),
    ],
};

/// A treatment beam.
///
/// The isocenter, prescription and machine are named references; the
/// resolver links them after a load. `dose` holds the decoded binary grid
/// named by `DoseVolume` when dose loading is enabled.
#[derive(Debug, PartialEq)]
pub struct Beam {
    pub name: String,
    pub beam_number: Option<i64>,
    pub isocenter: Option<NamedRef>,
    pub prescription: Option<NamedRef>,
    pub machine: Option<NamedRef>,
    pub modality: Option<String>,
    pub energy_name: Option<String>,
    pub set_beam_type: Option<String>,
    pub dose_volume: Option<String>,
    pub weight: Option<f64>,
    pub dose: Option<Volume>,
    monitor_units: OwnedSlot<MonitorUnitInfo>,
    cp_manager: OwnedSlot<CpManager>,
    meta: EntityMeta,
}

owning_clone!(Beam {
    name,
    beam_number,
    isocenter,
    prescription,
    machine,
    modality,
    energy_name,
    set_beam_type,
    dose_volume,
    weight,
    dose,
} owns { monitor_units, cp_manager });

impl Beam {
    pub fn new(name: impl Into<String>) -> Self {
        let meta = EntityMeta::new();
        let id = meta.id();
        Self {
            name: name.into(),
            beam_number: None,
            isocenter: None,
            prescription: None,
            machine: None,
            modality: None,
            energy_name: None,
            set_beam_type: None,
            dose_volume: None,
            weight: None,
            dose: None,
            monitor_units: OwnedSlot::new(id),
            cp_manager: OwnedSlot::new(id),
            meta,
        }
    }

    pub fn monitor_units(&self) -> Option<&MonitorUnitInfo> {
        self.monitor_units.get()
    }

    pub fn monitor_units_slot(&mut self) -> &mut OwnedSlot<MonitorUnitInfo> {
        &mut self.monitor_units
    }

    pub fn cp_manager(&self) -> Option<&CpManager> {
        self.cp_manager.get()
    }

    pub fn cp_manager_slot(&mut self) -> &mut OwnedSlot<CpManager> {
        &mut self.cp_manager
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        self.cp_manager
            .get()
            .map(|m| &m.control_points[..])
            .unwrap_or_default()
    }

    /// Number of the companion binary file, from `DoseVolume = \XDR:<n>\;`.
    pub fn dose_file_number(&self) -> Option<u32> {
        let raw = self.dose_volume.as_deref()?.trim().trim_matches('\\');
        raw.strip_prefix("XDR:")?.trim().parse().ok()
    }

    /// File name of the companion binary, `plan.Trial.binary.<nnn>`.
    pub fn dose_file_name(&self) -> Option<String> {
        self.dose_file_number()
            .map(|n| format!("plan.Trial.binary.{:03}", n))
    }

    pub fn set_dose_file_number(&mut self, n: u32) {
        self.dose_volume = Some(format!("\\XDR:{}\\", n));
    }
}

impl Entity for Beam {
    const TYPE_NAME: &'static str = "Beam";

    fn schema() -> &'static EntitySchema {
        &BEAM_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            name: r.req_text("Name")?,
            beam_number: r.opt_int("BeamNumber")?,
            isocenter: r.opt_ref("IsocenterName")?,
            prescription: r.opt_ref("PrescriptionName")?,
            machine: r.opt_ref("MachineNameAndVersion")?,
            modality: r.opt_text("Modality")?,
            energy_name: r.opt_text("MachineEnergyName")?,
            set_beam_type: r.opt_text("SetBeamType")?,
            dose_volume: r.opt_text("DoseVolume")?,
            weight: r.opt_float("Weight")?,
            dose: None,
            monitor_units: r.child("MonitorUnitInfo", id),
            cp_manager: r.child("CPManager", id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Name", Some(&self.name));
        w.int("BeamNumber", self.beam_number);
        w.reference("IsocenterName", self.isocenter.as_ref());
        w.reference("PrescriptionName", self.prescription.as_ref());
        w.reference("MachineNameAndVersion", self.machine.as_ref());
        w.text("Modality", self.modality.as_ref());
        w.text("MachineEnergyName", self.energy_name.as_ref());
        w.text("SetBeamType", self.set_beam_type.as_ref());
        w.text("DoseVolume", self.dose_volume.as_ref());
        w.float("Weight", self.weight);
        w.child("MonitorUnitInfo", &self.monitor_units);
        w.child("CPManager", &self.cp_manager);
    }
}

impl EntityNode for Beam {
    node_meta!("Beam");

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn children(&self) -> Vec<&dyn EntityNode> {
        let mut out: Vec<&dyn EntityNode> = Vec::new();
        if let Some(mu) = self.monitor_units.get() {
            out.push(mu);
        }
        if let Some(cp) = self.cp_manager.get() {
            out.push(cp);
        }
        out
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        let mut out: Vec<&mut dyn EntityNode> = Vec::new();
        if let Some(mu) = self.monitor_units.item_mut() {
            out.push(mu);
        }
        if let Some(cp) = self.cp_manager.item_mut() {
            out.push(cp);
        }
        out
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        if self.monitor_units.get().is_some_and(|m| m.meta().id() == id) {
            self.monitor_units.take();
            return true;
        }
        if self.cp_manager.get().is_some_and(|m| m.meta().id() == id) {
            self.cp_manager.take();
            return true;
        }
        false
    }

    fn refs_mut(&mut self) -> Vec<&mut NamedRef> {
        [&mut self.isocenter, &mut self.prescription, &mut self.machine]
            .into_iter()
            .filter_map(Option::as_mut)
            .collect()
    }
}

/// Monitor unit calculation inputs of a beam.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorUnitInfo {
    pub prescription_dose: Option<f64>,
    pub normalized_dose: Option<f64>,
    pub collimator_output_factor: Option<f64>,
    pub total_transmission_fraction: Option<f64>,
    meta: EntityMeta,
}

impl MonitorUnitInfo {
    pub fn new() -> Self {
        Self {
            prescription_dose: None,
            normalized_dose: None,
            collimator_output_factor: None,
            total_transmission_fraction: None,
            meta: EntityMeta::new(),
        }
    }
}

impl Default for MonitorUnitInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for MonitorUnitInfo {
    const TYPE_NAME: &'static str = "MonitorUnitInfo";

    fn schema() -> &'static EntitySchema {
        &MONITOR_UNIT_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            prescription_dose: r.opt_float("PrescriptionDose")?,
            normalized_dose: r.opt_float("NormalizedDose")?,
            collimator_output_factor: r.opt_float("CollimatorOutputFactor")?,
            total_transmission_fraction: r.opt_float("TotalTransmissionFraction")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.float("PrescriptionDose", self.prescription_dose);
        w.float("NormalizedDose", self.normalized_dose);
        w.float("CollimatorOutputFactor", self.collimator_output_factor);
        w.float("TotalTransmissionFraction", self.total_transmission_fraction);
    }
}

impl EntityNode for MonitorUnitInfo {
    node_meta!("MonitorUnitInfo");
}

/// Owner of a beam's control points, keyed `#0`, `#1`, ... in the file.
#[derive(Debug, PartialEq)]
pub struct CpManager {
    pub gantry_start_stop_set: Option<bool>,
    pub number_of_control_points: Option<i64>,
    control_points: OwnedList<ControlPoint>,
    meta: EntityMeta,
}

owning_clone!(CpManager {
    gantry_start_stop_set,
    number_of_control_points,
} owns { control_points });

impl CpManager {
    pub fn new() -> Self {
        let meta = EntityMeta::new();
        Self {
            gantry_start_stop_set: None,
            number_of_control_points: None,
            control_points: OwnedList::new(meta.id()),
            meta,
        }
    }

    pub fn control_points(&self) -> &OwnedList<ControlPoint> {
        &self.control_points
    }

    pub fn control_points_mut(&mut self) -> &mut OwnedList<ControlPoint> {
        &mut self.control_points
    }
}

impl Default for CpManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for CpManager {
    const TYPE_NAME: &'static str = "CPManager";

    fn schema() -> &'static EntitySchema {
        &CP_MANAGER_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            gantry_start_stop_set: r.opt_flag("IsGantryStartStopSet")?,
            number_of_control_points: r.opt_int("NumberOfControlPoints")?,
            control_points: r.children("ControlPointList", id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.flag("IsGantryStartStopSet", self.gantry_start_stop_set);
        w.int("NumberOfControlPoints", self.number_of_control_points);
        w.children("ControlPointList", &self.control_points);
    }
}

impl EntityNode for CpManager {
    node_meta!("CPManager");

    fn children(&self) -> Vec<&dyn EntityNode> {
        self.control_points.iter().map(|c| c as &dyn EntityNode).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        self.control_points
            .items_mut()
            .iter_mut()
            .map(|c| c as &mut dyn EntityNode)
            .collect()
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        self.control_points.remove_by_id(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dose_file_name() {
        let mut beam = Beam::new("B1");
        assert_eq!(beam.dose_file_name(), None);
        beam.dose_volume = Some("\\XDR:8\\".to_owned());
        assert_eq!(beam.dose_file_number(), Some(8));
        assert_eq!(beam.dose_file_name().as_deref(), Some("plan.Trial.binary.008"));
        beam.set_dose_file_number(112);
        assert_eq!(beam.dose_file_name().as_deref(), Some("plan.Trial.binary.112"));
    }

    #[test]
    fn test_malformed_dose_volume() {
        let mut beam = Beam::new("B1");
        beam.dose_volume = Some("XDR".to_owned());
        assert_eq!(beam.dose_file_number(), None);
    }

    #[test]
    fn test_control_points_default_empty() {
        let beam = Beam::new("B1");
        assert!(beam.control_points().is_empty());
        assert!(beam.monitor_units().is_none());
    }
}
