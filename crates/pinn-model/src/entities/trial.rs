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

use pinn_grid::GridDims;

use super::Beam;
use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter, Vec3};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::{OwnedList, OwnedSlot};
use crate::schema::{DefaultValue, EntitySchema, FieldKind, FieldSpec, ItemKey};

const PRESCRIPTION_ITEM: ItemKey = ItemKey::Named("Prescription");
const BEAM_ITEM: ItemKey = ItemKey::Named("Beam");

static TRIAL_SCHEMA: EntitySchema = EntitySchema {
    name: "Trial",
    fields: &[
        FieldSpec::required("Name", FieldKind::Text),
        FieldSpec::optional("DoseGrid", FieldKind::Child("DoseGrid")),
        FieldSpec::optional(
            "PrescriptionList",
            FieldKind::ChildList {
                item: PRESCRIPTION_ITEM,
                entity: "Prescription",
            },
        ),
        FieldSpec::optional(
            "BeamList",
            FieldKind::ChildList {
                item: BEAM_ITEM,
                entity: "Beam",
            },
        ),
    ],
};

static DOSE_GRID_SCHEMA: EntitySchema = EntitySchema {
    name: "DoseGrid",
    fields: &[
        FieldSpec::required("VoxelSize", FieldKind::Vec3),
        FieldSpec::required("Dimension", FieldKind::Dims),
        FieldSpec::defaulted("Origin", FieldKind::Vec3, DefaultValue::Vec3(0.0, 0.0, 0.0)),
        FieldSpec::optional("VolRotDelta", FieldKind::Vec3),
        FieldSpec::optional("Display2d", FieldKind::Flag),
        FieldSpec::optional("DoseSummationType", FieldKind::Int),
    ],
};

static PRESCRIPTION_SCHEMA: EntitySchema = EntitySchema {
    name: "Prescription",
    fields: &[
        FieldSpec::required("Name", FieldKind::Text),
        FieldSpec::optional("RequestedMonitorUnitsPerFraction", FieldKind::Float),
        FieldSpec::optional("PrescriptionDose", FieldKind::Float),
        FieldSpec::optional("PrescriptionPercent", FieldKind::Float),
        FieldSpec::optional("NumberOfFractions", FieldKind::Int),
        FieldSpec::optional("PrescriptionPoint", FieldKind::Text),
        FieldSpec::optional("Method", FieldKind::Text),
        FieldSpec::optional("NormalizationMethod", FieldKind::Text),
        FieldSpec::optional("WeightsProportionalTo", FieldKind::Text),
    ],
};

/// A treatment trial: its dose grid, prescriptions and beams.
#[derive(Debug, PartialEq)]
pub struct Trial {
    pub name: String,
    dose_grid: OwnedSlot<DoseGrid>,
    prescriptions: OwnedList<Prescription>,
    beams: OwnedList<Beam>,
    meta: EntityMeta,
}

owning_clone!(Trial {
    name,
} owns { dose_grid, prescriptions, beams });

impl Trial {
    pub fn new(name: impl Into<String>) -> Self {
        let meta = EntityMeta::new();
        let id = meta.id();
        Self {
            name: name.into(),
            dose_grid: OwnedSlot::new(id),
            prescriptions: OwnedList::new(id),
            beams: OwnedList::new(id),
            meta,
        }
    }

    pub fn dose_grid(&self) -> Option<&DoseGrid> {
        self.dose_grid.get()
    }

    pub fn dose_grid_slot(&mut self) -> &mut OwnedSlot<DoseGrid> {
        &mut self.dose_grid
    }

    pub fn prescriptions(&self) -> &OwnedList<Prescription> {
        &self.prescriptions
    }

    pub fn prescriptions_mut(&mut self) -> &mut OwnedList<Prescription> {
        &mut self.prescriptions
    }

    pub fn beams(&self) -> &OwnedList<Beam> {
        &self.beams
    }

    pub fn beams_mut(&mut self) -> &mut OwnedList<Beam> {
        &mut self.beams
    }

    pub fn beam_by_name(&self, name: &str) -> Option<&Beam> {
        self.beams.iter().find(|b| b.name == name)
    }

    pub fn prescription_by_name(&self, name: &str) -> Option<&Prescription> {
        self.prescriptions.iter().find(|p| p.name == name)
    }
}

impl Entity for Trial {
    const TYPE_NAME: &'static str = "Trial";

    fn schema() -> &'static EntitySchema {
        &TRIAL_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            name: r.req_text("Name")?,
            dose_grid: r.child("DoseGrid", id),
            prescriptions: r.children("PrescriptionList", id),
            beams: r.children("BeamList", id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Name", Some(&self.name));
        w.child("DoseGrid", &self.dose_grid);
        w.children("PrescriptionList", &self.prescriptions);
        w.children("BeamList", &self.beams);
    }
}

impl EntityNode for Trial {
    node_meta!("Trial");

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn children(&self) -> Vec<&dyn EntityNode> {
        let mut out: Vec<&dyn EntityNode> = Vec::new();
        if let Some(grid) = self.dose_grid.get() {
            out.push(grid);
        }
        out.extend(self.prescriptions.iter().map(|p| p as &dyn EntityNode));
        out.extend(self.beams.iter().map(|b| b as &dyn EntityNode));
        out
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        let mut out: Vec<&mut dyn EntityNode> = Vec::new();
        if let Some(grid) = self.dose_grid.item_mut() {
            out.push(grid);
        }
        out.extend(self.prescriptions.items_mut().iter_mut().map(|p| p as &mut dyn EntityNode));
        out.extend(self.beams.items_mut().iter_mut().map(|b| b as &mut dyn EntityNode));
        out
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        if self.dose_grid.get().is_some_and(|g| g.meta().id() == id) {
            self.dose_grid.take();
            return true;
        }
        self.prescriptions.remove_by_id(id).is_some() || self.beams.remove_by_id(id).is_some()
    }
}

/// Geometry of the trial's dose volume. Every beam's binary grid has
/// `Dimension` voxels.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseGrid {
    pub voxel_size: Vec3,
    pub dimension: GridDims,
    pub origin: Vec3,
    pub vol_rot_delta: Option<Vec3>,
    pub display_2d: Option<bool>,
    pub dose_summation_type: Option<i64>,
    meta: EntityMeta,
}

impl DoseGrid {
    pub fn new(voxel_size: Vec3, dimension: GridDims) -> Self {
        Self {
            voxel_size,
            dimension,
            origin: Vec3::default(),
            vol_rot_delta: None,
            display_2d: None,
            dose_summation_type: None,
            meta: EntityMeta::new(),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dimension
    }

    /// Physical size along each axis.
    pub fn extent(&self) -> Vec3 {
        Vec3::new(
            self.voxel_size.x * self.dimension.nx as f64,
            self.voxel_size.y * self.dimension.ny as f64,
            self.voxel_size.z * self.dimension.nz as f64,
        )
    }

    pub fn voxel_volume(&self) -> f64 {
        self.voxel_size.x * self.voxel_size.y * self.voxel_size.z
    }

    pub fn total_volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }
}

impl Entity for DoseGrid {
    const TYPE_NAME: &'static str = "DoseGrid";

    fn schema() -> &'static EntitySchema {
        &DOSE_GRID_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            voxel_size: r.req_vec3("VoxelSize")?,
            dimension: r.req_dims("Dimension")?,
            origin: r.req_vec3("Origin")?,
            vol_rot_delta: r.opt_vec3("VolRotDelta")?,
            display_2d: r.opt_flag("Display2d")?,
            dose_summation_type: r.opt_int("DoseSummationType")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.vec3("VoxelSize", Some(self.voxel_size));
        w.dims("Dimension", self.dimension);
        w.vec3("Origin", Some(self.origin));
        w.vec3("VolRotDelta", self.vol_rot_delta);
        w.flag("Display2d", self.display_2d);
        w.int("DoseSummationType", self.dose_summation_type);
    }
}

impl EntityNode for DoseGrid {
    node_meta!("DoseGrid");
}

/// Dose prescription. Beams name it through `PrescriptionName`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prescription {
    pub name: String,
    pub requested_mu_per_fraction: Option<f64>,
    pub prescription_dose: Option<f64>,
    pub prescription_percent: Option<f64>,
    pub number_of_fractions: Option<i64>,
    pub prescription_point: Option<String>,
    pub method: Option<String>,
    pub normalization_method: Option<String>,
    pub weights_proportional_to: Option<String>,
    meta: EntityMeta,
}

impl Prescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requested_mu_per_fraction: None,
            prescription_dose: None,
            prescription_percent: None,
            number_of_fractions: None,
            prescription_point: None,
            method: None,
            normalization_method: None,
            weights_proportional_to: None,
            meta: EntityMeta::new(),
        }
    }

    /// Dose per fraction, when both dose and fraction count are known.
    pub fn dose_per_fraction(&self) -> Option<f64> {
        match (self.prescription_dose, self.number_of_fractions) {
            (Some(dose), Some(n)) if n > 0 => Some(dose / n as f64),
            _ => None,
        }
    }
}

impl Entity for Prescription {
    const TYPE_NAME: &'static str = "Prescription";

    fn schema() -> &'static EntitySchema {
        &PRESCRIPTION_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            name: r.req_text("Name")?,
            requested_mu_per_fraction: r.opt_float("RequestedMonitorUnitsPerFraction")?,
            prescription_dose: r.opt_float("PrescriptionDose")?,
            prescription_percent: r.opt_float("PrescriptionPercent")?,
            number_of_fractions: r.opt_int("NumberOfFractions")?,
            prescription_point: r.opt_text("PrescriptionPoint")?,
            method: r.opt_text("Method")?,
            normalization_method: r.opt_text("NormalizationMethod")?,
            weights_proportional_to: r.opt_text("WeightsProportionalTo")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Name", Some(&self.name));
        w.float("RequestedMonitorUnitsPerFraction", self.requested_mu_per_fraction);
        w.float("PrescriptionDose", self.prescription_dose);
        w.float("PrescriptionPercent", self.prescription_percent);
        w.int("NumberOfFractions", self.number_of_fractions);
        w.text("PrescriptionPoint", self.prescription_point.as_ref());
        w.text("Method", self.method.as_ref());
        w.text("NormalizationMethod", self.normalization_method.as_ref());
        w.text("WeightsProportionalTo", self.weights_proportional_to.as_ref());
    }
}

impl EntityNode for Prescription {
    node_meta!("Prescription");

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
