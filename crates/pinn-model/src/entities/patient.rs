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

use super::{ImageSet, Plan};
use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::OwnedList;
use crate::schema::{EntitySchema, FieldKind, FieldSpec, ItemKey};

const PLAN_ITEM: ItemKey = ItemKey::Named("Plan");

static PATIENT_SCHEMA: EntitySchema = EntitySchema {
    name: "Patient",
    fields: &[
        FieldSpec::required("PatientID", FieldKind::Int),
        FieldSpec::optional("MedicalRecordNumber", FieldKind::Text),
        FieldSpec::optional("LastName", FieldKind::Text),
        FieldSpec::optional("FirstName", FieldKind::Text),
        FieldSpec::optional("MiddleName", FieldKind::Text),
        FieldSpec::optional("DateOfBirth", FieldKind::Text),
        FieldSpec::optional("Gender", FieldKind::Text),
        FieldSpec::optional("RadiationOncologist", FieldKind::Text),
        FieldSpec::optional("Comment", FieldKind::Text),
        FieldSpec::optional(
            "PlanList",
            FieldKind::ChildList {
                item: PLAN_ITEM,
                entity: "Plan",
            },
        ),
    ],
};

/// Root of one patient's records, read from the `Patient` file.
///
/// Image sets come from the `ImageSet_<id>` files next to it.
#[derive(Debug, PartialEq)]
pub struct Patient {
    pub patient_id: i64,
    pub medical_record_number: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub radiation_oncologist: Option<String>,
    pub comment: Option<String>,
    plans: OwnedList<Plan>,
    image_sets: OwnedList<ImageSet>,
    meta: EntityMeta,
}

owning_clone!(Patient {
    patient_id,
    medical_record_number,
    last_name,
    first_name,
    middle_name,
    date_of_birth,
    gender,
    radiation_oncologist,
    comment,
} owns { plans, image_sets });

impl Patient {
    pub fn new(patient_id: i64) -> Self {
        let meta = EntityMeta::new();
        Self {
            patient_id,
            medical_record_number: None,
            last_name: None,
            first_name: None,
            middle_name: None,
            date_of_birth: None,
            gender: None,
            radiation_oncologist: None,
            comment: None,
            plans: OwnedList::new(meta.id()),
            image_sets: OwnedList::new(meta.id()),
            meta,
        }
    }

    /// `LAST^FIRST^MIDDLE`, leaving out empty parts at the end.
    pub fn full_name(&self) -> String {
        let parts = [&self.last_name, &self.first_name, &self.middle_name]
            .map(|p| p.as_deref().unwrap_or_default());
        let used = parts
            .iter()
            .rposition(|p| !p.is_empty())
            .map_or(0, |i| i + 1);
        parts[..used].join("^")
    }

    pub fn plans(&self) -> &OwnedList<Plan> {
        &self.plans
    }

    pub fn plans_mut(&mut self) -> &mut OwnedList<Plan> {
        &mut self.plans
    }

    pub fn plan_by_id(&self, plan_id: i64) -> Option<&Plan> {
        self.plans.iter().find(|p| p.plan_id == plan_id)
    }

    pub fn plan_by_name(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name.as_deref() == Some(name))
    }

    pub fn image_sets(&self) -> &OwnedList<ImageSet> {
        &self.image_sets
    }

    pub fn image_sets_mut(&mut self) -> &mut OwnedList<ImageSet> {
        &mut self.image_sets
    }

    pub fn image_set_by_id(&self, image_set_id: i64) -> Option<&ImageSet> {
        self.image_sets
            .iter()
            .find(|s| s.image_set_id == image_set_id)
    }
}

impl Entity for Patient {
    const TYPE_NAME: &'static str = "Patient";

    fn schema() -> &'static EntitySchema {
        &PATIENT_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            patient_id: r.req_int("PatientID")?,
            medical_record_number: r.opt_text("MedicalRecordNumber")?,
            last_name: r.opt_text("LastName")?,
            first_name: r.opt_text("FirstName")?,
            middle_name: r.opt_text("MiddleName")?,
            date_of_birth: r.opt_text("DateOfBirth")?,
            gender: r.opt_text("Gender")?,
            radiation_oncologist: r.opt_text("RadiationOncologist")?,
            comment: r.opt_text("Comment")?,
            plans: r.children("PlanList", id),
            image_sets: OwnedList::new(id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("PatientID", Some(self.patient_id));
        w.text("MedicalRecordNumber", self.medical_record_number.as_ref());
        w.text("LastName", self.last_name.as_ref());
        w.text("FirstName", self.first_name.as_ref());
        w.text("MiddleName", self.middle_name.as_ref());
        w.text("DateOfBirth", self.date_of_birth.as_ref());
        w.text("Gender", self.gender.as_ref());
        w.text("RadiationOncologist", self.radiation_oncologist.as_ref());
        w.text("Comment", self.comment.as_ref());
        w.children("PlanList", &self.plans);
    }
}

impl EntityNode for Patient {
    node_meta!("Patient");

    fn children(&self) -> Vec<&dyn EntityNode> {
        let mut out: Vec<&dyn EntityNode> = Vec::new();
        out.extend(self.plans.iter().map(|p| p as &dyn EntityNode));
        out.extend(self.image_sets.iter().map(|s| s as &dyn EntityNode));
        out
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        let mut out: Vec<&mut dyn EntityNode> = Vec::new();
        out.extend(self.plans.items_mut().iter_mut().map(|p| p as &mut dyn EntityNode));
        out.extend(self.image_sets.items_mut().iter_mut().map(|s| s as &mut dyn EntityNode));
        out
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        self.plans.remove_by_id(id).is_some() || self.image_sets.remove_by_id(id).is_some()
    }
}
