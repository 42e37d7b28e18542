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

use super::{Machine, PatientSetup, Point, Trial};
use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::{OwnedList, OwnedSlot};
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

static PLAN_SCHEMA: EntitySchema = EntitySchema {
    name: "Plan",
    fields: &[
        FieldSpec::required("PlanID", FieldKind::Int),
        FieldSpec::optional("PlanName", FieldKind::Text),
        FieldSpec::optional("Comment", FieldKind::Text),
        FieldSpec::optional("Physicist", FieldKind::Text),
        FieldSpec::optional("Dosimetrist", FieldKind::Text),
        FieldSpec::optional("PrimaryCTImageSetID", FieldKind::Text),
        FieldSpec::optional("ToolType", FieldKind::Text),
    ],
};

/// A treatment plan.
///
/// The summary fields come from the patient's `PlanList`. The trials,
/// setup, points and machines come from the files of the plan's
/// `Plan_<PlanID>` folder; unknown top-level statements of those files are
/// kept in the extras of the corresponding list.
#[derive(Debug, PartialEq)]
pub struct Plan {
    pub plan_id: i64,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub physicist: Option<String>,
    pub dosimetrist: Option<String>,
    pub primary_ct_image_set_id: Option<String>,
    pub tool_type: Option<String>,
    trials: OwnedList<Trial>,
    setup: OwnedSlot<PatientSetup>,
    points: OwnedList<Point>,
    machines: OwnedList<Machine>,
    meta: EntityMeta,
}

owning_clone!(Plan {
    plan_id,
    name,
    comment,
    physicist,
    dosimetrist,
    primary_ct_image_set_id,
    tool_type,
} owns { trials, setup, points, machines });

impl Plan {
    pub fn new(plan_id: i64) -> Self {
        let meta = EntityMeta::new();
        let id = meta.id();
        Self {
            plan_id,
            name: None,
            comment: None,
            physicist: None,
            dosimetrist: None,
            primary_ct_image_set_id: None,
            tool_type: None,
            trials: OwnedList::new(id),
            setup: OwnedSlot::new(id),
            points: OwnedList::new(id),
            machines: OwnedList::new(id),
            meta,
        }
    }

    /// Folder holding the plan's files.
    pub fn folder_name(&self) -> String {
        format!("Plan_{}", self.plan_id)
    }

    pub fn trials(&self) -> &OwnedList<Trial> {
        &self.trials
    }

    pub fn trials_mut(&mut self) -> &mut OwnedList<Trial> {
        &mut self.trials
    }

    pub fn setup(&self) -> Option<&PatientSetup> {
        self.setup.get()
    }

    pub fn setup_slot(&mut self) -> &mut OwnedSlot<PatientSetup> {
        &mut self.setup
    }

    pub fn points(&self) -> &OwnedList<Point> {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut OwnedList<Point> {
        &mut self.points
    }

    pub fn machines(&self) -> &OwnedList<Machine> {
        &self.machines
    }

    pub fn machines_mut(&mut self) -> &mut OwnedList<Machine> {
        &mut self.machines
    }

    pub fn trial_by_name(&self, name: &str) -> Option<&Trial> {
        self.trials.iter().find(|t| t.name == name)
    }

    pub fn point_by_name(&self, name: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.name == name)
    }

    pub fn machine_by_name(&self, name: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.name == name)
    }
}

impl Entity for Plan {
    const TYPE_NAME: &'static str = "Plan";

    fn schema() -> &'static EntitySchema {
        &PLAN_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            plan_id: r.req_int("PlanID")?,
            name: r.opt_text("PlanName")?,
            comment: r.opt_text("Comment")?,
            physicist: r.opt_text("Physicist")?,
            dosimetrist: r.opt_text("Dosimetrist")?,
            primary_ct_image_set_id: r.opt_text("PrimaryCTImageSetID")?,
            tool_type: r.opt_text("ToolType")?,
            trials: OwnedList::new(id),
            setup: OwnedSlot::new(id),
            points: OwnedList::new(id),
            machines: OwnedList::new(id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("PlanID", Some(self.plan_id));
        w.text("PlanName", self.name.as_ref());
        w.text("Comment", self.comment.as_ref());
        w.text("Physicist", self.physicist.as_ref());
        w.text("Dosimetrist", self.dosimetrist.as_ref());
        w.text("PrimaryCTImageSetID", self.primary_ct_image_set_id.as_ref());
        w.text("ToolType", self.tool_type.as_ref());
    }
}

impl EntityNode for Plan {
    node_meta!("Plan");

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn children(&self) -> Vec<&dyn EntityNode> {
        let mut out: Vec<&dyn EntityNode> = Vec::new();
        out.extend(self.trials.iter().map(|t| t as &dyn EntityNode));
        if let Some(setup) = self.setup.get() {
            out.push(setup);
        }
        out.extend(self.points.iter().map(|p| p as &dyn EntityNode));
        out.extend(self.machines.iter().map(|m| m as &dyn EntityNode));
        out
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        let mut out: Vec<&mut dyn EntityNode> = Vec::new();
        out.extend(self.trials.items_mut().iter_mut().map(|t| t as &mut dyn EntityNode));
        if let Some(setup) = self.setup.item_mut() {
            out.push(setup);
        }
        out.extend(self.points.items_mut().iter_mut().map(|p| p as &mut dyn EntityNode));
        out.extend(self.machines.items_mut().iter_mut().map(|m| m as &mut dyn EntityNode));
        out
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        if self.setup.get().is_some_and(|s| s.meta().id() == id) {
            self.setup.take();
            return true;
        }
        self.trials.remove_by_id(id).is_some()
            || self.points.remove_by_id(id).is_some()
            || self.machines.remove_by_id(id).is_some()
    }
}
