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

use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::OwnedSlot;
use crate::schema::{DefaultValue, EntitySchema, FieldKind, FieldSpec};

static CONTROL_POINT_SCHEMA: EntitySchema = EntitySchema {
    name: "ControlPoint",
    fields: &[
        FieldSpec::defaulted("Gantry", FieldKind::Float, DefaultValue::Float(0.0)),
        FieldSpec::defaulted("Couch", FieldKind::Float, DefaultValue::Float(0.0)),
        FieldSpec::defaulted("Collimator", FieldKind::Float, DefaultValue::Float(0.0)),
        FieldSpec::optional("LeftJawPosition", FieldKind::Float),
        FieldSpec::optional("RightJawPosition", FieldKind::Float),
        FieldSpec::optional("TopJawPosition", FieldKind::Float),
        FieldSpec::optional("BottomJawPosition", FieldKind::Float),
        FieldSpec::optional("Weight", FieldKind::Float),
        FieldSpec::optional("WeightLocked", FieldKind::Flag),
        FieldSpec::optional("MLCLeafPositions", FieldKind::Child("MLCLeafPositions")),
    ],
};

static LEAF_POSITIONS_SCHEMA: EntitySchema = EntitySchema {
    name: "MLCLeafPositions",
    fields: &[FieldSpec::optional("RawData", FieldKind::Child("RawData"))],
};

static RAW_DATA_SCHEMA: EntitySchema = EntitySchema {
    name: "RawData",
    fields: &[
        FieldSpec::optional("NumberOfDimensions", FieldKind::Int),
        FieldSpec::optional("NumberOfPoints", FieldKind::Int),
        FieldSpec::optional("Points[]", FieldKind::FloatArray),
    ],
};

/// One machine state along a beam's delivery.
#[derive(Debug, PartialEq)]
pub struct ControlPoint {
    pub gantry: f64,
    pub couch: f64,
    pub collimator: f64,
    pub left_jaw: Option<f64>,
    pub right_jaw: Option<f64>,
    pub top_jaw: Option<f64>,
    pub bottom_jaw: Option<f64>,
    pub weight: Option<f64>,
    pub weight_locked: Option<bool>,
    mlc: OwnedSlot<LeafPositions>,
    meta: EntityMeta,
}

owning_clone!(ControlPoint {
    gantry,
    couch,
    collimator,
    left_jaw,
    right_jaw,
    top_jaw,
    bottom_jaw,
    weight,
    weight_locked,
} owns { mlc });

impl ControlPoint {
    pub fn new(gantry: f64, couch: f64, collimator: f64) -> Self {
        let meta = EntityMeta::new();
        Self {
            gantry,
            couch,
            collimator,
            left_jaw: None,
            right_jaw: None,
            top_jaw: None,
            bottom_jaw: None,
            weight: None,
            weight_locked: None,
            mlc: OwnedSlot::new(meta.id()),
            meta,
        }
    }

    pub fn mlc(&self) -> &OwnedSlot<LeafPositions> {
        &self.mlc
    }

    pub fn mlc_mut(&mut self) -> &mut OwnedSlot<LeafPositions> {
        &mut self.mlc
    }

    /// Flat leaf positions from `MLCLeafPositions.RawData.Points[]`.
    pub fn leaf_positions(&self) -> Option<&[f64]> {
        self.mlc.get()?.raw.get().map(|raw| raw.points.as_slice())
    }

    /// Replaces the leaf positions, creating the nested records as needed.
    pub fn set_leaf_positions(&mut self, points: Vec<f64>) {
        let mut raw = RawData::new();
        raw.number_of_dimensions = Some(2);
        raw.number_of_points = i64::try_from(points.len() / 2).ok();
        raw.points = points;
        if self.mlc.is_none() {
            self.mlc.set(LeafPositions::new());
        }
        if let Some(mut leaves) = self.mlc.get_mut() {
            leaves.raw.set(raw);
        }
    }
}

impl Entity for ControlPoint {
    const TYPE_NAME: &'static str = "ControlPoint";

    fn schema() -> &'static EntitySchema {
        &CONTROL_POINT_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            gantry: r.req_float("Gantry")?,
            couch: r.req_float("Couch")?,
            collimator: r.req_float("Collimator")?,
            left_jaw: r.opt_float("LeftJawPosition")?,
            right_jaw: r.opt_float("RightJawPosition")?,
            top_jaw: r.opt_float("TopJawPosition")?,
            bottom_jaw: r.opt_float("BottomJawPosition")?,
            weight: r.opt_float("Weight")?,
            weight_locked: r.opt_flag("WeightLocked")?,
            mlc: r.child("MLCLeafPositions", id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.float("Gantry", Some(self.gantry));
        w.float("Couch", Some(self.couch));
        w.float("Collimator", Some(self.collimator));
        w.float("LeftJawPosition", self.left_jaw);
        w.float("RightJawPosition", self.right_jaw);
        w.float("TopJawPosition", self.top_jaw);
        w.float("BottomJawPosition", self.bottom_jaw);
        w.float("Weight", self.weight);
        w.flag("WeightLocked", self.weight_locked);
        w.child("MLCLeafPositions", &self.mlc);
    }
}

impl EntityNode for ControlPoint {
    node_meta!("ControlPoint");

    fn children(&self) -> Vec<&dyn EntityNode> {
        self.mlc.get().map(|m| m as &dyn EntityNode).into_iter().collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        self.mlc.item_mut().map(|m| m as &mut dyn EntityNode).into_iter().collect()
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        if self.mlc.get().is_some_and(|m| m.meta().id() == id) {
            self.mlc.take();
            return true;
        }
        false
    }
}

/// The `MLCLeafPositions` wrapper around a control point's leaf curve.
#[derive(Debug, PartialEq)]
pub struct LeafPositions {
    raw: OwnedSlot<RawData>,
    meta: EntityMeta,
}

owning_clone!(LeafPositions {} owns { raw });

impl LeafPositions {
    pub fn new() -> Self {
        let meta = EntityMeta::new();
        Self {
            raw: OwnedSlot::new(meta.id()),
            meta,
        }
    }

    pub fn raw(&self) -> &OwnedSlot<RawData> {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut OwnedSlot<RawData> {
        &mut self.raw
    }
}

impl Default for LeafPositions {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for LeafPositions {
    const TYPE_NAME: &'static str = "MLCLeafPositions";

    fn schema() -> &'static EntitySchema {
        &LEAF_POSITIONS_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let raw = r.child("RawData", meta.id());
        Ok(Self { raw, meta })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.child("RawData", &self.raw);
    }
}

impl EntityNode for LeafPositions {
    node_meta!("MLCLeafPositions");

    fn children(&self) -> Vec<&dyn EntityNode> {
        self.raw.get().map(|r| r as &dyn EntityNode).into_iter().collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        self.raw.item_mut().map(|r| r as &mut dyn EntityNode).into_iter().collect()
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        if self.raw.get().is_some_and(|r| r.meta().id() == id) {
            self.raw.take();
            return true;
        }
        false
    }
}

/// A numeric curve: `NumberOfPoints` pairs stored flat in `Points[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawData {
    pub number_of_dimensions: Option<i64>,
    pub number_of_points: Option<i64>,
    pub points: Vec<f64>,
    meta: EntityMeta,
}

impl RawData {
    pub fn new() -> Self {
        Self {
            number_of_dimensions: None,
            number_of_points: None,
            points: Vec::new(),
            meta: EntityMeta::new(),
        }
    }
}

impl Default for RawData {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for RawData {
    const TYPE_NAME: &'static str = "RawData";

    fn schema() -> &'static EntitySchema {
        &RAW_DATA_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            number_of_dimensions: r.opt_int("NumberOfDimensions")?,
            number_of_points: r.opt_int("NumberOfPoints")?,
            points: r.opt_float_array("Points[]")?.unwrap_or_default(),
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("NumberOfDimensions", self.number_of_dimensions);
        w.int("NumberOfPoints", self.number_of_points);
        w.float_array("Points[]", Some(self.points.as_slice()));
    }
}

impl EntityNode for RawData {
    node_meta!("RawData");
}
