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
use crate::mapper::{Entity, FieldReader, FieldWriter, Vec3};
use crate::meta::EntityMeta;
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

static POINT_SCHEMA: EntitySchema = EntitySchema {
    name: "Poi",
    fields: &[
        FieldSpec::required("Name", FieldKind::Text),
        FieldSpec::optional("XCoord", FieldKind::Float),
        FieldSpec::optional("YCoord", FieldKind::Float),
        FieldSpec::optional("ZCoord", FieldKind::Float),
        FieldSpec::optional("Radius", FieldKind::Float),
        FieldSpec::optional("Color", FieldKind::Text),
        FieldSpec::optional("CoordSys", FieldKind::Text),
        FieldSpec::optional("VolumeName", FieldKind::Text),
        FieldSpec::optional("PoiInterpretedType", FieldKind::Text),
        FieldSpec::optional("IsLocked", FieldKind::Flag),
    ],
};

/// A point of interest from `plan.Points`, such as an isocenter.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub x_coord: Option<f64>,
    pub y_coord: Option<f64>,
    pub z_coord: Option<f64>,
    pub radius: Option<f64>,
    pub color: Option<String>,
    pub coord_sys: Option<String>,
    pub volume_name: Option<String>,
    pub interpreted_type: Option<String>,
    pub is_locked: Option<bool>,
    meta: EntityMeta,
}

impl Point {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x_coord: None,
            y_coord: None,
            z_coord: None,
            radius: None,
            color: None,
            coord_sys: None,
            volume_name: None,
            interpreted_type: None,
            is_locked: None,
            meta: EntityMeta::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.x_coord = Some(x);
        self.y_coord = Some(y);
        self.z_coord = Some(z);
        self
    }

    /// Coordinates with missing axes read as zero.
    pub fn coordinates(&self) -> Vec3 {
        Vec3::new(
            self.x_coord.unwrap_or_default(),
            self.y_coord.unwrap_or_default(),
            self.z_coord.unwrap_or_default(),
        )
    }
}

impl Entity for Point {
    const TYPE_NAME: &'static str = "Poi";

    fn schema() -> &'static EntitySchema {
        &POINT_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            name: r.req_text("Name")?,
            x_coord: r.opt_float("XCoord")?,
            y_coord: r.opt_float("YCoord")?,
            z_coord: r.opt_float("ZCoord")?,
            radius: r.opt_float("Radius")?,
            color: r.opt_text("Color")?,
            coord_sys: r.opt_text("CoordSys")?,
            volume_name: r.opt_text("VolumeName")?,
            interpreted_type: r.opt_text("PoiInterpretedType")?,
            is_locked: r.opt_flag("IsLocked")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Name", Some(&self.name));
        w.float("XCoord", self.x_coord);
        w.float("YCoord", self.y_coord);
        w.float("ZCoord", self.z_coord);
        w.float("Radius", self.radius);
        w.text("Color", self.color.as_ref());
        w.text("CoordSys", self.coord_sys.as_ref());
        w.text("VolumeName", self.volume_name.as_ref());
        w.text("PoiInterpretedType", self.interpreted_type.as_ref());
        w.flag("IsLocked", self.is_locked);
    }
}

impl EntityNode for Point {
    node_meta!("Poi");

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
