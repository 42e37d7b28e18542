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
use crate::meta::EntityMeta;
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

static MACHINE_SCHEMA: EntitySchema = EntitySchema {
    name: "Machine",
    fields: &[
        FieldSpec::required("Name", FieldKind::Text),
        FieldSpec::optional("MachineType", FieldKind::Text),
        FieldSpec::optional("VersionTimeStamp", FieldKind::Text),
        FieldSpec::optional("Manufacturer", FieldKind::Text),
        FieldSpec::optional("Model", FieldKind::Text),
        FieldSpec::optional("SerialNumber", FieldKind::Text),
        FieldSpec::optional("TolerateMUs", FieldKind::Flag),
    ],
};

/// A treatment machine commissioned for the plan.
///
/// Beams refer to it by name through `MachineNameAndVersion`.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub name: String,
    pub machine_type: Option<String>,
    pub version_time_stamp: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub tolerate_mus: Option<bool>,
    meta: EntityMeta,
}

impl Machine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine_type: None,
            version_time_stamp: None,
            manufacturer: None,
            model: None,
            serial_number: None,
            tolerate_mus: None,
            meta: EntityMeta::new(),
        }
    }

    /// `Name: VersionTimeStamp`, the form beams use to name a machine.
    pub fn name_and_version(&self) -> String {
        match &self.version_time_stamp {
            Some(version) => format!("{}: {}", self.name, version),
            None => self.name.clone(),
        }
    }
}

impl Entity for Machine {
    const TYPE_NAME: &'static str = "Machine";

    fn schema() -> &'static EntitySchema {
        &MACHINE_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            name: r.req_text("Name")?,
            machine_type: r.opt_text("MachineType")?,
            version_time_stamp: r.opt_text("VersionTimeStamp")?,
            manufacturer: r.opt_text("Manufacturer")?,
            model: r.opt_text("Model")?,
            serial_number: r.opt_text("SerialNumber")?,
            tolerate_mus: r.opt_flag("TolerateMUs")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Name", Some(&self.name));
        w.text("MachineType", self.machine_type.as_ref());
        w.text("VersionTimeStamp", self.version_time_stamp.as_ref());
        w.text("Manufacturer", self.manufacturer.as_ref());
        w.text("Model", self.model.as_ref());
        w.text("SerialNumber", self.serial_number.as_ref());
        w.flag("TolerateMUs", self.tolerate_mus);
    }
}

impl EntityNode for Machine {
    node_meta!("Machine");

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
