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
use crate::owned::OwnedList;
use crate::schema::{EntitySchema, FieldKind, FieldSpec, ItemKey};

static INSTITUTION_SCHEMA: EntitySchema = EntitySchema {
    name: "Institution",
    fields: &[
        FieldSpec::optional("InstitutionID", FieldKind::Int),
        FieldSpec::optional("InstitutionPath", FieldKind::Text),
        FieldSpec::optional("PinnInstitutionPath", FieldKind::Text),
        FieldSpec::optional("Name", FieldKind::Text),
        FieldSpec::optional("StreetAddress", FieldKind::Text),
        FieldSpec::optional("StreetAddress2", FieldKind::Text),
        FieldSpec::optional("City", FieldKind::Text),
        FieldSpec::optional("State", FieldKind::Text),
        FieldSpec::optional("ZipCode", FieldKind::Text),
        FieldSpec::optional("Country", FieldKind::Text),
        FieldSpec::optional("DefaultMountPoint", FieldKind::Text),
        FieldSpec::optional(
            "PatientLiteList",
            FieldKind::ChildList {
                item: ItemKey::Named("PatientLite"),
                entity: "PatientLite",
            },
        ),
    ],
};

static PATIENT_LITE_SCHEMA: EntitySchema = EntitySchema {
    name: "PatientLite",
    fields: &[
        FieldSpec::optional("PatientID", FieldKind::Int),
        FieldSpec::required("PatientPath", FieldKind::Text),
        FieldSpec::optional("MountPoint", FieldKind::Text),
        FieldSpec::optional("FormattedDescription", FieldKind::Text),
        FieldSpec::optional("DirSize", FieldKind::Float),
    ],
};

/// The institution directory's `Institution` file: address details and a
/// lightweight index of the patients stored below it.
#[derive(Debug, PartialEq)]
pub struct Institution {
    pub institution_id: Option<i64>,
    pub institution_path: Option<String>,
    pub pinn_institution_path: Option<String>,
    pub name: Option<String>,
    pub street_address: Option<String>,
    pub street_address_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub default_mount_point: Option<String>,
    patients: OwnedList<PatientLite>,
    meta: EntityMeta,
}

owning_clone!(Institution {
    institution_id,
    institution_path,
    pinn_institution_path,
    name,
    street_address,
    street_address_2,
    city,
    state,
    zip_code,
    country,
    default_mount_point,
} owns { patients });

impl Institution {
    pub fn new() -> Self {
        let meta = EntityMeta::new();
        Self {
            institution_id: None,
            institution_path: None,
            pinn_institution_path: None,
            name: None,
            street_address: None,
            street_address_2: None,
            city: None,
            state: None,
            zip_code: None,
            country: None,
            default_mount_point: None,
            patients: OwnedList::new(meta.id()),
            meta,
        }
    }

    /// Index entries from `PatientLiteList`.
    pub fn patients(&self) -> &OwnedList<PatientLite> {
        &self.patients
    }

    pub fn patients_mut(&mut self) -> &mut OwnedList<PatientLite> {
        &mut self.patients
    }

    pub fn patient_by_id(&self, patient_id: i64) -> Option<&PatientLite> {
        self.patients.iter().find(|p| p.patient_id == Some(patient_id))
    }
}

impl Default for Institution {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Institution {
    const TYPE_NAME: &'static str = "Institution";

    fn schema() -> &'static EntitySchema {
        &INSTITUTION_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            institution_id: r.opt_int("InstitutionID")?,
            institution_path: r.opt_text("InstitutionPath")?,
            pinn_institution_path: r.opt_text("PinnInstitutionPath")?,
            name: r.opt_text("Name")?,
            street_address: r.opt_text("StreetAddress")?,
            street_address_2: r.opt_text("StreetAddress2")?,
            city: r.opt_text("City")?,
            state: r.opt_text("State")?,
            zip_code: r.opt_text("ZipCode")?,
            country: r.opt_text("Country")?,
            default_mount_point: r.opt_text("DefaultMountPoint")?,
            patients: r.children("PatientLiteList", id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("InstitutionID", self.institution_id);
        w.text("InstitutionPath", self.institution_path.as_ref());
        w.text("PinnInstitutionPath", self.pinn_institution_path.as_ref());
        w.text("Name", self.name.as_ref());
        w.text("StreetAddress", self.street_address.as_ref());
        w.text("StreetAddress2", self.street_address_2.as_ref());
        w.text("City", self.city.as_ref());
        w.text("State", self.state.as_ref());
        w.text("ZipCode", self.zip_code.as_ref());
        w.text("Country", self.country.as_ref());
        w.text("DefaultMountPoint", self.default_mount_point.as_ref());
        w.children("PatientLiteList", &self.patients);
    }
}

impl EntityNode for Institution {
    node_meta!("Institution");

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn children(&self) -> Vec<&dyn EntityNode> {
        self.patients.iter().map(|p| p as &dyn EntityNode).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        self.patients
            .items_mut()
            .iter_mut()
            .map(|p| p as &mut dyn EntityNode)
            .collect()
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        self.patients.remove_by_id(id).is_some()
    }
}

/// Parts of a `FormattedDescription`, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientSummary {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub medical_record_number: String,
    pub physician: String,
    pub last_modified: String,
}

/// One `PatientLite` entry of the institution's patient index.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientLite {
    pub patient_id: Option<i64>,
    pub patient_path: String,
    pub mount_point: Option<String>,
    /// `LAST&&FIRST&&MIDDLE&&MRN&&PHYSICIAN&&LASTMODIFIED`.
    pub formatted_description: Option<String>,
    pub dir_size: Option<f64>,
    meta: EntityMeta,
}

impl PatientLite {
    pub fn new(patient_path: impl Into<String>) -> Self {
        Self {
            patient_id: None,
            patient_path: patient_path.into(),
            mount_point: None,
            formatted_description: None,
            dir_size: None,
            meta: EntityMeta::new(),
        }
    }

    /// Splits the formatted description. Missing trailing parts are empty.
    pub fn summary(&self) -> PatientSummary {
        let mut parts = self
            .formatted_description
            .as_deref()
            .unwrap_or_default()
            .split("&&")
            .map(str::to_owned);
        let mut next = || parts.next().unwrap_or_default();
        PatientSummary {
            last_name: next(),
            first_name: next(),
            middle_name: next(),
            medical_record_number: next(),
            physician: next(),
            last_modified: next(),
        }
    }

    /// Last path component, the patient's directory name.
    pub fn folder_name(&self) -> &str {
        self.patient_path
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or_default()
    }
}

impl Entity for PatientLite {
    const TYPE_NAME: &'static str = "PatientLite";

    fn schema() -> &'static EntitySchema {
        &PATIENT_LITE_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            patient_id: r.opt_int("PatientID")?,
            patient_path: r.req_text("PatientPath")?,
            mount_point: r.opt_text("MountPoint")?,
            formatted_description: r.opt_text("FormattedDescription")?,
            dir_size: r.opt_float("DirSize")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("PatientID", self.patient_id);
        w.text("PatientPath", Some(&self.patient_path));
        w.text("MountPoint", self.mount_point.as_ref());
        w.text("FormattedDescription", self.formatted_description.as_ref());
        w.float("DirSize", self.dir_size);
    }
}

impl EntityNode for PatientLite {
    node_meta!("PatientLite");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_parts() {
        let mut lite = PatientLite::new("Institution_1/Mount_0/Patient_1");
        lite.formatted_description =
            Some("LAST&&FIRST&&M&&000000&&TEST,MD&&2020-01-01 10:00:00".to_owned());
        let summary = lite.summary();
        assert_eq!(summary.last_name, "LAST");
        assert_eq!(summary.physician, "TEST,MD");
        assert_eq!(summary.last_modified, "2020-01-01 10:00:00");
        assert_eq!(lite.folder_name(), "Patient_1");
    }

    #[test]
    fn test_short_summary_pads_empty() {
        let mut lite = PatientLite::new("Patient_2/");
        lite.formatted_description = Some("DOE&&JANE".to_owned());
        let summary = lite.summary();
        assert_eq!(summary.first_name, "JANE");
        assert_eq!(summary.middle_name, "");
        assert_eq!(summary.last_modified, "");
        assert_eq!(lite.folder_name(), "Patient_2");
        assert_eq!(PatientLite::new("x").summary().last_name, "");
    }

    #[test]
    fn test_patient_lookup_and_parent() {
        let mut inst = Institution::new();
        let mut lite = PatientLite::new("Patient_7");
        lite.patient_id = Some(7);
        inst.patients_mut().push(lite);
        assert!(inst.patient_by_id(7).is_some());
        assert_eq!(inst.patients()[0].meta().parent(), Some(inst.meta().id()));
    }
}
