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

use std::fmt;

use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::EntityMeta;
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

static SETUP_SCHEMA: EntitySchema = EntitySchema {
    name: "PatientSetup",
    fields: &[
        FieldSpec::optional("Position", FieldKind::Text),
        FieldSpec::optional("Orientation", FieldKind::Text),
        FieldSpec::optional("TableMotion", FieldKind::Text),
    ],
};

/// Patient position code, e.g. head first supine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetupCode {
    Hfs,
    Hfp,
    Ffs,
    Ffp,
    Hfdr,
    Hfdl,
    Ffdr,
    Ffdl,
    Unknown,
}

impl SetupCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hfs => "HFS",
            Self::Hfp => "HFP",
            Self::Ffs => "FFS",
            Self::Ffp => "FFP",
            Self::Hfdr => "HFDR",
            Self::Hfdl => "HFDL",
            Self::Ffdr => "FFDR",
            Self::Ffdl => "FFDL",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SetupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the patient lay on the couch, from `plan.PatientSetup`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSetup {
    /// e.g. `On back (supine)`.
    pub position: Option<String>,
    /// e.g. `Head First Into Scanner`.
    pub orientation: Option<String>,
    pub table_motion: Option<String>,
    meta: EntityMeta,
}

impl PatientSetup {
    pub fn new() -> Self {
        Self {
            position: None,
            orientation: None,
            table_motion: None,
            meta: EntityMeta::new(),
        }
    }

    pub fn setup_code(&self) -> SetupCode {
        let head_first = match self.orientation.as_deref() {
            Some("Head First Into Scanner") => true,
            Some("Feet First Into Scanner") => false,
            _ => return SetupCode::Unknown,
        };
        match (head_first, self.position.as_deref()) {
            (true, Some("On back (supine)")) => SetupCode::Hfs,
            (true, Some("On front (prone)")) => SetupCode::Hfp,
            (true, Some("Right side down")) => SetupCode::Hfdr,
            (true, Some("Left side down")) => SetupCode::Hfdl,
            (false, Some("On back (supine)")) => SetupCode::Ffs,
            (false, Some("On front (prone)")) => SetupCode::Ffp,
            (false, Some("Right side down")) => SetupCode::Ffdr,
            (false, Some("Left side down")) => SetupCode::Ffdl,
            _ => SetupCode::Unknown,
        }
    }
}

impl Default for PatientSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for PatientSetup {
    const TYPE_NAME: &'static str = "PatientSetup";

    fn schema() -> &'static EntitySchema {
        &SETUP_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            position: r.opt_text("Position")?,
            orientation: r.opt_text("Orientation")?,
            table_motion: r.opt_text("TableMotion")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.text("Position", self.position.as_ref());
        w.text("Orientation", self.orientation.as_ref());
        w.text("TableMotion", self.table_motion.as_ref());
    }
}

impl EntityNode for PatientSetup {
    node_meta!("PatientSetup");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(orientation: &str, position: &str) -> PatientSetup {
        let mut s = PatientSetup::new();
        s.orientation = Some(orientation.to_owned());
        s.position = Some(position.to_owned());
        s
    }

    #[test]
    fn test_setup_codes() {
        assert_eq!(setup("Head First Into Scanner", "On back (supine)").setup_code(), SetupCode::Hfs);
        assert_eq!(setup("Feet First Into Scanner", "On front (prone)").setup_code(), SetupCode::Ffp);
        assert_eq!(setup("Head First Into Scanner", "Left side down").setup_code(), SetupCode::Hfdl);
        assert_eq!(setup("Feet First Into Scanner", "Right side down").setup_code().to_string(), "FFDR");
    }

    #[test]
    fn test_unknown_setup() {
        assert_eq!(PatientSetup::new().setup_code(), SetupCode::Unknown);
        assert_eq!(setup("Sideways", "On back (supine)").setup_code(), SetupCode::Unknown);
        assert_eq!(setup("Head First Into Scanner", "Standing").setup_code(), SetupCode::Unknown);
    }
}
