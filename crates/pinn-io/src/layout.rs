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

//! Directory layout of patient records.
//!
//! ```text
//! <institution>/
//!   Institution
//!   <patient dir>/
//!     Patient
//!     ImageSet_0.header
//!     ImageSet_0.ImageInfo
//!     Plan_0/
//!       plan.Trial
//!       plan.Trial.binary.000
//!       plan.Points
//!       plan.PatientSetup
//!       plan.Pinnacle.Machines
//! ```
//!
//! A scope may be an institution or a single patient directory; any
//! directory holding a `Patient` file is a patient directory.

use std::collections::BTreeMap;

pub const INSTITUTION_FILE: &str = "Institution";
pub const PATIENT_FILE: &str = "Patient";
pub const IMAGE_HEADER_SUFFIX: &str = ".header";
pub const IMAGE_INFO_SUFFIX: &str = ".ImageInfo";
pub const TRIAL_FILE: &str = "plan.Trial";
pub const POINTS_FILE: &str = "plan.Points";
pub const SETUP_FILE: &str = "plan.PatientSetup";
pub const MACHINES_FILE: &str = "plan.Pinnacle.Machines";

const PLAN_PREFIX: &str = "Plan_";
const IMAGE_SET_PREFIX: &str = "ImageSet_";

/// Record files of one `Plan_<N>` folder. Each is a full relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFiles {
    pub plan_id: i64,
    pub dir: String,
    pub trial: Option<String>,
    pub points: Option<String>,
    pub setup: Option<String>,
    pub machines: Option<String>,
    /// Every other file in the folder, dose binaries included.
    pub others: Vec<String>,
}

impl PlanFiles {
    fn new(plan_id: i64, dir: String) -> Self {
        Self {
            plan_id,
            dir,
            ..Self::default()
        }
    }

    /// Full path of `name` inside this folder.
    pub fn path_of(&self, name: &str) -> String {
        join(&self.dir, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let path = self.path_of(name);
        self.others.iter().any(|p| *p == path)
    }

    fn add(&mut self, path: String, name: &str) {
        let slot = match name {
            TRIAL_FILE => &mut self.trial,
            POINTS_FILE => &mut self.points,
            SETUP_FILE => &mut self.setup,
            MACHINES_FILE => &mut self.machines,
            _ => {
                self.others.push(path);
                return;
            }
        };
        *slot = Some(path);
    }
}

/// Metadata files of one `ImageSet_<N>`. The pixel file is not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSetFiles {
    pub image_set_id: i64,
    pub header: Option<String>,
    pub info: Option<String>,
}

/// One patient directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFiles {
    pub dir: String,
    pub patient: String,
    /// Plan folders by plan id.
    pub plans: BTreeMap<i64, PlanFiles>,
    /// Image sets by id.
    pub image_sets: BTreeMap<i64, ImageSetFiles>,
}

/// Groups a file listing into patient directories, in path order.
///
/// Files outside any patient directory, and plan folders whose name does not
/// end in a plan id, are ignored.
pub fn discover(files: &[String]) -> Vec<PatientFiles> {
    let mut patients: BTreeMap<String, PatientFiles> = BTreeMap::new();
    for path in files {
        let (dir, name) = split(path);
        if name == PATIENT_FILE {
            patients.insert(
                dir.to_owned(),
                PatientFiles {
                    dir: dir.to_owned(),
                    patient: path.clone(),
                    plans: BTreeMap::new(),
                    image_sets: BTreeMap::new(),
                },
            );
        }
    }

    for path in files {
        let (dir, name) = split(path);
        if let Some((image_set_id, suffix)) = image_set_of(name) {
            if let Some(patient) = patients.get_mut(dir) {
                let entry = patient
                    .image_sets
                    .entry(image_set_id)
                    .or_insert_with(|| ImageSetFiles {
                        image_set_id,
                        ..ImageSetFiles::default()
                    });
                match suffix {
                    IMAGE_HEADER_SUFFIX => entry.header = Some(path.clone()),
                    _ => entry.info = Some(path.clone()),
                }
                continue;
            }
        }
        let (patient_dir, folder) = split(dir);
        let Some(plan_id) = plan_id_of(folder) else {
            continue;
        };
        let Some(patient) = patients.get_mut(patient_dir) else {
            continue;
        };
        patient
            .plans
            .entry(plan_id)
            .or_insert_with(|| PlanFiles::new(plan_id, dir.to_owned()))
            .add(path.clone(), name);
    }
    patients.into_values().collect()
}

/// The shallowest `Institution` file of a listing. One inside a patient
/// directory does not count.
pub fn institution_file(files: &[String]) -> Option<&String> {
    let patient_dirs: Vec<&str> = files
        .iter()
        .map(|p| split(p))
        .filter(|(_, name)| *name == PATIENT_FILE)
        .map(|(dir, _)| dir)
        .collect();
    files
        .iter()
        .filter(|p| {
            let (dir, name) = split(p);
            name == INSTITUTION_FILE && !patient_dirs.contains(&dir)
        })
        .min_by(|a, b| {
            let depth = |p: &str| p.matches('/').count();
            depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
        })
}

/// Parses `ImageSet_<N>.header` and `ImageSet_<N>.ImageInfo` into the id
/// and the suffix.
pub fn image_set_of(name: &str) -> Option<(i64, &'static str)> {
    let rest = name.strip_prefix(IMAGE_SET_PREFIX)?;
    [IMAGE_HEADER_SUFFIX, IMAGE_INFO_SUFFIX]
        .into_iter()
        .find_map(|suffix| Some((rest.strip_suffix(suffix)?.parse().ok()?, suffix)))
}

pub fn image_set_stem(image_set_id: i64) -> String {
    format!("{}{}", IMAGE_SET_PREFIX, image_set_id)
}

/// Parses `Plan_<N>`.
pub fn plan_id_of(folder: &str) -> Option<i64> {
    folder.strip_prefix(PLAN_PREFIX)?.parse().ok()
}

pub fn plan_folder(plan_id: i64) -> String {
    format!("{}{}", PLAN_PREFIX, plan_id)
}

/// Directory name used when saving a patient into an institution.
pub fn patient_folder(patient_id: i64) -> String {
    format!("Patient_{}", patient_id)
}

pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Splits a relative path into its directory and last component.
fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_patient_directory_scope() {
        let layout = discover(&paths(&[
            "Patient",
            "Plan_0/plan.Trial",
            "Plan_0/plan.Trial.binary.000",
            "Plan_2/plan.Points",
            "ImageSet_0.header",
            "ImageSet_0.ImageInfo",
            "ImageSet_0.img",
            "ImageSet_3.header",
        ]));
        assert_eq!(layout.len(), 1);
        let patient = &layout[0];
        assert_eq!(patient.dir, "");
        assert_eq!(patient.plans.len(), 2);
        assert_eq!(patient.image_sets.len(), 2);
        assert_eq!(patient.image_sets[&0].info.as_deref(), Some("ImageSet_0.ImageInfo"));
        assert_eq!(patient.image_sets[&3].header.as_deref(), Some("ImageSet_3.header"));
        assert!(patient.image_sets[&3].info.is_none());
        let plan = &patient.plans[&0];
        assert_eq!(plan.trial.as_deref(), Some("Plan_0/plan.Trial"));
        assert!(plan.contains("plan.Trial.binary.000"));
        assert_eq!(patient.plans[&2].points.as_deref(), Some("Plan_2/plan.Points"));
    }

    #[test]
    fn test_institution_scope() {
        let layout = discover(&paths(&[
            "Inst/Patient_2/Patient",
            "Inst/Patient_1/Patient",
            "Inst/Patient_1/Plan_0/plan.PatientSetup",
            "Inst/Orphan/Plan_0/plan.Trial",
        ]));
        let dirs: Vec<_> = layout.iter().map(|p| p.dir.as_str()).collect();
        assert_eq!(dirs, vec!["Inst/Patient_1", "Inst/Patient_2"]);
        assert_eq!(
            layout[0].plans[&0].setup.as_deref(),
            Some("Inst/Patient_1/Plan_0/plan.PatientSetup")
        );
        assert!(layout[1].plans.is_empty());
    }

    #[test]
    fn test_institution_file() {
        let files = paths(&[
            "Inst/Patient_1/Patient",
            "Inst/Patient_1/Institution",
            "Inst/Institution",
            "Other/Deeper/Institution",
        ]);
        assert_eq!(institution_file(&files).map(String::as_str), Some("Inst/Institution"));
        assert_eq!(institution_file(&paths(&["Patient", "Institution"])), None);
        assert_eq!(institution_file(&paths(&["Patient_1/Patient"])), None);
    }

    #[test]
    fn test_image_set_of() {
        assert_eq!(image_set_of("ImageSet_4.header"), Some((4, IMAGE_HEADER_SUFFIX)));
        assert_eq!(image_set_of("ImageSet_4.ImageInfo"), Some((4, IMAGE_INFO_SUFFIX)));
        assert_eq!(image_set_of("ImageSet_4.img"), None);
        assert_eq!(image_set_of("ImageSet_.header"), None);
        assert_eq!(image_set_stem(4), "ImageSet_4");
    }

    #[test]
    fn test_plan_id_of() {
        assert_eq!(plan_id_of("Plan_12"), Some(12));
        assert_eq!(plan_id_of("Plan_"), None);
        assert_eq!(plan_id_of("Plan_x"), None);
        assert_eq!(plan_id_of("Trial_1"), None);
        assert_eq!(plan_folder(3), "Plan_3");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "Patient"), "Patient");
        assert_eq!(join("A/B", "Patient"), "A/B/Patient");
    }
}
