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

//! Whole-directory fixtures.
//!
//! A [`FixtureTree`] is a list of relative paths and their bytes. Tests
//! either write it under a temporary directory or serve it from memory.

use std::fs;
use std::io;
use std::path::Path;

use pinn_grid::{encode_with, ByteOrder, GridDims, GridOptions};

use crate::fixtures;

/// Dimensions of the dose grid in [`fixtures::plan_trial`].
pub const DOSE_DIMS: GridDims = GridDims::new(4, 3, 2);

/// One file of a fixture tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFile {
    /// Path relative to the tree root, `/`-separated.
    pub path: String,
    pub bytes: Vec<u8>,
}

impl FixtureFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn text(path: impl Into<String>, text: &str) -> Self {
        Self::new(path, text.as_bytes().to_vec())
    }
}

/// A directory of record files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureTree {
    files: Vec<FixtureFile>,
}

impl FixtureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patient 1001 as a patient directory: the `Patient` file, the
    /// metadata of image set 0, and `Plan_0/` with its record files and two
    /// little-endian dose binaries.
    pub fn patient_tree() -> Self {
        Self::patient_tree_with(ByteOrder::LittleEndian)
    }

    pub fn patient_tree_with(byte_order: ByteOrder) -> Self {
        let mut tree = Self::new();
        tree.add_text("Patient", fixtures::patient());
        tree.add_text("ImageSet_0.header", fixtures::image_set_header());
        tree.add_text("ImageSet_0.ImageInfo", fixtures::image_set_info());
        tree.add_text("Plan_0/plan.Trial", fixtures::plan_trial());
        tree.add_text("Plan_0/plan.Points", fixtures::plan_points());
        tree.add_text("Plan_0/plan.PatientSetup", fixtures::plan_setup());
        tree.add_text("Plan_0/plan.Pinnacle.Machines", fixtures::plan_machines());
        let options = GridOptions::default().with_byte_order(byte_order);
        for beam in 0..2 {
            let samples = dose_samples(beam);
            let bytes = encode_with(&samples, DOSE_DIMS, &options)
                .unwrap_or_else(|e| panic!("fixture dose encodes: {e}"));
            tree.add(format!("Plan_0/plan.Trial.binary.{beam:03}"), bytes);
        }
        tree
    }

    /// An institution directory: the `Institution` file and the patient
    /// tree under `Patient_1001/`.
    pub fn institution_tree() -> Self {
        let mut tree = Self::new();
        tree.add_text("Institution", fixtures::institution());
        for file in Self::patient_tree().files {
            tree.add(format!("Patient_1001/{}", file.path), file.bytes);
        }
        tree
    }

    pub fn add(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        let file = FixtureFile::new(path, bytes);
        self.remove(&file.path);
        self.files.push(file);
        self
    }

    pub fn add_text(&mut self, path: impl Into<String>, text: &str) -> &mut Self {
        self.add(path, text.as_bytes().to_vec())
    }

    /// Removes a file, returning it if present.
    pub fn remove(&mut self, path: &str) -> Option<FixtureFile> {
        let index = self.files.iter().position(|f| f.path == path)?;
        Some(self.files.remove(index))
    }

    pub fn get(&self, path: &str) -> Option<&FixtureFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn files(&self) -> &[FixtureFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every file below `root`, creating directories as needed.
    pub fn write_to(&self, root: &Path) -> io::Result<()> {
        for file in &self.files {
            let target = file
                .path
                .split('/')
                .fold(root.to_path_buf(), |acc, part| acc.join(part));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &file.bytes)?;
        }
        Ok(())
    }
}

impl IntoIterator for FixtureTree {
    type Item = FixtureFile;
    type IntoIter = std::vec::IntoIter<FixtureFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Deterministic dose samples for beam `beam`: distinct per voxel and per
/// beam, and exactly representable in `f32`.
pub fn dose_samples(beam: usize) -> Vec<f32> {
    let count = DOSE_DIMS.nx * DOSE_DIMS.ny * DOSE_DIMS.nz;
    (0..count)
        .map(|i| (beam * 100 + i) as f32 * 0.25)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_tree_files() {
        let tree = FixtureTree::patient_tree();
        assert_eq!(tree.len(), 9);
        assert!(tree.get("Patient").is_some());
        let dose = tree.get("Plan_0/plan.Trial.binary.001").unwrap();
        assert_eq!(dose.bytes.len(), 4 * 3 * 2 * 4);
    }

    #[test]
    fn test_dose_bytes_little_endian() {
        let tree = FixtureTree::patient_tree();
        let dose = tree.get("Plan_0/plan.Trial.binary.000").unwrap();
        assert_eq!(&dose.bytes[4..8], &0.25f32.to_le_bytes());
    }

    #[test]
    fn test_institution_tree_prefix() {
        let tree = FixtureTree::institution_tree();
        assert!(tree.get("Institution").is_some());
        assert!(tree
            .files()
            .iter()
            .filter(|f| f.path != "Institution")
            .all(|f| f.path.starts_with("Patient_1001/")));
    }

    #[test]
    fn test_add_replaces() {
        let mut tree = FixtureTree::new();
        tree.add_text("a", "1").add_text("a", "2");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").unwrap().bytes, b"2");
    }

    #[test]
    fn test_all_fixtures_parse_cleanly() {
        for (name, text) in crate::fixtures::all() {
            let parsed = pinn_core::parse(text().as_bytes()).unwrap();
            assert!(parsed.diagnostics.is_empty(), "{name}: {:?}", parsed.diagnostics);
        }
    }

    #[test]
    fn test_malformed_points_lose_one_record() {
        let text = crate::fixtures::errors::points_one_malformed();
        let parsed = pinn_core::parse(text.as_bytes()).unwrap();
        assert_eq!(parsed.document.get("Poi").unwrap().items().count(), 9);
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_invalid_samples_report() {
        for (name, text) in crate::fixtures::errors::invalid_samples() {
            let parsed = pinn_core::parse(text.as_bytes()).unwrap();
            assert!(!parsed.diagnostics.is_empty(), "{name} parsed cleanly");
        }
    }
}
