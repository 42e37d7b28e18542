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

//! Writing a graph back to disk.
//!
//! Every file is rendered first; nothing is written if rendering fails
//! with an error. Each file is then staged in its target directory and
//! persisted over the destination, so readers see either the old or the
//! new file, never a torn one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use pinn_c14n::canonicalize_with_config;
use pinn_core::{Diagnostic, DiagnosticKind, Diagnostics, Document};
use pinn_model::{collection_document, root_document, EntityGraph, ImageSet, Patient, Plan};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{SaveConfig, SaveLayout};
use crate::error::{Error, Result};
use crate::layout::{
    image_set_stem, join, patient_folder, plan_folder, IMAGE_HEADER_SUFFIX, IMAGE_INFO_SUFFIX,
    INSTITUTION_FILE, MACHINES_FILE, PATIENT_FILE, POINTS_FILE, SETUP_FILE, TRIAL_FILE,
};

/// One rendered file, relative to the save directory.
#[derive(Debug, Clone)]
struct Output {
    path: String,
    bytes: Vec<u8>,
}

/// Writes `graph` below `dir` in the layout chosen by `config`.
///
/// Files that cannot be rendered (for example a non-finite number) are
/// skipped and reported; I/O errors abort.
pub fn save(graph: &EntityGraph, dir: impl AsRef<Path>, config: &SaveConfig) -> Result<Diagnostics> {
    let start = Instant::now();
    let dir = dir.as_ref();
    let mut diagnostics = Diagnostics::new();
    let outputs = render(graph, config, &mut diagnostics)?;

    outputs
        .par_iter()
        .try_for_each(|out| write_atomic(&target_path(dir, &out.path), &out.bytes))?;

    info!(
        dir = %dir.display(),
        files = outputs.len(),
        diagnostics = diagnostics.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "saved graph"
    );
    Ok(diagnostics)
}

fn render(graph: &EntityGraph, config: &SaveConfig, diags: &mut Diagnostics) -> Result<Vec<Output>> {
    if config.layout == SaveLayout::Patient && graph.patients.len() != 1 {
        return Err(Error::Config(format!(
            "patient layout needs exactly one patient, graph has {}",
            graph.patients.len()
        )));
    }

    let mut outputs = Vec::new();
    if let Some(institution) = &graph.institution {
        match config.layout {
            SaveLayout::Institution => push_text(
                &mut outputs,
                INSTITUTION_FILE.to_owned(),
                &root_document(institution),
                config,
                diags,
            ),
            SaveLayout::Patient => debug!("patient layout: not writing the Institution file"),
        }
    }
    for patient in &graph.patients {
        let patient_dir = match config.layout {
            SaveLayout::Institution => patient_folder(patient.patient_id),
            SaveLayout::Patient => String::new(),
        };
        render_patient(patient, &patient_dir, config, &mut outputs, diags)?;
    }
    Ok(outputs)
}

fn render_patient(
    patient: &Patient,
    dir: &str,
    config: &SaveConfig,
    outputs: &mut Vec<Output>,
    diags: &mut Diagnostics,
) -> Result<()> {
    push_text(outputs, join(dir, PATIENT_FILE), &root_document(patient), config, diags);
    for image_set in patient.image_sets().iter() {
        render_image_set(image_set, dir, config, outputs, diags);
    }
    for plan in patient.plans().iter() {
        let plan_dir = join(dir, &plan_folder(plan.plan_id));
        render_plan(plan, &plan_dir, config, outputs, diags)?;
    }
    Ok(())
}

fn render_image_set(
    image_set: &ImageSet,
    dir: &str,
    config: &SaveConfig,
    outputs: &mut Vec<Output>,
    diags: &mut Diagnostics,
) {
    let stem = image_set_stem(image_set.image_set_id);
    let header = join(dir, &format!("{}{}", stem, IMAGE_HEADER_SUFFIX));
    push_text(outputs, header, &root_document(image_set), config, diags);
    let slices = image_set.image_info();
    if !slices.is_empty() || !slices.extras.is_empty() {
        let doc = collection_document("ImageInfo", slices.iter(), &slices.extras);
        let info = join(dir, &format!("{}{}", stem, IMAGE_INFO_SUFFIX));
        push_text(outputs, info, &doc, config, diags);
    }
}

fn render_plan(
    plan: &Plan,
    dir: &str,
    config: &SaveConfig,
    outputs: &mut Vec<Output>,
    diags: &mut Diagnostics,
) -> Result<()> {
    let trials = plan.trials();
    if !trials.is_empty() || !trials.extras.is_empty() {
        let doc = collection_document("Trial", trials.iter(), &trials.extras);
        push_text(outputs, join(dir, TRIAL_FILE), &doc, config, diags);
    }
    let points = plan.points();
    if !points.is_empty() || !points.extras.is_empty() {
        let doc = collection_document("Poi", points.iter(), &points.extras);
        push_text(outputs, join(dir, POINTS_FILE), &doc, config, diags);
    }
    if let Some(setup) = plan.setup() {
        push_text(outputs, join(dir, SETUP_FILE), &root_document(setup), config, diags);
    }
    let machines = plan.machines();
    if !machines.is_empty() || !machines.extras.is_empty() {
        let doc = collection_document("Machine", machines.iter(), &machines.extras);
        push_text(outputs, join(dir, MACHINES_FILE), &doc, config, diags);
    }

    for (ti, trial) in trials.iter().enumerate() {
        let grid_dims = trial.dose_grid().map(|grid| grid.dims());
        for (bi, beam) in trial.beams().iter().enumerate() {
            let Some(volume) = &beam.dose else {
                continue;
            };
            let path = format!("Trial[{}].BeamList.Beam[{}]", ti, bi);
            let Some(name) = beam.dose_file_name() else {
                diags.push(
                    Diagnostic::new(
                        DiagnosticKind::BinaryFormat,
                        format!("beam '{}' has a dose volume but no DoseVolume file", beam.name),
                    )
                    .in_file(join(dir, TRIAL_FILE))
                    .with_path(path),
                );
                continue;
            };
            let dims = volume.dims();
            if grid_dims != Some(dims) {
                warn!(beam = %beam.name, "dose volume does not match the trial DoseGrid");
                diags.push(
                    Diagnostic::new(
                        DiagnosticKind::BinaryFormat,
                        format!(
                            "beam '{}' dose is {}x{}x{}, which does not match the trial DoseGrid",
                            beam.name, dims.nx, dims.ny, dims.nz
                        ),
                    )
                    .in_file(join(dir, &name))
                    .with_path(path),
                );
                continue;
            }
            outputs.push(Output {
                path: join(dir, &name),
                bytes: volume.to_bytes(&config.grid)?,
            });
        }
    }
    Ok(())
}

fn push_text(
    outputs: &mut Vec<Output>,
    path: String,
    doc: &Document,
    config: &SaveConfig,
    diags: &mut Diagnostics,
) {
    match canonicalize_with_config(doc, &config.canonical) {
        Ok(text) => outputs.push(Output {
            path,
            bytes: text.into_bytes(),
        }),
        Err(err) => {
            warn!(file = %path, "skipping file: {}", err);
            diags.push(Diagnostic::from(&err).in_file(path));
        }
    }
}

fn target_path(dir: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(dir.to_path_buf(), |acc, part| acc.join(part))
}

/// Writes `bytes` to a staging file next to `target` and renames it over
/// `target`.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    debug!(file = %target.display(), bytes = bytes.len(), "wrote");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinn_model::{ImageInfo, Institution};

    #[test]
    fn test_write_atomic_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub/Patient");
        write_atomic(&target, b"PatientID = 1;\n").unwrap();
        write_atomic(&target, b"PatientID = 2;\n").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"PatientID = 2;\n");
        let leftovers = fs::read_dir(dir.path().join("sub")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_target_path() {
        let path = target_path(Path::new("/tmp/out"), "Patient_1/Plan_0/plan.Trial");
        assert_eq!(path, Path::new("/tmp/out/Patient_1/Plan_0/plan.Trial"));
    }

    #[test]
    fn test_patient_layout_needs_one_patient() {
        let graph = EntityGraph::new();
        let config = SaveConfig::new().with_layout(SaveLayout::Patient);
        let err = render(&graph, &config, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_render_patient_layout_paths() {
        let mut patient = Patient::new(7);
        patient.plans_mut().push(Plan::new(0));
        let mut graph = EntityGraph::new();
        graph.patients.push(patient);

        let mut diags = Diagnostics::new();
        let institution = render(&graph, &SaveConfig::new(), &mut diags).unwrap();
        assert_eq!(institution[0].path, "Patient_7/Patient");

        let config = SaveConfig::new().with_layout(SaveLayout::Patient);
        let flat = render(&graph, &config, &mut diags).unwrap();
        let paths: Vec<_> = flat.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["Patient"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_render_institution_and_image_sets() {
        let mut image_set = ImageSet::new(2);
        image_set.x_dim = Some(4);
        image_set.image_info_mut().push(ImageInfo::new());
        let mut patient = Patient::new(7);
        patient.image_sets_mut().push(image_set);
        patient.image_sets_mut().push(ImageSet::new(5));
        let mut graph = EntityGraph::new();
        graph.institution = Some(Institution::new());
        graph.patients.push(patient);

        let mut diags = Diagnostics::new();
        let outputs = render(&graph, &SaveConfig::new(), &mut diags).unwrap();
        let paths: Vec<_> = outputs.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Institution",
                "Patient_7/Patient",
                "Patient_7/ImageSet_2.header",
                "Patient_7/ImageSet_2.ImageInfo",
                "Patient_7/ImageSet_5.header",
            ]
        );

        let config = SaveConfig::new().with_layout(SaveLayout::Patient);
        let flat = render(&graph, &config, &mut diags).unwrap();
        assert_eq!(flat[0].path, "Patient");
        assert!(diags.is_empty());
    }
}
