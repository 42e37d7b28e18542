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

//! Batch loading.
//!
//! A load lists the scope, groups files into patient directories, and
//! issues one job per `Patient` file, image set and plan folder, plus one
//! for the `Institution` file, to a bounded worker pool. Dose binaries of a plan are decoded in parallel inside
//! its job. References are resolved once every job has finished.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use pinn_core::{parse_with_options, Diagnostic, DiagnosticKind, Diagnostics, Document};
use pinn_grid::{GridDims, GridError, Volume};
use pinn_model::{
    map_collection, map_root, resolve, Collection, Entity, EntityGraph, ImageInfo, ImageSet,
    Institution, Machine, Patient, PatientSetup, Plan, Point, Trial,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::layout::{
    discover, image_set_stem, institution_file, join, plan_folder, ImageSetFiles, PatientFiles,
    PlanFiles,
};
use crate::provider::{FileProvider, FsProvider};

/// Loads an institution or patient directory from disk.
pub fn load(path: impl AsRef<Path>, config: &LoadConfig) -> Result<(EntityGraph, Diagnostics)> {
    let provider = FsProvider::new(path.as_ref());
    load_from(&provider, "", config)
}

/// Loads every patient below `scope` of `provider`.
///
/// Returns the resolved graph and everything that was skipped along the
/// way. Provider I/O errors abort the load unchanged; cancellation returns
/// [`Error::Cancelled`] once in-flight documents have finished.
pub fn load_from(
    provider: &dyn FileProvider,
    scope: &str,
    config: &LoadConfig,
) -> Result<(EntityGraph, Diagnostics)> {
    let start = Instant::now();
    let files = provider.list_files(scope)?;
    let layout = discover(&files);
    let institution = institution_file(&files);
    let jobs: Vec<Job> = institution
        .map(|path| Job::Institution(path.as_str()))
        .into_iter()
        .chain(layout.iter().enumerate().flat_map(|(index, patient)| {
            std::iter::once(Job::Patient(index))
                .chain(patient.image_sets.keys().map(move |&id| Job::ImageSet(index, id)))
                .chain(patient.plans.keys().map(move |&id| Job::Plan(index, id)))
        }))
        .collect();
    debug!(scope, files = files.len(), patients = layout.len(), jobs = jobs.len(), "discovered");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_workers)
        .build()
        .map_err(|e| Error::Config(format!("failed to create worker pool: {}", e)))?;

    let loader = Loader {
        provider,
        config,
        processed: AtomicUsize::new(0),
    };
    let outcomes: Vec<Option<Result<Outcome>>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                if config.is_cancelled() {
                    return None;
                }
                Some(loader.run(job, &layout))
            })
            .collect()
    });

    if config.is_cancelled() {
        info!(scope, "load cancelled");
        return Err(Error::Cancelled);
    }

    let mut patients: Vec<Option<Patient>> = (0..layout.len()).map(|_| None).collect();
    let mut plans = Vec::new();
    let mut image_sets = Vec::new();
    let mut graph = EntityGraph::new();
    let mut diagnostics = Diagnostics::new();
    for outcome in outcomes {
        match outcome.ok_or(Error::Cancelled)?? {
            Outcome::Institution { institution, diags } => {
                diagnostics.extend(diags);
                graph.institution = institution;
            }
            Outcome::Patient { index, patient, diags } => {
                diagnostics.extend(diags);
                patients[index] = patient;
            }
            Outcome::ImageSet { index, image_set, diags } => {
                diagnostics.extend(diags);
                image_sets.extend(image_set.map(|set| (index, set)));
            }
            Outcome::Plan { index, parts, diags } => {
                diagnostics.extend(diags);
                plans.push((index, parts));
            }
        }
    }

    for (index, parts) in plans {
        match patients[index].as_mut() {
            Some(patient) => attach(patient, parts),
            None => {
                let folder = join(&layout[index].dir, &plan_folder(parts.plan_id));
                warn!(dir = %folder, "owning patient was dropped; skipping plan folder");
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::Schema,
                        format!("plan folder '{}' skipped: owning patient was dropped", folder),
                    )
                    .in_file(folder)
                    .with_path(plan_folder(parts.plan_id)),
                );
            }
        }
    }

    for (index, image_set) in image_sets {
        match patients[index].as_mut() {
            Some(patient) => patient.image_sets_mut().push(image_set),
            None => {
                let stem = image_set.file_stem();
                let file = join(&layout[index].dir, &stem);
                warn!(file = %file, "owning patient was dropped; skipping image set");
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::Schema,
                        format!("image set '{}' skipped: owning patient was dropped", file),
                    )
                    .in_file(file)
                    .with_path(stem),
                );
            }
        }
    }

    graph.patients = patients.into_iter().flatten().collect();
    diagnostics.extend(resolve(&mut graph));

    info!(
        files = loader.processed.load(Ordering::Relaxed),
        patients = graph.patients.len(),
        diagnostics = diagnostics.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded batch"
    );
    Ok((graph, diagnostics))
}

enum Job<'f> {
    Institution(&'f str),
    Patient(usize),
    ImageSet(usize, i64),
    Plan(usize, i64),
}

enum Outcome {
    Institution {
        institution: Option<Institution>,
        diags: Diagnostics,
    },
    Patient {
        index: usize,
        patient: Option<Patient>,
        diags: Diagnostics,
    },
    ImageSet {
        index: usize,
        image_set: Option<ImageSet>,
        diags: Diagnostics,
    },
    Plan {
        index: usize,
        parts: PlanParts,
        diags: Diagnostics,
    },
}

/// Everything read from one plan folder.
struct PlanParts {
    plan_id: i64,
    trials: Option<Collection<Trial>>,
    points: Option<Collection<Point>>,
    setup: Option<PatientSetup>,
    machines: Option<Collection<Machine>>,
}

enum GridRead {
    Loaded(Volume),
    Missing,
    Invalid(GridError),
}

struct Loader<'a> {
    provider: &'a dyn FileProvider,
    config: &'a LoadConfig,
    processed: AtomicUsize,
}

impl<'a> Loader<'a> {
    fn run(&self, job: &Job<'_>, layout: &[PatientFiles]) -> Result<Outcome> {
        match *job {
            Job::Institution(path) => {
                let mut diags = Diagnostics::new();
                let institution = match self.parse_file(path, &mut diags)? {
                    Some(doc) => self.map_single::<Institution>(&doc, path, &mut diags),
                    None => None,
                };
                Ok(Outcome::Institution { institution, diags })
            }
            Job::ImageSet(index, image_set_id) => {
                let mut diags = Diagnostics::new();
                let image_set = match layout[index].image_sets.get(&image_set_id) {
                    Some(files) => self.load_image_set(files, &mut diags)?,
                    None => None,
                };
                Ok(Outcome::ImageSet {
                    index,
                    image_set,
                    diags,
                })
            }
            Job::Patient(index) => {
                let mut diags = Diagnostics::new();
                let patient = self.load_patient(&layout[index], &mut diags)?;
                Ok(Outcome::Patient {
                    index,
                    patient,
                    diags,
                })
            }
            Job::Plan(index, plan_id) => {
                let mut diags = Diagnostics::new();
                let parts = match layout[index].plans.get(&plan_id) {
                    Some(files) => self.load_plan(files, &mut diags)?,
                    None => PlanParts::empty(plan_id),
                };
                Ok(Outcome::Plan {
                    index,
                    parts,
                    diags,
                })
            }
        }
    }

    /// Reads and parses one file. A file that cannot be parsed at all is
    /// reported and skipped, unless parsing is strict.
    fn parse_file(&self, path: &str, diags: &mut Diagnostics) -> Result<Option<Document>> {
        let start = Instant::now();
        let bytes = self.provider.read_all(path)?;
        self.processed.fetch_add(1, Ordering::Relaxed);
        match parse_with_options(&bytes, &self.config.parse) {
            Ok(parsed) => {
                debug!(
                    file = %path,
                    statements = parsed.document.statement_count(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "parsed"
                );
                let mut found = parsed.diagnostics;
                found.attach_file(path);
                diags.extend(found);
                Ok(Some(parsed.document))
            }
            Err(err) if self.config.parse.strict => {
                warn!(file = %path, "strict parse failed: {}", err);
                Err(Error::Parse(err))
            }
            Err(err) => {
                warn!(file = %path, "dropping file: {}", err);
                diags.push(Diagnostic::from(&err).in_file(path));
                Ok(None)
            }
        }
    }

    fn load_patient(&self, files: &PatientFiles, diags: &mut Diagnostics) -> Result<Option<Patient>> {
        let Some(doc) = self.parse_file(&files.patient, diags)? else {
            return Ok(None);
        };
        Ok(self.map_single::<Patient>(&doc, &files.patient, diags))
    }

    /// The header fields and the slice records. A header that fails its
    /// schema drops the image set; without a header file only the slices
    /// are kept.
    fn load_image_set(
        &self,
        files: &ImageSetFiles,
        diags: &mut Diagnostics,
    ) -> Result<Option<ImageSet>> {
        let mut image_set = match &files.header {
            Some(path) => match self.parse_file(path, diags)? {
                Some(doc) => match self.map_single::<ImageSet>(&doc, path, diags) {
                    Some(image_set) => image_set,
                    None => return Ok(None),
                },
                None => return Ok(None),
            },
            None => {
                debug!(image_set = %image_set_stem(files.image_set_id), "no header file");
                ImageSet::new(files.image_set_id)
            }
        };
        image_set.image_set_id = files.image_set_id;
        if let Some(path) = &files.info {
            if let Some(doc) = self.parse_file(path, diags)? {
                let records: Collection<ImageInfo> =
                    self.map_records(&doc, path, "ImageInfoList", "ImageInfo", diags);
                let list = image_set.image_info_mut();
                for info in records.items {
                    list.push(info);
                }
                list.extras = records.extras;
            }
        }
        Ok(Some(image_set))
    }

    fn load_plan(&self, files: &PlanFiles, diags: &mut Diagnostics) -> Result<PlanParts> {
        let mut parts = PlanParts::empty(files.plan_id);
        if let Some(path) = &files.trial {
            if let Some(doc) = self.parse_file(path, diags)? {
                parts.trials = Some(self.map_records(&doc, path, "TrialList", "Trial", diags));
            }
        }
        if let Some(path) = &files.points {
            if let Some(doc) = self.parse_file(path, diags)? {
                parts.points = Some(self.map_records(&doc, path, "PoiList", "Poi", diags));
            }
        }
        if let Some(path) = &files.setup {
            if let Some(doc) = self.parse_file(path, diags)? {
                parts.setup = self.map_single::<PatientSetup>(&doc, path, diags);
            }
        }
        if let Some(path) = &files.machines {
            if let Some(doc) = self.parse_file(path, diags)? {
                parts.machines = Some(self.map_records(&doc, path, "MachineList", "Machine", diags));
            }
        }
        if self.config.load_dose {
            if let Some(trials) = parts.trials.as_mut() {
                self.load_doses(files, &mut trials.items, diags)?;
            }
        }
        Ok(parts)
    }

    fn map_single<T: Entity>(&self, doc: &Document, path: &str, diags: &mut Diagnostics) -> Option<T> {
        let mut mapped = Diagnostics::new();
        let entity = match map_root::<T>(doc, &mut mapped) {
            Ok(entity) => Some(entity),
            Err(err) => {
                warn!(file = %path, entity = T::TYPE_NAME, "dropping entity: {}", err);
                mapped.push(err.to_diagnostic());
                None
            }
        };
        mapped.attach_file(path);
        diags.extend(mapped);
        entity
    }

    fn map_records<T: Entity>(
        &self,
        doc: &Document,
        path: &str,
        wrapper: &str,
        item: &str,
        diags: &mut Diagnostics,
    ) -> Collection<T> {
        let mut mapped = Diagnostics::new();
        let records = map_collection(doc, wrapper, item, &mut mapped);
        mapped.attach_file(path);
        diags.extend(mapped);
        records
    }

    /// Attaches each beam's decoded dose. A bad binary costs only that
    /// beam's dose.
    fn load_doses(&self, files: &PlanFiles, trials: &mut [Trial], diags: &mut Diagnostics) -> Result<()> {
        for (ti, trial) in trials.iter_mut().enumerate() {
            let wanted: Vec<(usize, String)> = trial
                .beams()
                .iter()
                .enumerate()
                .filter_map(|(bi, beam)| beam.dose_file_name().map(|name| (bi, name)))
                .collect();
            if wanted.is_empty() {
                continue;
            }
            let Some(dims) = trial.dose_grid().map(|grid| grid.dims()) else {
                diags.push(
                    Diagnostic::new(
                        DiagnosticKind::BinaryFormat,
                        format!("trial '{}' names dose files but has no DoseGrid", trial.name),
                    )
                    .in_file(files.trial.clone().unwrap_or_default())
                    .with_path(format!("Trial[{}]", ti)),
                );
                continue;
            };

            let reads: Vec<(usize, String, Result<GridRead>)> = wanted
                .par_iter()
                .map(|(bi, name)| {
                    let path = files.path_of(name);
                    let read = self.read_grid(files, name, &path, dims);
                    (*bi, path, read)
                })
                .collect();

            for (bi, path, read) in reads {
                let beam_path = format!("Trial[{}].BeamList.Beam[{}]", ti, bi);
                match read? {
                    GridRead::Loaded(volume) => {
                        if let Some(mut beam) = trial.beams_mut().get_mut(bi) {
                            beam.dose = Some(volume);
                        }
                    }
                    GridRead::Missing => {
                        warn!(file = %path, "dose file not found");
                        diags.push(
                            Diagnostic::new(DiagnosticKind::Io, "dose file not found")
                                .in_file(path)
                                .with_path(beam_path),
                        );
                    }
                    GridRead::Invalid(err) => {
                        warn!(file = %path, "dropping dose grid: {}", err);
                        diags.push(
                            Diagnostic::new(DiagnosticKind::BinaryFormat, err.to_string())
                                .in_file(path)
                                .with_path(beam_path),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn read_grid(&self, files: &PlanFiles, name: &str, path: &str, dims: GridDims) -> Result<GridRead> {
        if !files.contains(name) {
            return Ok(GridRead::Missing);
        }
        let start = Instant::now();
        let bytes = self.provider.read_all(path)?;
        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(match Volume::from_bytes(&bytes, dims, &self.config.grid) {
            Ok(volume) => {
                debug!(
                    file = %path,
                    bytes = bytes.len(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "decoded dose"
                );
                GridRead::Loaded(volume)
            }
            Err(err) => GridRead::Invalid(err),
        })
    }
}

impl PlanParts {
    fn empty(plan_id: i64) -> Self {
        Self {
            plan_id,
            trials: None,
            points: None,
            setup: None,
            machines: None,
        }
    }
}

/// Moves one plan folder's entities under the matching plan, adding the
/// plan when the `Patient` file does not list it.
fn attach(patient: &mut Patient, parts: PlanParts) {
    let plans = patient.plans_mut();
    let index = match plans.iter().position(|p| p.plan_id == parts.plan_id) {
        Some(index) => index,
        None => {
            debug!(plan_id = parts.plan_id, "plan folder not listed in Patient");
            plans.push(Plan::new(parts.plan_id));
            plans.len() - 1
        }
    };
    let Some(mut plan) = plans.get_mut(index) else {
        return;
    };
    if let Some(trials) = parts.trials {
        let list = plan.trials_mut();
        for trial in trials.items {
            list.push(trial);
        }
        list.extras = trials.extras;
    }
    if let Some(points) = parts.points {
        let list = plan.points_mut();
        for point in points.items {
            list.push(point);
        }
        list.extras = points.extras;
    }
    if let Some(machines) = parts.machines {
        let list = plan.machines_mut();
        for machine in machines.items {
            list.push(machine);
        }
        list.extras = machines.extras;
    }
    if let Some(setup) = parts.setup {
        plan.setup_slot().set(setup);
    }
}
