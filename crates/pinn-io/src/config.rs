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

//! Load and save configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pinn_c14n::CanonicalConfig;
use pinn_core::ParseOptions;
use pinn_grid::GridOptions;

use crate::error::{Error, Result};

/// Shared flag that stops a load from issuing further documents.
///
/// Clones share the flag. Documents already being parsed finish; the load
/// then returns [`Error::Cancelled`] rather than a partial graph.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Options for [`load`](crate::load).
///
/// # Examples
///
/// ```
/// use pinn_io::LoadConfig;
///
/// let config = LoadConfig::builder().max_workers(2).load_dose(false).build().unwrap();
/// assert_eq!(config.max_workers, 2);
/// assert!(!config.load_dose);
/// ```
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Size of the worker pool. Default: available parallelism
    pub max_workers: usize,
    /// Decode beam dose binaries. Default: true
    pub load_dose: bool,
    pub parse: ParseOptions,
    pub grid: GridOptions,
    pub cancel: Option<CancellationToken>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            load_dose: true,
            parse: ParseOptions::default(),
            grid: GridOptions::default(),
            cancel: None,
        }
    }
}

impl LoadConfig {
    pub fn builder() -> LoadConfigBuilder {
        LoadConfigBuilder::new()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// Builder for [`LoadConfig`].
#[derive(Debug, Clone, Default)]
pub struct LoadConfigBuilder {
    config: LoadConfig,
}

impl LoadConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    pub fn load_dose(mut self, load: bool) -> Self {
        self.config.load_dose = load;
        self
    }

    pub fn parse(mut self, options: ParseOptions) -> Self {
        self.config.parse = options;
        self
    }

    pub fn grid(mut self, options: GridOptions) -> Self {
        self.config.grid = options;
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Fails when `max_workers` is zero.
    pub fn build(self) -> Result<LoadConfig> {
        if self.config.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".into()));
        }
        Ok(self.config)
    }
}

/// Where [`save`](crate::save) puts each patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveLayout {
    /// One `Patient_<PatientID>/` directory per patient.
    #[default]
    Institution,
    /// The target directory is the patient directory. The graph must hold
    /// exactly one patient.
    Patient,
}

/// Options for [`save`](crate::save).
#[derive(Debug, Clone, Default)]
pub struct SaveConfig {
    pub canonical: CanonicalConfig,
    pub grid: GridOptions,
    pub layout: SaveLayout,
}

impl SaveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: SaveLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_grid(mut self, grid: GridOptions) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_canonical(mut self, canonical: CanonicalConfig) -> Self {
        self.canonical = canonical;
        self
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
