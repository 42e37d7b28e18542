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

//! Loading and saving whole Pinnacle patient directories.
//!
//! [`load`] reads an institution or patient directory into a resolved
//! [`EntityGraph`](pinn_model::EntityGraph) plus the
//! [`Diagnostics`](pinn_core::Diagnostics) for everything that had to be
//! skipped. [`save`] writes a graph back in the same layout, one atomic
//! replace per file.
//!
//! Files come from a [`FileProvider`]; [`FsProvider`] reads local disk and
//! [`MemoryProvider`] serves an in-memory tree.
//!
//! ```no_run
//! use pinn_io::{load, save, LoadConfig, SaveConfig};
//!
//! # fn main() -> pinn_io::Result<()> {
//! let (graph, diagnostics) = load("/data/Institution_1", &LoadConfig::default())?;
//! for diag in &diagnostics {
//!     eprintln!("{}", diag);
//! }
//! save(&graph, "/tmp/out", &SaveConfig::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure policy
//!
//! | Problem                             | Effect                                  |
//! |-------------------------------------|-----------------------------------------|
//! | Malformed statement or block        | Skipped, `Syntax`/`Lex` diagnostic      |
//! | Missing or mistyped required field  | Entity dropped, `Schema` diagnostic     |
//! | Dose binary of the wrong length     | Beam has no dose, `BinaryFormat` diagnostic |
//! | Dangling named reference            | Link left empty, `Reference` diagnostic |
//! | Provider I/O error                  | `Error::Io`, load aborted               |

mod config;
mod error;
mod json;
pub mod layout;
mod load;
mod provider;
mod save;

pub use config::{CancellationToken, LoadConfig, LoadConfigBuilder, SaveConfig, SaveLayout};
pub use error::{Error, Result};
pub use json::{to_json, to_json_string};
pub use load::{load, load_from};
pub use provider::{FileProvider, FsProvider, MemoryProvider};
pub use save::save;
