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

//! Typed entity model for planning records.
//!
//! The [`mapper`] turns the generic tree produced by [`pinn_core::parse`]
//! into typed entities ([`Patient`], [`Plan`], [`Trial`], [`Beam`], ...)
//! following a declarative [`EntitySchema`] per type, and rebuilds the tree
//! from them for writing. Unknown keys survive the trip in each entity's
//! extras.
//!
//! Ownership is strictly tree-shaped: owned children live in
//! [`OwnedList`] / [`OwnedSlot`] containers that stamp the owner's id on
//! every child. Cross-links such as a beam naming its machine are
//! [`NamedRef`]s, linked by [`resolve`] once a whole batch is mapped.
//!
//! ```
//! use pinn_core::{parse, Diagnostics};
//! use pinn_model::{map_entity, Entity, Machine};
//!
//! let parsed = parse(b"Name = \"Linac1\"; TolerateMUs = 1; Vendor = \"X\";").unwrap();
//! let mut diags = Diagnostics::new();
//! let machine: Machine = map_entity(&parsed.document.root, "", &mut diags).unwrap();
//! assert_eq!(machine.name, "Linac1");
//! assert_eq!(machine.tolerate_mus, Some(true));
//! assert!(machine.meta().extras.get("Vendor").is_some());
//! ```

mod entities;
mod error;
mod graph;
pub mod mapper;
mod meta;
mod owned;
mod reference;
mod resolver;
pub mod schema;

pub use entities::{
    Beam, ControlPoint, CpManager, DoseGrid, ImageInfo, ImageSet, Institution, LeafPositions,
    Machine, MonitorUnitInfo, Patient, PatientLite, PatientSetup, PatientSummary, Plan, Point,
    Prescription, RawData, SetupCode, Trial,
};
pub use error::{SchemaError, SchemaResult};
pub use graph::{walk, EntityGraph, EntityNode};
pub use mapper::{
    collection_document, map_collection, map_entity, map_root, root_document, write_entity,
    Collection, Entity, FieldReader, FieldWriter, Vec3,
};
pub use meta::{EntityId, EntityMeta, Extra, Extras};
pub use owned::{ChildMut, OwnedList, OwnedSlot};
pub use reference::NamedRef;
pub use resolver::{resolve, NameIndex};
pub use schema::{EntitySchema, FieldKind, FieldSpec, ItemKey};
