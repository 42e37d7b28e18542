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

//! Typed entities of a planning record.

macro_rules! entity_meta {
    () => {
        fn meta(&self) -> &$crate::meta::EntityMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut $crate::meta::EntityMeta {
            &mut self.meta
        }
    };
}

macro_rules! node_meta {
    ($name:expr) => {
        fn type_name(&self) -> &'static str {
            $name
        }

        fn id(&self) -> $crate::meta::EntityId {
            self.meta.id()
        }

        fn parent(&self) -> Option<$crate::meta::EntityId> {
            self.meta.parent()
        }
    };
}

/// `Clone` for an entity that owns children. The copy gets a fresh id and
/// its containers hold copies of the children, stamped with that id.
macro_rules! owning_clone {
    ($ty:ident { $($field:ident),* $(,)? } owns { $($owned:ident),+ $(,)? }) => {
        impl Clone for $ty {
            fn clone(&self) -> Self {
                let meta = self.meta.clone();
                let owner = meta.id();
                Self {
                    $($field: self.$field.clone(),)*
                    $($owned: self.$owned.clone_for(owner),)+
                    meta,
                }
            }
        }
    };
}

mod beam;
mod control_point;
mod image_set;
mod institution;
mod machine;
mod patient;
mod plan;
mod point;
mod setup;
mod trial;

pub use beam::{Beam, CpManager, MonitorUnitInfo};
pub use control_point::{ControlPoint, LeafPositions, RawData};
pub use image_set::{ImageInfo, ImageSet};
pub use institution::{Institution, PatientLite, PatientSummary};
pub use machine::Machine;
pub use patient::Patient;
pub use plan::Plan;
pub use point::Point;
pub use setup::{PatientSetup, SetupCode};
pub use trial::{DoseGrid, Prescription, Trial};
