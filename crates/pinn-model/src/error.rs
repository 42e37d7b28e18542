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

//! Schema errors raised while mapping a generic tree onto an entity.

use pinn_core::{Diagnostic, DiagnosticKind, SourcePos};
use thiserror::Error;

/// A missing or mistyped field. Fatal for the entity being mapped only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}.{field}: {message}")]
pub struct SchemaError {
    pub entity: &'static str,
    pub field: String,
    pub message: String,
    pub pos: Option<SourcePos>,
    /// Dotted path of the entity inside its document.
    pub path: String,
}

impl SchemaError {
    pub fn new(entity: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity,
            field: field.into(),
            message: message.into(),
            pos: None,
            path: String::new(),
        }
    }

    pub fn missing(entity: &'static str, field: &str) -> Self {
        Self::new(entity, field, "missing required field")
    }

    pub fn mistyped(entity: &'static str, field: &str, expected: &str, found: &str) -> Self {
        Self::new(entity, field, format!("expected {}, found {}", expected, found))
    }

    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Renders the error as a `Schema` diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(DiagnosticKind::Schema, self.to_string()).with_path(&*self.path);
        match self.pos {
            Some(pos) => diag.at(pos),
            None => diag,
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SchemaError::missing("Beam", "Name");
        assert_eq!(err.to_string(), "Beam.Name: missing required field");
    }

    #[test]
    fn test_diagnostic_carries_position_and_path() {
        let err = SchemaError::mistyped("DoseGrid", "Dimension.X", "integer", "text")
            .at(SourcePos::new(4, 7))
            .with_path("Trial[0].DoseGrid");
        let diag = err.to_diagnostic();
        assert_eq!(diag.kind, DiagnosticKind::Schema);
        assert_eq!(diag.location.line, 4);
        assert_eq!(diag.location.column, 7);
        assert_eq!(diag.location.path.as_deref(), Some("Trial[0].DoseGrid"));
        assert!(diag.message.contains("expected integer, found text"));
    }
}
