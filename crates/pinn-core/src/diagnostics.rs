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

//! Non-fatal diagnostics collected during load and save.
//!
//! A diagnostic never invalidates the result it accompanies; callers decide
//! which kinds, if any, they treat as fatal.

use std::fmt;

use crate::error::{ErrorKind, PinnError};
use crate::lex::SourcePos;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    Lex,
    Syntax,
    Schema,
    Reference,
    BinaryFormat,
    Io,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "LexError"),
            Self::Syntax => write!(f, "SyntaxError"),
            Self::Schema => write!(f, "SchemaError"),
            Self::Reference => write!(f, "ReferenceError"),
            Self::BinaryFormat => write!(f, "BinaryFormatError"),
            Self::Io => write!(f, "IOError"),
        }
    }
}

impl From<ErrorKind> for DiagnosticKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Lex => Self::Lex,
            ErrorKind::Syntax | ErrorKind::Limit => Self::Syntax,
            ErrorKind::Schema => Self::Schema,
            ErrorKind::Reference => Self::Reference,
            ErrorKind::BinaryFormat => Self::BinaryFormat,
            ErrorKind::Io => Self::Io,
        }
    }
}

/// Where a diagnostic points: a file, a position in it, and the dotted key
/// path of the record (for example `Trial.BeamList.Beam[1]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub path: Option<String>,
}

impl Location {
    pub fn at(pos: SourcePos) -> Self {
        Self {
            file: None,
            line: pos.line(),
            column: pos.column(),
            path: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        write!(f, "{}:{}", self.line, self.column)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}

/// One non-fatal issue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: Location::default(),
            message: message.into(),
        }
    }

    pub fn at(mut self, pos: SourcePos) -> Self {
        self.location.line = pos.line();
        self.location.column = pos.column();
        self
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.location.file = Some(file.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !path.is_empty() {
            self.location.path = Some(path);
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.location, self.message)
    }
}

impl From<&PinnError> for Diagnostic {
    fn from(err: &PinnError) -> Self {
        Self {
            kind: err.kind.into(),
            location: Location {
                file: None,
                line: err.line,
                column: err.column.unwrap_or(0),
                path: err.context.clone(),
            },
            message: err.message.clone(),
        }
    }
}

impl From<&Diagnostic> for PinnError {
    fn from(diag: &Diagnostic) -> Self {
        let kind = match diag.kind {
            DiagnosticKind::Lex => ErrorKind::Lex,
            DiagnosticKind::Syntax => ErrorKind::Syntax,
            DiagnosticKind::Schema => ErrorKind::Schema,
            DiagnosticKind::Reference => ErrorKind::Reference,
            DiagnosticKind::BinaryFormat => ErrorKind::BinaryFormat,
            DiagnosticKind::Io => ErrorKind::Io,
        };
        let mut err = PinnError::new(kind, diag.message.clone(), diag.location.line)
            .with_column(diag.location.column);
        if let Some(path) = &diag.location.path {
            err = err.with_context(path.clone());
        }
        err
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Appends all of `other`, preserving its order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    /// True when anything beyond dangling references was reported, i.e.
    /// some input was dropped.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.kind != DiagnosticKind::Reference)
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sets `file` on every diagnostic that does not name one yet.
    pub fn attach_file(&mut self, file: &str) {
        for diag in &mut self.items {
            if diag.location.file.is_none() {
                diag.location.file = Some(file.to_owned());
            }
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(DiagnosticKind::Reference, "machine 'Linac2' not found")
            .at(SourcePos::new(14, 5))
            .in_file("Plan_0/plan.Trial")
            .with_path("Trial[0].BeamList.Beam[1]");
        assert_eq!(
            diag.to_string(),
            "ReferenceError at Plan_0/plan.Trial:14:5 (Trial[0].BeamList.Beam[1]): machine 'Linac2' not found"
        );
    }

    #[test]
    fn test_empty_path_ignored() {
        let diag = Diagnostic::new(DiagnosticKind::Syntax, "x").with_path("");
        assert!(diag.location.path.is_none());
    }

    #[test]
    fn test_of_kind_and_count() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::Syntax, "a"));
        diags.push(Diagnostic::new(DiagnosticKind::Reference, "b"));
        diags.push(Diagnostic::new(DiagnosticKind::Syntax, "c"));
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::Syntax), 2);
        let messages: Vec<_> = diags
            .of_kind(DiagnosticKind::Syntax)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages, vec!["a", "c"]);
    }

    #[test]
    fn test_has_errors_ignores_references() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::Reference, "dangling"));
        assert!(!diags.has_errors());
        diags.push(Diagnostic::new(DiagnosticKind::Schema, "missing"));
        assert!(diags.has_errors());
    }

    #[test]
    fn test_attach_file_keeps_existing() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::Syntax, "a"));
        diags.push(Diagnostic::new(DiagnosticKind::Syntax, "b").in_file("other"));
        diags.attach_file("Patient");
        let files: Vec<_> = diags
            .iter()
            .map(|d| d.location.file.as_deref().unwrap())
            .collect();
        assert_eq!(files, vec!["Patient", "other"]);
    }

    #[test]
    fn test_error_round_trip() {
        let err = PinnError::syntax("expected ';'", 4).with_column(9);
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.kind, DiagnosticKind::Syntax);
        let back = PinnError::from(&diag);
        assert_eq!(back, err);
    }
}
