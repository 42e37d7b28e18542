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

//! The byte-stream boundary.
//!
//! Loading never touches the filesystem directly: it asks a
//! [`FileProvider`] for the files under a scope and opens them one by one.
//! Paths are relative to the provider's root and `/`-separated.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Source of record files.
pub trait FileProvider: Sync {
    /// Every file below `scope` (a directory path, `""` for the root), as
    /// full relative paths in a stable order.
    fn list_files(&self, scope: &str) -> io::Result<Vec<String>>;

    /// Opens one file for reading.
    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Reads a whole file.
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.open_read(path)?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Files on local disk below a root directory.
#[derive(Debug, Clone)]
pub struct FsProvider {
    root: PathBuf,
}

impl FsProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl FileProvider for FsProvider {
    fn list_files(&self, scope: &str) -> io::Result<Vec<String>> {
        let base = self.resolve(scope);
        if !base.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a directory: {}", base.display()),
            ));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            files.push(parts.join("/"));
        }
        Ok(files)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(File::open(self.resolve(path))?))
    }
}

/// Files held in memory, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<String>, B: Into<Vec<u8>>> FromIterator<(P, B)> for MemoryProvider {
    fn from_iter<I: IntoIterator<Item = (P, B)>>(iter: I) -> Self {
        let mut provider = Self::new();
        for (path, bytes) in iter {
            provider.insert(path, bytes);
        }
        provider
    }
}

impl FileProvider for MemoryProvider {
    fn list_files(&self, scope: &str) -> io::Result<Vec<String>> {
        let scope = scope.trim_matches('/');
        if scope.is_empty() {
            return Ok(self.files.keys().cloned().collect());
        }
        let prefix = format!("{}/", scope);
        let files: Vec<String> = self
            .files
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();
        if files.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a directory: {}", scope),
            ));
        }
        Ok(files)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        match self.files.get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // ==================== MemoryProvider tests ====================

    #[test]
    fn test_memory_list_scope() {
        let provider: MemoryProvider = [
            ("A/Patient", "x"),
            ("A/Plan_0/plan.Trial", "y"),
            ("AB/Patient", "z"),
        ]
        .into_iter()
        .collect();
        assert_eq!(provider.list_files("").unwrap().len(), 3);
        assert_eq!(
            provider.list_files("A").unwrap(),
            vec!["A/Patient", "A/Plan_0/plan.Trial"]
        );
    }

    #[test]
    fn test_memory_missing() {
        let provider = MemoryProvider::new();
        let err = provider.open_read("Patient").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(
            provider.list_files("nope").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_memory_read_all() {
        let mut provider = MemoryProvider::new();
        provider.insert("Patient", b"PatientID = 1;".to_vec());
        assert_eq!(provider.read_all("Patient").unwrap(), b"PatientID = 1;");
    }

    // ==================== FsProvider tests ====================

    #[test]
    fn test_fs_list_relative_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("P/Plan_0")).unwrap();
        fs::write(dir.path().join("P/Patient"), "a").unwrap();
        fs::write(dir.path().join("P/Plan_0/plan.Trial"), "b").unwrap();

        let provider = FsProvider::new(dir.path());
        assert_eq!(
            provider.list_files("").unwrap(),
            vec!["P/Patient", "P/Plan_0/plan.Trial"]
        );
        assert_eq!(provider.list_files("P/Plan_0").unwrap(), vec!["P/Plan_0/plan.Trial"]);
        assert_eq!(provider.read_all("P/Patient").unwrap(), b"a");
    }

    #[test]
    fn test_fs_missing_scope() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FsProvider::new(dir.path());
        assert_eq!(
            provider.list_files("missing").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
