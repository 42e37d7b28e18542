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

//! Resource limits for record parsing.

/// Configurable limits for parser security.
///
/// These bound the resources one document may consume. Exceeding any of them
/// aborts the parse of that document with a [`crate::ErrorKind::Limit`] error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum input size in bytes (default: 1GB).
    pub max_file_size: usize,
    /// Maximum block nesting depth (default: 1000).
    pub max_depth: usize,
    /// Maximum number of statements in one document (default: 10M).
    pub max_statements: usize,
    /// Maximum number of values in one numeric array (default: 100M).
    pub max_array_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024, // 1GB
            max_depth: 1000,
            max_statements: 10_000_000,
            max_array_len: 100_000_000,
        }
    }
}

impl Limits {
    /// Create limits with no restrictions (for testing).
    pub fn unlimited() -> Self {
        Self {
            max_file_size: usize::MAX,
            max_depth: usize::MAX,
            max_statements: usize::MAX,
            max_array_len: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_file_size, 1024 * 1024 * 1024);
        assert_eq!(limits.max_depth, 1000);
        assert_eq!(limits.max_statements, 10_000_000);
    }

    #[test]
    fn test_unlimited() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_depth, usize::MAX);
        assert_eq!(limits.max_array_len, usize::MAX);
    }
}
