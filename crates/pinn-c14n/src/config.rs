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

//! Canonicalization configuration.

/// Quoting strategy for bareword values.
///
/// Quoted text is always written quoted. This only decides what happens to
/// barewords such as `ON` or `\XDR:8\`.
///
/// ```
/// use pinn_c14n::{CanonicalConfig, QuotingStrategy};
///
/// let config = CanonicalConfig::new().with_quoting(QuotingStrategy::Always);
/// assert_eq!(config.quoting, QuotingStrategy::Always);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QuotingStrategy {
    /// Barewords stay bare unless they would not read back as the same
    /// bareword (empty, containing delimiters or whitespace, or looking like
    /// a number or `null`).
    #[default]
    Preserve,

    /// Quote every bareword.
    Always,
}

/// Configuration for canonical output.
///
/// ```
/// use pinn_c14n::CanonicalConfig;
///
/// let config = CanonicalConfig::default();
/// assert_eq!(config.indent, 2);
/// assert_eq!(config.array_values_per_line, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CanonicalConfig {
    /// Spaces per nesting level. Default: 2
    pub indent: usize,

    /// Bareword quoting. Default: [`QuotingStrategy::Preserve`]
    pub quoting: QuotingStrategy,

    /// How many numbers a `Points[]`-style array puts on one line.
    /// Contour and leaf data are pairs, hence the default of 2.
    pub array_values_per_line: usize,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            quoting: QuotingStrategy::Preserve,
            array_values_per_line: 2,
        }
    }
}

impl CanonicalConfig {
    /// Create a new configuration with all default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing a `CanonicalConfig`.
    pub fn builder() -> CanonicalConfigBuilder {
        CanonicalConfigBuilder::new()
    }

    /// Set the quoting strategy.
    pub fn with_quoting(mut self, quoting: QuotingStrategy) -> Self {
        self.quoting = quoting;
        self
    }

    /// Set the indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set the array wrap width. Zero puts the whole array on one line.
    pub fn with_array_values_per_line(mut self, count: usize) -> Self {
        self.array_values_per_line = count;
        self
    }
}

/// Builder for constructing a `CanonicalConfig` with a chainable API.
///
/// ```
/// use pinn_c14n::{CanonicalConfig, QuotingStrategy};
///
/// let config = CanonicalConfig::builder()
///     .indent(4)
///     .quoting(QuotingStrategy::Always)
///     .build();
/// assert_eq!(config.indent, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CanonicalConfigBuilder {
    config: CanonicalConfig,
}

impl CanonicalConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.config.indent = indent;
        self
    }

    pub fn quoting(mut self, quoting: QuotingStrategy) -> Self {
        self.config.quoting = quoting;
        self
    }

    pub fn array_values_per_line(mut self, count: usize) -> Self {
        self.config.array_values_per_line = count;
        self
    }

    pub fn build(self) -> CanonicalConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanonicalConfig::default();
        assert_eq!(config.indent, 2);
        assert_eq!(config.quoting, QuotingStrategy::Preserve);
        assert_eq!(config.array_values_per_line, 2);
    }

    #[test]
    fn test_builder_matches_default() {
        assert_eq!(CanonicalConfig::builder().build(), CanonicalConfig::default());
    }

    #[test]
    fn test_with_methods_chain() {
        let config = CanonicalConfig::new()
            .with_indent(0)
            .with_quoting(QuotingStrategy::Always)
            .with_array_values_per_line(3);
        assert_eq!(config.indent, 0);
        assert_eq!(config.quoting, QuotingStrategy::Always);
        assert_eq!(config.array_values_per_line, 3);
    }
}
