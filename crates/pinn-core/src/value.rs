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

//! Scalar values of the generic tree.

use crate::lex::SourcePos;

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Empty value (`Key = ;`) or the bareword `null`.
    Null,
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Quoted string.
    Text(String),
    /// Unquoted bareword such as `ON` or `\XDR:8\`.
    Word(String),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string (quoted text or bareword).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Word(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a float; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Word(_) => "bareword",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Text(s) | Self::Word(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A scalar leaf: its value, the literal it was read from, and where.
///
/// `raw` keeps the exact lexical form of numbers and `null` so that a value
/// such as `1.50` or `007` is written back the way it was read. Equality
/// compares `value` only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scalar {
    pub value: Value,
    pub raw: Option<String>,
    pub pos: SourcePos,
}

impl Scalar {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            raw: None,
            pos: SourcePos::default(),
        }
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub fn word(word: impl Into<String>) -> Self {
        Self::new(Value::Word(word.into()))
    }

    /// Decodes a numeric literal, keeping its text as `raw`.
    ///
    /// Literals without a fraction or exponent that fit in an `i64` become
    /// [`Value::Int`]; everything else becomes [`Value::Float`].
    pub fn number(literal: &str, pos: SourcePos) -> Self {
        let integral = !literal.contains(['.', 'e', 'E']);
        let value = match integral.then(|| literal.parse::<i64>().ok()).flatten() {
            Some(n) => Value::Int(n),
            None => Value::Float(literal.parse::<f64>().unwrap_or(f64::NAN)),
        };
        Self {
            value,
            raw: Some(literal.to_owned()),
            pos,
        }
    }

    pub fn with_pos(mut self, pos: SourcePos) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_int() {
        let s = Scalar::number("-42", SourcePos::start());
        assert_eq!(s.value, Value::Int(-42));
        assert_eq!(s.raw.as_deref(), Some("-42"));
    }

    #[test]
    fn test_number_float_forms() {
        assert_eq!(Scalar::number("1.50", SourcePos::start()).value, Value::Float(1.5));
        assert_eq!(Scalar::number("1e3", SourcePos::start()).value, Value::Float(1000.0));
        assert_eq!(Scalar::number(".5", SourcePos::start()).value, Value::Float(0.5));
    }

    #[test]
    fn test_number_overflow_becomes_float() {
        let s = Scalar::number("99999999999999999999", SourcePos::start());
        assert!(matches!(s.value, Value::Float(_)));
    }

    #[test]
    fn test_equality_ignores_raw_and_pos() {
        let a = Scalar::number("1.50", SourcePos::new(3, 4));
        let b = Scalar::new(1.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Word("ON".into()).as_str(), Some("ON"));
        assert_eq!(Value::Text("a b".into()).as_str(), Some("a b"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Float(1.0).as_int(), None);
    }
}
