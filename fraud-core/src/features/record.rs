use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A single scalar cell of a transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Convert a JSON scalar. Booleans become 0/1, `null` becomes `Missing`.
    /// Arrays and objects are rejected.
    pub fn from_json(column: &str, value: &serde_json::Value) -> CoreResult<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(FieldValue::Missing),
            Value::Bool(b) => Ok(FieldValue::Number(if *b { 1.0 } else { 0.0 })),
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| CoreError::malformed(column, "number out of range")),
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => {
                Err(CoreError::malformed(column, "expected a scalar value"))
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used for categorical and identifier columns.
    /// Integral numbers print without a fractional part (`1234`, not `1234.0`).
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(Cow::Owned(format!("{}", *n as i64)))
            }
            FieldValue::Number(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Missing => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Raw transaction: column name → scalar.
/// Ordered map so that logging and serialization are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    values: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    /// Numeric value of a column, `default` when absent or missing.
    /// Text in a numeric column is an error.
    pub fn number_or(&self, column: &str, default: f64) -> CoreResult<f64> {
        match self.values.get(column) {
            None | Some(FieldValue::Missing) => Ok(default),
            Some(FieldValue::Number(n)) if n.is_finite() => Ok(*n),
            Some(FieldValue::Number(_)) => Err(CoreError::malformed(column, "non-finite number")),
            Some(FieldValue::Text(s)) => Err(CoreError::malformed(
                column,
                format!("expected a number, got '{}'", s),
            )),
        }
    }
}
