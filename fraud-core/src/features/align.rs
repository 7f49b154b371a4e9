//! Aligned Row - a record reshaped to the exact schema layout
//!
//! Every prepared row, at training and serving time, goes through
//! `AlignedRow::from_record`. Column set and order come from the schema,
//! never from the input.

use serde::{Deserialize, Serialize};

use super::record::{FieldValue, RawRecord};
use crate::error::{CoreError, CoreResult};
use crate::schema::{FieldKind, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    values: Vec<FieldValue>,
}

impl AlignedRow {
    /// Reshape `record` to `schema`.
    ///
    /// - absent or null fields take the kind's default
    /// - text in a numeric field is an error
    /// - numbers in categorical/identifier fields are kept as text
    /// - columns not in the schema are ignored
    pub fn from_record(schema: &Schema, record: &RawRecord) -> CoreResult<Self> {
        let mut values = Vec::with_capacity(schema.len());

        for field in schema.fields() {
            let value = match record.get(field.name) {
                None | Some(FieldValue::Missing) => field.kind.default_value(),
                Some(value) => coerce(field.name, field.kind, value)?,
            };
            values.push(value);
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// (name, value) pairs in schema order
    pub fn named<'a>(
        &'a self,
        schema: &'a Schema,
    ) -> impl Iterator<Item = (&'static str, &'a FieldValue)> + 'a {
        schema.fields().iter().map(|f| f.name).zip(self.values.iter())
    }
}

fn coerce(column: &str, kind: FieldKind, value: &FieldValue) -> CoreResult<FieldValue> {
    match kind {
        FieldKind::Numeric => match value {
            FieldValue::Number(n) if n.is_finite() => Ok(FieldValue::Number(*n)),
            FieldValue::Number(_) => Err(CoreError::malformed(column, "non-finite number")),
            FieldValue::Text(s) => Err(CoreError::malformed(
                column,
                format!("expected a number, got '{}'", s),
            )),
            FieldValue::Missing => Ok(kind.default_value()),
        },
        FieldKind::Categorical | FieldKind::Frequency => Ok(value
            .as_text()
            .map(|s| FieldValue::Text(s.into_owned()))
            .unwrap_or_else(|| kind.default_value())),
    }
}
