//! Missing-value imputation for training data
//!
//! Numeric columns fill with the column median over the loaded dataset,
//! categorical and identifier columns fill with the `"unknown"` sentinel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::{FieldValue, RawRecord};
use crate::schema::{FieldKind, Schema, UNKNOWN_CATEGORY};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: BTreeMap<String, f64>,
}

impl MedianImputer {
    /// Compute medians for every non-derived numeric field of `schema`
    pub fn fit(schema: &Schema, records: &[RawRecord]) -> Self {
        let mut medians = BTreeMap::new();

        for field in schema.fields() {
            if field.kind != FieldKind::Numeric || schema.is_derived(field.name) {
                continue;
            }

            let mut values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(field.name).and_then(FieldValue::as_number))
                .filter(|v| v.is_finite())
                .collect();

            medians.insert(field.name.to_string(), median(&mut values).unwrap_or(0.0));
        }

        Self { medians }
    }

    pub fn median_of(&self, column: &str) -> Option<f64> {
        self.medians.get(column).copied()
    }

    /// Fill missing cells in place. Returns the number of cells filled.
    pub fn apply(&self, schema: &Schema, record: &mut RawRecord) -> usize {
        let mut filled = 0;

        for field in schema.fields() {
            if schema.is_derived(field.name) {
                continue;
            }
            let missing = record.get(field.name).map_or(true, FieldValue::is_missing);
            if !missing {
                continue;
            }

            match field.kind {
                FieldKind::Numeric => {
                    record.insert(field.name, self.median_of(field.name).unwrap_or(0.0));
                }
                FieldKind::Categorical | FieldKind::Frequency => {
                    record.insert(field.name, UNKNOWN_CATEGORY);
                }
            }
            filled += 1;
        }

        filled
    }
}

/// Median with midpoint averaging for even counts
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DatasetVariant;

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_fill_numeric_with_median_and_categorical_with_sentinel() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let records = vec![
            RawRecord::new().with("amount", 10.0).with("type", "PAYMENT"),
            RawRecord::new().with("amount", 30.0).with("type", "CASH_OUT"),
            RawRecord::new().with("amount", 20.0).with("type", "PAYMENT"),
        ];
        let imputer = MedianImputer::fit(&schema, &records);
        assert_eq!(imputer.median_of("amount"), Some(20.0));
        assert_eq!(imputer.median_of("balance_ratio"), None);

        let mut record = RawRecord::new().with("amount", FieldValue::Missing);
        imputer.apply(&schema, &mut record);

        assert_eq!(record.get("amount"), Some(&FieldValue::Number(20.0)));
        assert_eq!(record.get("type"), Some(&FieldValue::Text("unknown".into())));
        // absent numeric columns with no observations fall back to 0
        assert_eq!(record.get("oldbalanceOrg"), Some(&FieldValue::Number(0.0)));
        assert!(record.get("delta_balance_org").is_none());
    }
}
