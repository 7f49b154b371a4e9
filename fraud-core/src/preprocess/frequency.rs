//! Frequency encoding for high-cardinality identifiers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::FieldValue;

/// Maps each identifier to the number of times it occurred in the
/// training data. Unseen or missing identifiers map to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEncoder {
    counts: BTreeMap<String, u64>,
}

impl FrequencyEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a FieldValue>) -> Self {
        let mut counts = BTreeMap::new();
        for value in values {
            if let Some(key) = value.as_text() {
                *counts.entry(key.into_owned()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn encode(&self, value: &FieldValue) -> f64 {
        value
            .as_text()
            .and_then(|key| self.counts.get(key.as_ref()))
            .map_or(0.0, |&count| count as f64)
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}
