//! One-hot encoding for categorical columns

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::features::FieldValue;
use crate::schema::UNKNOWN_CATEGORY;

/// Categories seen at fit time, sorted.
/// Unseen categories at transform time encode as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a FieldValue>) -> Self {
        let categories: BTreeSet<String> = values.into_iter().map(category_of).collect();
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Index of the hot column, `None` for an unknown category
    pub fn position(&self, value: &FieldValue) -> Option<usize> {
        let category = category_of(value);
        self.categories.binary_search(&category).ok()
    }

    /// Write the block for `value` into `out` (which must be `width()` long)
    pub fn encode_into(&self, value: &FieldValue, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        if let Some(idx) = self.position(value) {
            out[idx] = 1.0;
        }
    }
}

fn category_of(value: &FieldValue) -> String {
    value
        .as_text()
        .map(|s| s.into_owned())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}
