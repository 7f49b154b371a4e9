//! Standardization for numeric columns

use serde::{Deserialize, Serialize};

/// Per-column mean and population standard deviation.
/// Constant columns get a scale of 1 so they pass through centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit from column-major values: `columns[j]` holds every value of column j
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let mut mean = Vec::with_capacity(columns.len());
        let mut scale = Vec::with_capacity(columns.len());

        for column in columns {
            let n = column.len().max(1) as f64;
            let m = column.iter().sum::<f64>() / n;
            let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            mean.push(m);
            scale.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Self { mean, scale }
    }

    pub fn transform(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.scale[index]
    }
}
