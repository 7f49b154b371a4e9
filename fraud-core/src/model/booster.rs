//! Gradient-Boosted Tree Classifier
//!
//! Binary logistic objective, histogram split finding, depth-wise trees.
//! Deterministic for a given seed.

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{BinnedMatrix, GrowthParams, Tree, TreeGrower};
use crate::error::{CoreError, CoreResult};

/// Booster hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of features sampled per tree
    pub colsample_bytree: f64,
    /// Weight multiplier for positive examples
    pub scale_pos_weight: f64,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum gain to make a split
    pub gamma: f64,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 6,
            learning_rate: 0.05,
            subsample: 0.8,
            colsample_bytree: 0.8,
            scale_pos_weight: 1.0,
            min_child_weight: 1.0,
            lambda: 1.0,
            gamma: 0.0,
            max_bins: 256,
            seed: 42,
        }
    }
}

impl BoosterParams {
    pub fn validate(&self) -> CoreResult<()> {
        let fraction = |v: f64| v > 0.0 && v <= 1.0;

        if self.n_estimators == 0 {
            return Err(CoreError::InvalidConfig("n_estimators must be > 0".into()));
        }
        if self.max_depth == 0 {
            return Err(CoreError::InvalidConfig("max_depth must be > 0".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(CoreError::InvalidConfig("learning_rate must be > 0".into()));
        }
        if !fraction(self.subsample) || !fraction(self.colsample_bytree) {
            return Err(CoreError::InvalidConfig(
                "subsample and colsample_bytree must be in (0, 1]".into(),
            ));
        }
        if !(self.scale_pos_weight > 0.0) || self.lambda < 0.0 || self.gamma < 0.0 {
            return Err(CoreError::InvalidConfig(
                "scale_pos_weight must be > 0, lambda and gamma >= 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: BoosterParams,
    n_features: usize,
    base_margin: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedClassifier {
    /// Fit on a dense (rows × features) matrix and 0/1 labels
    pub fn fit(x: ArrayView2<f64>, y: &[u8], params: &BoosterParams) -> CoreResult<Self> {
        params.validate()?;

        let (n_rows, n_features) = x.dim();
        if n_rows != y.len() {
            return Err(CoreError::InvalidConfig(format!(
                "{} rows but {} labels",
                n_rows,
                y.len()
            )));
        }
        let positives = y.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == n_rows {
            return Err(CoreError::DegenerateLabels(format!(
                "need both classes to fit, got {} positives out of {}",
                positives, n_rows
            )));
        }

        let weights: Vec<f64> = y
            .iter()
            .map(|&l| if l == 1 { params.scale_pos_weight } else { 1.0 })
            .collect();
        let weighted_pos: f64 = y
            .iter()
            .zip(&weights)
            .filter(|(&l, _)| l == 1)
            .map(|(_, w)| w)
            .sum();
        let prior = weighted_pos / weights.iter().sum::<f64>();
        let base_margin = (prior / (1.0 - prior)).ln();

        let columns: Vec<Vec<f64>> = x.columns().into_iter().map(|c| c.to_vec()).collect();
        let binned = BinnedMatrix::from_columns(&columns, params.max_bins);

        let growth = GrowthParams {
            max_depth: params.max_depth,
            learning_rate: params.learning_rate,
            lambda: params.lambda,
            gamma: params.gamma,
            min_child_weight: params.min_child_weight,
        };

        let n_sampled_features =
            ((params.colsample_bytree * n_features as f64).ceil() as usize).clamp(1, n_features.max(1));

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut margins = vec![base_margin; n_rows];
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for i in 0..n_rows {
                let p = sigmoid(margins[i]);
                let target = y[i] as f64;
                grad[i] = weights[i] * (p - target);
                hess[i] = weights[i] * (p * (1.0 - p)).max(1e-16);
            }

            let rows: Vec<u32> = if params.subsample < 1.0 {
                (0..n_rows as u32)
                    .filter(|_| rng.gen::<f64>() < params.subsample)
                    .collect()
            } else {
                (0..n_rows as u32).collect()
            };

            let mut features = if n_sampled_features < n_features {
                sample(&mut rng, n_features, n_sampled_features).into_vec()
            } else {
                (0..n_features).collect()
            };
            features.sort_unstable();

            let tree = TreeGrower::new(&binned, &grad, &hess, &features, growth).grow(rows);

            for (i, margin) in margins.iter_mut().enumerate() {
                *margin += tree.traverse(|j| x[[i, j]]);
            }
            trees.push(tree);

            if (round + 1) % 50 == 0 || round + 1 == params.n_estimators {
                log::debug!(
                    "round {}/{}: train logloss {:.5}",
                    round + 1,
                    params.n_estimators,
                    log_loss(y, &margins)
                );
            }
        }

        log::debug!(
            "{} trees fitted, deepest reaches depth {}",
            trees.len(),
            trees.iter().map(|t| t.depth()).max().unwrap_or(0)
        );

        Ok(Self {
            params: params.clone(),
            n_features,
            base_margin,
            trees,
        })
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds for one row
    pub fn predict_margin(&self, features: &[f64]) -> CoreResult<f64> {
        if features.len() != self.n_features {
            return Err(CoreError::WidthMismatch {
                context: "classifier input",
                expected: self.n_features,
                actual: features.len(),
            });
        }
        Ok(self.base_margin + self.trees.iter().map(|t| t.predict(features)).sum::<f64>())
    }

    /// Probability of the positive class for one row
    pub fn predict_proba(&self, features: &[f64]) -> CoreResult<f64> {
        self.predict_margin(features).map(sigmoid)
    }

    /// Positive-class probabilities for every row of `x`
    pub fn predict_proba_matrix(&self, x: &Array2<f64>) -> CoreResult<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(CoreError::WidthMismatch {
                context: "classifier input",
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let margin = self.base_margin
                    + self.trees.iter().map(|t| t.traverse(|j| row[j])).sum::<f64>();
                sigmoid(margin)
            })
            .collect())
    }
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

fn log_loss(y: &[u8], margins: &[f64]) -> f64 {
    let eps = 1e-15;
    let total: f64 = y
        .iter()
        .zip(margins)
        .map(|(&l, &m)| {
            let p = sigmoid(m).clamp(eps, 1.0 - eps);
            if l == 1 { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum();
    total / y.len().max(1) as f64
}
