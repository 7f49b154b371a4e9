//! Randomized hyperparameter search
//!
//! Samples booster configurations from a fixed grid and scores each by mean
//! F1 at 0.5 under stratified k-fold cross-validation. Runs on an already
//! transformed matrix, so encoder and scaler statistics are shared by all
//! folds.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::booster::{BoosterParams, GradientBoostedClassifier};
use super::metrics::ConfusionMatrix;
use crate::dataset::{random_oversample, stratified_kfold};
use crate::error::{CoreError, CoreResult};

/// Candidate values for each searched hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub subsample: Vec<f64>,
    pub colsample_bytree: Vec<f64>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200, 300, 400],
            max_depth: (3..=8).collect(),
            learning_rate: vec![0.01, 0.05, 0.1, 0.2],
            subsample: vec![0.6, 0.8, 1.0],
            colsample_bytree: vec![0.6, 0.8, 1.0],
        }
    }
}

impl SearchSpace {
    fn sample(&self, base: &BoosterParams, rng: &mut StdRng) -> CoreResult<BoosterParams> {
        fn pick<T: Copy>(name: &str, values: &[T], rng: &mut StdRng) -> CoreResult<T> {
            values
                .choose(rng)
                .copied()
                .ok_or_else(|| CoreError::InvalidConfig(format!("empty search range for {}", name)))
        }

        Ok(BoosterParams {
            n_estimators: pick("n_estimators", &self.n_estimators, rng)?,
            max_depth: pick("max_depth", &self.max_depth, rng)?,
            learning_rate: pick("learning_rate", &self.learning_rate, rng)?,
            subsample: pick("subsample", &self.subsample, rng)?,
            colsample_bytree: pick("colsample_bytree", &self.colsample_bytree, rng)?,
            ..base.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    pub space: SearchSpace,
    pub n_iter: usize,
    pub folds: usize,
    pub seed: u64,
    /// Oversample each fold's training part to this minority ratio
    pub oversample_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub params: BoosterParams,
    pub fold_f1: Vec<f64>,
    pub mean_f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: BoosterParams,
    pub best_score: f64,
    pub trials: Vec<Trial>,
}

impl RandomizedSearch {
    /// Evaluate `n_iter` sampled configurations; the first one with the
    /// highest mean F1 wins.
    pub fn run(&self, x: &Array2<f64>, y: &[u8], base: &BoosterParams) -> CoreResult<SearchOutcome> {
        if self.n_iter == 0 {
            return Err(CoreError::InvalidConfig("search needs at least one iteration".into()));
        }

        let folds = stratified_kfold(y, self.folds, self.seed)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trials = Vec::with_capacity(self.n_iter);

        for iteration in 0..self.n_iter {
            let params = self.space.sample(base, &mut rng)?;
            let mut fold_f1 = Vec::with_capacity(folds.len());

            for fold in &folds {
                let train = match self.oversample_ratio {
                    Some(ratio) => random_oversample(&fold.train, y, ratio, &mut rng)?,
                    None => fold.train.clone(),
                };
                let x_train = x.select(Axis(0), &train);
                let y_train: Vec<u8> = train.iter().map(|&i| y[i]).collect();
                let model = GradientBoostedClassifier::fit(x_train.view(), &y_train, &params)?;

                let x_val = x.select(Axis(0), &fold.test);
                let y_val: Vec<u8> = fold.test.iter().map(|&i| y[i]).collect();
                let scores = model.predict_proba_matrix(&x_val)?;
                fold_f1.push(ConfusionMatrix::from_scores(&y_val, &scores, 0.5).f1());
            }

            let mean_f1 = fold_f1.iter().sum::<f64>() / fold_f1.len() as f64;
            log::info!(
                "search {}/{}: trees={} depth={} lr={} subsample={} colsample={} → mean F1 {:.4}",
                iteration + 1,
                self.n_iter,
                params.n_estimators,
                params.max_depth,
                params.learning_rate,
                params.subsample,
                params.colsample_bytree,
                mean_f1
            );
            trials.push(Trial { params, fold_f1, mean_f1 });
        }

        let best = trials
            .iter()
            .fold(None::<&Trial>, |best, trial| match best {
                Some(b) if b.mean_f1 >= trial.mean_f1 => Some(b),
                _ => Some(trial),
            })
            .ok_or_else(|| CoreError::InvalidConfig("search produced no trials".into()))?;

        Ok(SearchOutcome {
            best: best.params.clone(),
            best_score: best.mean_f1,
            trials: trials.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Array2<f64>, Vec<u8>) {
        let n = 90;
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let v = (i % 30) as f64;
            x[[i, 0]] = v;
            x[[i, 1]] = (i % 7) as f64;
            y.push(if v >= 24.0 { 1 } else { 0 });
        }
        (x, y)
    }

    fn tiny_space() -> SearchSpace {
        SearchSpace {
            n_estimators: vec![5, 10],
            max_depth: vec![2, 3],
            learning_rate: vec![0.3],
            subsample: vec![1.0],
            colsample_bytree: vec![1.0],
        }
    }

    #[test]
    fn test_search_returns_best_trial() {
        let (x, y) = dataset();
        let search = RandomizedSearch {
            space: tiny_space(),
            n_iter: 3,
            folds: 3,
            seed: 42,
            oversample_ratio: None,
        };
        let outcome = search.run(&x, &y, &BoosterParams::default()).unwrap();

        assert_eq!(outcome.trials.len(), 3);
        assert!(outcome.trials.iter().all(|t| t.fold_f1.len() == 3));
        assert!(outcome.trials.iter().all(|t| t.mean_f1 <= outcome.best_score));
        assert!(outcome.best_score > 0.8);
        assert!([5, 10].contains(&outcome.best.n_estimators));
        // non-searched parameters come from the base
        assert_eq!(outcome.best.lambda, BoosterParams::default().lambda);
    }

    #[test]
    fn test_search_is_seeded() {
        let (x, y) = dataset();
        let search = RandomizedSearch {
            space: tiny_space(),
            n_iter: 2,
            folds: 3,
            seed: 9,
            oversample_ratio: Some(1.0),
        };
        let a = search.run(&x, &y, &BoosterParams::default()).unwrap();
        let b = search.run(&x, &y, &BoosterParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let (x, y) = dataset();
        let search = RandomizedSearch {
            space: SearchSpace::default(),
            n_iter: 0,
            folds: 3,
            seed: 42,
            oversample_ratio: None,
        };
        assert!(search.run(&x, &y, &BoosterParams::default()).is_err());
    }
}
