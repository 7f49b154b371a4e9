//! Model Module - classifier, pipeline, threshold and scoring
//!
//! - `tree` / `booster`: gradient-boosted trees (logistic loss)
//! - `pipeline`: column transformer + classifier with its layout stamp
//! - `threshold` / `metrics`: decision cutoff and held-out evaluation
//! - `search`: randomized hyperparameter search
//! - `inference`: loaded artifact pair used by the server

pub mod tree;
pub mod booster;
pub mod pipeline;
pub mod threshold;
pub mod metrics;
pub mod search;
pub mod inference;

pub use booster::{BoosterParams, GradientBoostedClassifier};
pub use inference::{ScoringModel, Verdict};
pub use metrics::{ClassificationReport, ConfusionMatrix, EvaluationSummary};
pub use pipeline::FittedPipeline;
pub use search::{RandomizedSearch, SearchOutcome, SearchSpace};
pub use threshold::{average_precision, is_fraud, select_threshold, ThresholdChoice};
