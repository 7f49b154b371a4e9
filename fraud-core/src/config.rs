//! Training configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::dataset::OversampleStage;
use crate::error::{CoreError, CoreResult};
use crate::model::BoosterParams;
use crate::schema::DatasetVariant;

/// Settings for one `fraud-train` run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Input CSV
    pub dataset_path: PathBuf,

    pub variant: DatasetVariant,

    /// Directory receiving both artifact files
    pub output_dir: PathBuf,

    /// Held-out fraction for evaluation and threshold selection
    pub test_size: f64,

    pub seed: u64,

    pub oversample: OversampleStage,

    /// Target minority / majority ratio after oversampling
    pub oversample_ratio: f64,

    /// Randomized search iterations (0 disables the search)
    pub search_iter: usize,

    pub cv_folds: usize,

    pub booster: BoosterParams,
}

impl TrainConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take defaults, unparsable
    /// values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let variant: DatasetVariant = parse_or(&lookup, "FRAUD_VARIANT", DatasetVariant::Paysim)?;

        let default_dataset = match variant {
            DatasetVariant::Paysim => "datasets/paysim.csv",
            DatasetVariant::Synthetic => "datasets/synthetic_fraud.csv",
        };
        let default_oversample = match variant {
            DatasetVariant::Paysim => OversampleStage::Off,
            DatasetVariant::Synthetic => OversampleStage::Train,
        };
        let default_pos_weight = match variant {
            DatasetVariant::Paysim => 10.0,
            DatasetVariant::Synthetic => 1.0,
        };

        let seed = parse_or(&lookup, "FRAUD_SEED", 42u64)?;
        let defaults = BoosterParams::default();
        let booster = BoosterParams {
            n_estimators: parse_or(&lookup, "FRAUD_N_ESTIMATORS", defaults.n_estimators)?,
            max_depth: parse_or(&lookup, "FRAUD_MAX_DEPTH", defaults.max_depth)?,
            learning_rate: parse_or(&lookup, "FRAUD_LEARNING_RATE", defaults.learning_rate)?,
            scale_pos_weight: parse_or(&lookup, "FRAUD_SCALE_POS_WEIGHT", default_pos_weight)?,
            seed,
            ..defaults
        };

        let config = Self {
            dataset_path: lookup("FRAUD_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default_dataset)),
            variant,
            output_dir: lookup("FRAUD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model")),
            test_size: parse_or(&lookup, "FRAUD_TEST_SIZE", 0.2)?,
            seed,
            oversample: parse_or(&lookup, "FRAUD_OVERSAMPLE", default_oversample)?,
            oversample_ratio: parse_or(&lookup, "FRAUD_OVERSAMPLE_RATIO", 1.0)?,
            search_iter: parse_or(&lookup, "FRAUD_SEARCH_ITER", 0usize)?,
            cv_folds: parse_or(&lookup, "FRAUD_CV_FOLDS", 3usize)?,
            booster,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "FRAUD_TEST_SIZE must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.oversample_ratio > 0.0 && self.oversample_ratio <= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "FRAUD_OVERSAMPLE_RATIO must be in (0, 1], got {}",
                self.oversample_ratio
            )));
        }
        if self.search_iter > 0 && self.cv_folds < 2 {
            return Err(CoreError::InvalidConfig("FRAUD_CV_FOLDS must be at least 2".into()));
        }
        self.booster.validate()
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> CoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            CoreError::InvalidConfig(format!("{}='{}': {}", key, raw, e))
        }),
    }
}
