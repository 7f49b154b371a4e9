//! Naive random oversampling of the minority class

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Where in the training run oversampling is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversampleStage {
    Off,
    /// Training partition only
    Train,
    /// Whole dataset before the split. Duplicates can land in both partitions.
    Full,
}

impl fmt::Display for OversampleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OversampleStage::Off => "off",
            OversampleStage::Train => "train",
            OversampleStage::Full => "full",
        })
    }
}

impl FromStr for OversampleStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(OversampleStage::Off),
            "train" => Ok(OversampleStage::Train),
            "full" => Ok(OversampleStage::Full),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown oversample stage '{}' (expected off, train or full)",
                other
            ))),
        }
    }
}

/// Duplicate minority rows of `indices` (drawn with replacement) until
/// minority / majority reaches `ratio`. Returns the original indices
/// followed by the duplicates.
pub fn random_oversample(
    indices: &[usize],
    labels: &[u8],
    ratio: f64,
    rng: &mut StdRng,
) -> CoreResult<Vec<usize>> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(CoreError::InvalidConfig(format!(
            "oversample ratio must be in (0, 1], got {}",
            ratio
        )));
    }

    let (positives, negatives): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| labels[i] == 1);
    let (minority, majority) = if positives.len() <= negatives.len() {
        (positives, negatives)
    } else {
        (negatives, positives)
    };

    let mut out = indices.to_vec();
    if minority.is_empty() {
        log::warn!("No minority rows to oversample");
        return Ok(out);
    }

    let target = (ratio * majority.len() as f64).ceil() as usize;
    let extra = target.saturating_sub(minority.len());
    for _ in 0..extra {
        if let Some(&pick) = minority.choose(rng) {
            out.push(pick);
        }
    }

    log::info!(
        "Oversampled minority class: {} → {} rows (majority {})",
        minority.len(),
        minority.len() + extra,
        majority.len()
    );
    Ok(out)
}
