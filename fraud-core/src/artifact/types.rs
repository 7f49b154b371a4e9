use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::model::{EvaluationSummary, FittedPipeline, ThresholdChoice};
use crate::schema::LayoutInfo;

/// Envelope format; bump when the envelope or pipeline encoding changes
pub const FORMAT_VERSION: u32 = 1;

pub const PIPELINE_FILE: &str = "fraud_pipeline.json";
pub const THRESHOLD_FILE: &str = "optimal_threshold.json";

/// Persisted fitted pipeline with its provenance stamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    pub artifact_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub layout: LayoutInfo,
    /// SHA-256 (hex) of the serialized `pipeline`
    pub checksum: String,
    pub metrics: Option<EvaluationSummary>,
    pub pipeline: FittedPipeline,
}

impl PipelineArtifact {
    pub fn new(pipeline: FittedPipeline, metrics: Option<EvaluationSummary>) -> CoreResult<Self> {
        let checksum = pipeline_checksum(&pipeline)?;
        Ok(Self {
            format_version: FORMAT_VERSION,
            artifact_id: Uuid::new_v4(),
            created_at: Utc::now(),
            layout: pipeline.layout().clone(),
            checksum,
            metrics,
            pipeline,
        })
    }
}

/// Persisted decision threshold, paired to one pipeline artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdArtifact {
    pub format_version: u32,
    pub artifact_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub threshold: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl ThresholdArtifact {
    pub fn for_pipeline(pipeline: &PipelineArtifact, choice: &ThresholdChoice) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            artifact_id: pipeline.artifact_id,
            created_at: pipeline.created_at,
            threshold: choice.threshold,
            f1: choice.f1,
            precision: choice.precision,
            recall: choice.recall,
        }
    }
}

pub fn pipeline_checksum(pipeline: &FittedPipeline) -> CoreResult<String> {
    let bytes = serde_json::to_vec(pipeline)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
