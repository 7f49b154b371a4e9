//! Inference - scoring webhook payloads with a loaded artifact pair
//!
//! `ScoringModel` is immutable once loaded; share it behind an `Arc`.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::threshold::is_fraud;
use crate::artifact::{load_pair, PipelineArtifact, ThresholdArtifact};
use crate::error::CoreResult;
use crate::features::{payment_object, prepare_payload, transaction_meta, TransactionMeta};
use crate::schema::{DatasetVariant, Schema};

/// Outcome of scoring one payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub fraud: bool,
    pub score: f64,
    pub threshold: f64,
    pub meta: TransactionMeta,
}

#[derive(Debug)]
pub struct ScoringModel {
    schema: Schema,
    pipeline: PipelineArtifact,
    threshold: ThresholdArtifact,
}

impl ScoringModel {
    /// Load and cross-check both artifact files
    pub fn load(pipeline_path: &Path, threshold_path: &Path) -> CoreResult<Self> {
        let (pipeline, threshold) = load_pair(pipeline_path, threshold_path)?;
        let model = Self::from_artifacts(pipeline, threshold)?;
        log::info!(
            "Model loaded: artifact {} ({} schema v{}, {} trees, threshold {:.4})",
            model.artifact_id(),
            model.variant(),
            model.pipeline.layout.version,
            model.pipeline.pipeline.classifier().n_trees(),
            model.threshold()
        );
        Ok(model)
    }

    pub fn from_artifacts(pipeline: PipelineArtifact, threshold: ThresholdArtifact) -> CoreResult<Self> {
        let schema = pipeline.pipeline.schema()?;
        Ok(Self { schema, pipeline, threshold })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn variant(&self) -> DatasetVariant {
        self.schema.variant()
    }

    pub fn artifact_id(&self) -> Uuid {
        self.pipeline.artifact_id
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.threshold
    }

    pub fn artifact(&self) -> &PipelineArtifact {
        &self.pipeline
    }

    /// Score a POST body (webhook envelope or flat record)
    pub fn score_payload(&self, body: &Value) -> CoreResult<Verdict> {
        let payment = payment_object(body);
        let row = prepare_payload(&self.schema, payment)?;
        if log::log_enabled!(log::Level::Debug) {
            let fields: Vec<String> = row
                .named(&self.schema)
                .map(|(name, value)| format!("{}={:?}", name, value))
                .collect();
            log::debug!("Aligned payload: {}", fields.join(", "));
        }
        let meta = transaction_meta(&self.schema, payment)?;
        let score = self.pipeline.pipeline.predict_proba(&row)?;
        let threshold = self.threshold();

        Ok(Verdict {
            fraud: is_fraud(score, threshold),
            score,
            threshold,
            meta,
        })
    }
}
