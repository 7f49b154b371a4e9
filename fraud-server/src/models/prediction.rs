//! Prediction model

use chrono::{DateTime, Utc};
use fraud_core::Verdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body returned by POST `/` and `/predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub fraud: bool,
    pub score: f64,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl From<Verdict> for PredictionResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            fraud: verdict.fraud,
            score: verdict.score,
            threshold: verdict.threshold,
            amount: verdict.meta.amount,
            transaction_id: verdict.meta.transaction_id,
            date: verdict.meta.date,
        }
    }
}

/// One element of the audit-log array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(flatten)]
    pub prediction: PredictionResponse,
    pub timestamp: DateTime<Utc>,
    pub artifact_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: i64,
    pub artifact_id: Uuid,
    pub variant: String,
    pub threshold: f64,
}
