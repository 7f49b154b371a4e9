//! Prediction handlers (mounted on `/` and `/predict`)

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use serde_json::Value;

use crate::files::write_json_atomic;
use crate::models::{AuditEntry, PredictionResponse, StatusMessage};
use crate::{AppError, AppResult, AppState};

/// GET: liveness message, query string ignored
pub async fn info() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Fraud detection API is running.",
    })
}

/// POST: score a webhook envelope or a flat transaction record
pub async fn predict(State(state): State<AppState>, body: Bytes) -> AppResult<Json<PredictionResponse>> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid JSON body: {}", e)))?;

    let verdict = state.model.score_payload(&payload)?;
    let response = PredictionResponse::from(verdict);

    tracing::info!(
        transaction = %response.transaction_id,
        score = response.score,
        fraud = response.fraud,
        "Prediction"
    );

    record(&state, &payload, &response).await;
    Ok(Json(response))
}

/// Side files, audit log and forwarding. Failures are logged only.
async fn record(state: &AppState, payload: &Value, response: &PredictionResponse) {
    if let Err(e) = write_json_atomic(&state.config.last_payload_path, payload).await {
        tracing::warn!("Failed to write {}: {}", state.config.last_payload_path.display(), e);
    }
    if let Err(e) = write_json_atomic(&state.config.last_prediction_path, response).await {
        tracing::warn!("Failed to write {}: {}", state.config.last_prediction_path.display(), e);
    }

    let entry = AuditEntry {
        prediction: response.clone(),
        timestamp: Utc::now(),
        artifact_id: state.model.artifact_id(),
    };
    if let Err(e) = state.audit.append(&entry).await {
        tracing::warn!("Failed to append audit log {}: {}", state.audit.path().display(), e);
    }

    if let Some(forwarder) = &state.forwarder {
        match serde_json::to_value(response) {
            Ok(value) => {
                forwarder.enqueue(value);
            }
            Err(e) => tracing::warn!("Failed to serialize prediction for forwarding: {}", e),
        }
    }
}
