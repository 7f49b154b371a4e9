//! Fraud Scoring Server
//!
//! Scores payment webhook payloads with the artifact pair written by
//! `fraud-train`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     FRAUD SCORING SERVER                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST / , /predict ──► ScoringModel (Arc, loaded at start)   │
//! │        │                                                     │
//! │        ├──► last_payload.json / last_prediction.json         │
//! │        ├──► audit-log.json (async mutex + rename)            │
//! │        └──► forward queue ──► background POST (retry)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod audit;
mod config;
mod error;
mod files;
mod forward;
mod handlers;
mod models;


use std::sync::Arc;

use anyhow::Context;
use axum::{http::HeaderValue, routing::get, Router};
use fraud_core::ScoringModel;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fraud_server=debug,fraud_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();
    tracing::info!("Fraud Scoring Server starting ({})...", config.environment);
    if config.is_production() && config.cors_origin.is_none() {
        tracing::warn!("CORS_ORIGIN not set in production, allowing any origin");
    }

    // Model load failure is fatal: the server never binds without a model
    let model = ScoringModel::load(&config.model_path, &config.threshold_path)
        .with_context(|| {
            format!(
                "failed to load model from {} and {}",
                config.model_path.display(),
                config.threshold_path.display()
            )
        })?;
    tracing::info!(
        "Model {} loaded ({} variant, threshold {:.4})",
        model.artifact_id(),
        model.variant(),
        model.threshold()
    );

    let forwarder = match config.forward.clone() {
        Some(forward) => Some(forward::Forwarder::spawn(forward)?.0),
        None => {
            tracing::info!("FORWARD_URL not set, forwarding disabled");
            None
        }
    };

    // Build application state
    let state = AppState {
        model: Arc::new(model),
        audit: Arc::new(audit::AuditLog::new(config.audit_log_path.clone())),
        forwarder,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("🚀 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ScoringModel>,
    pub audit: Arc<audit::AuditLog>,
    pub forwarder: Option<forward::Forwarder>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors = match state
        .config
        .cors_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        None => CorsLayer::new().allow_origin(Any),
    };

    Router::new()
        .route("/", get(handlers::predict::info).post(handlers::predict::predict))
        .route("/predict", get(handlers::predict::info).post(handlers::predict::predict))
        .route("/health", get(handlers::health::check))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors.allow_methods(Any).allow_headers(Any))
        .with_state(state)
}
