//! Fraud Scoring Core
//!
//! Shared by the `fraud-train` binary and the HTTP server:
//! - `schema`: column contract per dataset variant (versioned, hashed)
//! - `features`: raw records, derivations, imputation, row alignment,
//!   webhook payload reshaping
//! - `preprocess`: one-hot / frequency encoders, scaler, column transformer
//! - `model`: gradient-boosted classifier, pipeline, threshold, metrics,
//!   randomized search, inference
//! - `dataset`: CSV loading, stratified split / k-fold, oversampling
//! - `artifact`: stamped pipeline + threshold files
//! - `training`: the end-to-end training driver

pub mod error;
pub mod schema;
pub mod features;
pub mod preprocess;
pub mod model;
pub mod dataset;
pub mod artifact;
pub mod config;
pub mod training;

pub use error::{CoreError, CoreResult};
pub use model::{ScoringModel, Verdict};
pub use schema::{DatasetVariant, Schema};
