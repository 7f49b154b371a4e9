//! Artifact Module - file hand-off between training and serving
//!
//! Two JSON files per training run:
//! - `fraud_pipeline.json`: fitted pipeline inside a stamped envelope
//!   (format version, artifact id, layout, checksum, metrics)
//! - `optimal_threshold.json`: decision threshold carrying the same artifact id
//!
//! Loading verifies every stamp; a mismatch is an error, never a warning.

pub mod types;
pub mod storage;


pub use storage::{load_pair, load_pipeline, load_threshold, save_pair, save_pipeline, save_threshold};
pub use types::{
    pipeline_checksum, PipelineArtifact, ThresholdArtifact, FORMAT_VERSION, PIPELINE_FILE,
    THRESHOLD_FILE,
};
