//! Features Module - Feature Preparation
//!
//! Turns raw transactions (CSV rows or webhook payloads) into rows that
//! match the schema the pipeline was fitted on.

pub mod record;
pub mod derive;
pub mod impute;
pub mod align;
pub mod webhook;


// Re-export common types
pub use record::{FieldValue, RawRecord};
pub use align::AlignedRow;
pub use impute::MedianImputer;
pub use derive::derive;
pub use webhook::{payment_object, prepare_payload, transaction_meta, TransactionMeta};
