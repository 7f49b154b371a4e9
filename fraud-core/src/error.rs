//! Error types shared by training and serving

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}' in dataset header")]
    MissingColumn(String),

    /// A value could not be interpreted for its column.
    /// `row` is 1-based and absent for single-record (serving) input.
    #[error("Malformed field '{column}'{}: {reason}", row.map(|r| format!(" at row {}", r)).unwrap_or_default())]
    MalformedField {
        column: String,
        row: Option<usize>,
        reason: String,
    },

    #[error("Schema mismatch: expected v{expected_version} (hash: {expected_hash:08x}), got v{actual_version} (hash: {actual_hash:08x})")]
    SchemaMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("Artifact checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Threshold belongs to artifact {threshold_artifact}, pipeline is {pipeline_artifact}")]
    ArtifactPairMismatch {
        pipeline_artifact: uuid::Uuid,
        threshold_artifact: uuid::Uuid,
    },

    #[error("Unsupported artifact format version {0}")]
    UnsupportedFormat(u32),

    #[error("Degenerate labels: {0}")]
    DegenerateLabels(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Row or matrix width disagrees with what a fitted part expects
    #[error("Feature width mismatch in {context}: expected {expected}, got {actual}")]
    WidthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl CoreError {
    pub fn malformed(column: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedField {
            column: column.into(),
            row: None,
            reason: reason.into(),
        }
    }

    /// Attach a 1-based dataset row number to a field error
    pub fn at_row(self, row: usize) -> Self {
        match self {
            CoreError::MalformedField { column, reason, .. } => CoreError::MalformedField {
                column,
                row: Some(row),
                reason,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_with_row() {
        let err = CoreError::malformed("Timestamp", "unparsable").at_row(7);
        assert_eq!(err.to_string(), "Malformed field 'Timestamp' at row 7: unparsable");
    }

    #[test]
    fn test_malformed_message_without_row() {
        let err = CoreError::malformed("amount", "expected a number");
        assert_eq!(err.to_string(), "Malformed field 'amount': expected a number");
    }
}
