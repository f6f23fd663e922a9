use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single CSV row could not be turned into a file.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    #[error("invalid output path {}: {reason}", path.display())]
    InvalidOutputPath { path: PathBuf, reason: String },

    #[error("failed to write {}", path.display())]
    IoWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("field `{field}` contains a line break and cannot go in the header block")]
    MultilineHeaderValue { field: String },

    #[error("malformed CSV record: {0}")]
    MalformedRecord(#[from] csv::Error),
}

impl RowError {
    pub fn missing(field: &str) -> Self {
        RowError::MissingRequiredField {
            field: field.to_string(),
        }
    }

    /// Short machine-friendly name used in the JSON report.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::MissingRequiredField { .. } => "missing_required_field",
            RowError::InvalidOutputPath { .. } => "invalid_output_path",
            RowError::IoWriteFailure { .. } => "io_write_failure",
            RowError::MultilineHeaderValue { .. } => "multiline_header_value",
            RowError::MalformedRecord(_) => "malformed_record",
        }
    }
}
