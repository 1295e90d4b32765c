use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort the conversion of a single document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed layout: {0}")]
    MalformedLayout(String),

    #[error("layout conversion failed for {path}: {reason}")]
    ExternalConversion { path: PathBuf, reason: String },
}

impl ExtractError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedLayout(message.into())
    }

    pub fn conversion(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ExternalConversion {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Per-row problems. The row (or field) is recovered locally and the
/// document keeps going. `reason` says what happened to the row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("page {}: {reason}: {text}", .page + 1)]
    UnclassifiedRow {
        page: usize,
        text: String,
        reason: &'static str,
    },

    #[error("page {}: field '{field}' kept as text, not a date: {raw}", .page + 1)]
    DateParseFailure {
        page: usize,
        field: String,
        raw: String,
    },
}
