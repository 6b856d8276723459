// src/error.rs

use thiserror::Error;

/// Failures of the table-extraction core. Every variant is scoped to a single
/// course poll; the sweep driver logs it and moves on to the next course.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradeError {
    /// No table in the document carries the anchor cell.
    #[error("no table containing a `{marker}` cell")]
    TableNotFound { marker: String },

    /// The requested row identifier is not present in the grade table.
    #[error("row `{row}` not found in grade table")]
    RowNotFound { row: String },

    /// The requested row identifier keys more than one row.
    #[error("row `{row}` appears {count} times in grade table")]
    DuplicateRow { row: String, count: usize },

    /// Header decoding or colspan expansion produced an unusable shape.
    #[error("unexpected table shape: {0}")]
    ParseShape(String),
}

impl GradeError {
    /// Short machine-friendly tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GradeError::TableNotFound { .. } => "table-not-found",
            GradeError::RowNotFound { .. } => "row-not-found",
            GradeError::DuplicateRow { .. } => "duplicate-row",
            GradeError::ParseShape(_) => "parse-shape",
        }
    }
}

/// Classify any poll failure: core errors by their kind, everything else is a
/// fetch/transport failure.
pub fn failure_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<GradeError>()
        .map(GradeError::kind)
        .unwrap_or("fetch")
}
