use thiserror::Error;

/// Per-record failures. The offending record is skipped; the batch it would
/// have joined is unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Field '{field}' expects {expected} but got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Field '{field}' is not nullable but got NULL")]
    NullNotAllowed { field: String },

    #[error("Required field '{field}' is missing")]
    MissingRequiredField { field: String },

    #[error("Primary key column '{column}' is missing or NULL")]
    MissingKey { column: String },
}

impl TransformError {
    /// Stable name of the error variant, used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::TypeMismatch { .. } => "TypeMismatch",
            TransformError::NullNotAllowed { .. } => "NullNotAllowed",
            TransformError::MissingRequiredField { .. } => "MissingRequiredField",
            TransformError::MissingKey { .. } => "MissingKey",
        }
    }
}
