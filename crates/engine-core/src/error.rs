use std::{fmt, time::Duration};
use thiserror::Error;

/// Why the store refused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
    /// An insert hit an existing primary key.
    AlreadyExists,
    /// An update targeted a missing row.
    NotFound,
    /// The operation is malformed (unknown table, missing key column).
    InvalidArgument,
    FailedPrecondition,
    /// A column does not exist in the target table.
    SchemaMismatch,
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectCode::AlreadyExists => "ALREADY_EXISTS",
            RejectCode::NotFound => "NOT_FOUND",
            RejectCode::InvalidArgument => "INVALID_ARGUMENT",
            RejectCode::FailedPrecondition => "FAILED_PRECONDITION",
            RejectCode::SchemaMismatch => "SCHEMA_MISMATCH",
        };
        f.write_str(name)
    }
}

/// Structured failure of a `submit` call against a transactional store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Transaction aborted: {0}")]
    Aborted(String),

    #[error("Commit timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transaction rejected ({code}): {reason}")]
    Rejected {
        operation_index: Option<usize>,
        code: RejectCode,
        reason: String,
    },
}

impl StoreError {
    pub fn rejected(operation_index: usize, code: RejectCode, reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            operation_index: Some(operation_index),
            code,
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Rejected { .. })
    }
}
