use engine_core::error::StoreError;
use model::records::commit::CommitResult;
use thiserror::Error;

/// Terminal failure of a batch commit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("Batch '{batch_id}' rejected after {attempts} attempt(s): {reason}")]
    Rejected {
        batch_id: String,
        operation_index: Option<usize>,
        reason: String,
        attempts: usize,
    },

    #[error("Batch '{batch_id}' failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        batch_id: String,
        attempts: usize,
        last_error: StoreError,
    },
}

impl CommitError {
    pub fn batch_id(&self) -> &str {
        match self {
            CommitError::Rejected { batch_id, .. } | CommitError::Exhausted { batch_id, .. } => {
                batch_id
            }
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            CommitError::Rejected { attempts, .. } | CommitError::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn to_result(&self) -> CommitResult {
        match self {
            CommitError::Rejected {
                batch_id,
                operation_index,
                reason,
                attempts,
            } => CommitResult::failed(batch_id, *attempts, *operation_index, reason.clone()),
            CommitError::Exhausted {
                batch_id,
                attempts,
                last_error,
            } => CommitResult::failed(batch_id, *attempts, None, last_error.to_string()),
        }
    }
}
