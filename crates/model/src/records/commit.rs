use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a batch from accumulation to a terminal commit outcome.
///
/// `Open -> Sealed -> Submitting -> {Committed | Retrying -> Submitting | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Open,
    Sealed,
    Submitting,
    Retrying,
    Committed,
    Failed,
}

impl BatchState {
    pub fn can_transition_to(self, next: BatchState) -> bool {
        use BatchState::*;
        matches!(
            (self, next),
            (Open, Sealed)
                | (Sealed, Submitting)
                | (Submitting, Committed)
                | (Submitting, Retrying)
                | (Submitting, Failed)
                | (Retrying, Submitting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Committed | BatchState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Open => "open",
            BatchState::Sealed => "sealed",
            BatchState::Submitting => "submitting",
            BatchState::Retrying => "retrying",
            BatchState::Committed => "committed",
            BatchState::Failed => "failed",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFailure {
    /// Index of the rejecting operation within the batch, when the store reports it.
    pub operation_index: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub batch_id: String,
    pub succeeded_count: usize,
    pub attempts: usize,
    pub state: BatchState,
    pub failure: Option<CommitFailure>,
    /// Input positions of the records behind the batch's operations, in batch order.
    #[serde(default)]
    pub record_indices: Vec<u64>,
}

impl CommitResult {
    pub fn committed(batch_id: &str, succeeded_count: usize, attempts: usize) -> Self {
        CommitResult {
            batch_id: batch_id.to_string(),
            succeeded_count,
            attempts,
            state: BatchState::Committed,
            failure: None,
            record_indices: Vec::new(),
        }
    }

    /// A failed batch never reports partial success: the write is transactional.
    pub fn failed(
        batch_id: &str,
        attempts: usize,
        operation_index: Option<usize>,
        reason: String,
    ) -> Self {
        CommitResult {
            batch_id: batch_id.to_string(),
            succeeded_count: 0,
            attempts,
            state: BatchState::Failed,
            failure: Some(CommitFailure {
                operation_index,
                reason,
            }),
            record_indices: Vec::new(),
        }
    }

    pub fn with_record_indices(mut self, record_indices: Vec<u64>) -> Self {
        self.record_indices = record_indices;
        self
    }

    /// Input position of the record whose operation the store rejected.
    pub fn rejected_record_index(&self) -> Option<u64> {
        let index = self.failure.as_ref()?.operation_index?;
        self.record_indices.get(index).copied()
    }

    pub fn is_committed(&self) -> bool {
        self.state == BatchState::Committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_commit_state_machine() {
        use BatchState::*;
        assert!(Open.can_transition_to(Sealed));
        assert!(Sealed.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Committed));
        assert!(Submitting.can_transition_to(Failed));

        assert!(!Sealed.can_transition_to(Committed));
        assert!(!Retrying.can_transition_to(Committed));
        assert!(!Committed.can_transition_to(Submitting));
        assert!(!Failed.can_transition_to(Retrying));
        assert!(Committed.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn failed_result_reports_no_success() {
        let result = CommitResult::failed("b1", 1, Some(2), "duplicate key".into());
        assert_eq!(result.succeeded_count, 0);
        assert!(!result.is_committed());
        assert_eq!(result.failure.unwrap().operation_index, Some(2));
    }

    #[test]
    fn rejected_operation_maps_to_its_record() {
        let result = CommitResult::failed("b1", 1, Some(1), "duplicate key".into())
            .with_record_indices(vec![3, 7, 11]);
        assert_eq!(result.rejected_record_index(), Some(7));

        let exhausted =
            CommitResult::failed("b2", 4, None, "unavailable".into()).with_record_indices(vec![1]);
        assert_eq!(exhausted.rejected_record_index(), None);
    }
}
