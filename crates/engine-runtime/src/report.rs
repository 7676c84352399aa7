use chrono::{DateTime, Utc};
use model::{execution::failed_row::FailedRecord, records::commit::CommitResult};
use serde::Serialize;

/// Outcome of one sink run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub table: String,
    pub records_received: u64,
    pub operations_committed: u64,
    pub committed: Vec<CommitResult>,
    pub failed: Vec<CommitResult>,
    pub failed_records: Vec<FailedRecord>,
    /// Operations of open batches dropped on cancellation.
    pub discarded_operations: usize,
    /// Records handed to a worker but never transformed because of cancellation.
    pub unprocessed_records: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub(crate) fn new(run_id: &str, table: &str, started_at: DateTime<Utc>) -> Self {
        RunReport {
            run_id: run_id.to_string(),
            table: table.to_string(),
            records_received: 0,
            operations_committed: 0,
            committed: Vec::new(),
            failed: Vec::new(),
            failed_records: Vec::new(),
            discarded_operations: 0,
            unprocessed_records: 0,
            cancelled: false,
            started_at,
            finished_at: started_at,
        }
    }

    /// True when every sealed batch committed and the run was not cancelled.
    ///
    /// Skipped records do not fail a run; inspect `failed_records` for them.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    pub fn batches_committed(&self) -> usize {
        self.committed.len()
    }

    pub fn batches_failed(&self) -> usize {
        self.failed.len()
    }

    /// Input positions of records whose batch failed, in ascending order.
    pub fn unwritten_record_indices(&self) -> Vec<u64> {
        let mut indices: Vec<u64> = self
            .failed
            .iter()
            .flat_map(|r| r.record_indices.iter().copied())
            .collect();
        indices.sort_unstable();
        indices
    }
}
