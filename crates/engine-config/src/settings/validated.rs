use crate::report::finding::Finding;
use engine_core::retry::RetryPolicy;
use model::{records::operation::WriteKind, schema::Schema};
use std::{sync::Arc, time::Duration};

/// Immutable, validated configuration used throughout a sink run.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    /// Name reported for the target dataset
    pub reference_name: String,
    /// Target table
    pub table: String,
    /// Columns that identify a row in the target table
    pub primary_keys: Vec<String>,
    /// Mutation kind emitted for every record
    pub write_kind: WriteKind,
    /// Resolved schema every record must conform to
    pub schema: Arc<Schema>,
    /// Seal a batch once it holds this many operations
    pub max_batch_operations: usize,
    /// Seal a batch once its estimated size reaches this many bytes
    pub max_batch_bytes: usize,
    /// Backoff applied to transient commit failures
    pub retry_policy: RetryPolicy,
    /// Bound on a single submit attempt
    pub commit_timeout: Duration,
    /// Number of transform/commit workers
    pub workers: usize,
    /// Non-fatal findings raised during validation
    pub warnings: Vec<Finding>,
}

impl ValidatedSettings {
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn retry_limit(&self) -> usize {
        self.retry_policy.retry_limit()
    }
}
