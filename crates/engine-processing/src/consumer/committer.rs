use crate::{error::CommitError, retry::classify_store_error};
use engine_core::{
    connectors::store::TransactionalStore,
    error::StoreError,
    metrics::Metrics,
    retry::{Attempted, RetryError, RetryPolicy},
};
use model::records::{
    batch::SealedBatch,
    commit::{BatchState, CommitResult},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

/// Submits sealed batches to the store as single atomic transactions.
///
/// Transient failures and timeouts resubmit the whole batch under the
/// retry policy. A rejection stops immediately.
#[derive(Clone)]
pub struct BatchCommitter {
    store: Arc<dyn TransactionalStore>,
    retry: RetryPolicy,
    timeout: Duration,
    metrics: Metrics,
}

impl BatchCommitter {
    pub fn new(
        store: Arc<dyn TransactionalStore>,
        retry: RetryPolicy,
        timeout: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            retry,
            timeout,
            metrics,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn commit(&self, batch: SealedBatch) -> Result<CommitResult, CommitError> {
        let start = std::time::Instant::now();
        let batch_id = batch.id().to_string();
        let mut state = BatchState::Sealed;

        info!(
            batch_id = %batch_id,
            sequence = batch.sequence(),
            operations = batch.len(),
            bytes = batch.size_bytes(),
            "Committing batch"
        );

        let operations = batch.operations();
        let id = batch_id.as_str();
        let tracked = &mut state;
        let outcome = self
            .retry
            .run(
                move |attempt| {
                    if attempt > 0 {
                        advance(id, tracked, BatchState::Retrying);
                        self.metrics.increment_retries(1);
                    }
                    advance(id, tracked, BatchState::Submitting);
                    self.metrics.increment_attempts(1);

                    let store = self.store.clone();
                    let timeout = self.timeout;
                    async move {
                        let result =
                            match tokio::time::timeout(timeout, store.submit(operations)).await {
                                Ok(result) => result,
                                Err(_) => Err(StoreError::Timeout(timeout)),
                            };
                        if let Err(e) = &result
                            && e.is_transient()
                        {
                            warn!(batch_id = %id, attempt, error = %e, "Transient commit failure");
                        }
                        result
                    }
                },
                classify_store_error,
            )
            .await;

        match outcome {
            Ok(Attempted { attempts, .. }) => {
                advance(&batch_id, &mut state, BatchState::Committed);
                self.metrics
                    .record_commit(batch.len() as u64, batch.size_bytes() as u64);

                info!(
                    batch_id = %batch_id,
                    rows = batch.len(),
                    attempts,
                    duration_ms = start.elapsed().as_millis(),
                    "Batch committed"
                );
                Ok(CommitResult::committed(&batch_id, batch.len(), attempts))
            }
            Err(err) => {
                advance(&batch_id, &mut state, BatchState::Failed);
                self.metrics.increment_batch_failures(1);

                let err = match err {
                    RetryError::Fatal {
                        error:
                            StoreError::Rejected {
                                operation_index,
                                code,
                                reason,
                            },
                        attempts,
                    } => CommitError::Rejected {
                        batch_id,
                        operation_index,
                        reason: format!("{code}: {reason}"),
                        attempts,
                    },
                    RetryError::Fatal { error, attempts }
                    | RetryError::AttemptsExceeded { error, attempts } => CommitError::Exhausted {
                        batch_id,
                        attempts,
                        last_error: error,
                    },
                };

                error!(
                    batch_id = %err.batch_id(),
                    rows = batch.len(),
                    attempts = err.attempts(),
                    error = %err,
                    "Batch failed"
                );
                Err(err)
            }
        }
    }
}

fn advance(batch_id: &str, state: &mut BatchState, next: BatchState) {
    debug_assert!(state.can_transition_to(next), "{state} -> {next}");
    debug!(batch_id = %batch_id, from = %state, to = %next, "Batch state transition");
    *state = next;
}
