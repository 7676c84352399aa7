use crate::lifecycle::SinkContext;
use engine_core::metrics::Metrics;
use engine_processing::{
    consumer::{accumulator::BatchAccumulator, committer::BatchCommitter},
    transform::record::RecordTransformer,
};
use model::{
    execution::failed_row::FailedRecord,
    records::{batch::SealedBatch, commit::CommitResult, record::Record},
};
use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Capacity of each worker's input channel.
pub const WORKER_QUEUE_CAPACITY: usize = 256;

/// A record tagged with its position in the input stream.
pub type IndexedRecord = (u64, Record);

/// What one worker did during a run.
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    pub committed: Vec<CommitResult>,
    pub failed: Vec<CommitResult>,
    pub failed_records: Vec<FailedRecord>,
    pub discarded_operations: usize,
    pub unprocessed_records: usize,
    pub cancelled: bool,
}

pub struct WorkerHandle {
    pub sender: Sender<IndexedRecord>,
    pub handle: JoinHandle<WorkerOutcome>,
}

/// Launches `ctx.settings().workers` workers, each with its own accumulator.
pub fn spawn(ctx: &SinkContext, cancel: &CancellationToken) -> Vec<WorkerHandle> {
    let count = ctx.settings().workers.max(1);
    info!(workers = count, "Launching workers");

    (0..count)
        .map(|id| {
            let (sender, receiver) = mpsc::channel(WORKER_QUEUE_CAPACITY);
            let worker = Worker {
                id,
                receiver,
                transformer: ctx.transformer(),
                committer: ctx.committer().clone(),
                accumulator: BatchAccumulator::new(
                    ctx.settings().max_batch_operations,
                    ctx.settings().max_batch_bytes,
                ),
                pending_indices: Vec::new(),
                metrics: ctx.metrics().clone(),
                cancel: cancel.clone(),
                outcome: WorkerOutcome::default(),
            };
            let handle = tokio::spawn(worker.run());
            WorkerHandle { sender, handle }
        })
        .collect()
}

struct Worker {
    id: usize,
    receiver: Receiver<IndexedRecord>,
    transformer: Arc<RecordTransformer>,
    committer: BatchCommitter,
    accumulator: BatchAccumulator,
    /// Record indices of the open batch's operations, in append order.
    pending_indices: Vec<u64>,
    metrics: Metrics,
    cancel: CancellationToken,
    outcome: WorkerOutcome,
}

impl Worker {
    async fn run(mut self) -> WorkerOutcome {
        let cancelled = loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break true,
                next = self.receiver.recv() => next,
            };

            match next {
                Some((index, record)) => self.process(index, &record).await,
                None => break false,
            }
        };

        if cancelled {
            self.abandon();
            return self.outcome;
        }

        if let Some(batch) = self.accumulator.flush() {
            self.metrics.increment_sealed(1);
            self.commit(batch).await;
        }

        info!(
            worker = self.id,
            committed = self.outcome.committed.len(),
            failed = self.outcome.failed.len(),
            skipped_records = self.outcome.failed_records.len(),
            "Worker finished"
        );
        self.outcome
    }

    async fn process(&mut self, index: u64, record: &Record) {
        match self.transformer.transform(record) {
            Ok(op) => {
                self.metrics.increment_transformed(1);
                self.pending_indices.push(index);
                if let Some(batch) = self.accumulator.add(op) {
                    self.metrics.increment_sealed(1);
                    self.commit(batch).await;
                }
            }
            Err(e) => {
                self.metrics.increment_record_failures(1);
                warn!(worker = self.id, record_index = index, error = %e, "Skipping record");
                self.outcome
                    .failed_records
                    .push(FailedRecord::new(index, e.kind(), e.to_string()));
            }
        }
    }

    // Not raced against cancellation: a started commit runs to its outcome.
    async fn commit(&mut self, batch: SealedBatch) {
        // A sealed batch always holds the oldest pending operations.
        let indices: Vec<u64> = self.pending_indices.drain(..batch.len()).collect();
        match self.committer.commit(batch).await {
            Ok(result) => self
                .outcome
                .committed
                .push(result.with_record_indices(indices)),
            Err(e) => {
                warn!(
                    worker = self.id,
                    batch_id = %e.batch_id(),
                    records = indices.len(),
                    first_record = ?indices.first(),
                    "Batch not written"
                );
                self.outcome
                    .failed
                    .push(e.to_result().with_record_indices(indices));
            }
        }
    }

    fn abandon(&mut self) {
        self.receiver.close();
        let mut unprocessed = 0;
        while self.receiver.try_recv().is_ok() {
            unprocessed += 1;
        }

        let discarded = self.accumulator.discard();
        self.pending_indices.clear();
        warn!(
            worker = self.id,
            discarded_operations = discarded,
            unprocessed_records = unprocessed,
            "Worker cancelled"
        );

        self.outcome.discarded_operations = discarded;
        self.outcome.unprocessed_records = unprocessed;
        self.outcome.cancelled = true;
    }
}
