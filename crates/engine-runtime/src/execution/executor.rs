use crate::{
    error::RuntimeError,
    execution::workers::{self, WorkerOutcome},
    lifecycle::SinkContext,
    report::RunReport,
};
use chrono::Utc;
use futures::{Stream, StreamExt, future::join_all, stream};
use model::records::record::Record;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Streams `records` through the sink until the input ends or `cancel` fires.
///
/// Records are dealt round-robin to the workers. Per-record and per-batch
/// failures end up in the returned report; only task failures are errors.
pub async fn run<S>(
    ctx: &SinkContext,
    mut records: S,
    cancel: CancellationToken,
) -> Result<RunReport, RuntimeError>
where
    S: Stream<Item = Record> + Unpin,
{
    let mut report = RunReport::new(ctx.run_id(), &ctx.settings().table, Utc::now());
    info!(run_id = %ctx.run_id(), table = %ctx.settings().table, "Starting sink run");

    let workers = workers::spawn(ctx, &cancel);
    let mut next_worker = 0;
    let mut closed_worker = None;

    loop {
        let record = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            record = records.next() => record,
        };
        let Some(record) = record else {
            break;
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = workers[next_worker].sender.send((report.records_received, record)) => sent,
        };
        if sent.is_err() {
            closed_worker = Some(next_worker);
            break;
        }

        report.records_received += 1;
        next_worker = (next_worker + 1) % workers.len();
    }

    if cancel.is_cancelled() {
        warn!(
            run_id = %ctx.run_id(),
            records_received = report.records_received,
            "Cancellation requested, stopping intake"
        );
    }

    let handles = workers
        .into_iter()
        .map(|worker| worker.handle)
        .collect::<Vec<_>>();
    // Every worker is awaited so no commit outlives the run.
    let mut join_error = None;
    for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(outcome) => merge(&mut report, outcome),
            Err(e) => {
                error!(worker, error = %e, "Worker task failed");
                join_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = join_error {
        error!(
            run_id = %ctx.run_id(),
            operations = report.operations_committed,
            batches = report.batches_committed(),
            failed_batches = report.batches_failed(),
            "Sink run aborted by a failed worker"
        );
        return Err(e.into());
    }

    if let Some(worker) = closed_worker
        && !cancel.is_cancelled()
    {
        error!(worker, "Worker closed its input before end of stream");
        return Err(RuntimeError::WorkerClosed { worker });
    }

    report.cancelled |= cancel.is_cancelled();
    report.failed_records.sort_by_key(|r| r.record_index);
    report.finished_at = Utc::now();

    let duration_ms = (report.finished_at - report.started_at).num_milliseconds();
    if report.is_success() {
        info!(
            run_id = %report.run_id,
            records = report.records_received,
            operations = report.operations_committed,
            batches = report.batches_committed(),
            skipped_records = report.failed_records.len(),
            duration_ms,
            "Sink run completed"
        );
    } else {
        warn!(
            run_id = %report.run_id,
            records = report.records_received,
            operations = report.operations_committed,
            batches = report.batches_committed(),
            failed_batches = report.batches_failed(),
            discarded_operations = report.discarded_operations,
            cancelled = report.cancelled,
            duration_ms,
            "Sink run finished with failures"
        );
    }

    Ok(report)
}

/// Runs an in-memory list of records to completion.
pub async fn run_all(
    ctx: &SinkContext,
    records: Vec<Record>,
    cancel: CancellationToken,
) -> Result<RunReport, RuntimeError> {
    run(ctx, stream::iter(records), cancel).await
}

fn merge(report: &mut RunReport, outcome: WorkerOutcome) {
    report.operations_committed += outcome
        .committed
        .iter()
        .map(|r| r.succeeded_count as u64)
        .sum::<u64>();
    report.committed.extend(outcome.committed);
    report.failed.extend(outcome.failed);
    report.failed_records.extend(outcome.failed_records);
    report.discarded_operations += outcome.discarded_operations;
    report.unprocessed_records += outcome.unprocessed_records;
    report.cancelled |= outcome.cancelled;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{initialize, prepare_run};
    use engine_config::settings::SinkSettings;
    use engine_core::{connectors::memory::MemoryStore, error::StoreError};
    use model::{
        core::{
            data_type::DataType,
            value::{ColumnValue, Value},
        },
        schema::{Field, Schema},
    };
    use std::{sync::Arc, time::Duration};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::String, true),
        ])
    }

    fn user(id: i64) -> Record {
        Record::new()
            .with("id", Value::Long(id))
            .with("name", Value::String(format!("user-{id}")))
    }

    fn context(store: Arc<MemoryStore>, workers: usize, batch: usize) -> SinkContext {
        let mut settings = SinkSettings::new("users", &["id"]);
        settings.workers = workers;
        settings.max_batch_operations = batch;
        settings.retry_base_delay_ms = 1;
        settings.retry_max_delay_ms = 1;
        initialize(prepare_run(&settings, Some(&schema())).unwrap(), store)
    }

    #[tokio::test]
    async fn single_worker_commits_ceil_n_over_k_batches() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        let ctx = context(store.clone(), 1, 3);

        let report = run_all(&ctx, (1..=10).map(user).collect(), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.records_received, 10);
        assert_eq!(report.batches_committed(), 4);
        assert_eq!(report.operations_committed, 10);
        assert_eq!(store.row_count("users").await, 10);
        assert_eq!(
            store.row("users", &[ColumnValue::Int64(7)]).await.unwrap()["name"],
            ColumnValue::String("user-7".into())
        );
    }

    #[tokio::test]
    async fn workers_share_the_load() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        let ctx = context(store.clone(), 3, 4);

        let report = run_all(&ctx, (0..30).map(user).collect(), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.operations_committed, 30);
        assert!(report.committed.iter().all(|r| r.succeeded_count <= 4));
        assert_eq!(store.row_count("users").await, 30);
        assert_eq!(ctx.metrics().snapshot().records_transformed, 30);
    }

    #[tokio::test]
    async fn bad_records_are_reported_and_skipped() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        let ctx = context(store.clone(), 2, 10);

        let records = vec![
            user(1),
            Record::new().with("name", Value::String("no key".into())),
            user(2),
            Record::new()
                .with("id", Value::String("3".into()))
                .with("name", Value::Null),
        ];
        let report = run_all(&ctx, records, CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.operations_committed, 2);
        let skipped: Vec<_> = report
            .failed_records
            .iter()
            .map(|r| (r.record_index, r.error_kind.as_str()))
            .collect();
        assert_eq!(skipped, vec![(1, "MissingKey"), (3, "TypeMismatch")]);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_the_run() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        store
            .fail_next(vec![StoreError::Unavailable("down".into()); 4])
            .await;
        let ctx = context(store.clone(), 1, 2);

        let report = run_all(&ctx, (0..4).map(user).collect(), CancellationToken::new())
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.batches_failed(), 1);
        assert_eq!(report.failed[0].attempts, 4);
        assert_eq!(report.failed[0].record_indices, vec![0, 1]);
        assert_eq!(report.unwritten_record_indices(), vec![0, 1]);
        assert_eq!(report.batches_committed(), 1);
        assert_eq!(report.committed[0].record_indices, vec![2, 3]);
        assert_eq!(store.row_count("users").await, 2);
    }

    #[tokio::test]
    async fn cancellation_discards_open_batch() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        let ctx = context(store.clone(), 1, 100);
        let cancel = CancellationToken::new();

        let records = stream::iter((0..5).map(user)).chain(stream::pending());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = run(&ctx, Box::pin(records), cancel).await.unwrap();

        assert!(report.cancelled);
        assert!(!report.is_success());
        assert_eq!(report.records_received, 5);
        assert_eq!(report.discarded_operations, 5);
        assert_eq!(store.submit_count(), 0);
        assert_eq!(store.row_count("users").await, 0);
    }

    #[tokio::test]
    async fn in_flight_commit_completes_after_cancellation() {
        let store = Arc::new(MemoryStore::new().with_table("users", &["id"]));
        store.set_latency(Some(Duration::from_millis(200))).await;
        let ctx = context(store.clone(), 1, 2);
        let cancel = CancellationToken::new();

        let records = stream::iter((0..2).map(user)).chain(stream::pending());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = run(&ctx, Box::pin(records), cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.batches_committed(), 1);
        assert_eq!(report.discarded_operations, 0);
        assert_eq!(store.row_count("users").await, 2);
    }
}
