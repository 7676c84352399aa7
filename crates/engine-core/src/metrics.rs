use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_transformed: AtomicU64,
    records_failed: AtomicU64,
    batches_sealed: AtomicU64,
    batches_committed: AtomicU64,
    batches_failed: AtomicU64,
    operations_committed: AtomicU64,
    bytes_committed: AtomicU64,
    commit_attempts: AtomicU64,
    retry_count: AtomicU64,
}

/// Counters shared by every worker of a sink run.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_transformed: u64,
    pub records_failed: u64,
    pub batches_sealed: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    pub operations_committed: u64,
    pub bytes_committed: u64,
    pub commit_attempts: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_transformed(&self, count: u64) {
        self.inner
            .records_transformed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_record_failures(&self, count: u64) {
        self.inner.records_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_sealed(&self, count: u64) {
        self.inner.batches_sealed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_commit(&self, operations: u64, bytes: u64) {
        self.inner.batches_committed.fetch_add(1, Ordering::Relaxed);
        self.inner
            .operations_committed
            .fetch_add(operations, Ordering::Relaxed);
        self.inner
            .bytes_committed
            .fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_batch_failures(&self, count: u64) {
        self.inner.batches_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_attempts(&self, count: u64) {
        self.inner.commit_attempts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_transformed: self.inner.records_transformed.load(Ordering::Relaxed),
            records_failed: self.inner.records_failed.load(Ordering::Relaxed),
            batches_sealed: self.inner.batches_sealed.load(Ordering::Relaxed),
            batches_committed: self.inner.batches_committed.load(Ordering::Relaxed),
            batches_failed: self.inner.batches_failed.load(Ordering::Relaxed),
            operations_committed: self.inner.operations_committed.load(Ordering::Relaxed),
            bytes_committed: self.inner.bytes_committed.load(Ordering::Relaxed),
            commit_attempts: self.inner.commit_attempts.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let worker = metrics.clone();

        worker.record_commit(10, 512);
        worker.increment_attempts(2);
        metrics.increment_retries(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_committed, 1);
        assert_eq!(snapshot.operations_committed, 10);
        assert_eq!(snapshot.bytes_committed, 512);
        assert_eq!(snapshot.commit_attempts, 2);
        assert_eq!(snapshot.retry_count, 1);
    }
}
