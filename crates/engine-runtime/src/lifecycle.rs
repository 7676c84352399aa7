use crate::error::RuntimeError;
use engine_config::settings::{SinkSettings, validated::ValidatedSettings, validator::validate};
use engine_core::{
    connectors::store::TransactionalStore,
    metrics::{Metrics, MetricsSnapshot},
};
use engine_processing::{consumer::committer::BatchCommitter, transform::record::RecordTransformer};
use model::schema::Schema;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Settings that passed validation, ready to be bound to a store.
#[derive(Debug, Clone)]
pub struct PreparedSink {
    settings: ValidatedSettings,
}

impl PreparedSink {
    pub fn settings(&self) -> &ValidatedSettings {
        &self.settings
    }
}

/// Everything a run needs, shared by all workers.
#[derive(Clone)]
pub struct SinkContext {
    run_id: String,
    settings: Arc<ValidatedSettings>,
    transformer: Arc<RecordTransformer>,
    committer: BatchCommitter,
    metrics: Metrics,
}

impl SinkContext {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn settings(&self) -> &ValidatedSettings {
        &self.settings
    }

    pub fn transformer(&self) -> Arc<RecordTransformer> {
        Arc::clone(&self.transformer)
    }

    pub fn committer(&self) -> &BatchCommitter {
        &self.committer
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Validates `settings` against the schema of the incoming records.
///
/// Fails with every collected error finding; warnings are kept on the settings.
pub fn prepare_run(
    settings: &SinkSettings,
    input_schema: Option<&Schema>,
) -> Result<PreparedSink, RuntimeError> {
    let settings = validate(settings, input_schema)?;

    info!(
        reference_name = %settings.reference_name,
        table = %settings.table,
        fields = settings.schema.len(),
        primary_keys = ?settings.primary_keys,
        write_kind = %settings.write_kind,
        warnings = settings.warnings.len(),
        "Prepared sink run"
    );

    Ok(PreparedSink { settings })
}

/// Binds prepared settings to a store and builds the shared run components.
pub fn initialize(prepared: PreparedSink, store: Arc<dyn TransactionalStore>) -> SinkContext {
    let settings = prepared.settings;
    let metrics = Metrics::new();

    let transformer = RecordTransformer::from_settings(&settings);
    let committer = BatchCommitter::new(
        store,
        settings.retry_policy.clone(),
        settings.commit_timeout,
        metrics.clone(),
    );

    let run_id = Uuid::new_v4().to_string();
    info!(
        run_id = %run_id,
        workers = settings.workers,
        max_batch_operations = settings.max_batch_operations,
        max_batch_bytes = settings.max_batch_bytes,
        retry_limit = settings.retry_limit(),
        commit_timeout_ms = settings.commit_timeout.as_millis(),
        "Sink initialized"
    );

    SinkContext {
        run_id,
        settings: Arc::new(settings),
        transformer: Arc::new(transformer),
        committer,
        metrics,
    }
}

/// Tears the context down and returns the final counters.
pub fn destroy(ctx: SinkContext) -> MetricsSnapshot {
    let snapshot = ctx.metrics.snapshot();
    info!(
        run_id = %ctx.run_id,
        records_transformed = snapshot.records_transformed,
        records_failed = snapshot.records_failed,
        batches_committed = snapshot.batches_committed,
        batches_failed = snapshot.batches_failed,
        operations_committed = snapshot.operations_committed,
        commit_attempts = snapshot.commit_attempts,
        retries = snapshot.retry_count,
        "Sink destroyed"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::settings::error::SettingsError;
    use engine_core::connectors::memory::MemoryStore;
    use model::{core::data_type::DataType, schema::Field};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::String, true),
        ])
    }

    #[test]
    fn prepare_fails_with_all_findings() {
        let settings = SinkSettings::new("", &[]);
        let err = prepare_run(&settings, None).unwrap_err();

        let RuntimeError::Settings(SettingsError::Invalid { findings }) = err else {
            panic!("expected invalid settings");
        };
        assert!(findings.len() >= 2);
    }

    #[test]
    fn initialize_and_destroy() {
        let mut settings = SinkSettings::new("users", &["id"]);
        settings.workers = 3;

        let prepared = prepare_run(&settings, Some(&schema())).unwrap();
        assert_eq!(prepared.settings().workers, 3);

        let ctx = initialize(prepared, Arc::new(MemoryStore::new()));
        assert!(!ctx.run_id().is_empty());
        assert_eq!(ctx.transformer().table(), "users");
        assert_eq!(ctx.committer().retry_policy().retry_limit(), 3);

        let snapshot = destroy(ctx);
        assert_eq!(snapshot, MetricsSnapshot::default());
    }
}
