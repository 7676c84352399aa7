use engine_config::settings::error::SettingsError;
use thiserror::Error;

/// Top-level errors of a sink run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Settings could not be loaded or failed validation.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A worker task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Worker {worker} stopped accepting records")]
    WorkerClosed { worker: usize },

    #[error("Tracing initialisation failed: {0}")]
    Telemetry(String),
}
