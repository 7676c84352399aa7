use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report of a record that was skipped because it could not be transformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRecord {
    /// Position of the record in the input stream.
    pub record_index: u64,
    pub error_kind: String,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}

impl FailedRecord {
    pub fn new(record_index: u64, error_kind: &str, message: String) -> Self {
        FailedRecord {
            record_index,
            error_kind: error_kind.to_string(),
            message,
            failed_at: Utc::now(),
        }
    }
}
