use crate::settings::error::SettingsError;
use model::{core::data_type::DataType, records::operation::WriteKind, schema::Field};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub mod validated;
pub mod validator;

pub const DEFAULT_MAX_BATCH_OPERATIONS: usize = 100;
pub const DEFAULT_MAX_BATCH_BYTES: usize = 1024 * 1024;
pub const DEFAULT_RETRY_LIMIT: usize = 3;
pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5_000;

/// User-facing configuration of a sink run, as loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SinkSettings {
    /// Name under which the target dataset is reported.
    #[serde(default)]
    pub reference_name: Option<String>,

    #[serde(default)]
    pub table: String,

    #[serde(default)]
    pub primary_keys: Vec<String>,

    #[serde(default)]
    pub write_kind: WriteKind,

    #[serde(default = "default_max_batch_operations")]
    pub max_batch_operations: usize,

    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: usize,

    #[serde(default = "default_retry_limit")]
    pub retry_limit: usize,

    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Overrides the input schema when present.
    #[serde(default)]
    pub schema: Option<Vec<FieldSpec>>,
}

/// A schema field as written in the settings document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Sub-fields for `record` and `array<record>` types.
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
}

impl FieldSpec {
    pub fn to_field(&self) -> Result<Field, String> {
        let normalized = self.type_name.trim().to_ascii_lowercase();
        let data_type = match normalized.as_str() {
            "record" => DataType::Record(self.sub_fields()?),
            "array<record>" => DataType::Array(Box::new(DataType::Record(self.sub_fields()?))),
            _ => DataType::from_type_name(&self.type_name)
                .map_err(|e| format!("field '{}': {e}", self.name))?,
        };

        Ok(Field::new(&self.name, data_type, self.nullable))
    }

    fn sub_fields(&self) -> Result<Vec<Field>, String> {
        let specs = self
            .fields
            .as_ref()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| format!("field '{}': record type requires `fields`", self.name))?;
        specs.iter().map(FieldSpec::to_field).collect()
    }
}

impl SinkSettings {
    pub fn new(table: &str, primary_keys: &[&str]) -> Self {
        SinkSettings {
            reference_name: None,
            table: table.to_string(),
            primary_keys: primary_keys.iter().map(|k| k.to_string()).collect(),
            write_kind: WriteKind::default(),
            max_batch_operations: DEFAULT_MAX_BATCH_OPERATIONS,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            retry_limit: DEFAULT_RETRY_LIMIT,
            commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            workers: default_workers(),
            schema: None,
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

fn default_max_batch_operations() -> usize {
    DEFAULT_MAX_BATCH_OPERATIONS
}

fn default_max_batch_bytes() -> usize {
    DEFAULT_MAX_BATCH_BYTES
}

fn default_retry_limit() -> usize {
    DEFAULT_RETRY_LIMIT
}

fn default_commit_timeout_ms() -> u64 {
    DEFAULT_COMMIT_TIMEOUT_MS
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_retry_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}

fn default_workers() -> usize {
    1
}

fn default_nullable() -> bool {
    true
}
