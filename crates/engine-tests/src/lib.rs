#![allow(dead_code)]

use engine_config::settings::SinkSettings;
use engine_core::connectors::memory::MemoryStore;
use engine_runtime::lifecycle::{SinkContext, initialize, prepare_run};
use model::{
    core::{data_type::DataType, value::Value},
    records::record::Record,
    schema::{Field, Schema},
};
use std::sync::Arc;

pub mod utils;

/// Settings document for the `users` table used across the scenarios.
pub const USERS_SETTINGS: &str = r#"{
    "reference_name": "users_sink",
    "table": "users",
    "primary_keys": ["id"],
    "write_kind": "insert",
    "max_batch_operations": 3,
    "retry_limit": 3,
    "retry_base_delay_ms": 1,
    "retry_max_delay_ms": 4
}"#;

/// `id INT64 NOT NULL, name STRING NULL, age INT32 NOT NULL`
pub fn users_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::String, true),
        Field::new("age", DataType::Int32, false),
    ])
}

pub fn user(id: i64, name: Option<&str>, age: i32) -> Record {
    Record::new()
        .with("id", Value::Long(id))
        .with(
            "name",
            name.map_or(Value::Null, |n| Value::String(n.to_string())),
        )
        .with("age", Value::Int(age))
}

pub fn users_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_strict_table("users", &["id"], &["id", "name", "age"]))
}

/// Validates `settings` against [`users_schema`] and binds them to `store`.
pub fn users_context(settings: &SinkSettings, store: Arc<MemoryStore>) -> SinkContext {
    let prepared = prepare_run(settings, Some(&users_schema())).expect("valid settings");
    initialize(prepared, store)
}
