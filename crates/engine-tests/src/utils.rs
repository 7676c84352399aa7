use async_trait::async_trait;
use engine_core::{
    connectors::{
        memory::{MemoryStore, StoredRow},
        store::TransactionalStore,
    },
    error::StoreError,
};
use futures::lock::Mutex;
use model::{
    core::value::ColumnValue,
    records::operation::{WriteKind, WriteOperation},
};
use std::sync::Arc;

/// Store wrapper that records every submitted transaction before delegating.
pub struct RecordingStore {
    inner: Arc<MemoryStore>,
    submitted: Mutex<Vec<Vec<(WriteKind, ColumnValue)>>>,
    key_column: String,
}

impl RecordingStore {
    pub fn new(inner: Arc<MemoryStore>, key_column: &str) -> Self {
        Self {
            inner,
            submitted: Mutex::new(Vec::new()),
            key_column: key_column.to_string(),
        }
    }

    /// `(kind, key)` of each operation, per submit call, in submission order.
    pub async fn submitted(&self) -> Vec<Vec<(WriteKind, ColumnValue)>> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl TransactionalStore for RecordingStore {
    async fn submit(&self, operations: &[WriteOperation]) -> Result<(), StoreError> {
        let trace = operations
            .iter()
            .map(|op| {
                let key = op.get(&self.key_column).cloned().unwrap_or(ColumnValue::Null);
                (op.kind, key)
            })
            .collect();
        self.submitted.lock().await.push(trace);
        self.inner.submit(operations).await
    }
}

/// Store wrapper that panics on any batch holding `key`, standing in for a
/// crashing store client.
pub struct PanickingStore {
    inner: Arc<MemoryStore>,
    key_column: String,
    key: ColumnValue,
}

impl PanickingStore {
    pub fn new(inner: Arc<MemoryStore>, key_column: &str, key: ColumnValue) -> Self {
        Self {
            inner,
            key_column: key_column.to_string(),
            key,
        }
    }
}

#[async_trait]
impl TransactionalStore for PanickingStore {
    async fn submit(&self, operations: &[WriteOperation]) -> Result<(), StoreError> {
        if operations
            .iter()
            .any(|op| op.get(&self.key_column) == Some(&self.key))
        {
            panic!("store client crashed on key {}", self.key);
        }
        self.inner.submit(operations).await
    }
}

pub async fn assert_row_count(store: &MemoryStore, table: &str, expected: usize) {
    let actual = store.row_count(table).await;
    assert_eq!(actual, expected, "row count mismatch for table '{table}'");
}

pub async fn fetch_row(store: &MemoryStore, table: &str, id: i64) -> Option<StoredRow> {
    store.row(table, &[ColumnValue::Int64(id)]).await
}

pub async fn get_cell(store: &MemoryStore, table: &str, id: i64, column: &str) -> ColumnValue {
    fetch_row(store, table, id)
        .await
        .and_then(|row| row.get(column).cloned())
        .unwrap_or_else(|| panic!("no cell {table}.{column} for id {id}"))
}
