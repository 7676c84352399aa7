use crate::{
    connectors::store::TransactionalStore,
    error::{RejectCode, StoreError},
};
use async_trait::async_trait;
use futures::lock::Mutex;
use model::{
    core::value::ColumnValue,
    records::operation::{WriteKind, WriteOperation},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tracing::debug;

pub type StoredRow = BTreeMap<String, ColumnValue>;

#[derive(Debug, Clone)]
struct MemoryTable {
    key_columns: Vec<String>,
    columns: Option<HashSet<String>>,
    rows: BTreeMap<String, StoredRow>,
}

#[derive(Debug, Default)]
struct Faults {
    scripted: VecDeque<StoreError>,
    latency: Option<Duration>,
}

/// In-process transactional store.
///
/// Tables are keyed by their primary-key columns. A submitted list is applied
/// to a copy of the tables and swapped in only if every operation succeeds.
/// Transient failures and latency can be injected to exercise commit retries
/// and timeouts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    faults: Mutex<Faults>,
    submits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table that accepts any column.
    pub fn with_table(self, name: &str, key_columns: &[&str]) -> Self {
        self.insert_table(name, key_columns, None)
    }

    /// Registers a table that rejects columns outside `columns`.
    pub fn with_strict_table(self, name: &str, key_columns: &[&str], columns: &[&str]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.insert_table(name, key_columns, Some(columns))
    }

    fn insert_table(
        mut self,
        name: &str,
        key_columns: &[&str],
        columns: Option<HashSet<String>>,
    ) -> Self {
        self.tables.get_mut().insert(
            name.to_string(),
            MemoryTable {
                key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
                columns,
                rows: BTreeMap::new(),
            },
        );
        self
    }

    /// Makes the next submits fail with the given errors, in order.
    pub async fn fail_next(&self, errors: Vec<StoreError>) {
        self.faults.lock().await.scripted.extend(errors);
    }

    /// Delays every submit by `latency` before it is applied.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().await.latency = latency;
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .await
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    pub async fn row(&self, table: &str, key: &[ColumnValue]) -> Option<StoredRow> {
        let tables = self.tables.lock().await;
        let key = render_key(key.iter());
        tables.get(table).and_then(|t| t.rows.get(&key).cloned())
    }

    async fn next_fault(&self) -> (Option<StoreError>, Option<Duration>) {
        let mut faults = self.faults.lock().await;
        (faults.scripted.pop_front(), faults.latency)
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn submit(&self, operations: &[WriteOperation]) -> Result<(), StoreError> {
        self.submits.fetch_add(1, Ordering::SeqCst);

        let (fault, latency) = self.next_fault().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = fault {
            return Err(err);
        }

        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();

        for (index, op) in operations.iter().enumerate() {
            apply(&mut staged, index, op)?;
        }

        *tables = staged;
        debug!(operations = operations.len(), "Applied transaction");
        Ok(())
    }
}

fn apply(
    tables: &mut HashMap<String, MemoryTable>,
    index: usize,
    op: &WriteOperation,
) -> Result<(), StoreError> {
    let table = tables.get_mut(&op.table).ok_or_else(|| {
        StoreError::rejected(
            index,
            RejectCode::InvalidArgument,
            format!("table '{}' not found", op.table),
        )
    })?;

    if let Some(columns) = &table.columns
        && let Some((name, _)) = op.columns.iter().find(|(name, _)| !columns.contains(name))
    {
        return Err(StoreError::rejected(
            index,
            RejectCode::SchemaMismatch,
            format!("column '{name}' not found in table '{}'", op.table),
        ));
    }

    let mut key_values = Vec::with_capacity(table.key_columns.len());
    for column in &table.key_columns {
        let value = op.get(column).ok_or_else(|| {
            StoreError::rejected(
                index,
                RejectCode::InvalidArgument,
                format!("missing key column '{column}' for table '{}'", op.table),
            )
        })?;
        key_values.push(value);
    }
    let key = render_key(key_values.into_iter());

    let row: StoredRow = op.columns.iter().cloned().collect();

    match op.kind {
        WriteKind::Insert => {
            if table.rows.contains_key(&key) {
                return Err(StoreError::rejected(
                    index,
                    RejectCode::AlreadyExists,
                    format!("row {key} already exists in table '{}'", op.table),
                ));
            }
            table.rows.insert(key, row);
        }
        WriteKind::Update => match table.rows.get_mut(&key) {
            Some(existing) => existing.extend(row),
            None => {
                return Err(StoreError::rejected(
                    index,
                    RejectCode::NotFound,
                    format!("row {key} not found in table '{}'", op.table),
                ));
            }
        },
        WriteKind::InsertOrUpdate => table.rows.entry(key).or_default().extend(row),
        WriteKind::Delete => {
            table.rows.remove(&key);
        }
    }

    Ok(())
}

// ColumnValue rendering escapes quotes and backslashes, so distinct keys render distinctly.
fn render_key<'a>(values: impl Iterator<Item = &'a ColumnValue>) -> String {
    let parts = values.map(|v| v.to_string()).collect::<Vec<_>>();
    format!("[{}]", parts.join(", "))
}
