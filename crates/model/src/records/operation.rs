use crate::core::value::ColumnValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    #[default]
    Insert,
    Update,
    InsertOrUpdate,
    Delete,
}

impl WriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteKind::Insert => "INSERT",
            WriteKind::Update => "UPDATE",
            WriteKind::InsertOrUpdate => "INSERT_OR_UPDATE",
            WriteKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mutation against one table, in the store's native value model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteOperation {
    pub table: String,
    pub kind: WriteKind,
    /// Columns in schema order.
    pub columns: Vec<(String, ColumnValue)>,
}

impl WriteOperation {
    pub fn new(table: &str, kind: WriteKind, columns: Vec<(String, ColumnValue)>) -> Self {
        WriteOperation {
            table: table.to_string(),
            kind,
            columns,
        }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn size_bytes(&self) -> usize {
        self.table.len()
            + self
                .columns
                .iter()
                .map(|(name, value)| name.len() + value.size_bytes())
                .sum::<usize>()
    }
}
