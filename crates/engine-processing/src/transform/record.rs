use crate::transform::{error::TransformError, field_mapper::map_field};
use engine_config::settings::validated::ValidatedSettings;
use model::{
    core::value::{ColumnValue, Value},
    records::{
        operation::{WriteKind, WriteOperation},
        record::Record,
    },
    schema::Schema,
};
use std::sync::Arc;

/// Converts structured records into write operations for one table.
///
/// The transform is pure: it performs no I/O and keeps no state between
/// records, so a single instance can be shared by every worker.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    table: String,
    schema: Arc<Schema>,
    primary_keys: Vec<String>,
    kind: WriteKind,
}

impl RecordTransformer {
    pub fn new(table: &str, schema: Arc<Schema>, primary_keys: Vec<String>, kind: WriteKind) -> Self {
        Self {
            table: table.to_string(),
            schema,
            primary_keys,
            kind,
        }
    }

    pub fn from_settings(settings: &ValidatedSettings) -> Self {
        Self::new(
            &settings.table,
            settings.schema(),
            settings.primary_keys.clone(),
            settings.write_kind,
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Builds the write operation for `record`.
    ///
    /// Key columns are checked first, then every schema field in order.
    /// Record fields unknown to the schema are dropped.
    pub fn transform(&self, record: &Record) -> Result<WriteOperation, TransformError> {
        for key in &self.primary_keys {
            if matches!(record.get(key), None | Some(Value::Null)) {
                return Err(TransformError::MissingKey {
                    column: key.clone(),
                });
            }
        }

        let mut columns = Vec::with_capacity(self.schema.len());
        for field in self.schema.fields() {
            if self.kind == WriteKind::Delete && !self.is_key(&field.name) {
                continue;
            }

            let value = match record.get(&field.name) {
                Some(value) => map_field(field, value)?,
                None if field.nullable => ColumnValue::Null,
                None => {
                    return Err(TransformError::MissingRequiredField {
                        field: field.name.clone(),
                    });
                }
            };
            columns.push((field.name.clone(), value));
        }

        Ok(WriteOperation::new(&self.table, self.kind, columns))
    }

    fn is_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|k| k == column)
    }
}
