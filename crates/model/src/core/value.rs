use crate::records::record::Record;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw field value as it arrives from the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Record(Record),
}

/// A value in the target store's native representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Array(Vec<ColumnValue>),
    Struct(Vec<(String, ColumnValue)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type name, used when reporting mismatches.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOL",
            Value::Int(_) => "INT32",
            Value::Long(_) => "INT64",
            Value::Float(_) => "FLOAT",
            Value::Double(_) => "DOUBLE",
            Value::String(_) => "STRING",
            Value::Bytes(_) => "BYTES",
            Value::Date(_) => "DATE",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Array(_) => "ARRAY",
            Value::Record(_) => "RECORD",
        }
    }
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Approximate encoded size, used to bound batches.
    pub fn size_bytes(&self) -> usize {
        match self {
            ColumnValue::Null => 1,
            ColumnValue::Bool(_) => 1,
            ColumnValue::Int64(_) => std::mem::size_of::<i64>(),
            ColumnValue::Float64(_) => std::mem::size_of::<f64>(),
            ColumnValue::String(s) => s.len(),
            ColumnValue::Bytes(b) => b.len(),
            ColumnValue::Date(_) => 4,
            ColumnValue::Timestamp(_) => 12,
            ColumnValue::Array(values) => values.iter().map(ColumnValue::size_bytes).sum(),
            ColumnValue::Struct(fields) => fields
                .iter()
                .map(|(name, value)| name.len() + value.size_bytes())
                .sum(),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => write!(f, "NULL"),
            ColumnValue::Bool(v) => write!(f, "{v}"),
            ColumnValue::Int64(v) => write!(f, "{v}"),
            ColumnValue::Float64(v) => write!(f, "{v}"),
            ColumnValue::String(v) => {
                write!(f, "'{}'", v.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            ColumnValue::Bytes(v) => {
                let hex = v
                    .iter()
                    .fold(String::new(), |acc, byte| acc + &format!("{byte:02x}"));
                write!(f, "b'{hex}'")
            }
            ColumnValue::Date(v) => write!(f, "DATE '{v}'"),
            ColumnValue::Timestamp(v) => write!(f, "TIMESTAMP '{}'", v.to_rfc3339()),
            ColumnValue::Array(values) => {
                let items = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{items}]")
            }
            ColumnValue::Struct(fields) => {
                let items = fields
                    .iter()
                    .map(|(name, v)| format!("{name}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({items})")
            }
        }
    }
}
