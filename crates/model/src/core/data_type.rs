use crate::schema::Field;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// Logical type of a schema field as declared by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Bytes,
    Timestamp,
    Date,
    Array(Box<DataType>),
    Record(Vec<Field>),
}

/// Native column type of the target store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    Date,
    Timestamp,
    Array(Box<ColumnType>),
    Struct(Vec<(String, ColumnType)>),
}

lazy_static! {
    static ref SCALAR_TYPE_MAP: HashMap<&'static str, DataType> = build_scalar_type_map();
}

impl DataType {
    /// Parses a configured type name such as `int64`, `STRING` or `array<date>`.
    pub fn from_type_name(type_name: &str) -> Result<Self, String> {
        let normalized = type_name.trim().to_ascii_lowercase();

        if let Some(inner) = normalized
            .strip_prefix("array<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let element = Self::from_type_name(inner)
                .map_err(|_| format!("Unknown array element type: {type_name}"))?;
            return Ok(DataType::Array(Box::new(element)));
        }

        SCALAR_TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .ok_or_else(|| format!("Unknown field type: {type_name}"))
    }

    /// Short uppercase name used in error messages and reports.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            DataType::Boolean => Cow::Borrowed("BOOL"),
            DataType::Int32 => Cow::Borrowed("INT32"),
            DataType::Int64 => Cow::Borrowed("INT64"),
            DataType::Float => Cow::Borrowed("FLOAT"),
            DataType::Double => Cow::Borrowed("DOUBLE"),
            DataType::String => Cow::Borrowed("STRING"),
            DataType::Bytes => Cow::Borrowed("BYTES"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Array(element) => Cow::Owned(format!("ARRAY<{}>", element.name())),
            DataType::Record(_) => Cow::Borrowed("RECORD"),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            DataType::Boolean => ColumnType::Bool,
            DataType::Int32 | DataType::Int64 => ColumnType::Int64,
            DataType::Float | DataType::Double => ColumnType::Float64,
            DataType::String => ColumnType::String,
            DataType::Bytes => ColumnType::Bytes,
            DataType::Timestamp => ColumnType::Timestamp,
            DataType::Date => ColumnType::Date,
            DataType::Array(element) => ColumnType::Array(Box::new(element.column_type())),
            DataType::Record(fields) => ColumnType::Struct(
                fields
                    .iter()
                    .map(|f| (f.name.clone(), f.data_type.column_type()))
                    .collect(),
            ),
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, DataType::Array(_) | DataType::Record(_))
    }
}

impl ColumnType {
    /// Column type as written in the store's DDL.
    pub fn ddl_name(&self) -> Cow<'_, str> {
        match self {
            ColumnType::Bool => Cow::Borrowed("BOOL"),
            ColumnType::Int64 => Cow::Borrowed("INT64"),
            ColumnType::Float64 => Cow::Borrowed("FLOAT64"),
            ColumnType::String => Cow::Borrowed("STRING(MAX)"),
            ColumnType::Bytes => Cow::Borrowed("BYTES(MAX)"),
            ColumnType::Date => Cow::Borrowed("DATE"),
            ColumnType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            ColumnType::Array(element) => Cow::Owned(format!("ARRAY<{}>", element.ddl_name())),
            ColumnType::Struct(fields) => {
                let inner = fields
                    .iter()
                    .map(|(name, ty)| format!("{name} {}", ty.ddl_name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                Cow::Owned(format!("STRUCT<{inner}>"))
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ddl_name())
    }
}

fn build_scalar_type_map() -> HashMap<&'static str, DataType> {
    HashMap::from([
        ("bool", DataType::Boolean),
        ("boolean", DataType::Boolean),
        ("int", DataType::Int32),
        ("int32", DataType::Int32),
        ("integer", DataType::Int32),
        ("long", DataType::Int64),
        ("int64", DataType::Int64),
        ("bigint", DataType::Int64),
        ("float", DataType::Float),
        ("float32", DataType::Float),
        ("double", DataType::Double),
        ("float64", DataType::Double),
        ("string", DataType::String),
        ("bytes", DataType::Bytes),
        ("timestamp", DataType::Timestamp),
        ("date", DataType::Date),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_and_array_names() {
        assert_eq!(DataType::from_type_name("INT64"), Ok(DataType::Int64));
        assert_eq!(DataType::from_type_name(" long "), Ok(DataType::Int64));
        assert_eq!(
            DataType::from_type_name("array<String>"),
            Ok(DataType::Array(Box::new(DataType::String)))
        );
        assert!(DataType::from_type_name("map<string,int>").is_err());
    }

    #[test]
    fn widened_types_share_native_column() {
        assert_eq!(DataType::Int32.column_type(), ColumnType::Int64);
        assert_eq!(DataType::Float.column_type(), ColumnType::Float64);
        assert_eq!(
            DataType::Array(Box::new(DataType::String))
                .column_type()
                .ddl_name(),
            "ARRAY<STRING(MAX)>"
        );
    }

    #[test]
    fn record_maps_to_struct() {
        let record = DataType::Record(vec![
            Field::new("zip", DataType::String, false),
            Field::new("floor", DataType::Int32, true),
        ]);
        assert_eq!(
            record.column_type().ddl_name(),
            "STRUCT<zip STRING(MAX), floor INT64>"
        );
        assert!(!record.is_scalar());
    }
}
