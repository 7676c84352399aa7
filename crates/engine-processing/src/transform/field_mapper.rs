use crate::transform::error::TransformError;
use model::{
    core::{
        data_type::DataType,
        value::{ColumnValue, Value},
    },
    schema::Field,
};

/// Converts one record value into the store's native value for `field`.
pub fn map_field(field: &Field, value: &Value) -> Result<ColumnValue, TransformError> {
    map_value(&field.data_type, field.nullable, value, &field.name)
}

/// Converts `value` to the native representation of `data_type`.
///
/// Only lossless widening is applied (`INT32 -> INT64`, `FLOAT -> DOUBLE`).
/// Strings and bytes are passed through untouched. Array elements may be
/// NULL; record sub-fields follow their own nullability. `path` names the
/// value in errors, e.g. `address.zip` or `tags[2]`.
pub fn map_value(
    data_type: &DataType,
    nullable: bool,
    value: &Value,
    path: &str,
) -> Result<ColumnValue, TransformError> {
    if value.is_null() {
        return if nullable {
            Ok(ColumnValue::Null)
        } else {
            Err(TransformError::NullNotAllowed {
                field: path.to_string(),
            })
        };
    }

    match (data_type, value) {
        (DataType::Boolean, Value::Boolean(v)) => Ok(ColumnValue::Bool(*v)),
        (DataType::Int32 | DataType::Int64, Value::Int(v)) => Ok(ColumnValue::Int64(i64::from(*v))),
        (DataType::Int64, Value::Long(v)) => Ok(ColumnValue::Int64(*v)),
        (DataType::Float | DataType::Double, Value::Float(v)) => {
            Ok(ColumnValue::Float64(f64::from(*v)))
        }
        (DataType::Double, Value::Double(v)) => Ok(ColumnValue::Float64(*v)),
        (DataType::String, Value::String(v)) => Ok(ColumnValue::String(v.clone())),
        (DataType::Bytes, Value::Bytes(v)) => Ok(ColumnValue::Bytes(v.clone())),
        (DataType::Date, Value::Date(v)) => Ok(ColumnValue::Date(*v)),
        (DataType::Timestamp, Value::Timestamp(v)) => Ok(ColumnValue::Timestamp(*v)),
        (DataType::Array(element), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| map_value(element, true, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValue::Array),
        (DataType::Record(fields), Value::Record(record)) => fields
            .iter()
            .map(|field| {
                let sub_path = format!("{path}.{}", field.name);
                let mapped = match record.get(&field.name) {
                    Some(v) => map_value(&field.data_type, field.nullable, v, &sub_path)?,
                    None if field.nullable => ColumnValue::Null,
                    None => {
                        return Err(TransformError::MissingRequiredField { field: sub_path });
                    }
                };
                Ok((field.name.clone(), mapped))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValue::Struct),
        (expected, found) => Err(TransformError::TypeMismatch {
            field: path.to_string(),
            expected: expected.name().into_owned(),
            found: found.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use model::records::record::Record;

    fn mismatch(data_type: &DataType, value: Value) -> bool {
        matches!(
            map_value(data_type, true, &value, "f"),
            Err(TransformError::TypeMismatch { .. })
        )
    }

    #[test]
    fn widens_numbers() {
        assert_eq!(
            map_value(&DataType::Int64, false, &Value::Int(7), "n"),
            Ok(ColumnValue::Int64(7))
        );
        assert_eq!(
            map_value(&DataType::Double, false, &Value::Float(1.5), "n"),
            Ok(ColumnValue::Float64(1.5))
        );
        assert_eq!(
            map_value(&DataType::Int32, false, &Value::Int(-3), "n"),
            Ok(ColumnValue::Int64(-3))
        );
    }

    #[test]
    fn rejects_narrowing_and_cross_kind_coercion() {
        assert!(mismatch(&DataType::Int32, Value::Long(1)));
        assert!(mismatch(&DataType::Float, Value::Double(1.0)));
        assert!(mismatch(&DataType::Double, Value::Int(1)));
        assert!(mismatch(&DataType::String, Value::Long(1)));
        assert!(mismatch(&DataType::Bytes, Value::String("abc".into())));
        assert!(mismatch(&DataType::Timestamp, Value::String("2024-01-01".into())));
    }

    #[test]
    fn null_respects_nullability() {
        let nullable = Field::new("name", DataType::String, true);
        let required = Field::new("name", DataType::String, false);

        assert_eq!(map_field(&nullable, &Value::Null), Ok(ColumnValue::Null));
        assert_eq!(
            map_field(&required, &Value::Null),
            Err(TransformError::NullNotAllowed {
                field: "name".into()
            })
        );
    }

    #[test]
    fn passes_strings_bytes_and_time_through() {
        let bytes = vec![0xff, 0x00, 0xfe];
        assert_eq!(
            map_value(&DataType::Bytes, false, &Value::Bytes(bytes.clone()), "b"),
            Ok(ColumnValue::Bytes(bytes))
        );
        assert_eq!(
            map_value(&DataType::String, false, &Value::String("żółw".into()), "s"),
            Ok(ColumnValue::String("żółw".into()))
        );

        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(
            map_value(&DataType::Date, false, &Value::Date(date), "d"),
            Ok(ColumnValue::Date(date))
        );
        assert_eq!(
            map_value(&DataType::Timestamp, false, &Value::Timestamp(ts), "t"),
            Ok(ColumnValue::Timestamp(ts))
        );
    }

    #[test]
    fn arrays_recurse_and_empty_is_not_null() {
        let tags = DataType::Array(Box::new(DataType::Int64));

        assert_eq!(
            map_value(&tags, false, &Value::Array(vec![]), "tags"),
            Ok(ColumnValue::Array(vec![]))
        );
        assert_eq!(
            map_value(
                &tags,
                false,
                &Value::Array(vec![Value::Int(1), Value::Null, Value::Long(3)]),
                "tags"
            ),
            Ok(ColumnValue::Array(vec![
                ColumnValue::Int64(1),
                ColumnValue::Null,
                ColumnValue::Int64(3)
            ]))
        );
        assert_eq!(
            map_value(
                &tags,
                false,
                &Value::Array(vec![Value::Long(1), Value::String("x".into())]),
                "tags"
            ),
            Err(TransformError::TypeMismatch {
                field: "tags[1]".into(),
                expected: "INT64".into(),
                found: "STRING".into(),
            })
        );
    }

    #[test]
    fn records_recurse_with_field_paths() {
        let address = DataType::Record(vec![
            Field::new("zip", DataType::String, false),
            Field::new("floor", DataType::Int32, true),
        ]);

        let complete = Record::new().with("zip", Value::String("10115".into()));
        assert_eq!(
            map_value(&address, true, &Value::Record(complete), "address"),
            Ok(ColumnValue::Struct(vec![
                ("zip".into(), ColumnValue::String("10115".into())),
                ("floor".into(), ColumnValue::Null),
            ]))
        );

        let missing = Record::new().with("floor", Value::Int(2));
        assert_eq!(
            map_value(&address, true, &Value::Record(missing), "address"),
            Err(TransformError::MissingRequiredField {
                field: "address.zip".into()
            })
        );

        let null_zip = Record::new().with("zip", Value::Null);
        assert_eq!(
            map_value(&address, true, &Value::Record(null_zip), "address"),
            Err(TransformError::NullNotAllowed {
                field: "address.zip".into()
            })
        );
    }
}
