use crate::{
    report::finding::{
        CODE_BOUND_INVALID, CODE_KEY_DUPLICATE, CODE_KEY_NOT_IN_SCHEMA, CODE_KEY_NOT_SCALAR,
        CODE_KEY_NULLABLE, CODE_KEYS_MISSING, CODE_NESTED_ARRAY, CODE_SCHEMA_DUPLICATE,
        CODE_SCHEMA_MISSING, CODE_SCHEMA_TYPE, CODE_TABLE_INVALID, CODE_TABLE_MISSING, Finding,
        FindingKind,
    },
    settings::{SinkSettings, error::SettingsError, validated::ValidatedSettings},
};
use engine_core::retry::RetryPolicy;
use model::{
    core::data_type::DataType,
    schema::{Field, Schema},
};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tracing::{info, warn};

const MAX_TABLE_NAME_LEN: usize = 128;

/// Validates sink settings against the schema the pipeline supplies.
///
/// Every problem is collected as a [`Finding`]; the run is refused only after
/// all checks have executed, so a user sees the complete list at once.
pub struct SettingsValidator<'a> {
    input_schema: Option<&'a Schema>,
    findings: Vec<Finding>,
}

impl<'a> SettingsValidator<'a> {
    pub fn new(input_schema: Option<&'a Schema>) -> Self {
        Self {
            input_schema,
            findings: Vec::new(),
        }
    }

    pub fn validate(mut self, settings: &SinkSettings) -> Result<ValidatedSettings, SettingsError> {
        self.validate_table(&settings.table);
        self.validate_bounds(settings);
        let schema = self.resolve_schema(settings);

        if let Some(schema) = &schema {
            self.validate_schema(schema);
        }
        self.validate_keys(&settings.primary_keys, schema.as_ref());

        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.findings.into_iter().partition(Finding::is_error);

        for finding in &warnings {
            warn!(code = %finding.code, "{}", finding.message);
        }

        if !errors.is_empty() {
            return Err(SettingsError::Invalid { findings: errors });
        }

        let Some(schema) = schema else {
            // resolve_schema records an error whenever it returns None
            return Err(SettingsError::Invalid { findings: warnings });
        };

        let validated = ValidatedSettings {
            reference_name: settings
                .reference_name
                .clone()
                .unwrap_or_else(|| settings.table.clone()),
            table: settings.table.clone(),
            primary_keys: settings.primary_keys.clone(),
            write_kind: settings.write_kind,
            schema: Arc::new(schema),
            max_batch_operations: settings.max_batch_operations,
            max_batch_bytes: settings.max_batch_bytes,
            retry_policy: RetryPolicy::from_retry_limit(
                settings.retry_limit,
                Duration::from_millis(settings.retry_base_delay_ms),
                Duration::from_millis(settings.retry_max_delay_ms),
            ),
            commit_timeout: Duration::from_millis(settings.commit_timeout_ms),
            workers: settings.workers,
            warnings,
        };

        info!(
            table = %validated.table,
            keys = ?validated.primary_keys,
            fields = validated.schema.len(),
            max_ops = validated.max_batch_operations,
            max_bytes = validated.max_batch_bytes,
            retry_limit = settings.retry_limit,
            "Sink settings validated"
        );

        Ok(validated)
    }

    fn validate_table(&mut self, table: &str) {
        if table.trim().is_empty() {
            self.findings.push(
                Finding::error(
                    CODE_TABLE_MISSING,
                    "Target table name is required".to_string(),
                    FindingKind::Table,
                )
                .with_suggestion("Set `table` to the name of the destination table."),
            );
            return;
        }

        if !is_valid_identifier(table) {
            self.findings.push(
                Finding::error(
                    CODE_TABLE_INVALID,
                    format!("Table name `{table}` is not a valid identifier"),
                    FindingKind::Table,
                )
                .with_suggestion(
                    "Use letters, digits and underscores, starting with a letter, at most 128 characters.",
                ),
            );
        }
    }

    fn validate_bounds(&mut self, settings: &SinkSettings) {
        let checks = [
            ("max_batch_operations", settings.max_batch_operations as u64),
            ("max_batch_bytes", settings.max_batch_bytes as u64),
            ("commit_timeout_ms", settings.commit_timeout_ms),
            ("workers", settings.workers as u64),
        ];

        for (name, value) in checks {
            if value == 0 {
                self.findings.push(Finding::error(
                    CODE_BOUND_INVALID,
                    format!("`{name}` must be greater than zero"),
                    FindingKind::Batching,
                ));
            }
        }

        if settings.retry_max_delay_ms != 0
            && settings.retry_max_delay_ms < settings.retry_base_delay_ms
        {
            self.findings.push(Finding::warning(
                CODE_BOUND_INVALID,
                format!(
                    "`retry_max_delay_ms` ({}) is lower than `retry_base_delay_ms` ({}); every retry waits the maximum",
                    settings.retry_max_delay_ms, settings.retry_base_delay_ms
                ),
                FindingKind::Batching,
            ));
        }
    }

    /// The configured schema wins over the one supplied by the pipeline.
    fn resolve_schema(&mut self, settings: &SinkSettings) -> Option<Schema> {
        if let Some(specs) = &settings.schema {
            let mut fields = Vec::with_capacity(specs.len());
            for spec in specs {
                match spec.to_field() {
                    Ok(field) => fields.push(field),
                    Err(message) => self.findings.push(Finding::error(
                        CODE_SCHEMA_TYPE,
                        message,
                        FindingKind::Schema,
                    )),
                }
            }
            if fields.len() != specs.len() {
                return None;
            }
            if fields.is_empty() {
                self.push_schema_missing();
                return None;
            }
            return Some(Schema::new(fields));
        }

        match self.input_schema {
            Some(schema) if !schema.is_empty() => Some(schema.clone()),
            _ => {
                self.push_schema_missing();
                None
            }
        }
    }

    fn push_schema_missing(&mut self) {
        self.findings.push(
            Finding::error(
                CODE_SCHEMA_MISSING,
                "No schema available: neither a configured schema nor an input schema was provided"
                    .to_string(),
                FindingKind::Schema,
            )
            .with_suggestion("Add a `schema` to the settings or connect an upstream stage."),
        );
    }

    fn validate_schema(&mut self, schema: &Schema) {
        self.check_fields(schema.fields(), "");
    }

    fn check_fields(&mut self, fields: &[Field], prefix: &str) {
        let mut seen = HashSet::new();
        for field in fields {
            let path = format!("{prefix}{}", field.name);
            if !seen.insert(field.name.as_str()) {
                self.findings.push(Finding::error(
                    CODE_SCHEMA_DUPLICATE,
                    format!("Field `{path}` is declared more than once"),
                    FindingKind::Schema,
                ));
            }
            self.check_type(&field.data_type, &path);
        }
    }

    fn check_type(&mut self, data_type: &DataType, path: &str) {
        match data_type {
            DataType::Array(element) => {
                if matches!(element.as_ref(), DataType::Array(_)) {
                    self.findings.push(
                        Finding::error(
                            CODE_NESTED_ARRAY,
                            format!("Field `{path}` is an array of arrays, which has no column type"),
                            FindingKind::Schema,
                        )
                        .with_suggestion("Wrap the inner array in a record."),
                    );
                }
                self.check_type(element, path);
            }
            DataType::Record(fields) => self.check_fields(fields, &format!("{path}.")),
            _ => {}
        }
    }

    fn validate_keys(&mut self, keys: &[String], schema: Option<&Schema>) {
        if keys.is_empty() {
            self.findings.push(
                Finding::error(
                    CODE_KEYS_MISSING,
                    "At least one primary key column is required".to_string(),
                    FindingKind::Keys,
                )
                .with_suggestion("List the key columns in `primary_keys`."),
            );
            return;
        }

        let mut seen = HashSet::new();
        for key in keys {
            if !seen.insert(key.as_str()) {
                self.findings.push(Finding::error(
                    CODE_KEY_DUPLICATE,
                    format!("Primary key column `{key}` is listed more than once"),
                    FindingKind::Keys,
                ));
                continue;
            }

            let Some(schema) = schema else { continue };
            match schema.field(key) {
                None => self.findings.push(Finding::error(
                    CODE_KEY_NOT_IN_SCHEMA,
                    format!("Primary key column `{key}` is not a field of the schema"),
                    FindingKind::Keys,
                )),
                Some(field) if !field.data_type.is_scalar() => self.findings.push(Finding::error(
                    CODE_KEY_NOT_SCALAR,
                    format!(
                        "Primary key column `{key}` has type {} which cannot be a key",
                        field.data_type
                    ),
                    FindingKind::Keys,
                )),
                Some(field) if field.nullable => self.findings.push(Finding::warning(
                    CODE_KEY_NULLABLE,
                    format!(
                        "Primary key column `{key}` is nullable; records with a null key will be skipped"
                    ),
                    FindingKind::Keys,
                )),
                Some(_) => {}
            }
        }
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_TABLE_NAME_LEN
        && first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates `settings` and resolves the schema the run will use.
pub fn validate(
    settings: &SinkSettings,
    input_schema: Option<&Schema>,
) -> Result<ValidatedSettings, SettingsError> {
    SettingsValidator::new(input_schema).validate(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FieldSpec;

    fn input_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::String, true),
        ])
    }

    fn codes(err: &SettingsError) -> Vec<&str> {
        err.findings().iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_settings() {
        let schema = input_schema();
        let validated = validate(&SinkSettings::new("users", &["id"]), Some(&schema)).unwrap();

        assert_eq!(validated.reference_name, "users");
        assert_eq!(validated.schema.len(), 2);
        assert_eq!(validated.retry_policy.max_attempts, 4);
        assert_eq!(validated.commit_timeout, Duration::from_secs(30));
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn collects_every_error() {
        let mut settings = SinkSettings::new("", &[]);
        settings.max_batch_operations = 0;
        settings.workers = 0;

        let err = validate(&settings, None).unwrap_err();
        let codes = codes(&err);

        assert!(codes.contains(&CODE_TABLE_MISSING));
        assert!(codes.contains(&CODE_KEYS_MISSING));
        assert!(codes.contains(&CODE_SCHEMA_MISSING));
        assert_eq!(
            codes.iter().filter(|c| **c == CODE_BOUND_INVALID).count(),
            2
        );
    }

    #[test]
    fn rejects_invalid_table_identifier() {
        let schema = input_schema();
        let err = validate(&SinkSettings::new("1users-x", &["id"]), Some(&schema)).unwrap_err();
        assert_eq!(codes(&err), vec![CODE_TABLE_INVALID]);
    }

    #[test]
    fn configured_schema_overrides_input() {
        let mut settings = SinkSettings::new("users", &["user_id"]);
        settings.schema = Some(vec![FieldSpec {
            name: "user_id".into(),
            type_name: "string".into(),
            nullable: false,
            fields: None,
        }]);

        let schema = input_schema();
        let validated = validate(&settings, Some(&schema)).unwrap();
        assert_eq!(validated.schema.field_names(), vec!["user_id"]);
    }

    #[test]
    fn key_must_be_scalar_schema_field() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("tags", DataType::Array(Box::new(DataType::String)), false),
        ]);

        let err = validate(&SinkSettings::new("users", &["tags", "ghost"]), Some(&schema))
            .unwrap_err();
        assert_eq!(codes(&err), vec![CODE_KEY_NOT_SCALAR, CODE_KEY_NOT_IN_SCHEMA]);
    }

    #[test]
    fn nullable_key_is_only_a_warning() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64, true)]);
        let validated = validate(&SinkSettings::new("users", &["id"]), Some(&schema)).unwrap();

        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].code, CODE_KEY_NULLABLE);
    }

    #[test]
    fn rejects_nested_arrays_and_duplicates() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new(
                "matrix",
                DataType::Array(Box::new(DataType::Array(Box::new(DataType::Double)))),
                true,
            ),
            Field::new(
                "address",
                DataType::Record(vec![
                    Field::new("zip", DataType::String, true),
                    Field::new("zip", DataType::String, true),
                ]),
                true,
            ),
        ]);

        let err = validate(&SinkSettings::new("users", &["id"]), Some(&schema)).unwrap_err();
        assert_eq!(codes(&err), vec![CODE_NESTED_ARRAY, CODE_SCHEMA_DUPLICATE]);
        assert!(err.findings()[1].message.contains("address.zip"));
    }

    #[test]
    fn bad_configured_type_is_reported() {
        let mut settings = SinkSettings::new("users", &["id"]);
        settings.schema = Some(vec![FieldSpec {
            name: "id".into(),
            type_name: "uuid".into(),
            nullable: false,
            fields: None,
        }]);

        let err = validate(&settings, None).unwrap_err();
        assert_eq!(codes(&err), vec![CODE_SCHEMA_TYPE]);
    }
}
