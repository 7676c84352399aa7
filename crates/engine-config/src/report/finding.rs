use serde::Serialize;
use std::fmt;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    Table,    // target table name
    Keys,     // primary key declaration
    Batching, // batch bounds, retries, timeouts
    Schema,   // configured or input schema
}

/// A single configuration problem. Validation collects every finding
/// before deciding whether the run can start.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

pub const CODE_TABLE_MISSING: &str = "TABLE_MISSING";
pub const CODE_TABLE_INVALID: &str = "TABLE_INVALID";
pub const CODE_KEYS_MISSING: &str = "KEYS_MISSING";
pub const CODE_KEY_NOT_IN_SCHEMA: &str = "KEY_NOT_IN_SCHEMA";
pub const CODE_KEY_NOT_SCALAR: &str = "KEY_NOT_SCALAR";
pub const CODE_KEY_NULLABLE: &str = "KEY_NULLABLE";
pub const CODE_KEY_DUPLICATE: &str = "KEY_DUPLICATE";
pub const CODE_BOUND_INVALID: &str = "BOUND_INVALID";
pub const CODE_SCHEMA_MISSING: &str = "SCHEMA_MISSING";
pub const CODE_SCHEMA_TYPE: &str = "SCHEMA_TYPE";
pub const CODE_SCHEMA_DUPLICATE: &str = "SCHEMA_DUPLICATE";
pub const CODE_NESTED_ARRAY: &str = "NESTED_ARRAY";

impl Finding {
    pub fn new(
        code: &str,
        message: String,
        severity: Severity,
        kind: FindingKind,
        suggestion: Option<String>,
    ) -> Self {
        Finding {
            code: code.to_string(),
            message,
            severity,
            kind,
            suggestion,
        }
    }

    pub fn error(code: &str, message: String, kind: FindingKind) -> Self {
        Finding::new(code, message, Severity::Error, kind, None)
    }

    pub fn warning(code: &str, message: String, kind: FindingKind) -> Self {
        Finding::new(code, message, Severity::Warning, kind, None)
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}
