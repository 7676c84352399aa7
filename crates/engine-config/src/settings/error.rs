use crate::report::finding::Finding;
use thiserror::Error;

/// Errors raised while loading or validating sink settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON for `SinkSettings`.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// One or more validation errors were collected.
    #[error("Invalid sink settings: {}", render(.findings))]
    Invalid { findings: Vec<Finding> },
}

fn render(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SettingsError {
    pub fn findings(&self) -> &[Finding] {
        match self {
            SettingsError::Invalid { findings } => findings,
            _ => &[],
        }
    }
}
