use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Rule with id '{0}' is already registered")]
    DuplicateRule(String),

    #[error("Rule {rule_id} failed: {message}")]
    Evaluation { rule_id: String, message: String },

    #[error("Invalid rule configuration: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl RuleError {
    pub fn evaluation(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        RuleError::Evaluation {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}
