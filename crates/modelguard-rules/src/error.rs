use std::path::PathBuf;

/// Errors raised by rules and rule files.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// An asynchronous rule could not produce a result.
    #[error("rule failed: {0}")]
    Failed(String),

    /// A rule file parsed but describes rules that cannot apply.
    #[error("invalid rule file: {class}.{field}: {reason}")]
    InvalidRuleFile {
        class: String,
        field: String,
        reason: String,
    },

    /// A rule file is not valid JSON or does not describe known rules.
    #[error("invalid rule file: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A rule file could not be read.
    #[error("failed reading rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
