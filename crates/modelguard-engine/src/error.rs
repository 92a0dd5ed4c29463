use modelguard_rules::RuleError;

/// Failures that stop a validation run. Validation errors about the model
/// itself are never reported here; they are returned in the error graph.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// An asynchronous rule failed outright.
    #[error("rule for {class}.{field} failed: {source}")]
    Rule {
        class: String,
        field: String,
        #[source]
        source: RuleError,
    },

    /// A rule returned an outcome that cannot be attached to the error graph.
    #[error("invalid rule outcome for {class}.{field}: {reason}")]
    InvalidOutcome {
        class: String,
        field: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
