use std::fmt;
use std::io;

use modelguard_engine::ValidationError;
use modelguard_rules::RuleError;
use modelguard_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
/// The model failed validation, or an input file is malformed.
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match err {
        SchemaError::LoadFailed(_) => USAGE,
        SchemaError::CompileFailed(_)
        | SchemaError::InvalidDescriptor { .. }
        | SchemaError::InvalidJson(_)
        | SchemaError::DuplicateClass(_) => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn rule_error(context: &str, err: RuleError) -> CliError {
    match err {
        RuleError::Io { source, .. } => io_error(context, source),
        RuleError::InvalidJson(_) | RuleError::InvalidRuleFile { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        RuleError::Failed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn validation_error(context: &str, err: ValidationError) -> CliError {
    match err {
        ValidationError::Rule { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        ValidationError::InvalidOutcome { .. } => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
    }
}
