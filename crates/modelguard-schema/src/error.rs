/// Errors that can occur while building or loading a schema catalog.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// A JSON Schema fragment could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// A field descriptor is not one of the recognized forms.
    #[error("invalid descriptor for {class}.{field}: {reason}")]
    InvalidDescriptor {
        class: String,
        field: String,
        reason: String,
    },

    /// The schema document is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A class with the same name is already present in the catalog.
    #[error("class {0} is already registered")]
    DuplicateClass(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
