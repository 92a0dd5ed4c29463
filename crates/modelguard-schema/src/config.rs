/// Controls how model schemas are compiled and loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// When true, object-typed field fragments reject properties they do not declare.
    pub strict_mode: bool,
    /// Key whose string value names the class of an object (subclass override).
    pub class_key: String,
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes allowed per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            class_key: "$type".to_string(),
            max_schemas_from_directory: 256,
            max_schema_file_size: 256 * 1024,
        }
    }
}
