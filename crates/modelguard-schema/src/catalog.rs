use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::CatalogConfig;
use crate::decoder::{JsonSchemaDecoder, PrimitiveType};
use crate::error::{Result, SchemaError};
use crate::kind::{FieldKind, ModelSchema};

const SCHEMA_FILE_SUFFIX: &str = ".model.json";

/// Class-keyed catalog of model schemas.
///
/// The catalog answers the three questions validation asks of a schema
/// mechanism: which fields a class declares, whether a runtime value is a
/// schema-described object, and which class such a value belongs to.
#[derive(Debug)]
pub struct SchemaCatalog {
    schemas: HashMap<String, ModelSchema>,
    config: CatalogConfig,
}

impl SchemaCatalog {
    /// Create an empty catalog with default config.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    /// Create an empty catalog with explicit config.
    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            schemas: HashMap::new(),
            config,
        }
    }

    /// Add a programmatically built schema.
    pub fn insert(&mut self, schema: ModelSchema) -> Result<()> {
        if self.schemas.contains_key(schema.class()) {
            return Err(SchemaError::DuplicateClass(schema.class().to_string()));
        }
        tracing::debug!(class = schema.class(), fields = schema.len(), "schema registered");
        self.schemas.insert(schema.class().to_string(), schema);
        Ok(())
    }

    /// Register a schema from a JSON document string.
    pub fn register(&mut self, schema_json: &str) -> Result<()> {
        let document: Value = serde_json::from_str(schema_json)?;
        self.register_value(&document, None)
    }

    /// Register a schema document. `fallback_class` names the class when the
    /// document has no `class` key.
    pub fn register_value(&mut self, document: &Value, fallback_class: Option<&str>) -> Result<()> {
        let schema = parse_document(document, fallback_class, self.config.strict_mode)?;
        self.insert(schema)
    }

    /// Load from embedded schema documents.
    pub fn from_embedded(documents: &[&str]) -> Result<Self> {
        let mut catalog = Self::new();
        for document in documents {
            catalog.register(document)?;
        }
        Ok(catalog)
    }

    /// Load `*.model.json` documents from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, CatalogConfig::default())
    }

    /// Load `*.model.json` documents from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: CatalogConfig) -> Result<Self> {
        let mut catalog = Self::with_config(config);
        let mut loaded_schema_count = 0usize;

        let mut entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(SCHEMA_FILE_SUFFIX) else {
                continue;
            };

            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            if path_metadata.file_type().is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !path_metadata.is_file() {
                continue;
            }

            loaded_schema_count = loaded_schema_count.saturating_add(1);
            if loaded_schema_count > catalog.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    catalog.config.max_schemas_from_directory, loaded_schema_count
                )));
            }

            let content = read_limited(&entry_path, catalog.config.max_schema_file_size)?;
            let document: Value = serde_json::from_str(&content)?;
            catalog.register_value(&document, Some(stem))?;
        }

        tracing::debug!(
            path = %path.display(),
            classes = catalog.schemas.len(),
            "schema directory loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, class: &str) -> Option<&ModelSchema> {
        self.schemas.get(class)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.schemas.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    /// Class named by the value's discriminator key, if it names a known class.
    pub fn declared_class<'v>(&self, value: &'v Value) -> Option<&'v str> {
        value
            .get(&self.config.class_key)
            .and_then(Value::as_str)
            .filter(|class| self.has_class(class))
    }

    /// Whether `value` is an object this catalog can describe on its own.
    pub fn is_model(&self, value: &Value) -> bool {
        value.is_object() && self.declared_class(value).is_some()
    }

    /// Class identity for `value`: its discriminator when that names a known
    /// class, otherwise the statically declared class.
    pub fn class_of<'a>(&self, value: &'a Value, declared: &'a str) -> &'a str {
        self.declared_class(value).unwrap_or(declared)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;
    let metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
    if metadata.len() > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({} bytes): {}",
            metadata.len(),
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large while reading: {}",
            path.display()
        )));
    }
    Ok(content)
}

fn parse_document(
    document: &Value,
    fallback_class: Option<&str>,
    strict_mode: bool,
) -> Result<ModelSchema> {
    let class = document
        .get("class")
        .and_then(Value::as_str)
        .or(fallback_class)
        .ok_or_else(|| SchemaError::LoadFailed("schema document has no class".to_string()))?;

    let empty = Map::new();
    let fields = match document.get("fields") {
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            return Err(SchemaError::LoadFailed(format!(
                "fields of {class} must be an object"
            )))
        }
        None => &empty,
    };

    let mut schema = ModelSchema::new(class);
    for (field, descriptor) in fields {
        let kind = parse_descriptor(descriptor, strict_mode).map_err(|reason| match reason {
            DescriptorError::Invalid(reason) => SchemaError::InvalidDescriptor {
                class: class.to_string(),
                field: field.clone(),
                reason,
            },
            DescriptorError::Schema(err) => err,
        })?;
        schema = schema.field(field.as_str(), kind);
    }
    Ok(schema)
}

enum DescriptorError {
    Invalid(String),
    Schema(SchemaError),
}

fn parse_descriptor(
    descriptor: &Value,
    strict_mode: bool,
) -> std::result::Result<FieldKind, DescriptorError> {
    match descriptor {
        Value::String(name) => PrimitiveType::from_name(name)
            .map(FieldKind::from)
            .ok_or_else(|| DescriptorError::Invalid(format!("unknown primitive type {name:?}"))),
        Value::Object(map) => {
            if let Some(class) = map.get("$model") {
                return class_name(class, "$model").map(FieldKind::model);
            }
            if let Some(class) = map.get("$array") {
                return class_name(class, "$array").map(FieldKind::array_of);
            }
            if let Some(inner) = map.get("$nullable") {
                return parse_descriptor(inner, strict_mode).map(FieldKind::nullable);
            }
            if let Some(variants) = map.get("$union") {
                let Value::Array(variants) = variants else {
                    return Err(DescriptorError::Invalid(
                        "$union must be an array".to_string(),
                    ));
                };
                if variants.is_empty() {
                    return Err(DescriptorError::Invalid(
                        "$union must not be empty".to_string(),
                    ));
                }
                return variants
                    .iter()
                    .map(|variant| parse_descriptor(variant, strict_mode))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(FieldKind::Union);
            }
            JsonSchemaDecoder::compile(descriptor, strict_mode)
                .map(FieldKind::primitive)
                .map_err(DescriptorError::Schema)
        }
        other => Err(DescriptorError::Invalid(format!(
            "descriptor must be a string or object, got {other}"
        ))),
    }
}

fn class_name(value: &Value, keyword: &str) -> std::result::Result<String, DescriptorError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DescriptorError::Invalid(format!("{keyword} must name a class")))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::kind::ResolvedKind;

    const PERSON_SCHEMA: &str = r#"{
        "class": "Person",
        "fields": {
            "Name": "string",
            "Age": { "type": "integer", "minimum": 0 },
            "Home": { "$model": "Address" },
            "Items": { "$array": "Item" },
            "Nick": { "$nullable": "string" },
            "Contact": { "$union": [{ "$model": "Address" }, "string"] }
        }
    }"#;

    const ADDRESS_SCHEMA: &str = r#"{
        "class": "Address",
        "fields": { "Street": "string" }
    }"#;

    #[test]
    fn register_parses_all_descriptor_forms() {
        let catalog = SchemaCatalog::from_embedded(&[PERSON_SCHEMA, ADDRESS_SCHEMA]).unwrap();
        let person = catalog.get("Person").unwrap();

        assert_eq!(person.len(), 6);
        assert_eq!(person.get("Name").unwrap().label(), "string");
        assert_eq!(person.get("Age").unwrap().label(), "integer");
        assert_eq!(person.get("Home").unwrap().label(), "Address");
        assert_eq!(person.get("Items").unwrap().label(), "[Item]");
        assert_eq!(person.get("Nick").unwrap().label(), "string | null");
        assert_eq!(person.get("Contact").unwrap().label(), "Address | string");
        assert_eq!(catalog.classes(), vec!["Address", "Person"]);
    }

    #[test]
    fn json_schema_fields_decode_values() {
        let catalog = SchemaCatalog::from_embedded(&[PERSON_SCHEMA]).unwrap();
        let age = catalog.get("Person").unwrap().get("Age").unwrap();
        let resolved = age.resolve(Some(&json!(-1)), &catalog);

        assert!(matches!(resolved, ResolvedKind::Leaf(_)));
        assert!(resolved.decode(&json!(3)).is_ok());
        assert!(resolved.decode(&json!(-1)).is_err());
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(ADDRESS_SCHEMA).unwrap();
        assert!(matches!(
            catalog.register(ADDRESS_SCHEMA),
            Err(SchemaError::DuplicateClass(class)) if class == "Address"
        ));
    }

    #[test]
    fn invalid_descriptor_names_class_and_field() {
        let result = SchemaCatalog::from_embedded(&[
            r#"{"class": "Broken", "fields": {"Oops": "datetime"}}"#,
        ]);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDescriptor { class, field, .. })
                if class == "Broken" && field == "Oops"
        ));

        let result = SchemaCatalog::from_embedded(&[
            r#"{"class": "Broken", "fields": {"Oops": {"$union": []}}}"#,
        ]);
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn invalid_fragment_fails_compile() {
        let result = SchemaCatalog::from_embedded(&[
            r#"{"class": "Broken", "fields": {"Oops": {"type": "definitely-not-a-type"}}}"#,
        ]);
        assert!(matches!(result, Err(SchemaError::CompileFailed(_))));
    }

    #[test]
    fn invalid_json_document_fails() {
        let mut catalog = SchemaCatalog::new();
        assert!(matches!(
            catalog.register("not-json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn class_identity_uses_discriminator_for_known_classes() {
        let catalog = SchemaCatalog::from_embedded(&[ADDRESS_SCHEMA]).unwrap();

        let tagged = json!({"$type": "Address", "Street": "Main"});
        let unknown = json!({"$type": "Planet"});
        let plain = json!({"Street": "Main"});

        assert!(catalog.is_model(&tagged));
        assert!(!catalog.is_model(&unknown));
        assert!(!catalog.is_model(&plain));
        assert!(!catalog.is_model(&json!("Address")));

        assert_eq!(catalog.class_of(&tagged, "Base"), "Address");
        assert_eq!(catalog.class_of(&unknown, "Base"), "Base");
    }

    #[test]
    fn custom_class_key_is_honored() {
        let mut catalog = SchemaCatalog::with_config(CatalogConfig {
            class_key: "kind".to_string(),
            ..CatalogConfig::default()
        });
        catalog.register(ADDRESS_SCHEMA).unwrap();

        assert!(catalog.is_model(&json!({"kind": "Address"})));
        assert!(!catalog.is_model(&json!({"$type": "Address"})));
    }

    #[test]
    fn from_directory_loads_model_files() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "Person.model.json", PERSON_SCHEMA);
        write_schema(&dir, "Address.model.json", r#"{"fields": {"Street": "string"}}"#);
        write_schema(&dir, "notes.json", "ignored");

        let catalog = SchemaCatalog::from_directory(&dir).unwrap();
        assert_eq!(catalog.classes(), vec!["Address", "Person"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink-schema");
        let target = dir.join("target.json");
        std::fs::write(&target, ADDRESS_SCHEMA.as_bytes()).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("Address.model.json")).unwrap();

        let result = SchemaCatalog::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_count_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-count-limit");
        write_schema(&dir, "A.model.json", r#"{"fields": {}}"#);
        write_schema(&dir, "B.model.json", r#"{"fields": {}}"#);

        let config = CatalogConfig {
            max_schemas_from_directory: 1,
            ..CatalogConfig::default()
        };
        let result = SchemaCatalog::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_file_size_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-size-limit");
        write_schema(&dir, "Address.model.json", ADDRESS_SCHEMA);

        let config = CatalogConfig {
            max_schema_file_size: 8,
            ..CatalogConfig::default()
        };
        let result = SchemaCatalog::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "modelguard-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
