use std::fmt;

use jsonschema::Validator;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

/// Upper bound on reasons reported for a single decode failure.
const MAX_REPORTED_REASONS: usize = 4;

/// Decodes (checks) a raw field value against its declared primitive type.
///
/// Each reason returned on failure is reported as one error string on the
/// field's error list.
pub trait Decoder: Send + Sync + fmt::Debug {
    /// Check `value`, returning the reasons it does not decode.
    fn decode(&self, value: &Value) -> std::result::Result<(), Vec<String>>;

    /// Short label used in messages (`string`, `integer`, ...).
    fn describe(&self) -> String;
}

/// Built-in JSON primitive decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Any,
}

impl PrimitiveType {
    /// Parse the bare-string descriptor form (`"string"`, `"integer"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => is_integral(value),
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
            Self::Any => true,
        }
    }
}

impl Decoder for PrimitiveType {
    fn decode(&self, value: &Value) -> std::result::Result<(), Vec<String>> {
        if self.accepts(value) {
            return Ok(());
        }
        Err(vec![format!(
            "expected {}, got {}",
            self.name(),
            json_type_name(value)
        )])
    }

    fn describe(&self) -> String {
        self.name().to_string()
    }
}

/// Decoder backed by a compiled JSON Schema fragment.
pub struct JsonSchemaDecoder {
    validator: Validator,
    label: String,
}

impl JsonSchemaDecoder {
    /// Compile a fragment. With `strict_mode`, object schemas inside it reject
    /// properties they do not declare.
    pub fn compile(fragment: &Value, strict_mode: bool) -> Result<Self> {
        let mut fragment = fragment.clone();
        if strict_mode {
            apply_strict_mode(&mut fragment);
        }

        let validator = jsonschema::validator_for(&fragment)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;

        Ok(Self {
            validator,
            label: fragment_label(&fragment),
        })
    }
}

impl fmt::Debug for JsonSchemaDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaDecoder")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Decoder for JsonSchemaDecoder {
    fn decode(&self, value: &Value) -> std::result::Result<(), Vec<String>> {
        let reasons: Vec<String> = self
            .validator
            .iter_errors(value)
            .take(MAX_REPORTED_REASONS)
            .map(|err| err.to_string())
            .collect();

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// JSON type name of a value, as used in decode messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_integral(value) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn fragment_label(fragment: &Value) -> String {
    match fragment.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "schema".to_string(),
    }
}

fn apply_strict_mode(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_object_schema(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            recurse_children(map);
        }
        Value::Array(items) => items.iter_mut().for_each(apply_strict_mode),
        _ => {}
    }
}

fn recurse_children(map: &mut Map<String, Value>) {
    const SCHEMA_MAPS: [&str; 5] = [
        "properties",
        "patternProperties",
        "dependentSchemas",
        "$defs",
        "definitions",
    ];
    const SUBSCHEMAS: [&str; 15] = [
        "propertyNames",
        "additionalProperties",
        "unevaluatedProperties",
        "items",
        "contains",
        "additionalItems",
        "unevaluatedItems",
        "not",
        "if",
        "then",
        "else",
        "prefixItems",
        "allOf",
        "anyOf",
        "oneOf",
    ];

    for key in SCHEMA_MAPS {
        if let Some(Value::Object(children)) = map.get_mut(key) {
            children.values_mut().for_each(apply_strict_mode);
        }
    }
    for key in SUBSCHEMAS {
        if let Some(child) = map.get_mut(key) {
            apply_strict_mode(child);
        }
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    const OBJECT_KEYWORDS: [&str; 8] = [
        "properties",
        "patternProperties",
        "additionalProperties",
        "unevaluatedProperties",
        "required",
        "dependentRequired",
        "dependentSchemas",
        "propertyNames",
    ];

    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Value::String(kind) if kind == "object")),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn primitive_types_accept_matching_values() {
        assert!(PrimitiveType::String.decode(&json!("x")).is_ok());
        assert!(PrimitiveType::Number.decode(&json!(1.5)).is_ok());
        assert!(PrimitiveType::Integer.decode(&json!(3)).is_ok());
        assert!(PrimitiveType::Integer.decode(&json!(3.0)).is_ok());
        assert!(PrimitiveType::Boolean.decode(&json!(false)).is_ok());
        assert!(PrimitiveType::Null.decode(&Value::Null).is_ok());
        assert!(PrimitiveType::Any.decode(&json!({"a": 1})).is_ok());
    }

    #[test]
    fn primitive_type_mismatch_reports_one_reason() {
        let reasons = PrimitiveType::Integer.decode(&json!("abc")).unwrap_err();
        assert_eq!(reasons, vec!["expected integer, got string".to_string()]);

        let reasons = PrimitiveType::String.decode(&Value::Null).unwrap_err();
        assert_eq!(reasons, vec!["expected string, got null".to_string()]);
    }

    #[test]
    fn primitive_names_round_trip() {
        for name in ["string", "number", "integer", "boolean", "null", "any"] {
            assert_eq!(PrimitiveType::from_name(name).unwrap().name(), name);
        }
        assert_eq!(PrimitiveType::from_name("date"), None);
    }

    #[test]
    fn json_schema_decoder_reports_violations() {
        let decoder =
            JsonSchemaDecoder::compile(&json!({"type": "string", "maxLength": 3}), false).unwrap();
        assert_eq!(decoder.describe(), "string");
        assert!(decoder.decode(&json!("abc")).is_ok());

        let reasons = decoder.decode(&json!("abcd")).unwrap_err();
        assert_eq!(reasons.len(), 1);
    }

    #[test]
    fn json_schema_decoder_rejects_invalid_fragment() {
        let result = JsonSchemaDecoder::compile(&json!({"type": "definitely-not-a-type"}), false);
        assert!(matches!(result, Err(SchemaError::CompileFailed(_))));
    }

    #[test]
    fn strict_mode_rejects_undeclared_properties() {
        let fragment = json!({
            "type": "object",
            "properties": {
                "nested": {
                    "properties": { "v": { "type": "integer" } }
                }
            }
        });

        let permissive = JsonSchemaDecoder::compile(&fragment, false).unwrap();
        let strict = JsonSchemaDecoder::compile(&fragment, true).unwrap();

        let value = json!({"nested": {"v": 1, "extra": true}});
        assert!(permissive.decode(&value).is_ok());
        assert!(strict.decode(&value).is_err());
        assert!(strict.decode(&json!({"nested": {"v": 1}})).is_ok());
    }

    #[test]
    fn reasons_are_capped() {
        let decoder = JsonSchemaDecoder::compile(
            &json!({"type": "array", "items": {"type": "integer"}}),
            false,
        )
        .unwrap();
        let reasons = decoder
            .decode(&json!(["a", "b", "c", "d", "e", "f"]))
            .unwrap_err();
        assert_eq!(reasons.len(), MAX_REPORTED_REASONS);
    }
}
