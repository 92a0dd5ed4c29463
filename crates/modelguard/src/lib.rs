//! Declarative validation for nested JSON models.
//!
//! Rules are registered per class, schemas describe the shape of each class,
//! and the engine walks a model to produce an error graph that mirrors it.
//!
//! # Crate Structure
//!
//! - [`schema`]: field descriptors, decoders and the class catalog
//! - [`rules`]: rule primitives, built-ins, rule registry and rule files
//! - [`engine`]: the recursive validator and its error graph

/// Re-export schema types.
pub mod schema {
    pub use modelguard_schema::*;
}

/// Re-export rule types.
pub mod rules {
    pub use modelguard_rules::*;
}

/// Re-export engine types.
pub mod engine {
    pub use modelguard_engine::*;
}

pub use modelguard_engine::{is_array_result, is_valid, ModelErrors, ValidateOptions, Validator};
pub use modelguard_rules::{max, min, required, Rule, RuleOutcome, RuleRegistry, RuleSet};
pub use modelguard_schema::{FieldKind, ModelSchema, PrimitiveType, SchemaCatalog};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn facade_validates_end_to_end() {
        let mut catalog = SchemaCatalog::new();
        catalog
            .insert(ModelSchema::new("Person").field("Name", PrimitiveType::String))
            .unwrap();
        let mut rules: RuleRegistry = RuleRegistry::new();
        rules.register("Person", RuleSet::new().field("Name", required()));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let result = runtime
            .block_on(Validator::new(&rules, &catalog).validate("Person", &json!({}), &()))
            .unwrap();

        assert!(!is_valid(&result));
        assert_eq!(result.field_errors("Name"), &["Name is required".to_string()]);
    }
}
