//! Validation engine for modelguard.
//!
//! [`Validator`] walks a JSON model against the rules of a
//! [`RuleRegistry`](modelguard_rules::RuleRegistry) and the descriptors of a
//! [`SchemaCatalog`](modelguard_schema::SchemaCatalog), producing a
//! [`ModelErrors`] graph that mirrors the model's shape: a message list per
//! primitive field, an [`ArrayErrors`] node per array and a nested
//! [`ModelErrors`] per object.

pub mod error;
pub mod result;
pub mod scope;
pub mod validator;

pub use error::{Result, ValidationError};
pub use result::{
    is_array_result, is_valid, ArrayErrors, ErrorList, ErrorNode, ModelErrors, ShapeMismatch,
};
pub use scope::{Scope, ROOT_PREFIX};
pub use validator::{ValidateOptions, Validator, EXPECTED_ARRAY, EXPECTED_OBJECT};
