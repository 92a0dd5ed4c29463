//! Validation rules for modelguard.
//!
//! Field rules see a single field value; model rules see the whole object,
//! the caller's context and an optional original snapshot, and may report
//! errors against other fields. Rules are stored per class in a
//! [`RuleRegistry`], in registration order.

pub mod builtin;
pub mod error;
pub mod file;
pub mod registry;
pub mod rule;

pub use builtin::{max, min, required, Max, Min, Required};
pub use error::{Result, RuleError};
pub use file::{RuleFile, RuleSpec};
pub use registry::{FieldRules, RuleList, RuleRegistry, RuleSet};
pub use rule::{
    FieldCheck, FieldInput, FieldRule, ModelCheck, ModelInput, ModelRule, Rule, RuleKind,
    RuleOutcome,
};
