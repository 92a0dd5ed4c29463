//! Declarative rule files.
//!
//! A rule file maps class → field → built-in rule(s):
//!
//! ```json
//! {
//!   "Person": {
//!     "FirstName": [{ "rule": "required" }, { "rule": "max", "bound": 40 }],
//!     "Age": { "rule": "min", "bound": 0, "message": "age cannot be negative" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builtin::{max, min, required};
use crate::error::{Result, RuleError};
use crate::registry::{RuleRegistry, RuleSet};
use crate::rule::Rule;

/// One built-in rule as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum RuleSpec {
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min {
        bound: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Max {
        bound: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl RuleSpec {
    pub fn to_rule<C>(&self) -> Rule<C> {
        match self {
            Self::Required { message } => {
                with_message(required(), message.as_deref(), |rule, m| rule.message(m))
            }
            Self::Min { bound, message } => {
                with_message(min(*bound), message.as_deref(), |rule, m| rule.message(m))
            }
            Self::Max { bound, message } => {
                with_message(max(*bound), message.as_deref(), |rule, m| rule.message(m))
            }
        }
    }
}

fn with_message<R, C>(rule: R, message: Option<&str>, apply: impl FnOnce(R, &str) -> R) -> Rule<C>
where
    R: Into<Rule<C>>,
{
    match message {
        Some(message) => apply(rule, message).into(),
        None => rule.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RuleSpec),
    Many(Vec<RuleSpec>),
}

impl OneOrMany {
    fn specs(&self) -> &[RuleSpec] {
        match self {
            Self::One(spec) => std::slice::from_ref(spec),
            Self::Many(specs) => specs,
        }
    }
}

/// Parsed rule file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleFile {
    classes: BTreeMap<String, BTreeMap<String, OneOrMany>>,
}

impl RuleFile {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(json)?;
        file.check()?;
        Ok(file)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Classes named in the file, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Rules of one field, in file order.
    pub fn specs(&self, class: &str, field: &str) -> &[RuleSpec] {
        self.classes
            .get(class)
            .and_then(|fields| fields.get(field))
            .map(OneOrMany::specs)
            .unwrap_or(&[])
    }

    fn check(&self) -> Result<()> {
        for (class, fields) in &self.classes {
            for (field, specs) in fields {
                let invalid = |reason: &str| RuleError::InvalidRuleFile {
                    class: class.clone(),
                    field: field.clone(),
                    reason: reason.to_string(),
                };
                let specs = specs.specs();
                if specs.is_empty() {
                    return Err(invalid("empty rule list"));
                }

                let lower = specs.iter().filter_map(|spec| match spec {
                    RuleSpec::Min { bound, .. } => Some(*bound),
                    _ => None,
                });
                let upper = specs.iter().filter_map(|spec| match spec {
                    RuleSpec::Max { bound, .. } => Some(*bound),
                    _ => None,
                });
                if let (Some(lower), Some(upper)) = (lower.reduce(f64::max), upper.reduce(f64::min)) {
                    if lower > upper {
                        return Err(invalid("min bound exceeds max bound"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Register every rule in the file with `registry`.
    pub fn apply<C>(&self, registry: &mut RuleRegistry<C>) {
        for (class, fields) in &self.classes {
            let rules = fields.iter().fold(RuleSet::new(), |set, (field, specs)| {
                let rules: Vec<Rule<C>> = specs.specs().iter().map(RuleSpec::to_rule).collect();
                set.field(field.as_str(), rules)
            });
            registry.register(class.as_str(), rules);
        }
    }
}
