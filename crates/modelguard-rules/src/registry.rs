use std::collections::{BTreeMap, HashMap};

use crate::builtin::{Max, Min, Required};
use crate::rule::Rule;

/// One rule, or an ordered list of rules, for a single field.
pub struct RuleList<C>(Vec<Rule<C>>);

impl<C> RuleList<C> {
    pub fn into_inner(self) -> Vec<Rule<C>> {
        self.0
    }
}

impl<C> From<Rule<C>> for RuleList<C> {
    fn from(rule: Rule<C>) -> Self {
        Self(vec![rule])
    }
}

impl<C> From<Vec<Rule<C>>> for RuleList<C> {
    fn from(rules: Vec<Rule<C>>) -> Self {
        Self(rules)
    }
}

impl<C, const N: usize> From<[Rule<C>; N]> for RuleList<C> {
    fn from(rules: [Rule<C>; N]) -> Self {
        Self(rules.into())
    }
}

impl<C> From<Required> for RuleList<C> {
    fn from(rule: Required) -> Self {
        Self(vec![rule.into()])
    }
}

impl<C> From<Min> for RuleList<C> {
    fn from(rule: Min) -> Self {
        Self(vec![rule.into()])
    }
}

impl<C> From<Max> for RuleList<C> {
    fn from(rule: Max) -> Self {
        Self(vec![rule.into()])
    }
}

/// Rules registered for one field, in registration order.
pub struct FieldRules<C> {
    pub field: String,
    pub rules: Vec<Rule<C>>,
}

impl<C> FieldRules<C> {
    pub fn has_required(&self) -> bool {
        self.rules.iter().any(Rule::is_required)
    }
}

/// Field → rules mapping passed to one [`RuleRegistry::register`] call.
pub struct RuleSet<C> {
    fields: Vec<FieldRules<C>>,
}

impl<C> RuleSet<C> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add rules for a field. Repeating a field appends to its list.
    pub fn field(mut self, name: impl Into<String>, rules: impl Into<RuleList<C>>) -> Self {
        append(&mut self.fields, name.into(), rules.into().into_inner());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Class-keyed store of validation rules.
///
/// Registering the same class again appends to the rules already present for
/// each field; nothing is replaced. The registry is read-only while a
/// validation runs.
pub struct RuleRegistry<C = ()> {
    classes: HashMap<String, Vec<FieldRules<C>>>,
}

impl<C> RuleRegistry<C> {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    /// Append `rules` to the rules registered for `class`.
    pub fn register(&mut self, class: impl Into<String>, rules: RuleSet<C>) {
        let class = class.into();
        let entry = self.classes.entry(class.clone()).or_default();
        for FieldRules { field, rules } in rules.fields {
            tracing::debug!(class = %class, field = %field, rules = rules.len(), "rules registered");
            append(entry, field, rules);
        }
    }

    /// Rules for `class` in field registration order; empty when unknown.
    pub fn rules_for(&self, class: &str) -> &[FieldRules<C>] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules for one field of `class`; empty when unknown.
    pub fn field_rules(&self, class: &str, field: &str) -> &[Rule<C>] {
        self.rules_for(class)
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.rules.as_slice())
            .unwrap_or(&[])
    }

    /// For every field of `class` with at least one rule, whether one of them
    /// is `required`.
    pub fn required_fields_for(&self, class: &str) -> BTreeMap<String, bool> {
        self.rules_for(class)
            .iter()
            .map(|entry| (entry.field.clone(), entry.has_required()))
            .collect()
    }

    pub fn has_rules(&self, class: &str) -> bool {
        !self.rules_for(class).is_empty()
    }

    /// Classes with registered rules, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }
}

impl<C> Default for RuleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn append<C>(fields: &mut Vec<FieldRules<C>>, field: String, rules: Vec<Rule<C>>) {
    match fields.iter_mut().find(|entry| entry.field == field) {
        Some(entry) => entry.rules.extend(rules),
        None => fields.push(FieldRules { field, rules }),
    }
}
