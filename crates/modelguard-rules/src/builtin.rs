//! Built-in field rules: `required`, `min` and `max`.
//!
//! Default messages are generated from the rule's own parameters and the
//! field name; `.message(..)` overrides them.

use std::future::ready;

use serde_json::Value;

use crate::rule::{FieldCheck, FieldInput, FieldRule, Rule, RuleKind};

/// Fails on a missing value, or an empty string or array.
pub fn required() -> Required {
    Required { message: None }
}

/// Lower bound on a length (strings, arrays) or a number.
pub fn min(bound: impl Into<f64>) -> Min {
    Min {
        bound: bound.into(),
        message: None,
    }
}

/// Upper bound on a length (strings, arrays) or a number.
pub fn max(bound: impl Into<f64>) -> Max {
    Max {
        bound: bound.into(),
        message: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Required {
    message: Option<String>,
}

impl Required {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn evaluate(&self, input: FieldInput<'_>) -> Option<String> {
        let missing = match input.value {
            None | Some(Value::Null) => true,
            Some(value) => measure(value).is_some_and(|measure| match measure {
                Measure::Length { len, .. } => len < 1,
                Measure::Number(_) => false,
            }),
        };

        missing.then(|| {
            self.message
                .clone()
                .unwrap_or_else(|| format!("{} is required", input.name))
        })
    }
}

impl FieldRule for Required {
    fn kind(&self) -> RuleKind {
        RuleKind::Required
    }

    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a> {
        Box::pin(ready(Ok(self.evaluate(input))))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Min {
    bound: f64,
    message: Option<String>,
}

impl Min {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn evaluate(&self, input: FieldInput<'_>) -> Option<String> {
        let measure = input.value.and_then(measure)?;
        if measure.amount() >= self.bound {
            return None;
        }
        Some(self.message.clone().unwrap_or_else(|| {
            bound_message(input.name, "at least", self.bound, &measure)
        }))
    }
}

impl FieldRule for Min {
    fn kind(&self) -> RuleKind {
        RuleKind::Min
    }

    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a> {
        Box::pin(ready(Ok(self.evaluate(input))))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Max {
    bound: f64,
    message: Option<String>,
}

impl Max {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn evaluate(&self, input: FieldInput<'_>) -> Option<String> {
        let measure = input.value.and_then(measure)?;
        if measure.amount() <= self.bound {
            return None;
        }
        Some(self.message.clone().unwrap_or_else(|| {
            bound_message(input.name, "at most", self.bound, &measure)
        }))
    }
}

impl FieldRule for Max {
    fn kind(&self) -> RuleKind {
        RuleKind::Max
    }

    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a> {
        Box::pin(ready(Ok(self.evaluate(input))))
    }
}

impl<C> From<Required> for Rule<C> {
    fn from(rule: Required) -> Self {
        Rule::Field(std::sync::Arc::new(rule))
    }
}

impl<C> From<Min> for Rule<C> {
    fn from(rule: Min) -> Self {
        Rule::Field(std::sync::Arc::new(rule))
    }
}

impl<C> From<Max> for Rule<C> {
    fn from(rule: Max) -> Self {
        Rule::Field(std::sync::Arc::new(rule))
    }
}

enum Measure {
    Length { len: usize, unit: (&'static str, &'static str) },
    Number(f64),
}

impl Measure {
    fn amount(&self) -> f64 {
        match self {
            Self::Length { len, .. } => *len as f64,
            Self::Number(number) => *number,
        }
    }
}

/// Length for strings and arrays, the value for numbers; other kinds are not measured.
fn measure(value: &Value) -> Option<Measure> {
    match value {
        Value::String(text) => Some(Measure::Length {
            len: text.chars().count(),
            unit: ("character", "characters"),
        }),
        Value::Array(items) => Some(Measure::Length {
            len: items.len(),
            unit: ("entry", "entries"),
        }),
        Value::Number(number) => number.as_f64().map(Measure::Number),
        _ => None,
    }
}

fn bound_message(name: &str, relation: &str, bound: f64, measure: &Measure) -> String {
    let bound_text = format_bound(bound);
    match measure {
        Measure::Length {
            unit: (singular, plural),
            ..
        } => {
            let unit = if bound == 1.0 { singular } else { plural };
            format!("{name} must be {relation} {bound_text} {unit}")
        }
        Measure::Number(_) => format!("{name} must be {relation} {bound_text}"),
    }
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input<'a>(value: Option<&'a Value>) -> FieldInput<'a> {
        FieldInput::new("Name", value)
    }

    #[test]
    fn required_fails_on_missing_null_and_empty() {
        let rule = required();
        let expected = Some("Name is required".to_string());

        assert_eq!(rule.evaluate(input(None)), expected);
        assert_eq!(rule.evaluate(input(Some(&Value::Null))), expected);
        assert_eq!(rule.evaluate(input(Some(&json!("")))), expected);
        assert_eq!(rule.evaluate(input(Some(&json!([])))), expected);
    }

    #[test]
    fn required_passes_on_present_values() {
        let rule = required();
        assert_eq!(rule.evaluate(input(Some(&json!("Test")))), None);
        assert_eq!(rule.evaluate(input(Some(&json!(0)))), None);
        assert_eq!(rule.evaluate(input(Some(&json!(false)))), None);
        assert_eq!(rule.evaluate(input(Some(&json!({})))), None);
        assert_eq!(rule.evaluate(input(Some(&json!([1])))), None);
    }

    #[test]
    fn required_uses_custom_message() {
        let rule = required().message("please fill in a name");
        assert_eq!(
            rule.evaluate(input(None)).as_deref(),
            Some("please fill in a name")
        );
    }

    #[test]
    fn min_checks_lengths() {
        let rule = min(3);
        assert_eq!(
            rule.evaluate(input(Some(&json!("ab")))).as_deref(),
            Some("Name must be at least 3 characters")
        );
        assert_eq!(rule.evaluate(input(Some(&json!("abc")))), None);
        assert_eq!(rule.evaluate(input(Some(&json!("äöü")))), None);
        assert_eq!(
            min(1).evaluate(input(Some(&json!([])))).as_deref(),
            Some("Name must be at least 1 entry")
        );
    }

    #[test]
    fn min_checks_numbers() {
        let rule = min(18);
        assert_eq!(
            rule.evaluate(input(Some(&json!(17)))).as_deref(),
            Some("Name must be at least 18")
        );
        assert_eq!(rule.evaluate(input(Some(&json!(18)))), None);
        assert_eq!(
            min(0.5).evaluate(input(Some(&json!(0.25)))).as_deref(),
            Some("Name must be at least 0.5")
        );
    }

    #[test]
    fn max_checks_lengths_and_numbers() {
        assert_eq!(
            max(2).evaluate(input(Some(&json!(["a", "b", "c"])))).as_deref(),
            Some("Name must be at most 2 entries")
        );
        assert_eq!(
            max(10).evaluate(input(Some(&json!(11)))).as_deref(),
            Some("Name must be at most 10")
        );
        assert_eq!(max(10).evaluate(input(Some(&json!(10)))), None);
        assert_eq!(
            max(1).message("too long").evaluate(input(Some(&json!("ab")))).as_deref(),
            Some("too long")
        );
    }

    #[test]
    fn bounds_ignore_missing_and_unmeasured_values() {
        assert_eq!(min(1).evaluate(input(None)), None);
        assert_eq!(min(1).evaluate(input(Some(&Value::Null))), None);
        assert_eq!(max(0).evaluate(input(Some(&json!(true)))), None);
        assert_eq!(max(0).evaluate(input(Some(&json!({"a": 1})))), None);
    }

    #[test]
    fn conversions_keep_kind_tags() {
        let required: Rule<()> = required().into();
        let lower: Rule<()> = min(1).into();
        let upper: Rule<()> = max(1).into();

        assert!(required.is_required());
        assert_eq!(lower.kind(), RuleKind::Min);
        assert_eq!(upper.kind(), RuleKind::Max);
    }
}
