use std::fmt;
use std::future::ready;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;

/// Future returned by a field rule: a message, or `None` when the value passes.
pub type FieldCheck<'a> = BoxFuture<'a, Result<Option<String>>>;

/// Future returned by a model rule.
pub type ModelCheck<'a> = BoxFuture<'a, Result<RuleOutcome>>;

/// What a field rule sees: the field's name and its value (`None` when absent).
#[derive(Debug, Clone, Copy)]
pub struct FieldInput<'a> {
    pub name: &'a str,
    pub value: Option<&'a Value>,
}

impl<'a> FieldInput<'a> {
    pub fn new(name: &'a str, value: Option<&'a Value>) -> Self {
        Self { name, value }
    }

    /// True for an absent key or an explicit `null`.
    pub fn is_missing(&self) -> bool {
        self.value.is_none_or(Value::is_null)
    }
}

/// What a model rule sees.
pub struct ModelInput<'a, C> {
    /// Field the rule is registered under.
    pub field: &'a str,
    /// The object being validated.
    pub model: &'a Value,
    /// Caller supplied context.
    pub context: &'a C,
    /// Previous snapshot of the same object, if one was supplied.
    pub original: Option<&'a Value>,
}

impl<'a, C> ModelInput<'a, C> {
    /// Current value of the registered field.
    pub fn value(&self) -> Option<&'a Value> {
        self.model.get(self.field)
    }

    /// Value of the registered field in the original snapshot.
    pub fn original_value(&self) -> Option<&'a Value> {
        self.original.and_then(|original| original.get(self.field))
    }
}

impl<C> Clone for ModelInput<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ModelInput<'_, C> {}

/// Result of one rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Nothing to report.
    Valid,
    /// One message attributed to the field the rule is registered under.
    Error(String),
    /// Outcomes addressed to fields by name. Nested `Fields` address the
    /// fields of a nested object.
    Fields(Vec<(String, RuleOutcome)>),
}

impl RuleOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn fields<K, I>(outcomes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RuleOutcome)>,
    {
        Self::Fields(
            outcomes
                .into_iter()
                .map(|(field, outcome)| (field.into(), outcome))
                .collect(),
        )
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Valid => true,
            Self::Error(_) => false,
            Self::Fields(outcomes) => outcomes.iter().all(|(_, outcome)| outcome.is_valid()),
        }
    }
}

impl From<Option<String>> for RuleOutcome {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Valid, Self::Error)
    }
}

/// Which built-in a rule is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Required,
    Min,
    Max,
    Custom,
}

/// A validator bound to one field that sees only that field's value.
pub trait FieldRule: Send + Sync {
    fn kind(&self) -> RuleKind {
        RuleKind::Custom
    }

    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a>;
}

/// A validator that sees the whole object, the context and the original snapshot.
pub trait ModelRule<C>: Send + Sync {
    fn check<'a>(&'a self, input: ModelInput<'a, C>) -> ModelCheck<'a>;
}

/// A registered rule.
pub enum Rule<C> {
    Field(Arc<dyn FieldRule>),
    Model(Arc<dyn ModelRule<C>>),
}

impl<C: 'static> Rule<C> {
    pub fn field(rule: impl FieldRule + 'static) -> Self {
        Self::Field(Arc::new(rule))
    }

    pub fn model(rule: impl ModelRule<C> + 'static) -> Self {
        Self::Model(Arc::new(rule))
    }

    /// Synchronous field rule from a closure.
    pub fn field_fn<F>(check: F) -> Self
    where
        F: Fn(FieldInput<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self::field(FieldFn(check))
    }

    /// Asynchronous field rule from a closure returning a boxed future.
    pub fn field_async<F>(check: F) -> Self
    where
        F: for<'a> Fn(FieldInput<'a>) -> FieldCheck<'a> + Send + Sync + 'static,
    {
        Self::field(FieldAsync(check))
    }

    /// Synchronous model rule from a closure.
    pub fn model_fn<F>(check: F) -> Self
    where
        F: for<'a> Fn(ModelInput<'a, C>) -> RuleOutcome + Send + Sync + 'static,
    {
        Self::model(ModelFn(check))
    }

    /// Asynchronous model rule from a closure returning a boxed future.
    pub fn model_async<F>(check: F) -> Self
    where
        F: for<'a> Fn(ModelInput<'a, C>) -> ModelCheck<'a> + Send + Sync + 'static,
    {
        Self::model(ModelAsync(check))
    }
}

impl<C> Rule<C> {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Field(rule) => rule.kind(),
            Self::Model(_) => RuleKind::Custom,
        }
    }

    pub fn is_required(&self) -> bool {
        self.kind() == RuleKind::Required
    }
}

impl<C> Clone for Rule<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(rule) => Self::Field(Arc::clone(rule)),
            Self::Model(rule) => Self::Model(Arc::clone(rule)),
        }
    }
}

impl<C> fmt::Debug for Rule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(rule) => write!(f, "Rule::Field({:?})", rule.kind()),
            Self::Model(_) => f.write_str("Rule::Model"),
        }
    }
}

struct FieldFn<F>(F);

impl<F> FieldRule for FieldFn<F>
where
    F: Fn(FieldInput<'_>) -> Option<String> + Send + Sync,
{
    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a> {
        Box::pin(ready(Ok((self.0)(input))))
    }
}

struct FieldAsync<F>(F);

impl<F> FieldRule for FieldAsync<F>
where
    F: for<'a> Fn(FieldInput<'a>) -> FieldCheck<'a> + Send + Sync,
{
    fn check<'a>(&'a self, input: FieldInput<'a>) -> FieldCheck<'a> {
        (self.0)(input)
    }
}

struct ModelFn<F>(F);

impl<C, F> ModelRule<C> for ModelFn<F>
where
    F: for<'a> Fn(ModelInput<'a, C>) -> RuleOutcome + Send + Sync,
{
    fn check<'a>(&'a self, input: ModelInput<'a, C>) -> ModelCheck<'a> {
        Box::pin(ready(Ok((self.0)(input))))
    }
}

struct ModelAsync<F>(F);

impl<C, F> ModelRule<C> for ModelAsync<F>
where
    F: for<'a> Fn(ModelInput<'a, C>) -> ModelCheck<'a> + Send + Sync,
{
    fn check<'a>(&'a self, input: ModelInput<'a, C>) -> ModelCheck<'a> {
        (self.0)(input)
    }
}
