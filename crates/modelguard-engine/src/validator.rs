use futures_core::future::BoxFuture;
use modelguard_rules::{FieldInput, ModelInput, Rule, RuleError, RuleOutcome, RuleRegistry};
use modelguard_schema::{FieldKind, ModelSchema, ResolvedKind, SchemaCatalog};
use serde_json::Value;
use tracing::Instrument;

use crate::error::{Result, ValidationError};
use crate::result::{ArrayErrors, ErrorList, ErrorNode, ModelErrors};
use crate::scope::{element_prefix, field_path, nested_prefix, Scope, ROOT_PREFIX};

pub const EXPECTED_OBJECT: &str = "expected an object";
pub const EXPECTED_ARRAY: &str = "expected an array";

const UNKNOWN_CLASS: &str = "?";

static NULL: Value = Value::Null;

/// Optional inputs of a validation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions<'a> {
    /// Previous snapshot of the model, handed to model rules.
    pub original: Option<&'a Value>,
    /// Restrict validation to fields on this path (see [`Scope`]).
    pub scope: Option<&'a str>,
}

impl<'a> ValidateOptions<'a> {
    pub fn with_original(mut self, original: &'a Value) -> Self {
        self.original = Some(original);
        self
    }

    pub fn with_scope(mut self, scope: &'a str) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Runs registered rules and schema decoding over a model graph.
///
/// Each call builds a fresh [`ModelErrors`] graph. The registry and catalog
/// are only read; every recursive step builds its own subtree and the caller
/// attaches it.
pub struct Validator<'a, C> {
    rules: &'a RuleRegistry<C>,
    catalog: &'a SchemaCatalog,
}

/// The object a rule outcome is attached to.
#[derive(Clone, Copy)]
struct Frame<'f> {
    class: &'f str,
    schema: Option<&'f ModelSchema>,
    model: &'f Value,
}

impl<'f> Frame<'f> {
    fn kind(&self, field: &str) -> Option<&'f FieldKind> {
        self.schema.and_then(|schema| schema.get(field))
    }
}

/// Runtime shape of a field.
#[derive(Clone, Copy)]
enum Shape<'f> {
    Leaf(ResolvedKind<'f>),
    /// Element class, and the leaf kind that decodes the whole array when the
    /// field was not declared as an array of models.
    Array(&'f str, Option<ResolvedKind<'f>>),
    Model(&'f str),
}

/// What a rule is attaching to a field whose shape is not declared anywhere.
#[derive(Clone, Copy)]
enum Incoming {
    Message,
    Fields,
}

impl<'a, C: Sync> Validator<'a, C> {
    pub fn new(rules: &'a RuleRegistry<C>, catalog: &'a SchemaCatalog) -> Self {
        Self { rules, catalog }
    }

    pub async fn validate(&self, class: &str, model: &Value, context: &C) -> Result<ModelErrors> {
        self.validate_with(class, model, context, ValidateOptions::default())
            .await
    }

    pub async fn validate_with(
        &self,
        class: &str,
        model: &Value,
        context: &C,
        options: ValidateOptions<'_>,
    ) -> Result<ModelErrors> {
        let scope = Scope::new(options.scope);
        let span = tracing::debug_span!(
            "validate",
            class,
            scope = scope.path().unwrap_or_default()
        );
        let result = self
            .visit(
                class,
                model,
                options.original,
                ROOT_PREFIX.to_string(),
                context,
                scope,
            )
            .instrument(span)
            .await?;

        tracing::debug!(class, valid = result.is_valid(), "validation finished");
        Ok(result)
    }

    fn visit<'f>(
        &'f self,
        class: &'f str,
        model: &'f Value,
        original: Option<&'f Value>,
        prefix: String,
        context: &'f C,
        scope: Scope<'f>,
    ) -> BoxFuture<'f, Result<ModelErrors>> {
        Box::pin(async move {
            let mut node = ModelErrors::new();
            if !model.is_object() {
                return Ok(node);
            }

            let class = self.catalog.class_of(model, class);
            let frame = Frame {
                class,
                schema: self.catalog.get(class),
                model,
            };
            tracing::trace!(class, prefix = %prefix, "visiting model");

            self.run_rules(&mut node, frame, original, &prefix, context, scope)
                .await?;

            // Schema fields, then rule fields the schema does not declare.
            let mut fields: Vec<(&str, Option<&FieldKind>)> = frame
                .schema
                .map(|schema| schema.fields().map(|(field, kind)| (field, Some(kind))).collect())
                .unwrap_or_default();
            for entry in self.rules.rules_for(class) {
                if frame.kind(&entry.field).is_none() {
                    fields.push((entry.field.as_str(), None));
                }
            }

            for (field, kind) in fields {
                let path = field_path(&prefix, field);
                if !scope.includes(&path) {
                    continue;
                }

                let value = model.get(field);
                let original_value = original.and_then(|original| original.get(field));

                match self.shape_of(kind, value) {
                    Some(Shape::Model(nested_class)) => {
                        let nested = match value {
                            Some(nested) if nested.is_object() => {
                                self.visit(
                                    nested_class,
                                    nested,
                                    original_value.filter(|original| original.is_object()),
                                    nested_prefix(&path),
                                    context,
                                    scope,
                                )
                                .await?
                            }
                            _ => ModelErrors::new(),
                        };

                        let slot = self.model_slot(&mut node, frame, field)?;
                        if value.is_some_and(|value| !value.is_object() && !value.is_null()) {
                            slot.errors.push(EXPECTED_OBJECT);
                        }
                        slot.merge(nested)
                            .map_err(|err| invalid(frame.class, field, err.to_string()))?;
                    }
                    Some(Shape::Array(element_class, leaf)) => {
                        let mut items = Vec::new();
                        if let Some(Value::Array(elements)) = value {
                            let originals = original_value.and_then(Value::as_array);
                            for (index, element) in elements.iter().enumerate() {
                                let original_element = originals
                                    .and_then(|originals| originals.get(index))
                                    .filter(|original| original.is_object());
                                let item = self
                                    .visit(
                                        element_class,
                                        element,
                                        original_element,
                                        element_prefix(&path, index),
                                        context,
                                        scope,
                                    )
                                    .await?;
                                items.push(item);
                            }
                        }

                        let mut array = ArrayErrors {
                            errors: ErrorList::new(),
                            items,
                        };
                        if value.is_some_and(|value| !value.is_array() && !value.is_null()) {
                            array.errors.push(EXPECTED_ARRAY);
                        }
                        if let (Some(leaf), Some(value)) = (leaf, value) {
                            if let Err(reasons) = leaf.decode(value) {
                                array.errors.extend(reasons);
                            }
                        }
                        self.slot(&mut node, frame, field, Incoming::Message)
                            .merge(ErrorNode::Array(array))
                            .map_err(|err| invalid(frame.class, field, err.to_string()))?;
                    }
                    Some(Shape::Leaf(resolved)) => {
                        let slot = self.slot(&mut node, frame, field, Incoming::Message);
                        if let Some(Err(reasons)) = value.map(|value| resolved.decode(value)) {
                            tracing::trace!(class, field, reasons = reasons.len(), "decode failed");
                            for reason in reasons {
                                slot.push_message(reason);
                            }
                        }
                    }
                    None => {}
                }
            }

            Ok(node)
        })
    }

    async fn run_rules(
        &self,
        node: &mut ModelErrors,
        frame: Frame<'_>,
        original: Option<&Value>,
        prefix: &str,
        context: &C,
        scope: Scope<'_>,
    ) -> Result<()> {
        for entry in self.rules.rules_for(frame.class) {
            let path = field_path(prefix, &entry.field);
            if !scope.includes(&path) {
                continue;
            }
            tracing::trace!(
                class = frame.class,
                field = %entry.field,
                rules = entry.rules.len(),
                "running rules"
            );

            for rule in &entry.rules {
                let outcome = run_rule(rule, frame, &entry.field, original, context)
                    .await
                    .map_err(|source| ValidationError::Rule {
                        class: frame.class.to_string(),
                        field: entry.field.clone(),
                        source,
                    })?;
                self.apply_outcome(node, frame, &entry.field, outcome, prefix, scope)?;
            }

            self.slot(node, frame, &entry.field, Incoming::Message);
        }
        Ok(())
    }

    fn apply_outcome(
        &self,
        node: &mut ModelErrors,
        frame: Frame<'_>,
        field: &str,
        outcome: RuleOutcome,
        prefix: &str,
        scope: Scope<'_>,
    ) -> Result<()> {
        match outcome {
            RuleOutcome::Valid => {}
            RuleOutcome::Error(message) => {
                self.slot(node, frame, field, Incoming::Message)
                    .push_message(message);
            }
            RuleOutcome::Fields(outcomes) => {
                self.apply_fields(node, frame, outcomes, prefix, scope)?;
            }
        }
        Ok(())
    }

    /// Attach a partial mapping of field outcomes to the fields of `frame`.
    fn apply_fields(
        &self,
        node: &mut ModelErrors,
        frame: Frame<'_>,
        outcomes: Vec<(String, RuleOutcome)>,
        prefix: &str,
        scope: Scope<'_>,
    ) -> Result<()> {
        for (field, outcome) in outcomes {
            let path = field_path(prefix, &field);
            if !scope.includes(&path) {
                continue;
            }

            match outcome {
                RuleOutcome::Valid => {}
                RuleOutcome::Error(message) => {
                    self.slot(node, frame, &field, Incoming::Message)
                        .push_message(message);
                }
                RuleOutcome::Fields(nested) => {
                    let child = self.child_frame(frame, &field);
                    let slot = self.model_slot(node, frame, &field)?;
                    self.apply_fields(slot, child, nested, &nested_prefix(&path), scope)?;
                }
            }
        }
        Ok(())
    }

    /// Error node for `field`, created with the field's shape when absent.
    fn slot<'n>(
        &self,
        node: &'n mut ModelErrors,
        frame: Frame<'_>,
        field: &str,
        incoming: Incoming,
    ) -> &'n mut ErrorNode {
        node.fields.entry(field.to_string()).or_insert_with(|| {
            match self.shape_of(frame.kind(field), frame.model.get(field)) {
                Some(Shape::Leaf(_)) => ErrorNode::Field(ErrorList::new()),
                Some(Shape::Array(..)) => ErrorNode::Array(ArrayErrors::default()),
                Some(Shape::Model(_)) => ErrorNode::Model(ModelErrors::new()),
                None => match incoming {
                    Incoming::Message => ErrorNode::Field(ErrorList::new()),
                    Incoming::Fields => ErrorNode::Model(ModelErrors::new()),
                },
            }
        })
    }

    /// Nested error node for `field`; fails when the field is not an object.
    fn model_slot<'n>(
        &self,
        node: &'n mut ModelErrors,
        frame: Frame<'_>,
        field: &str,
    ) -> Result<&'n mut ModelErrors> {
        match self.slot(node, frame, field, Incoming::Fields) {
            ErrorNode::Model(model) => Ok(model),
            other => Err(invalid(
                frame.class,
                field,
                format!("field errors cannot be attached to {} errors", other.shape()),
            )),
        }
    }

    fn child_frame<'f>(&'f self, frame: Frame<'f>, field: &str) -> Frame<'f> {
        let value = frame.model.get(field);
        let class = match self.shape_of(frame.kind(field), value) {
            Some(Shape::Model(class)) => {
                value.map_or(class, |value| self.catalog.class_of(value, class))
            }
            _ => UNKNOWN_CLASS,
        };
        Frame {
            class,
            schema: self.catalog.get(class),
            model: value.unwrap_or(&NULL),
        }
    }

    /// Shape of a field from its declared kind and runtime value. Values that
    /// name a known class through the discriminator key are nested models,
    /// and array values are arrays, even when the declared kind is a leaf or
    /// there is no declared kind.
    fn shape_of<'f>(
        &self,
        kind: Option<&'f FieldKind>,
        value: Option<&'f Value>,
    ) -> Option<Shape<'f>> {
        let resolved = kind.map(|kind| kind.resolve(value, self.catalog));
        match resolved {
            Some(ResolvedKind::Model(class)) => Some(Shape::Model(class)),
            Some(ResolvedKind::Array(class)) => Some(Shape::Array(class, None)),
            leaf => match value {
                Some(value) if self.catalog.is_model(value) => {
                    Some(Shape::Model(self.catalog.class_of(value, UNKNOWN_CLASS)))
                }
                Some(Value::Array(_)) => Some(Shape::Array(UNKNOWN_CLASS, leaf)),
                _ => leaf.map(Shape::Leaf),
            },
        }
    }
}

async fn run_rule<C: Sync>(
    rule: &Rule<C>,
    frame: Frame<'_>,
    field: &str,
    original: Option<&Value>,
    context: &C,
) -> std::result::Result<RuleOutcome, RuleError> {
    match rule {
        Rule::Field(rule) => rule
            .check(FieldInput::new(field, frame.model.get(field)))
            .await
            .map(RuleOutcome::from),
        Rule::Model(rule) => {
            rule.check(ModelInput {
                field,
                model: frame.model,
                context,
                original,
            })
            .await
        }
    }
}

fn invalid(class: &str, field: &str, reason: String) -> ValidationError {
    ValidationError::InvalidOutcome {
        class: class.to_string(),
        field: field.to_string(),
        reason,
    }
}
