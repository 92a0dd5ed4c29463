use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::SchemaCatalog;
use crate::decoder::{Decoder, PrimitiveType};

/// Declared kind of one schema field.
#[derive(Clone)]
pub enum FieldKind {
    /// A leaf value checked by a decoder.
    Primitive(Arc<dyn Decoder>),
    /// A nested object of the named class.
    Model(String),
    /// An array whose elements are objects of the named class.
    ArrayOf(String),
    /// The first variant accepting the runtime value wins.
    Union(Vec<FieldKind>),
}

impl FieldKind {
    pub fn primitive(decoder: impl Decoder + 'static) -> Self {
        Self::Primitive(Arc::new(decoder))
    }

    pub fn model(class: impl Into<String>) -> Self {
        Self::Model(class.into())
    }

    pub fn array_of(class: impl Into<String>) -> Self {
        Self::ArrayOf(class.into())
    }

    pub fn union(variants: impl IntoIterator<Item = FieldKind>) -> Self {
        Self::Union(variants.into_iter().collect())
    }

    /// `kind` or `null`.
    pub fn nullable(kind: impl Into<FieldKind>) -> Self {
        Self::Union(vec![kind.into(), PrimitiveType::Null.into()])
    }

    /// Human readable label, e.g. `Address`, `[Item]`, `string | null`.
    pub fn label(&self) -> String {
        match self {
            Self::Primitive(decoder) => decoder.describe(),
            Self::Model(class) => class.clone(),
            Self::ArrayOf(class) => format!("[{class}]"),
            Self::Union(variants) => join_labels(variants),
        }
    }

    /// Resolve the kind that applies to `value` (`None` when the key is absent).
    pub fn resolve<'a>(&'a self, value: Option<&Value>, catalog: &SchemaCatalog) -> ResolvedKind<'a> {
        match self {
            Self::Primitive(decoder) => ResolvedKind::Leaf(decoder.as_ref()),
            Self::Model(class) => ResolvedKind::Model(class),
            Self::ArrayOf(class) => ResolvedKind::Array(class),
            Self::Union(variants) => resolve_union(variants, value, catalog),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Primitive(decoder) => decoder.decode(value).is_ok(),
            Self::Model(_) => value.is_object(),
            Self::ArrayOf(_) => value.is_array(),
            Self::Union(variants) => variants.iter().any(|variant| variant.accepts(value)),
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldKind({})", self.label())
    }
}

impl From<PrimitiveType> for FieldKind {
    fn from(value: PrimitiveType) -> Self {
        Self::primitive(value)
    }
}

/// A field kind after union resolution against a runtime value.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedKind<'a> {
    Leaf(&'a dyn Decoder),
    Model(&'a str),
    Array(&'a str),
    /// A union none of whose variants accepts the value.
    NoMatch(&'a [FieldKind]),
}

impl ResolvedKind<'_> {
    /// Decode a present leaf value. Nested and array kinds always succeed here;
    /// their shape is checked by the caller.
    pub fn decode(&self, value: &Value) -> Result<(), Vec<String>> {
        match self {
            Self::Leaf(decoder) => decoder.decode(value),
            Self::NoMatch(variants) => Err(vec![format!(
                "expected one of {}",
                join_labels(variants)
            )]),
            Self::Model(_) | Self::Array(_) => Ok(()),
        }
    }
}

fn resolve_union<'a>(
    variants: &'a [FieldKind],
    value: Option<&Value>,
    catalog: &SchemaCatalog,
) -> ResolvedKind<'a> {
    let Some(value) = value else {
        // Absent: keep the shape of the first variant that is not `null`.
        return variants
            .iter()
            .find(|variant| !variant.accepts(&Value::Null))
            .or_else(|| variants.first())
            .map(|variant| variant.resolve(None, catalog))
            .unwrap_or(ResolvedKind::NoMatch(variants));
    };

    if let Some(class) = catalog.declared_class(value) {
        let exact = variants
            .iter()
            .find(|variant| matches!(variant, FieldKind::Model(name) if name == class));
        if let Some(variant) = exact {
            return variant.resolve(Some(value), catalog);
        }
    }

    variants
        .iter()
        .find(|variant| variant.accepts(value))
        .map(|variant| variant.resolve(Some(value), catalog))
        .unwrap_or(ResolvedKind::NoMatch(variants))
}

fn join_labels(variants: &[FieldKind]) -> String {
    variants
        .iter()
        .map(FieldKind::label)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Ordered field descriptors for one class.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    class: String,
    fields: Vec<(String, FieldKind)>,
}

impl ModelSchema {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, replacing an earlier declaration of the same name.
    pub fn field(mut self, name: impl Into<String>, kind: impl Into<FieldKind>) -> Self {
        let name = name.into();
        let kind = kind.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = kind,
            None => self.fields.push((name, kind)),
        }
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn get(&self, name: &str) -> Option<&FieldKind> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, kind)| kind)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
