use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Ordered list of distinct error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorList(Vec<String>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless an identical message is already present.
    /// Returns whether it was added.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.contains(&message) {
            return false;
        }
        self.0.push(message);
        true
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn contains(&self, message: &str) -> bool {
        self.0.iter().any(|existing| existing == message)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ErrorList {
    fn from(messages: Vec<String>) -> Self {
        let mut list = Self::new();
        list.extend(messages);
        list
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ErrorList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Errors for an array field: messages about the array itself, and one
/// node per element, index-aligned with the model array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArrayErrors {
    pub errors: ErrorList,
    pub items: Vec<ModelErrors>,
}

impl ArrayErrors {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.items.iter().all(ModelErrors::is_valid)
    }

    fn merge(&mut self, other: ArrayErrors) -> Result<(), ShapeMismatch> {
        self.errors.extend(other.errors);
        for (index, item) in other.items.into_iter().enumerate() {
            match self.items.get_mut(index) {
                Some(existing) => existing.merge(item)?,
                None => self.items.push(item),
            }
        }
        Ok(())
    }
}

/// Errors for one object: messages about the object as a whole, and one node
/// per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelErrors {
    pub errors: ErrorList,
    pub fields: BTreeMap<String, ErrorNode>,
}

impl ModelErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&ErrorNode> {
        self.fields.get(name)
    }

    /// Messages of a primitive field; empty for unknown or non-primitive fields.
    pub fn field_errors(&self, name: &str) -> &[String] {
        self.fields
            .get(name)
            .and_then(ErrorNode::as_field)
            .map(ErrorList::as_slice)
            .unwrap_or(&[])
    }

    pub fn array(&self, name: &str) -> Option<&ArrayErrors> {
        self.fields.get(name).and_then(ErrorNode::as_array)
    }

    pub fn nested(&self, name: &str) -> Option<&ModelErrors> {
        self.fields.get(name).and_then(ErrorNode::as_model)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.fields.values().all(ErrorNode::is_valid)
    }

    /// Every message in the graph with the path it is attached to, using the
    /// same `.Field[index].Sub` syntax as validation scopes.
    pub fn messages(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_model(self, ".", &mut out);
        out
    }

    /// Merge `other` into `self`, deduplicating messages.
    pub fn merge(&mut self, other: ModelErrors) -> Result<(), ShapeMismatch> {
        self.errors.extend(other.errors);
        for (name, node) in other.fields {
            match self.fields.get_mut(&name) {
                Some(existing) => existing.merge(node)?,
                None => {
                    self.fields.insert(name, node);
                }
            }
        }
        Ok(())
    }
}

/// One node of the error graph. Its variant always mirrors the shape of the
/// corresponding model node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Field(ErrorList),
    Array(ArrayErrors),
    Model(ModelErrors),
}

impl ErrorNode {
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Field(list) => list.is_empty(),
            Self::Array(array) => array.is_valid(),
            Self::Model(model) => model.is_valid(),
        }
    }

    /// Attach a message to this node's own channel: the list of a primitive
    /// field, or the `errors` of an array or nested object.
    pub fn push_message(&mut self, message: impl Into<String>) -> bool {
        match self {
            Self::Field(list) => list.push(message),
            Self::Array(array) => array.errors.push(message),
            Self::Model(model) => model.errors.push(message),
        }
    }

    pub fn as_field(&self) -> Option<&ErrorList> {
        match self {
            Self::Field(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayErrors> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelErrors> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Array(_) => "array",
            Self::Model(_) => "object",
        }
    }

    pub fn merge(&mut self, other: ErrorNode) -> Result<(), ShapeMismatch> {
        match (self, other) {
            (Self::Field(list), Self::Field(other)) => {
                list.extend(other);
                Ok(())
            }
            (Self::Array(array), Self::Array(other)) => array.merge(other),
            (Self::Model(model), Self::Model(other)) => model.merge(other),
            (existing, other) => Err(ShapeMismatch {
                existing: existing.shape(),
                incoming: other.shape(),
            }),
        }
    }
}

/// Two error nodes of different shapes were merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot merge {incoming} errors into {existing} errors")]
pub struct ShapeMismatch {
    pub existing: &'static str,
    pub incoming: &'static str,
}

/// True iff every list in the graph is empty.
pub fn is_valid(result: &ModelErrors) -> bool {
    result.is_valid()
}

/// True iff `node` is an array node (element nodes plus its own `errors`).
pub fn is_array_result(node: &ErrorNode) -> bool {
    matches!(node, ErrorNode::Array(_))
}

fn collect_model(model: &ModelErrors, path: &str, out: &mut Vec<(String, String)>) {
    let own_path = path.strip_suffix('.').filter(|p| !p.is_empty()).unwrap_or(path);
    out.extend(
        model
            .errors
            .iter()
            .map(|message| (own_path.to_string(), message.clone())),
    );

    for (name, node) in &model.fields {
        let field_path = format!("{path}{name}");
        match node {
            ErrorNode::Field(list) => out.extend(
                list.iter()
                    .map(|message| (field_path.clone(), message.clone())),
            ),
            ErrorNode::Array(array) => {
                out.extend(
                    array
                        .errors
                        .iter()
                        .map(|message| (field_path.clone(), message.clone())),
                );
                for (index, item) in array.items.iter().enumerate() {
                    collect_model(item, &format!("{field_path}[{index}]."), out);
                }
            }
            ErrorNode::Model(nested) => collect_model(nested, &format!("{field_path}."), out),
        }
    }
}
