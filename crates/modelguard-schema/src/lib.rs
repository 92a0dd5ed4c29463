//! Schema descriptions for modelguard.
//!
//! A [`SchemaCatalog`] maps class names to ordered field descriptors. Each
//! field is a primitive checked by a [`Decoder`], a nested model, an array of
//! models, or a union of those. Primitive fields may be described with plain
//! JSON Schema fragments.

pub mod catalog;
pub mod config;
pub mod decoder;
pub mod error;
pub mod kind;

pub use catalog::SchemaCatalog;
pub use config::CatalogConfig;
pub use decoder::{json_type_name, Decoder, JsonSchemaDecoder, PrimitiveType};
pub use error::{Result, SchemaError};
pub use kind::{FieldKind, ModelSchema, ResolvedKind};
