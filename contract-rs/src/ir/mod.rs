//! Intermediate Representation (IR) for contract types.
//!
//! The IR is the single source of truth read by coercion, validation,
//! the transformation pipeline and every code generator.
//!
//! # Structure
//!
//! - [`TypeDef`]: a named, registrable type
//! - [`ParamDefinition`]: one descriptor node (kind, modifiers, constraints)
//! - [`TypeKind`]: scalar kinds and containers
//! - [`FieldMetadata`]: documentation metadata
//!
//! # Example
//!
//! ```rust
//! use contract_rs::ir::{Field, ParamDefinition, TypeDef};
//!
//! let invoice = TypeDef::new(
//!     "Invoice",
//!     ParamDefinition::object(vec![
//!         Field::new("number", ParamDefinition::string()),
//!         Field::new("notes", ParamDefinition::string().nullable().optional()),
//!         Field::new("status", ParamDefinition::enumeration(["draft", "sent", "paid"])),
//!     ]),
//! );
//! assert!(invoice.validate_shape().is_ok());
//! ```

mod metadata;
mod param;
mod schema;
mod types;

pub use metadata::FieldMetadata;
pub use param::ParamDefinition;
pub use schema::TypeDef;
pub use types::{
    ArrayItems, EnumValues, Field, ObjectShape, ScalarKind, StringFormat, TypeKind, UnionVariant,
};
