//! Type kind definitions.
//!
//! This module defines the kinds a descriptor can take: scalar kinds,
//! arrays, objects, unions, references and literals. These are
//! consumer-agnostic; coercion, validation and every generator read
//! the same values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::param::ParamDefinition;

/// Scalar kinds understood by the coercion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Time,
    Uuid,
    /// Accepts any value unchanged.
    Unknown,
}

impl ScalarKind {
    /// Wire name of the scalar kind, used in issue metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::Datetime => "datetime",
            ScalarKind::Time => "time",
            ScalarKind::Uuid => "uuid",
            ScalarKind::Unknown => "unknown",
        }
    }

    /// Check if this kind is numeric (bounds compare values, not lengths).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarKind::Integer | ScalarKind::Float | ScalarKind::Decimal
        )
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type kind of a descriptor.
///
/// Serialized with an internal `type` tag so contract documents read as
/// `{"type": "integer", "min": 1}` or `{"type": "reference", "to": "Invoice"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeKind {
    // ==========================================================================
    // Scalars
    // ==========================================================================
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Time,
    Uuid,
    Unknown,

    // ==========================================================================
    // Containers
    // ==========================================================================
    /// List of values: either a typed element (`of`) or an inline shape.
    Array { items: ArrayItems },

    /// Record with named fields.
    Object { shape: ObjectShape },

    /// Tagged (with discriminator) or value-based union.
    Union {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
        variants: Vec<UnionVariant>,
    },

    // ==========================================================================
    // Indirection and literals
    // ==========================================================================
    /// Reference to a registered type by name. Never inlined.
    Reference { to: String },

    /// Exactly this JSON value.
    Literal { value: Value },
}

impl TypeKind {
    /// The scalar kind, if this is a scalar.
    pub fn scalar(&self) -> Option<ScalarKind> {
        Some(match self {
            TypeKind::String => ScalarKind::String,
            TypeKind::Integer => ScalarKind::Integer,
            TypeKind::Float => ScalarKind::Float,
            TypeKind::Decimal => ScalarKind::Decimal,
            TypeKind::Boolean => ScalarKind::Boolean,
            TypeKind::Date => ScalarKind::Date,
            TypeKind::Datetime => ScalarKind::Datetime,
            TypeKind::Time => ScalarKind::Time,
            TypeKind::Uuid => ScalarKind::Uuid,
            TypeKind::Unknown => ScalarKind::Unknown,
            _ => return None,
        })
    }

    /// Build the type kind for a scalar.
    pub fn from_scalar(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::String => TypeKind::String,
            ScalarKind::Integer => TypeKind::Integer,
            ScalarKind::Float => TypeKind::Float,
            ScalarKind::Decimal => TypeKind::Decimal,
            ScalarKind::Boolean => TypeKind::Boolean,
            ScalarKind::Date => TypeKind::Date,
            ScalarKind::Datetime => TypeKind::Datetime,
            ScalarKind::Time => TypeKind::Time,
            ScalarKind::Uuid => TypeKind::Uuid,
            ScalarKind::Unknown => TypeKind::Unknown,
        }
    }

    /// Short name used in issue metadata and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Array { .. } => "array",
            TypeKind::Object { .. } => "object",
            TypeKind::Union { .. } => "union",
            TypeKind::Reference { .. } => "reference",
            TypeKind::Literal { .. } => "literal",
            other => other.scalar().map(|s| s.as_str()).unwrap_or("unknown"),
        }
    }

    /// Check if this is a scalar kind.
    pub fn is_scalar(&self) -> bool {
        self.scalar().is_some()
    }

    /// Check if this is a reference kind.
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeKind::Reference { .. })
    }
}

/// Element type of an array: a descriptor (`of`) or an inline shape, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayItems {
    Of(Box<ParamDefinition>),
    Shape(ObjectShape),
}

/// Ordered field list of an object.
///
/// Objects are strict: keys not declared here are reported as unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectShape {
    pub fields: Vec<Field>,
}

impl ObjectShape {
    /// Create a shape from fields in declaration order.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Look up a field by its internal name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One named field of an object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Internal (domain) name.
    pub name: String,

    /// Wire name, overriding the namespace key case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    #[serde(flatten)]
    pub definition: ParamDefinition,
}

impl Field {
    /// Create a new field with the given name and definition.
    pub fn new(name: impl Into<String>, definition: ParamDefinition) -> Self {
        Self {
            name: name.into(),
            rename: None,
            definition,
        }
    }

    /// Use a fixed wire name for this field.
    pub fn renamed(mut self, wire_name: impl Into<String>) -> Self {
        self.rename = Some(wire_name.into());
        self
    }
}

/// One member of a union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionVariant {
    /// Discriminator value selecting this variant (tagged unions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(flatten)]
    pub definition: ParamDefinition,
}

impl UnionVariant {
    /// A variant selected by a discriminator value.
    pub fn tagged(tag: impl Into<String>, definition: ParamDefinition) -> Self {
        Self {
            tag: Some(tag.into()),
            definition,
        }
    }

    /// A variant of a value-based union.
    pub fn untagged(definition: ParamDefinition) -> Self {
        Self {
            tag: None,
            definition,
        }
    }
}

/// Allowed values of an enum-constrained field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValues {
    /// Values declared on the field itself.
    Inline(Vec<String>),
    /// Name of a registered enum type.
    Named(String),
}

/// String formats checked by validation and rendered by generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Uri,
    Uuid,
    Date,
    Datetime,
    Ipv4,
    Ipv6,
    /// Custom regular expression.
    Pattern(String),
}

impl StringFormat {
    /// Format name as reported in `string_format_invalid` metadata.
    pub fn name(&self) -> &str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Uri => "uri",
            StringFormat::Uuid => "uuid",
            StringFormat::Date => "date",
            StringFormat::Datetime => "date-time",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Pattern(_) => "pattern",
        }
    }
}
