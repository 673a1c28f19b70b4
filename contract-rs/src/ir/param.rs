//! Parameter (descriptor) IR.
//!
//! A [`ParamDefinition`] describes one value: its kind, the two independent
//! optional/nullable axes, constraints and documentation. Every consumer
//! (coercion, validation, the pipeline and all generators) reads the same
//! definition.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::metadata::FieldMetadata;
use super::types::{
    ArrayItems, EnumValues, Field, ObjectShape, ScalarKind, StringFormat, TypeKind, UnionVariant,
};

fn is_false(value: &bool) -> bool {
    !*value
}

/// One descriptor node of the type IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDefinition {
    /// Kind of value
    #[serde(flatten)]
    pub kind: TypeKind,

    /// Whether `null` is an accepted value
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,

    /// Whether the key may be absent
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    /// String format constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,

    /// Lower bound: value for numbers, length for strings, count for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound: value for numbers, length for strings, count for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Allowed values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<EnumValues>,

    /// Value filled into inbound params when the key is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Named transformer applied to inbound values after validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode: Option<String>,

    /// Named transformer applied to outbound values before validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode: Option<String>,

    #[serde(flatten)]
    pub metadata: FieldMetadata,
}

impl ParamDefinition {
    /// Create a new definition of the given kind with no modifiers.
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
            optional: false,
            format: None,
            min: None,
            max: None,
            enum_values: None,
            default: None,
            decode: None,
            encode: None,
            metadata: FieldMetadata::default(),
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(TypeKind::from_scalar(kind))
    }

    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    pub fn integer() -> Self {
        Self::new(TypeKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(TypeKind::Float)
    }

    pub fn decimal() -> Self {
        Self::new(TypeKind::Decimal)
    }

    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(TypeKind::Date)
    }

    pub fn datetime() -> Self {
        Self::new(TypeKind::Datetime)
    }

    pub fn time() -> Self {
        Self::new(TypeKind::Time)
    }

    pub fn uuid() -> Self {
        Self::new(TypeKind::Uuid)
    }

    pub fn unknown() -> Self {
        Self::new(TypeKind::Unknown)
    }

    /// String constrained to a fixed set of values.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::string().with_enum(EnumValues::Inline(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// String constrained to the values of a registered enum type.
    pub fn named_enum(name: impl Into<String>) -> Self {
        Self::string().with_enum(EnumValues::Named(name.into()))
    }

    /// Object with the given fields in declaration order.
    pub fn object(fields: Vec<Field>) -> Self {
        Self::new(TypeKind::Object {
            shape: ObjectShape::new(fields),
        })
    }

    /// Array whose elements are described by `element`.
    pub fn array_of(element: ParamDefinition) -> Self {
        Self::new(TypeKind::Array {
            items: ArrayItems::Of(Box::new(element)),
        })
    }

    /// Array whose elements are inline objects.
    pub fn array_of_shape(fields: Vec<Field>) -> Self {
        Self::new(TypeKind::Array {
            items: ArrayItems::Shape(ObjectShape::new(fields)),
        })
    }

    /// By-name reference to a registered type.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Reference { to: name.into() })
    }

    /// Exactly the given value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(TypeKind::Literal {
            value: value.into(),
        })
    }

    /// Value-based union: the first matching variant wins.
    pub fn union(variants: Vec<ParamDefinition>) -> Self {
        Self::new(TypeKind::Union {
            discriminator: None,
            variants: variants.into_iter().map(UnionVariant::untagged).collect(),
        })
    }

    /// Discriminated union keyed by `discriminator`.
    pub fn tagged_union(discriminator: impl Into<String>, variants: Vec<UnionVariant>) -> Self {
        Self::new(TypeKind::Union {
            discriminator: Some(discriminator.into()),
            variants,
        })
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    /// Accept `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Allow the key to be absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_enum(mut self, values: EnumValues) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_decode(mut self, transformer: impl Into<String>) -> Self {
        self.decode = Some(transformer.into());
        self
    }

    pub fn with_encode(mut self, transformer: impl Into<String>) -> Self {
        self.encode = Some(transformer.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.metadata.example = Some(example.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.metadata.deprecated = true;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The scalar kind, if this is a scalar.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        self.kind.scalar()
    }

    /// The referenced type name, if this is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Reference { to } => Some(to),
            _ => None,
        }
    }

    /// The object shape, if this is an object.
    pub fn shape(&self) -> Option<&ObjectShape> {
        match &self.kind {
            TypeKind::Object { shape } => Some(shape),
            _ => None,
        }
    }

    /// Inline enum values, if any.
    pub fn inline_enum(&self) -> Option<&[String]> {
        match &self.enum_values {
            Some(EnumValues::Inline(values)) => Some(values),
            _ => None,
        }
    }

    /// Whether this describes a pure enum type (string with inline values).
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::String) && self.inline_enum().is_some()
    }

    /// Whether this definition is a bare reference with no modifiers of its own.
    pub fn is_alias(&self) -> bool {
        self.kind.is_reference()
            && !self.nullable
            && !self.optional
            && self.enum_values.is_none()
            && self.metadata.is_empty()
    }

    /// Collect every registered name this definition depends on.
    ///
    /// Includes references and named enums, at any depth.
    pub fn collect_references(&self, out: &mut BTreeSet<String>) {
        if let Some(EnumValues::Named(name)) = &self.enum_values {
            out.insert(name.clone());
        }
        match &self.kind {
            TypeKind::Reference { to } => {
                out.insert(to.clone());
            }
            TypeKind::Array { items } => match items {
                ArrayItems::Of(element) => element.collect_references(out),
                ArrayItems::Shape(shape) => collect_shape_references(shape, out),
            },
            TypeKind::Object { shape } => collect_shape_references(shape, out),
            TypeKind::Union { variants, .. } => {
                for variant in variants {
                    variant.definition.collect_references(out);
                }
            }
            _ => {}
        }
    }

    /// Names referenced by this definition, sorted.
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    /// Check the structural invariants, pushing one message per violation.
    pub(crate) fn check(&self, path: &str, problems: &mut Vec<String>) {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                problems.push(format!("{path}: min {min} exceeds max {max}"));
            }
        }
        if let Some(StringFormat::Pattern(pattern)) = &self.format {
            if regex::Regex::new(pattern).is_err() {
                problems.push(format!("{path}: invalid pattern `{pattern}`"));
            }
        }
        match &self.kind {
            TypeKind::Object { shape } => check_shape(shape, path, problems),
            TypeKind::Array { items } => match items {
                ArrayItems::Of(element) => element.check(&format!("{path}[]"), problems),
                ArrayItems::Shape(shape) => check_shape(shape, &format!("{path}[]"), problems),
            },
            TypeKind::Union {
                discriminator,
                variants,
            } => {
                if variants.is_empty() {
                    problems.push(format!("{path}: union has no variants"));
                }
                let mut tags = BTreeSet::new();
                for (index, variant) in variants.iter().enumerate() {
                    let variant_path = format!("{path}|{index}");
                    match (discriminator, &variant.tag) {
                        (Some(_), None) => {
                            problems.push(format!("{variant_path}: tagged variant has no tag"))
                        }
                        (Some(_), Some(tag)) if !tags.insert(tag.clone()) => {
                            problems.push(format!("{variant_path}: duplicate tag `{tag}`"))
                        }
                        _ => {}
                    }
                    variant.definition.check(&variant_path, problems);
                }
            }
            TypeKind::Reference { to } if to.is_empty() => {
                problems.push(format!("{path}: empty reference"));
            }
            _ => {}
        }
    }
}

fn collect_shape_references(shape: &ObjectShape, out: &mut BTreeSet<String>) {
    for field in &shape.fields {
        field.definition.collect_references(out);
    }
}

fn check_shape(shape: &ObjectShape, path: &str, problems: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for field in &shape.fields {
        if !seen.insert(field.name.as_str()) {
            problems.push(format!("{path}: duplicate field `{}`", field.name));
        }
        field
            .definition
            .check(&format!("{path}.{}", field.name), problems);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_chain() {
        let def = ParamDefinition::string()
            .nullable()
            .optional()
            .with_min(1.0)
            .with_max(10.0)
            .with_description("Notes");

        assert!(def.nullable);
        assert!(def.optional);
        assert_eq!(def.min, Some(1.0));
        assert_eq!(def.max, Some(10.0));
        assert_eq!(def.metadata.description, Some("Notes".to_string()));
    }

    #[test]
    fn test_enumeration() {
        let def = ParamDefinition::enumeration(["draft", "sent"]);
        assert!(def.is_enum());
        assert_eq!(
            def.inline_enum(),
            Some(&["draft".to_string(), "sent".to_string()][..])
        );
    }

    #[test]
    fn test_collect_references() {
        let def = ParamDefinition::object(vec![
            Field::new("customer", ParamDefinition::reference("Customer")),
            Field::new(
                "lines",
                ParamDefinition::array_of(ParamDefinition::reference("LineItem")),
            ),
            Field::new("status", ParamDefinition::named_enum("InvoiceStatus")),
        ]);

        let refs: Vec<_> = def.references().into_iter().collect();
        assert_eq!(refs, vec!["Customer", "InvoiceStatus", "LineItem"]);
    }

    #[test]
    fn test_alias_detection() {
        assert!(ParamDefinition::reference("User").is_alias());
        assert!(!ParamDefinition::reference("User").nullable().is_alias());
        assert!(!ParamDefinition::string().is_alias());
    }

    #[test]
    fn test_serde_document_form() {
        let def: ParamDefinition = serde_json::from_value(json!({
            "type": "object",
            "shape": [
                { "name": "number", "type": "string", "min": 1 },
                { "name": "notes", "type": "string", "nullable": true, "optional": true },
                { "name": "status", "type": "string", "enum": ["draft", "sent", "paid"] }
            ]
        }))
        .unwrap();

        let shape = def.shape().unwrap();
        assert_eq!(shape.fields.len(), 3);
        assert_eq!(shape.fields[0].definition.min, Some(1.0));
        assert!(shape.fields[1].definition.nullable);
        assert!(shape.fields[2].definition.is_enum());
    }

    #[test]
    fn test_serde_tagged_union() {
        let def: ParamDefinition = serde_json::from_value(json!({
            "type": "union",
            "discriminator": "kind",
            "variants": [
                { "tag": "card", "type": "reference", "to": "CardPayment" },
                { "tag": "bank", "type": "reference", "to": "BankPayment" }
            ]
        }))
        .unwrap();

        match &def.kind {
            TypeKind::Union {
                discriminator,
                variants,
            } => {
                assert_eq!(discriminator.as_deref(), Some("kind"));
                assert_eq!(variants[0].tag.as_deref(), Some("card"));
                assert_eq!(variants[1].definition.reference_name(), Some("BankPayment"));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_check_reports_problems() {
        let def = ParamDefinition::object(vec![
            Field::new("a", ParamDefinition::string()),
            Field::new("a", ParamDefinition::integer().with_min(5.0).with_max(1.0)),
            Field::new(
                "u",
                ParamDefinition::tagged_union(
                    "kind",
                    vec![UnionVariant::untagged(ParamDefinition::string())],
                ),
            ),
        ]);

        let mut problems = Vec::new();
        def.check("Bad", &mut problems);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("duplicate field `a`"));
        assert!(problems[1].contains("min 5 exceeds max 1"));
        assert!(problems[2].contains("tagged variant has no tag"));
    }
}
