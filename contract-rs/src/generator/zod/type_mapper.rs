//! Descriptor to Zod schema mappings.
//!
//! | Descriptor | Zod Schema |
//! |------------|------------|
//! | `string` | `z.string()` |
//! | `integer` | `z.number().int()` |
//! | `float`, `decimal` | `z.number()` |
//! | `boolean` | `z.boolean()` |
//! | `date` / `datetime` / `time` | `z.string().date()` / `.datetime({ offset: true })` / `.time()` |
//! | `uuid` | `z.string().uuid()` |
//! | `unknown` | `z.unknown()` |
//! | enum | `z.enum([...])` (sorted) |
//! | object | `z.object({...}).strict()` |
//! | array | `z.array(T)` |
//! | tagged union | `z.discriminatedUnion(key, [...])` |
//! | union | `z.union([...])` |
//! | reference | `{Name}Schema`, or `z.lazy(() => {Name}Schema)` when not yet declared |
//! | literal | `z.literal(v)` |

use crate::generator::traits::GenerationContext;
use crate::generator::{
    js_literal, js_string, number, property_key, sorted_values, variant_definition,
};
use crate::ir::{
    ArrayItems, EnumValues, Field, ObjectShape, ParamDefinition, StringFormat, TypeKind,
    UnionVariant,
};

/// Zod identifier of a registered type.
pub fn schema_name(name: &str) -> String {
    format!("{name}Schema")
}

/// Maps descriptors to Zod schema expressions while one type is emitted.
///
/// References to types not yet declared in the file, including the type
/// being emitted, are deferred with `z.lazy`.
#[derive(Debug, Clone, Copy)]
pub struct ZodTypeMapper<'a> {
    ctx: GenerationContext<'a>,
    /// Name of the type being emitted
    current: &'a str,
}

impl<'a> ZodTypeMapper<'a> {
    pub fn new(ctx: GenerationContext<'a>, current: &'a str) -> Self {
        Self { ctx, current }
    }

    /// Map a definition to its Zod schema, including nullability.
    ///
    /// `depth` is the indentation level of the line the schema starts on.
    pub fn map_type(&self, def: &ParamDefinition, depth: usize) -> String {
        let schema = self.map_type_kind(def, depth);
        if def.nullable {
            format!("{schema}.nullable()")
        } else {
            schema
        }
    }

    /// Map a field: the type, then `.optional()`, `.default()` and `.describe()`.
    pub fn map_field(&self, field: &Field, depth: usize) -> String {
        let def = &field.definition;
        let mut schema = self.map_type(def, depth);

        if def.optional {
            schema.push_str(".optional()");
        }
        if let Some(default) = &def.default {
            schema.push_str(&format!(".default({})", js_literal(default)));
        }
        if self.ctx.config.generate_docs {
            if let Some(desc) = &def.metadata.description {
                schema.push_str(&format!(".describe({})", js_string(desc)));
            }
        }
        schema
    }

    /// Reference to a registered type by its schema identifier.
    pub fn map_reference(&self, name: &str) -> String {
        if name != self.current && self.ctx.is_emitted(name) {
            schema_name(name)
        } else {
            format!("z.lazy(() => {})", schema_name(name))
        }
    }

    fn map_type_kind(&self, def: &ParamDefinition, depth: usize) -> String {
        match &def.kind {
            TypeKind::String => match &def.enum_values {
                Some(EnumValues::Inline(values)) => map_enum(values),
                Some(EnumValues::Named(name)) => self.map_reference(name),
                None => {
                    let schema = self.apply_format("z.string()".to_string(), def.format.as_ref());
                    self.apply_bounds(schema, def)
                }
            },
            TypeKind::Integer => self.apply_bounds("z.number().int()".to_string(), def),
            TypeKind::Float | TypeKind::Decimal => self.apply_bounds("z.number()".to_string(), def),
            TypeKind::Boolean => "z.boolean()".to_string(),
            TypeKind::Date => "z.string().date()".to_string(),
            TypeKind::Datetime => "z.string().datetime({ offset: true })".to_string(),
            TypeKind::Time => "z.string().time()".to_string(),
            TypeKind::Uuid => "z.string().uuid()".to_string(),
            TypeKind::Unknown => "z.unknown()".to_string(),

            TypeKind::Array { items } => {
                let element = match items {
                    ArrayItems::Of(element) => self.map_type(element, depth),
                    ArrayItems::Shape(shape) => self.map_object(shape, depth),
                };
                self.apply_bounds(format!("z.array({element})"), def)
            }
            TypeKind::Object { shape } => self.map_object(shape, depth),
            TypeKind::Union {
                discriminator,
                variants,
            } => self.map_union(discriminator.as_deref(), variants, depth),
            TypeKind::Reference { to } => self.map_reference(to),
            TypeKind::Literal { value } if value.is_null() => "z.null()".to_string(),
            TypeKind::Literal { value } => format!("z.literal({})", js_literal(value)),
        }
    }

    /// Map an object shape; undeclared keys are rejected.
    pub fn map_object(&self, shape: &ObjectShape, depth: usize) -> String {
        if shape.is_empty() {
            return "z.object({}).strict()".to_string();
        }

        let indent = self.ctx.config.indent.indent(depth + 1);
        let fields: Vec<String> = shape
            .fields
            .iter()
            .map(|field| {
                format!(
                    "{indent}{}: {}",
                    property_key(&self.ctx.config.key_case.wire_name(field)),
                    self.map_field(field, depth + 1)
                )
            })
            .collect();

        format!(
            "z.object({{\n{}\n{}}}).strict()",
            fields.join(",\n"),
            self.ctx.config.indent.indent(depth)
        )
    }

    /// Map a union.
    ///
    /// Tagged unions use `z.discriminatedUnion` when every variant is an
    /// object schema known at this point; otherwise all unions use `z.union`.
    fn map_union(
        &self,
        discriminator: Option<&str>,
        variants: &[UnionVariant],
        depth: usize,
    ) -> String {
        let schemas: Vec<String> = variants
            .iter()
            .map(|variant| self.map_type(&variant_definition(discriminator, variant), depth))
            .collect();

        match (discriminator, schemas.as_slice()) {
            (_, []) => "z.never()".to_string(),
            (Some(key), _) if self.all_objects(discriminator, variants) => format!(
                "z.discriminatedUnion({}, [{}])",
                js_string(&self.ctx.config.key_case.apply(key)),
                schemas.join(", ")
            ),
            (_, [single]) => single.clone(),
            _ => format!("z.union([{}])", schemas.join(", ")),
        }
    }

    fn all_objects(&self, discriminator: Option<&str>, variants: &[UnionVariant]) -> bool {
        variants.iter().all(|variant| {
            let def = variant_definition(discriminator, variant);
            if def.nullable {
                return false;
            }
            match &def.kind {
                TypeKind::Object { .. } => true,
                TypeKind::Reference { to } => {
                    to != self.current && self.ctx.is_emitted(to) && self.ctx.is_object(to)
                }
                _ => false,
            }
        })
    }

    fn apply_format(&self, mut schema: String, format: Option<&StringFormat>) -> String {
        match format {
            Some(StringFormat::Email) => schema.push_str(".email()"),
            Some(StringFormat::Uri) => schema.push_str(".url()"),
            Some(StringFormat::Uuid) => schema.push_str(".uuid()"),
            Some(StringFormat::Date) => schema.push_str(".date()"),
            Some(StringFormat::Datetime) => schema.push_str(".datetime({ offset: true })"),
            Some(StringFormat::Ipv4) => schema.push_str(".ip({ version: \"v4\" })"),
            Some(StringFormat::Ipv6) => schema.push_str(".ip({ version: \"v6\" })"),
            Some(StringFormat::Pattern(pattern)) => {
                schema.push_str(&format!(".regex(/{}/)", escape_regex(pattern)))
            }
            None => {}
        }
        schema
    }

    /// `.min()`/`.max()`: value for numbers, length for strings, count for arrays.
    fn apply_bounds(&self, mut schema: String, def: &ParamDefinition) -> String {
        if let Some(min) = def.min {
            schema.push_str(&format!(".min({})", number(min)));
        }
        if let Some(max) = def.max {
            schema.push_str(&format!(".max({})", number(max)));
        }
        schema
    }
}

fn map_enum(values: &[String]) -> String {
    let literals: Vec<String> = sorted_values(values).into_iter().map(js_string).collect();
    if literals.is_empty() {
        "z.never()".to_string()
    } else {
        format!("z.enum([{}])", literals.join(", "))
    }
}

/// Escape a pattern for use inside a regex literal.
fn escape_regex(pattern: &str) -> String {
    pattern.replace('/', "\\/")
}
