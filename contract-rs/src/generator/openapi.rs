//! OpenAPI 3.1 component schema generator.
//!
//! Every registered type becomes one entry of `components.schemas`;
//! references become `$ref` pointers into that map.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Map, Value};

use crate::error::GeneratorError;
use crate::ir::{ArrayItems, EnumValues, ObjectShape, ParamDefinition, StringFormat, TypeKind};
use crate::issue::number_value;
use crate::registry::{OrderedKind, OrderedType};

use super::traits::{CodeGenerator, GeneratedCode, GenerationContext, GeneratorFeature};
use super::{sorted_values, variant_definition};

pub const OPENAPI_VERSION: &str = "3.1.0";

/// `$ref` pointer of a registered type.
pub fn schema_ref(name: &str) -> String {
    format!("#/components/schemas/{name}")
}

/// OpenAPI document generator.
#[derive(Debug, Clone)]
pub struct OpenApiGenerator {
    /// `info.version` of the document
    api_version: String,
}

impl Default for OpenApiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiGenerator {
    pub fn new() -> Self {
        Self {
            api_version: "1.0.0".to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// JSON Schema for one definition.
    pub fn schema(&self, def: &ParamDefinition, ctx: &GenerationContext<'_>) -> Value {
        let mut schema = self.schema_kind(def, ctx);
        if def.nullable {
            schema = make_nullable(schema);
        }

        if let Some(default) = &def.default {
            schema.insert("default".to_string(), default.clone());
        }
        if ctx.config.generate_docs {
            let meta = &def.metadata;
            if let Some(description) = &meta.description {
                schema.insert("description".to_string(), json!(description));
            }
            if let Some(example) = &meta.example {
                schema.insert("examples".to_string(), json!([example]));
            }
            if meta.deprecated {
                schema.insert("deprecated".to_string(), json!(true));
            }
        }
        Value::Object(schema)
    }

    fn schema_kind(
        &self,
        def: &ParamDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Map<String, Value> {
        let mut schema = Map::new();
        match &def.kind {
            TypeKind::String => match &def.enum_values {
                Some(EnumValues::Named(name)) => {
                    schema.insert("$ref".to_string(), json!(schema_ref(name)));
                }
                Some(EnumValues::Inline(values)) => {
                    schema.insert("type".to_string(), json!("string"));
                    schema.insert("enum".to_string(), json!(sorted_values(values)));
                }
                None => {
                    schema.insert("type".to_string(), json!("string"));
                    if let Some(format) = &def.format {
                        insert_format(&mut schema, format);
                    }
                    insert_bounds(&mut schema, def, "minLength", "maxLength");
                }
            },
            TypeKind::Integer => {
                schema.insert("type".to_string(), json!("integer"));
                insert_bounds(&mut schema, def, "minimum", "maximum");
            }
            TypeKind::Float | TypeKind::Decimal => {
                schema.insert("type".to_string(), json!("number"));
                insert_bounds(&mut schema, def, "minimum", "maximum");
            }
            TypeKind::Boolean => {
                schema.insert("type".to_string(), json!("boolean"));
            }
            TypeKind::Date => string_format(&mut schema, "date"),
            TypeKind::Datetime => string_format(&mut schema, "date-time"),
            TypeKind::Time => string_format(&mut schema, "time"),
            TypeKind::Uuid => string_format(&mut schema, "uuid"),
            TypeKind::Unknown => {}

            TypeKind::Array { items } => {
                let items = match items {
                    ArrayItems::Of(element) => self.schema(element, ctx),
                    ArrayItems::Shape(shape) => Value::Object(self.object(shape, ctx)),
                };
                schema.insert("type".to_string(), json!("array"));
                schema.insert("items".to_string(), items);
                insert_bounds(&mut schema, def, "minItems", "maxItems");
            }
            TypeKind::Object { shape } => schema = self.object(shape, ctx),
            TypeKind::Union {
                discriminator,
                variants,
            } => {
                let one_of: Vec<Value> = variants
                    .iter()
                    .map(|variant| {
                        self.schema(&variant_definition(discriminator.as_deref(), variant), ctx)
                    })
                    .collect();
                schema.insert("oneOf".to_string(), Value::Array(one_of));

                if let Some(key) = discriminator {
                    let mapping: Map<String, Value> = variants
                        .iter()
                        .filter_map(|variant| {
                            let tag = variant.tag.as_ref()?;
                            let target = variant.definition.reference_name()?;
                            Some((tag.clone(), json!(schema_ref(target))))
                        })
                        .collect();
                    let mut object = Map::new();
                    object.insert(
                        "propertyName".to_string(),
                        json!(ctx.config.key_case.apply(key)),
                    );
                    if !mapping.is_empty() {
                        object.insert("mapping".to_string(), Value::Object(mapping));
                    }
                    schema.insert("discriminator".to_string(), Value::Object(object));
                }
            }
            TypeKind::Reference { to } => {
                schema.insert("$ref".to_string(), json!(schema_ref(to)));
            }
            TypeKind::Literal { value } => {
                schema.insert("const".to_string(), value.clone());
            }
        }
        schema
    }

    fn object(&self, shape: &ObjectShape, ctx: &GenerationContext<'_>) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &shape.fields {
            let key = ctx.config.key_case.wire_name(field);
            if !field.definition.optional {
                required.push(json!(key));
            }
            properties.insert(key, self.schema(&field.definition, ctx));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema.insert("additionalProperties".to_string(), json!(false));
        schema
    }

    /// Serialize with the configured indentation.
    fn render(
        &self,
        document: &Value,
        ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(ctx.config.indent_str().as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        let mut out = String::from_utf8_lossy(&buf).into_owned();
        out.push('\n');
        Ok(out)
    }
}

/// `type: [t, "null"]` where a type is present, `oneOf` with null otherwise.
fn make_nullable(mut schema: Map<String, Value>) -> Map<String, Value> {
    match schema.get("type").and_then(Value::as_str).map(str::to_string) {
        Some(ty) => {
            schema.insert("type".to_string(), json!([ty, "null"]));
            if let Some(Value::Array(values)) = schema.get_mut("enum") {
                values.push(Value::Null);
            }
            schema
        }
        None => {
            let mut wrapped = Map::new();
            wrapped.insert(
                "oneOf".to_string(),
                json!([Value::Object(schema), { "type": "null" }]),
            );
            wrapped
        }
    }
}

fn string_format(schema: &mut Map<String, Value>, format: &str) {
    schema.insert("type".to_string(), json!("string"));
    schema.insert("format".to_string(), json!(format));
}

fn insert_format(schema: &mut Map<String, Value>, format: &StringFormat) {
    match format {
        StringFormat::Pattern(pattern) => {
            schema.insert("pattern".to_string(), json!(pattern));
        }
        other => {
            schema.insert("format".to_string(), json!(other.name()));
        }
    }
}

fn insert_bounds(
    schema: &mut Map<String, Value>,
    def: &ParamDefinition,
    min_key: &str,
    max_key: &str,
) {
    if let Some(min) = def.min {
        schema.insert(min_key.to_string(), number_value(min));
    }
    if let Some(max) = def.max {
        schema.insert(max_key.to_string(), number_value(max));
    }
}

impl CodeGenerator for OpenApiGenerator {
    fn id(&self) -> &'static str {
        "openapi"
    }

    fn name(&self) -> &'static str {
        "OpenAPI Schema Generator"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn generate(
        &self,
        ty: &OrderedType<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<GeneratedCode, GeneratorError> {
        let (schema, dependencies) = match &ty.kind {
            OrderedKind::Alias(target) => {
                (json!({ "$ref": schema_ref(target) }), vec![target.clone()])
            }
            OrderedKind::Defined(def) => (
                self.schema(&def.definition, ctx),
                def.dependencies().into_iter().collect(),
            ),
        };
        Ok(GeneratedCode::new(serde_json::to_string(&schema)?, &ty.name)
            .with_dependencies(dependencies))
    }

    /// Collect the per-type schemas into one document.
    fn assemble(
        &self,
        _preamble: String,
        parts: Vec<GeneratedCode>,
        _postamble: String,
        ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        let mut schemas = Map::new();
        for part in parts {
            schemas.insert(part.type_name, serde_json::from_str(&part.code)?);
        }

        let title = ctx.view.scope.api_name().unwrap_or("global");
        let document = json!({
            "openapi": OPENAPI_VERSION,
            "info": {
                "title": title,
                "version": self.api_version,
            },
            "components": {
                "schemas": schemas,
            },
        });
        self.render(&document, ctx)
    }

    fn supports_feature(&self, feature: GeneratorFeature) -> bool {
        !matches!(
            feature,
            GeneratorFeature::Lazy | GeneratorFeature::RuntimeValidation
        )
    }
}
