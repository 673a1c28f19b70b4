//! TypeScript declaration generator.
//!
//! Objects become interfaces, everything else a type alias. Optionality
//! maps to `?`, nullability to `| null`, and the two never stand in for
//! each other.
//!
//! | Descriptor | TypeScript |
//! |------------|------------|
//! | `string`, `date`, `datetime`, `time`, `uuid` | `string` |
//! | `integer`, `float`, `decimal` | `number` |
//! | `boolean` | `boolean` |
//! | `unknown` | `unknown` |
//! | enum | `"a" \| "b"` (sorted) |
//! | array | `T[]` |
//! | reference | type name |
//! | literal | literal type |

use crate::error::GeneratorError;
use crate::ir::{ArrayItems, EnumValues, Field, ObjectShape, ParamDefinition, TypeDef, TypeKind};
use crate::registry::{OrderedKind, OrderedType};

use super::traits::{CodeGenerator, GeneratedCode, GenerationContext, GeneratorFeature};
use super::{
    header, js_literal, js_string, jsdoc, property_key, sorted_values, variant_definition,
};

/// TypeScript type declaration generator.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptGenerator;

impl TypeScriptGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Declaration of one named type, without documentation.
    pub fn declaration(&self, def: &TypeDef, ctx: &GenerationContext<'_>) -> String {
        let export = ctx.config.export_prefix();
        let name = &def.name;
        if let Some(target) = def.alias_target() {
            return format!("{export}type {name} = {target};\n");
        }
        match &def.definition.kind {
            TypeKind::Object { shape } if !def.definition.nullable => {
                format!("{export}interface {name} {}\n", self.render_object(shape, ctx, 0))
            }
            _ => format!(
                "{export}type {name} = {};\n",
                self.render_type(&def.definition, ctx, 0)
            ),
        }
    }

    /// TypeScript type expression for a definition.
    ///
    /// `depth` is the indentation level of the line the expression starts on.
    pub fn render_type(
        &self,
        def: &ParamDefinition,
        ctx: &GenerationContext<'_>,
        depth: usize,
    ) -> String {
        let base = self.render_base(def, ctx, depth);
        if def.nullable {
            format!("{base} | null")
        } else {
            base
        }
    }

    fn render_base(&self, def: &ParamDefinition, ctx: &GenerationContext<'_>, depth: usize) -> String {
        match &def.kind {
            TypeKind::String => match &def.enum_values {
                Some(EnumValues::Inline(values)) => render_enum(values),
                Some(EnumValues::Named(name)) => name.clone(),
                None => "string".to_string(),
            },
            TypeKind::Date | TypeKind::Datetime | TypeKind::Time | TypeKind::Uuid => {
                "string".to_string()
            }
            TypeKind::Integer | TypeKind::Float | TypeKind::Decimal => "number".to_string(),
            TypeKind::Boolean => "boolean".to_string(),
            TypeKind::Unknown => "unknown".to_string(),
            TypeKind::Array { items } => {
                let element = match items {
                    ArrayItems::Of(element) => self.render_type(element, ctx, depth),
                    ArrayItems::Shape(shape) => self.render_object(shape, ctx, depth),
                };
                if element.contains(" | ") {
                    format!("({element})[]")
                } else {
                    format!("{element}[]")
                }
            }
            TypeKind::Object { shape } => self.render_object(shape, ctx, depth),
            TypeKind::Union {
                discriminator,
                variants,
            } => variants
                .iter()
                .map(|variant| {
                    let def = variant_definition(discriminator.as_deref(), variant);
                    self.render_type(&def, ctx, depth)
                })
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Reference { to } => to.clone(),
            TypeKind::Literal { value } => js_literal(value),
        }
    }

    fn render_object(&self, shape: &ObjectShape, ctx: &GenerationContext<'_>, depth: usize) -> String {
        if shape.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::from("{\n");
        for field in &shape.fields {
            out.push_str(&self.render_field(field, ctx, depth + 1));
        }
        out.push_str(&ctx.config.indent.indent(depth));
        out.push('}');
        out
    }

    fn render_field(&self, field: &Field, ctx: &GenerationContext<'_>, depth: usize) -> String {
        let indent = ctx.config.indent.indent(depth);
        let mut out = String::new();
        if ctx.config.generate_docs {
            out.push_str(&jsdoc(&field.definition.metadata, &indent));
        }
        let key = property_key(&ctx.config.key_case.wire_name(field));
        let marker = if field.definition.optional { "?" } else { "" };
        out.push_str(&format!(
            "{indent}{key}{marker}: {};\n",
            self.render_type(&field.definition, ctx, depth)
        ));
        out
    }
}

fn render_enum(values: &[String]) -> String {
    let literals: Vec<String> = sorted_values(values)
        .into_iter()
        .map(js_string)
        .collect();
    if literals.is_empty() {
        "never".to_string()
    } else {
        literals.join(" | ")
    }
}

impl CodeGenerator for TypeScriptGenerator {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn name(&self) -> &'static str {
        "TypeScript Declaration Generator"
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn generate(
        &self,
        ty: &OrderedType<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<GeneratedCode, GeneratorError> {
        let (code, dependencies) = match &ty.kind {
            OrderedKind::Alias(target) => (
                format!("{}type {} = {target};\n", ctx.config.export_prefix(), ty.name),
                vec![target.clone()],
            ),
            OrderedKind::Defined(def) => {
                let mut code = String::new();
                if ctx.config.generate_docs {
                    code.push_str(&jsdoc(&def.definition.metadata, ""));
                }
                code.push_str(&self.declaration(def, ctx));
                (code, def.dependencies().into_iter().collect())
            }
        };
        Ok(GeneratedCode::new(code, &ty.name).with_dependencies(dependencies))
    }

    fn generate_preamble(
        &self,
        _types: &[OrderedType<'_>],
        ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        Ok(format!("{}\n", header(self, ctx.view.scope, ctx.config)))
    }

    fn supports_feature(&self, feature: GeneratorFeature) -> bool {
        matches!(
            feature,
            GeneratorFeature::CircularReferences
                | GeneratorFeature::DiscriminatedUnions
                | GeneratorFeature::Descriptions
                | GeneratorFeature::Deprecation
                | GeneratorFeature::Examples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate_namespace, GeneratorConfig, OutputStyle};
    use crate::ir::{FieldMetadata, UnionVariant};
    use crate::pipeline::KeyCase;
    use crate::registry::{Scope, TypeRegistry};

    fn billing() -> (TypeRegistry, Scope) {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new("Status", ParamDefinition::enumeration(["sent", "draft", "paid"])),
                &scope,
            )
            .unwrap();
        registry
            .register(
                TypeDef::new(
                    "LineItem",
                    ParamDefinition::object(vec![
                        Field::new("description", ParamDefinition::string()),
                        Field::new("quantity", ParamDefinition::integer().with_min(1.0)),
                    ]),
                ),
                &scope,
            )
            .unwrap();
        registry
            .register(
                TypeDef::new(
                    "Invoice",
                    ParamDefinition::object(vec![
                        Field::new("number", ParamDefinition::string()),
                        Field::new("status", ParamDefinition::reference("Status")),
                        Field::new(
                            "line_items",
                            ParamDefinition::array_of(ParamDefinition::reference("LineItem")),
                        ),
                        Field::new("notes", ParamDefinition::string().nullable().optional()),
                        Field::new("due_on", ParamDefinition::date().optional()),
                    ]),
                ),
                &scope,
            )
            .unwrap();
        (registry, scope)
    }

    fn generate(registry: &TypeRegistry, scope: &Scope, config: &GeneratorConfig) -> String {
        generate_namespace(&TypeScriptGenerator::new(), registry, scope, config).unwrap()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[test]
    fn test_interface_with_optional_and_nullable() {
        let (registry, scope) = billing();
        let config = GeneratorConfig::default().with_key_case(KeyCase::Camel);
        let ts = generate(&registry, &scope, &config);

        assert!(ts.contains(
            "export interface Invoice {\n  number: string;\n  status: Status;\n  lineItems: LineItem[];\n  notes?: string | null;\n  dueOn?: string;\n}\n"
        ));
        assert!(ts.contains(r#"export type Status = "draft" | "paid" | "sent";"#));
        assert!(ts.starts_with("// Generated by contract-rs (typescript) for api:billing"));
    }

    #[test]
    fn test_dependencies_declared_first() {
        let (registry, scope) = billing();
        let ts = generate(&registry, &scope, &GeneratorConfig::default());

        let line_item = ts.find("interface LineItem").unwrap();
        let status = ts.find("type Status").unwrap();
        let invoice = ts.find("interface Invoice").unwrap();
        assert!(line_item < invoice);
        assert!(status < invoice);
    }

    #[test]
    fn test_declaration_style() {
        let (registry, scope) = billing();
        let config = GeneratorConfig::default().with_output_style(OutputStyle::Declaration);
        let ts = generate(&registry, &scope, &config);
        assert!(ts.contains("\ninterface Invoice {"));
        assert!(!ts.contains("export "));
    }

    #[test]
    fn test_nested_object_indentation() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new(
                    "Address",
                    ParamDefinition::object(vec![Field::new(
                        "geo",
                        ParamDefinition::object(vec![Field::new("lat", ParamDefinition::float())]),
                    )]),
                ),
                &scope,
            )
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains("export interface Address {\n  geo: {\n    lat: number;\n  };\n}\n"));
    }

    #[test]
    fn test_array_of_nullable_elements_parenthesized() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new(
                    "Tags",
                    ParamDefinition::array_of(ParamDefinition::string().nullable()),
                ),
                &scope,
            )
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains("export type Tags = (string | null)[];"));
    }

    #[test]
    fn test_tagged_union_gets_discriminator_literal() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new(
                    "Payment",
                    ParamDefinition::tagged_union(
                        "type",
                        vec![
                            UnionVariant::tagged(
                                "card",
                                ParamDefinition::object(vec![Field::new(
                                    "last_four",
                                    ParamDefinition::string(),
                                )]),
                            ),
                            UnionVariant::tagged("cash", ParamDefinition::object(vec![])),
                        ],
                    ),
                ),
                &scope,
            )
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains(
            "export type Payment = {\n  type: \"card\";\n  last_four: string;\n} | {\n  type: \"cash\";\n};"
        ));
    }

    #[test]
    fn test_alias_and_quoted_keys() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new(
                    "Customer",
                    ParamDefinition::object(vec![
                        Field::new("name", ParamDefinition::string()).renamed("display-name")
                    ]),
                ),
                &scope,
            )
            .unwrap();
        registry
            .register(TypeDef::new("Client", ParamDefinition::reference("Customer")), &scope)
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains("export type Client = Customer;"));
        assert!(ts.contains("  \"display-name\": string;"));
    }

    #[test]
    fn test_docs() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        let mut number = ParamDefinition::string();
        number.metadata = FieldMetadata::with_description("Invoice number").as_deprecated();
        registry
            .register(
                TypeDef::new(
                    "Invoice",
                    ParamDefinition::object(vec![Field::new("number", number)])
                        .with_description("A bill"),
                ),
                &scope,
            )
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains(
            "/** A bill */\nexport interface Invoice {\n  /**\n   * Invoice number\n   * @deprecated\n   */\n  number: string;\n}"
        ));

        let bare = generate(&registry, &scope, &GeneratorConfig::default().with_generate_docs(false));
        assert!(!bare.contains("/**"));
    }

    #[test]
    fn test_recursive_type_refers_to_itself() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new(
                    "Category",
                    ParamDefinition::object(vec![
                        Field::new("name", ParamDefinition::string()),
                        Field::new(
                            "children",
                            ParamDefinition::array_of(ParamDefinition::reference("Category")),
                        ),
                    ]),
                ),
                &scope,
            )
            .unwrap();

        let ts = generate(&registry, &scope, &GeneratorConfig::default());
        assert!(ts.contains("  children: Category[];"));
        assert_eq!(ts.matches("interface Category").count(), 1);
    }

    #[test]
    fn test_supports_feature() {
        let generator = TypeScriptGenerator::new();
        assert!(generator.supports_feature(GeneratorFeature::DiscriminatedUnions));
        assert!(!generator.supports_feature(GeneratorFeature::RuntimeValidation));
    }
}
