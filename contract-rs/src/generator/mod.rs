//! Code generation from the registry.
//!
//! [`generate_namespace`] walks the types visible from one scope in
//! dependency order and hands each to a [`CodeGenerator`]. Output depends
//! only on registry state and [`GeneratorConfig`], so identical inputs give
//! byte-identical files.
//!
//! # Example
//! ```rust
//! use contract_rs::generator::{generate_namespace, GeneratorConfig, TypeScriptGenerator};
//! use contract_rs::ir::{Field, ParamDefinition, TypeDef};
//! use contract_rs::registry::{Scope, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let scope = Scope::api("billing");
//! registry
//!     .register(
//!         TypeDef::new("Invoice", ParamDefinition::object(vec![
//!             Field::new("number", ParamDefinition::string()),
//!         ])),
//!         &scope,
//!     )
//!     .unwrap();
//!
//! let ts = generate_namespace(&TypeScriptGenerator::new(), &registry, &scope, &GeneratorConfig::default()).unwrap();
//! assert!(ts.contains("export interface Invoice {\n  number: string;\n}"));
//! ```

pub mod openapi;
pub mod traits;
pub mod typescript;
pub mod zod;

pub use openapi::OpenApiGenerator;
pub use traits::{
    CodeGenerator, GeneratedCode, GenerationContext, GeneratorConfig, GeneratorFeature,
    IndentStyle, LineEnding, OutputStyle,
};
pub use typescript::TypeScriptGenerator;
pub use zod::ZodGenerator;

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::GeneratorError;
use crate::ir::{Field, FieldMetadata, ParamDefinition, TypeKind, UnionVariant};
use crate::issue::number_value;
use crate::registry::{Scope, TypeRegistry};

/// All built-in generators.
pub fn generators() -> Vec<Box<dyn CodeGenerator>> {
    vec![
        Box::new(TypeScriptGenerator::new()),
        Box::new(ZodGenerator::new()),
        Box::new(OpenApiGenerator::new()),
    ]
}

/// Built-in generator by id (`typescript`/`ts`, `zod`, `openapi`).
pub fn generator_for(id: &str) -> Option<Box<dyn CodeGenerator>> {
    let id = if id == "ts" { "typescript" } else { id };
    generators().into_iter().find(|g| g.id() == id)
}

/// Generate one file for every type visible from `scope`.
///
/// Each registry name is emitted once; later references to it are by name.
pub fn generate_namespace(
    generator: &dyn CodeGenerator,
    registry: &TypeRegistry,
    scope: &Scope,
    config: &GeneratorConfig,
) -> Result<String, GeneratorError> {
    let ordered = registry.ordered(scope)?;
    let view = registry.scoped(scope);

    let mut emitted = BTreeSet::new();
    let mut parts = Vec::with_capacity(ordered.len());
    for ty in &ordered {
        if emitted.contains(&ty.name) {
            continue;
        }
        let ctx = GenerationContext {
            config,
            view,
            emitted: &emitted,
        };
        trace!(generator = generator.id(), name = %ty.name, "Generating type");
        let code = generator.generate(ty, &ctx)?;
        parts.push(code);
        emitted.insert(ty.name.clone());
    }

    let ctx = GenerationContext {
        config,
        view,
        emitted: &emitted,
    };
    let preamble = generator.generate_preamble(&ordered, &ctx)?;
    let postamble = generator.generate_postamble(&ordered, &ctx)?;
    let output = generator.assemble(preamble, parts, postamble, &ctx)?;

    debug!(
        generator = generator.id(),
        scope = %scope,
        types = emitted.len(),
        recursive = ordered.iter().filter(|ty| ty.recursive).count(),
        "Generated namespace"
    );

    Ok(match config.line_ending {
        LineEnding::Lf => output,
        LineEnding::CrLf => output.replace('\n', "\r\n"),
    })
}

// =============================================================================
// Shared rendering helpers
// =============================================================================

/// Double-quoted JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{escaped}\"")
}

/// JavaScript literal for a JSON value.
pub(crate) fn js_literal(value: &Value) -> String {
    match value {
        Value::String(s) => js_string(s),
        other => other.to_string(),
    }
}

/// Object key, quoted unless it is a plain identifier.
pub(crate) fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        name.to_string()
    } else {
        js_string(name)
    }
}

/// Enum values in output order.
pub(crate) fn sorted_values(values: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Number literal; integral bounds render without a fraction.
pub(crate) fn number(n: f64) -> String {
    number_value(n).to_string()
}

/// JSDoc block for `metadata`, or nothing when it is empty.
pub(crate) fn jsdoc(metadata: &FieldMetadata, indent: &str) -> String {
    let mut lines = Vec::new();
    if let Some(description) = &metadata.description {
        lines.extend(description.lines().map(str::to_string));
    }
    if let Some(example) = &metadata.example {
        lines.push(format!("@example {example}"));
    }
    if metadata.deprecated {
        lines.push("@deprecated".to_string());
    }

    match lines.as_slice() {
        [] => String::new(),
        [line] => format!("{indent}/** {line} */\n"),
        _ => {
            let mut out = format!("{indent}/**\n");
            for line in &lines {
                out.push_str(&format!("{indent} * {line}\n"));
            }
            out.push_str(&format!("{indent} */\n"));
            out
        }
    }
}

/// Definition of a union variant as emitted.
///
/// Inline object variants of a tagged union that do not declare the
/// discriminator get it prepended as a literal field.
pub(crate) fn variant_definition<'d>(
    discriminator: Option<&str>,
    variant: &'d UnionVariant,
) -> Cow<'d, ParamDefinition> {
    let (Some(key), Some(tag)) = (discriminator, variant.tag.as_deref()) else {
        return Cow::Borrowed(&variant.definition);
    };
    match &variant.definition.kind {
        TypeKind::Object { shape } if shape.field(key).is_none() => {
            let mut def = variant.definition.clone();
            if let TypeKind::Object { shape } = &mut def.kind {
                shape
                    .fields
                    .insert(0, Field::new(key, ParamDefinition::literal(tag)));
            }
            Cow::Owned(def)
        }
        _ => Cow::Borrowed(&variant.definition),
    }
}

/// Header comment for text targets.
pub(crate) fn header(generator: &dyn CodeGenerator, scope: &Scope, config: &GeneratorConfig) -> String {
    format!(
        "// Generated by contract-rs ({}) for {scope}, locale {}. Do not edit.\n",
        generator.id(),
        config.locale
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::ir::{Field, ParamDefinition, TypeDef};
    use serde_json::json;

    #[test]
    fn test_js_string() {
        assert_eq!(js_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(js_string("it's"), r#""it's""#);
        assert_eq!(js_literal(&json!(3)), "3");
        assert_eq!(js_literal(&json!("a")), r#""a""#);
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("lineItems"), "lineItems");
        assert_eq!(property_key("_op"), "_op");
        assert_eq!(property_key("a/b"), r#""a/b""#);
        assert_eq!(property_key("line-items"), r#""line-items""#);
        assert_eq!(property_key("1st"), r#""1st""#);
    }

    #[test]
    fn test_jsdoc() {
        let meta = FieldMetadata::with_description("Invoice number");
        assert_eq!(jsdoc(&meta, "  "), "  /** Invoice number */\n");

        let meta = FieldMetadata::with_description("Old").as_deprecated();
        assert_eq!(jsdoc(&meta, ""), "/**\n * Old\n * @deprecated\n */\n");

        assert_eq!(jsdoc(&FieldMetadata::default(), ""), "");
    }

    #[test]
    fn test_variant_definition_adds_discriminator() {
        let variant = UnionVariant::tagged(
            "card",
            ParamDefinition::object(vec![Field::new("last_four", ParamDefinition::string())]),
        );
        let def = variant_definition(Some("type"), &variant);
        let names: Vec<&str> = def.shape().unwrap().field_names().collect();
        assert_eq!(names, vec!["type", "last_four"]);
        assert!(matches!(def, Cow::Owned(_)));

        let by_ref = UnionVariant::tagged("card", ParamDefinition::reference("CardPayment"));
        assert!(matches!(variant_definition(Some("type"), &by_ref), Cow::Borrowed(_)));
        assert!(matches!(variant_definition(None, &variant), Cow::Borrowed(_)));
    }

    #[test]
    fn test_generator_for() {
        assert_eq!(generator_for("ts").map(|g| g.id()), Some("typescript"));
        assert_eq!(generator_for("zod").map(|g| g.file_extension()), Some("ts"));
        assert_eq!(generator_for("openapi").map(|g| g.file_extension()), Some("json"));
        assert!(generator_for("protobuf").is_none());
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry
            .register(
                TypeDef::new("A", ParamDefinition::object(vec![Field::new("x", ParamDefinition::string())])),
                &scope,
            )
            .unwrap();

        let config = GeneratorConfig::default().with_line_ending(LineEnding::CrLf);
        let out = generate_namespace(&TypeScriptGenerator::new(), &registry, &scope, &config).unwrap();
        assert!(out.contains("{\r\n  x: string;\r\n}"));
        assert!(!out.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_placeholder_fails_generation() {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry.reserve("Pending", &scope);

        let err = generate_namespace(
            &ZodGenerator::new(),
            &registry,
            &scope,
            &GeneratorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Configuration(ConfigurationError::UndefinedPlaceholder { .. })
        ));
    }
}
