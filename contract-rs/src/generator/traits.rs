//! Code generator trait definition.
//!
//! Every target (TypeScript, Zod, OpenAPI) implements [`CodeGenerator`].
//! [`generate_namespace`](super::generate_namespace) drives the ordered
//! traversal and calls into the generator once per type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::pipeline::KeyCase;
use crate::registry::{OrderedType, ScopedRegistry};

/// Trait for contract code generators.
///
/// # Example
///
/// ```rust
/// use contract_rs::error::GeneratorError;
/// use contract_rs::generator::{
///     CodeGenerator, GeneratedCode, GenerationContext, GeneratorFeature,
/// };
/// use contract_rs::registry::OrderedType;
///
/// struct NamesOnly;
///
/// impl CodeGenerator for NamesOnly {
///     fn id(&self) -> &'static str { "names" }
///     fn name(&self) -> &'static str { "Type Name Lister" }
///     fn file_extension(&self) -> &'static str { "txt" }
///
///     fn generate(
///         &self,
///         ty: &OrderedType<'_>,
///         _ctx: &GenerationContext<'_>,
///     ) -> Result<GeneratedCode, GeneratorError> {
///         Ok(GeneratedCode::new(format!("{}\n", ty.name), &ty.name))
///     }
///
///     fn supports_feature(&self, _feature: GeneratorFeature) -> bool {
///         false
///     }
/// }
/// ```
pub trait CodeGenerator: Send + Sync {
    /// Short lowercase identifier (`"typescript"`, `"zod"`, `"openapi"`).
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Extension of generated files, without the dot.
    fn file_extension(&self) -> &'static str;

    /// Generate the declaration of one named type.
    fn generate(
        &self,
        ty: &OrderedType<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<GeneratedCode, GeneratorError>;

    /// Imports or header emitted once before all types.
    fn generate_preamble(
        &self,
        _types: &[OrderedType<'_>],
        _ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    /// Trailer emitted once after all types.
    fn generate_postamble(
        &self,
        _types: &[OrderedType<'_>],
        _ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    /// Join preamble, per-type output and postamble into one file.
    ///
    /// Text targets concatenate; document targets override this.
    fn assemble(
        &self,
        preamble: String,
        parts: Vec<GeneratedCode>,
        postamble: String,
        _ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        let mut out = preamble;
        let body: Vec<String> = parts.into_iter().map(|part| part.code).collect();
        out.push_str(&body.join("\n"));
        if !postamble.is_empty() {
            out.push('\n');
            out.push_str(&postamble);
        }
        Ok(out)
    }

    /// Check if this generator supports a specific feature.
    fn supports_feature(&self, feature: GeneratorFeature) -> bool;
}

/// State shared with a generator while it emits one type.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub config: &'a GeneratorConfig,
    /// Registry as seen from the namespace being generated
    pub view: ScopedRegistry<'a>,
    /// Names already emitted earlier in the file
    pub emitted: &'a BTreeSet<String>,
}

impl GenerationContext<'_> {
    pub fn is_emitted(&self, name: &str) -> bool {
        self.emitted.contains(name)
    }

    /// Whether `name` resolves to an object type.
    pub fn is_object(&self, name: &str) -> bool {
        self.view
            .resolve(name)
            .ok()
            .and_then(|def| self.view.deref(&def.definition).ok())
            .is_some_and(|(target, _)| target.shape().is_some())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Generator configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Case of field names in the output
    pub key_case: KeyCase,

    /// Locale recorded in generated headers
    pub locale: String,

    /// Declaration style
    pub output_style: OutputStyle,

    /// Whether to emit `z.infer` type aliases next to Zod schemas
    pub generate_types: bool,

    /// Whether to emit documentation (JSDoc, `.describe()`, `description`)
    pub generate_docs: bool,

    pub indent: IndentStyle,

    pub line_ending: LineEnding,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            key_case: KeyCase::Preserve,
            locale: "en".to_string(),
            output_style: OutputStyle::default(),
            generate_types: true,
            generate_docs: true,
            indent: IndentStyle::default(),
            line_ending: LineEnding::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    pub fn with_generate_types(mut self, generate: bool) -> Self {
        self.generate_types = generate;
        self
    }

    pub fn with_generate_docs(mut self, generate: bool) -> Self {
        self.generate_docs = generate;
        self
    }

    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn indent_str(&self) -> &'static str {
        self.indent.as_str()
    }

    /// The `export ` prefix, or nothing for plain declarations.
    pub fn export_prefix(&self) -> &'static str {
        if self.output_style.is_exported() {
            "export "
        } else {
            ""
        }
    }
}

/// How declarations are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStyle {
    /// `export const InvoiceSchema = ...`
    #[default]
    ConstExport,

    /// `const InvoiceSchema = ...`
    Declaration,
}

impl OutputStyle {
    pub fn is_exported(&self) -> bool {
        matches!(self, OutputStyle::ConstExport)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentStyle {
    #[default]
    Spaces2,
    Spaces4,
    Tabs,
}

impl IndentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
            IndentStyle::Tabs => "\t",
        }
    }

    /// Indentation for the given depth.
    pub fn indent(&self, depth: usize) -> String {
        self.as_str().repeat(depth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Output for one named type.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    /// Emitted text
    pub code: String,

    /// Registry name (e.g. "Invoice")
    pub type_name: String,

    /// Target identifier (e.g. "InvoiceSchema")
    pub schema_name: String,

    /// Names this output refers to
    pub dependencies: Vec<String>,
}

impl GeneratedCode {
    pub fn new(code: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            code: code.into(),
            schema_name: type_name.clone(),
            type_name,
            dependencies: Vec::new(),
        }
    }

    pub fn with_schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = name.into();
        self
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = String>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

/// Capabilities a generator may or may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorFeature {
    /// Circular/recursive type references
    CircularReferences,

    /// Discriminated unions
    DiscriminatedUnions,

    /// Deferred references for recursion
    Lazy,

    /// Rejects undeclared keys
    StrictMode,

    /// Runtime bound and format checks
    RuntimeValidation,

    /// Default values
    DefaultValues,

    /// Descriptions
    Descriptions,

    /// Deprecation markers
    Deprecation,

    /// Examples
    Examples,
}

impl GeneratorFeature {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorFeature::CircularReferences => "Circular References",
            GeneratorFeature::DiscriminatedUnions => "Discriminated Unions",
            GeneratorFeature::Lazy => "Lazy Evaluation",
            GeneratorFeature::StrictMode => "Strict Mode",
            GeneratorFeature::RuntimeValidation => "Runtime Validation",
            GeneratorFeature::DefaultValues => "Default Values",
            GeneratorFeature::Descriptions => "Descriptions",
            GeneratorFeature::Deprecation => "Deprecation",
            GeneratorFeature::Examples => "Examples",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output_style, OutputStyle::ConstExport);
        assert!(config.generate_types);
        assert!(config.generate_docs);
        assert_eq!(config.key_case, KeyCase::Preserve);
        assert_eq!(config.locale, "en");
        assert_eq!(config.export_prefix(), "export ");
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_output_style(OutputStyle::Declaration)
            .with_generate_types(false)
            .with_indent(IndentStyle::Spaces4)
            .with_key_case(KeyCase::Camel);

        assert_eq!(config.export_prefix(), "");
        assert!(!config.generate_types);
        assert_eq!(config.indent_str(), "    ");
        assert_eq!(config.key_case, KeyCase::Camel);
    }

    #[test]
    fn test_generator_config_deserialize_partial() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "key_case": "camel", "indent": "tabs" }"#).unwrap();
        assert_eq!(config.key_case, KeyCase::Camel);
        assert_eq!(config.indent, IndentStyle::Tabs);
        assert!(config.generate_docs);
    }

    #[test]
    fn test_indent_style() {
        assert_eq!(IndentStyle::Spaces2.indent(2), "    ");
        assert_eq!(IndentStyle::Tabs.indent(1), "\t");
    }

    #[test]
    fn test_line_ending() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
    }

    #[test]
    fn test_generated_code() {
        let code = GeneratedCode::new("z.object({})", "User").with_schema_name("UserSchema");
        assert_eq!(code.type_name, "User");
        assert_eq!(code.schema_name, "UserSchema");
        assert!(!code.has_dependencies());

        let code = code.with_dependencies(vec!["Address".to_string()]);
        assert_eq!(code.dependencies, vec!["Address"]);
    }
}
