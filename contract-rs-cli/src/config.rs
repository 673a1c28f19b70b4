//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `contract-rs.toml` files
//! and merging with command-line arguments.

use std::path::{Path, PathBuf};

use contract_rs::generator::{generator_for, IndentStyle, LineEnding, OutputStyle};
use contract_rs::{ErrorPolicy, GeneratorConfig, KeyCase};
use serde::Deserialize;

use crate::error::{CliResult, ConfigError};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "contract-rs.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub naming: NamingConfig,
    pub generators: GeneratorsConfig,
}

/// Where contract documents come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory searched for `*.json` contract documents.
    pub dir: PathBuf,

    /// Glob over paths relative to `dir`.
    pub filter: Option<String>,

    /// What to do with declaration mistakes found while loading.
    pub error_policy: ErrorPolicy,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for generated files.
    pub dir: PathBuf,

    pub style: OutputStyle,

    pub indent: IndentStyle,

    pub line_ending: LineEnding,

    /// Whether to generate `z.infer` type exports.
    pub generate_types: bool,

    /// Whether to generate JSDoc, `.describe()` and descriptions.
    pub generate_docs: bool,
}

/// Naming convention configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Case of field names on the wire and in generated output.
    pub key_case: KeyCase,

    /// Locale recorded in generated headers.
    pub locale: String,
}

/// Generator selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorsConfig {
    /// Generator ids: `typescript`, `zod`, `openapi`.
    pub targets: Vec<String>,

    /// `info.version` of generated OpenAPI documents.
    pub api_version: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./contracts"),
            filter: None,
            error_policy: ErrorPolicy::Raise,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./generated"),
            style: OutputStyle::ConstExport,
            indent: IndentStyle::Spaces2,
            line_ending: LineEnding::Lf,
            generate_types: true,
            generate_docs: true,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            key_case: KeyCase::Camel,
            locale: "en".to_string(),
        }
    }
}

impl Default for GeneratorsConfig {
    fn default() -> Self {
        Self {
            targets: vec!["typescript".into(), "zod".into(), "openapi".into()],
            api_version: "1.0.0".to_string(),
        }
    }
}

impl Config {
    /// Library generator options for this configuration.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_key_case(self.naming.key_case)
            .with_locale(self.naming.locale.clone())
            .with_output_style(self.output.style)
            .with_indent(self.output.indent)
            .with_line_ending(self.output.line_ending)
            .with_generate_types(self.output.generate_types)
            .with_generate_docs(self.output.generate_docs)
    }

    /// Reject targets no generator answers to.
    pub fn validate(&self) -> CliResult<()> {
        if self.generators.targets.is_empty() {
            return Err(ConfigError::invalid_value("generators.targets", "no targets selected").into());
        }
        for target in &self.generators.targets {
            if generator_for(target).is_none() {
                return Err(ConfigError::invalid_value(
                    "generators.targets",
                    format!("unknown target `{target}`"),
                )
                .into());
            }
        }
        Ok(())
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path, e.to_string()))?;

        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref input) = args.input {
            config.input.dir = input.clone();
        }

        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        if let Some(ref target) = args.target {
            config.generators.targets = vec![target.clone()];
        }

        if let Some(key_case) = args.key_case {
            config.naming.key_case = key_case;
        }

        if let Some(generate_types) = args.generate_types {
            config.output.generate_types = generate_types;
        }

        if let Some(generate_docs) = args.generate_docs {
            config.output.generate_docs = generate_docs;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# contract-rs configuration file

[input]
# Directory containing contract documents (*.json)
dir = "./contracts"

# Only load documents whose relative path matches this glob
# filter = "billing/*.json"

# Declaration mistakes: "raise" fails the run, "log" warns, "silent" ignores
error_policy = "raise"

[output]
# Output directory for generated files
dir = "./generated"

# "const_export" (export const X = ...) or "declaration" (const X = ...)
style = "const_export"

# "spaces2", "spaces4" or "tabs"
indent = "spaces2"

# "lf" or "cr_lf"
line_ending = "lf"

# Whether to generate type inference exports (export type X = z.infer<typeof XSchema>)
generate_types = true

# Whether to generate JSDoc comments, .describe() calls and OpenAPI descriptions
generate_docs = true

[naming]
# Case of field names on the wire: "preserve", "camel", "snake" or "kebab"
key_case = "camel"

# Locale recorded in generated file headers
locale = "en"

[generators]
# Any of "typescript", "zod", "openapi"
targets = ["typescript", "zod", "openapi"]

# info.version of generated OpenAPI documents
api_version = "1.0.0"
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Contract directory override.
    pub input: Option<PathBuf>,

    /// Output directory override.
    pub output: Option<PathBuf>,

    /// Single target override.
    pub target: Option<String>,

    /// Key case override.
    pub key_case: Option<KeyCase>,

    /// Generate types override.
    pub generate_types: Option<bool>,

    /// Generate docs override.
    pub generate_docs: Option<bool>,
}
