//! Registry population and output generation.
//!
//! Contract documents are registered into one [`TypeRegistry`], one API
//! scope per namespace, and every configured generator is run over every
//! namespace. The same registry backs payload validation, so generated
//! clients and server-side checks always agree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use contract_rs::generator::{generate_namespace, generator_for, CodeGenerator};
use contract_rs::ir::{ParamDefinition, TypeDef};
use contract_rs::pipeline::{Direction, NamespaceConfig, PipelineOutcome};
use contract_rs::registry::Scope;
use contract_rs::resource::ResourceCatalog;
use contract_rs::{ConfigurationError, KeyCase, OpenApiGenerator, Pipeline, TypeRegistry};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CliResult, GenerateError};
use crate::loader::LoadedContract;

/// Registry built from a set of contract documents.
#[derive(Debug, Clone)]
pub struct ContractSet {
    pub registry: TypeRegistry,

    /// Namespaces seen, with their key case override if any
    pub namespaces: BTreeMap<String, Option<KeyCase>>,
}

impl ContractSet {
    /// Key case used on the wire for `namespace`.
    pub fn key_case(&self, namespace: &str, fallback: KeyCase) -> KeyCase {
        self.namespaces
            .get(namespace)
            .copied()
            .flatten()
            .unwrap_or(fallback)
    }

    /// Pipeline configuration for `namespace`.
    pub fn namespace_config(&self, namespace: &str, config: &Config) -> CliResult<NamespaceConfig> {
        if !self.namespaces.contains_key(namespace) {
            return Err(GenerateError::UnknownNamespace {
                namespace: namespace.to_string(),
            }
            .into());
        }
        Ok(NamespaceConfig::new(namespace)
            .with_key_case(self.key_case(namespace, config.naming.key_case))
            .with_locale(config.naming.locale.clone()))
    }

    /// Run `payload` through the inbound pipeline as an instance of `type_name`.
    pub fn validate_payload(
        &self,
        config: &Config,
        namespace: &str,
        type_name: &str,
        direction: Direction,
        payload: Value,
    ) -> CliResult<PipelineOutcome> {
        let namespace_config = self.namespace_config(namespace, config)?;
        let scope = Scope::api(namespace);
        if !self.registry.exists(type_name, &scope) {
            return Err(configuration(
                namespace,
                ConfigurationError::UnknownType {
                    name: type_name.to_string(),
                    scope: scope.to_string(),
                },
            )
            .into());
        }

        let def = ParamDefinition::reference(type_name);
        let pipeline = Pipeline::new(&self.registry, &scope, namespace_config);
        Ok(pipeline.process(direction, payload, &def)?)
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,

    pub namespace: String,

    /// Generator id.
    pub target: String,

    pub content: String,
}

/// Generated output for all namespaces and targets.
#[derive(Debug, Clone, Default)]
pub struct GeneratedOutput {
    pub files: Vec<GeneratedFile>,
}

/// How a generated file differs from what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    Missing(PathBuf),
    Changed(PathBuf),
}

impl Drift {
    pub fn path(&self) -> &Path {
        match self {
            Drift::Missing(path) | Drift::Changed(path) => path,
        }
    }
}

/// Builds registries from contract documents and runs the generators.
pub struct ContractGenerator {
    config: Config,
}

impl ContractGenerator {
    /// Create a new generator with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the types and resources of every document.
    ///
    /// Documents sharing a namespace are merged; their resources form one
    /// catalog so associations may cross files.
    pub fn build(&self, contracts: &[LoadedContract]) -> CliResult<ContractSet> {
        let mut registry = TypeRegistry::new().with_policy(self.config.input.error_policy);
        let mut namespaces: BTreeMap<String, Option<KeyCase>> = BTreeMap::new();
        let mut catalogs: BTreeMap<String, ResourceCatalog> = BTreeMap::new();

        for contract in contracts {
            let document = &contract.document;
            let namespace = &document.namespace;
            let scope = Scope::api(namespace);

            let known = namespaces.entry(namespace.clone()).or_insert(None);
            match (*known, document.key_case) {
                (None, case) => *known = case,
                (Some(existing), Some(case)) if existing != case => warn!(
                    namespace = %namespace,
                    path = %contract.relative_path.display(),
                    "Conflicting key case for namespace, keeping the first"
                ),
                _ => {}
            }

            for (name, definition) in &document.types {
                registry
                    .register(TypeDef::new(name, definition.clone()), &scope)
                    .map_err(|source| configuration(namespace, source))?;
            }

            let catalog = catalogs.entry(namespace.clone()).or_default();
            for resource in &document.resources {
                catalog.insert(resource.clone());
            }
        }

        for (namespace, catalog) in &catalogs {
            catalog
                .register_all(&mut registry, &Scope::api(namespace))
                .map_err(|source| configuration(namespace, source))?;
        }

        for namespace in namespaces.keys() {
            for (name, missing) in registry.unresolved_references(&Scope::api(namespace)) {
                registry
                    .policy()
                    .apply(ConfigurationError::UnknownType {
                        name: missing,
                        scope: format!("api:{namespace} (referenced by {name})"),
                    })
                    .map_err(|source| configuration(namespace, source))?;
            }
        }

        debug!(
            namespaces = namespaces.len(),
            types = registry.len(),
            "Built contract registry"
        );
        Ok(ContractSet {
            registry,
            namespaces,
        })
    }

    /// Resolve a configured target id to a generator.
    pub fn generator(&self, target: &str) -> CliResult<Box<dyn CodeGenerator>> {
        if target == "openapi" {
            return Ok(Box::new(
                OpenApiGenerator::new().with_api_version(self.config.generators.api_version.clone()),
            ));
        }
        generator_for(target).ok_or_else(|| {
            GenerateError::UnknownTarget {
                target: target.to_string(),
            }
            .into()
        })
    }

    /// Run every configured generator over every namespace.
    pub fn generate(&self, set: &ContractSet) -> CliResult<GeneratedOutput> {
        let mut files = Vec::new();

        for target in &self.config.generators.targets {
            let generator = self.generator(target)?;
            for namespace in set.namespaces.keys() {
                let config = self
                    .config
                    .generator_config()
                    .with_key_case(set.key_case(namespace, self.config.naming.key_case));
                let content =
                    generate_namespace(generator.as_ref(), &set.registry, &Scope::api(namespace), &config)
                        .map_err(|source| GenerateError::Generator {
                            target: generator.id().to_string(),
                            namespace: namespace.clone(),
                            source,
                        })?;

                files.push(GeneratedFile {
                    path: output_file_name(namespace, generator.as_ref()),
                    namespace: namespace.clone(),
                    target: generator.id().to_string(),
                    content,
                });
            }
        }

        Ok(GeneratedOutput { files })
    }

    /// Compare generated files against the contents of `dir`.
    pub fn check(&self, output: &GeneratedOutput, dir: &Path) -> CliResult<Vec<Drift>> {
        let mut drift = Vec::new();
        for file in &output.files {
            let path = dir.join(&file.path);
            if !path.exists() {
                drift.push(Drift::Missing(file.path.clone()));
                continue;
            }
            let existing = std::fs::read_to_string(&path)?;
            if existing != file.content {
                drift.push(Drift::Changed(file.path.clone()));
            }
        }
        Ok(drift)
    }
}

/// `{namespace}.{generator id}.{extension}`, e.g. `billing.zod.ts`.
pub fn output_file_name(namespace: &str, generator: &dyn CodeGenerator) -> PathBuf {
    PathBuf::from(format!(
        "{namespace}.{}.{}",
        generator.id(),
        generator.file_extension()
    ))
}

fn configuration(namespace: &str, source: ConfigurationError) -> GenerateError {
    GenerateError::Configuration {
        namespace: namespace.to_string(),
        source,
    }
}
