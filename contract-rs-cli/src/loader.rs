//! Contract document discovery and loading.
//!
//! Contract documents are JSON files declaring the named types and
//! resources of one namespace. This module recursively scans a directory
//! for them, respecting `.gitignore` patterns and an optional glob filter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use contract_rs::ir::ParamDefinition;
use contract_rs::resource::ResourceDefinition;
use contract_rs::KeyCase;
use ignore::WalkBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult, LoadError};

/// One contract document as authored.
///
/// ```json
/// {
///   "namespace": "billing",
///   "types": { "Money": { "type": "decimal", "min": 0 } },
///   "resources": [{ "name": "Invoice", "attributes": [...] }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContractDocument {
    /// API namespace the declarations are registered under
    pub namespace: String,

    /// Wire key case for this namespace, overriding the configured one
    #[serde(default)]
    pub key_case: Option<KeyCase>,

    #[serde(default)]
    pub types: BTreeMap<String, ParamDefinition>,

    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

/// A contract document together with where it was found.
#[derive(Debug, Clone)]
pub struct LoadedContract {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// Path relative to the scan root.
    pub relative_path: PathBuf,

    pub document: ContractDocument,
}

/// Scanner for discovering contract documents.
#[derive(Debug)]
pub struct ContractLoader {
    /// Root directory to scan.
    root: PathBuf,

    /// Optional glob filter pattern.
    filter: Option<glob::Pattern>,
}

impl ContractLoader {
    /// Create a new loader for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: None,
        }
    }

    /// Only load documents whose relative path matches `pattern`.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, LoadError> {
        let glob_pattern = glob::Pattern::new(pattern)
            .map_err(|e| LoadError::invalid_pattern(pattern, e.to_string()))?;
        self.filter = Some(glob_pattern);
        Ok(self)
    }

    /// Load every contract document under the root, sorted by relative path.
    pub fn load(&self) -> CliResult<Vec<LoadedContract>> {
        if !self.root.exists() {
            return Err(LoadError::not_found(self.root.clone()).into());
        }

        let walker = WalkBuilder::new(&self.root)
            .git_ignore(true)
            .hidden(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut contracts = Vec::new();
        for entry in walker {
            let entry = entry.map_err(LoadError::Walk)?;
            let path = entry.path();

            if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            let relative_path = self.relative_path(path);
            if let Some(ref pattern) = self.filter {
                if !pattern.matches_path(&relative_path) {
                    continue;
                }
            }

            let document = read_document(path)?;
            debug!(
                path = %relative_path.display(),
                namespace = %document.namespace,
                types = document.types.len(),
                resources = document.resources.len(),
                "Loaded contract document"
            );
            contracts.push(LoadedContract {
                path: path.to_path_buf(),
                relative_path,
                document,
            });
        }

        if contracts.is_empty() {
            return Err(LoadError::no_contracts(self.root.clone()).into());
        }

        Ok(contracts)
    }

    /// Load without failing on an empty directory.
    pub fn load_allow_empty(&self) -> CliResult<Vec<LoadedContract>> {
        match self.load() {
            Ok(contracts) => Ok(contracts),
            Err(CliError::Load(LoadError::NoContracts { .. })) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Parse one contract document.
pub fn read_document(path: &Path) -> Result<ContractDocument, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| LoadError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
