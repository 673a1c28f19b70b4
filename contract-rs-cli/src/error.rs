//! Error types for the CLI.
//!
//! Every failure the binary can report, with enough context (paths,
//! namespaces, targets) to act on without a backtrace.

use std::path::PathBuf;

use contract_rs::{ConfigurationError, GeneratorError, PipelineError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error discovering or reading contract documents.
    #[error("Failed to load contracts: {0}")]
    Load(#[from] LoadError),

    /// Error building the registry or generating output.
    #[error("Failed to generate output: {0}")]
    Generate(#[from] GenerateError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error writing output files.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// The pipeline could not process a payload.
    #[error("Failed to process payload: {0}")]
    Pipeline(#[from] PipelineError),

    /// Generated files are stale, or a payload does not match its type.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation(_) => 2,
            _ => 1,
        }
    }
}

/// Error discovering or parsing contract documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("No contract documents found in: {path}")]
    NoContracts { path: PathBuf },

    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid contract document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Error from the directory walker.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Error building the registry or running a generator.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A contract declares something the registry rejects.
    #[error("Invalid contract for namespace '{namespace}': {source}")]
    Configuration {
        namespace: String,
        #[source]
        source: ConfigurationError,
    },

    /// A generator failed for one namespace.
    #[error("{target} generation failed for namespace '{namespace}': {source}")]
    Generator {
        target: String,
        namespace: String,
        #[source]
        source: GeneratorError,
    },

    #[error("Unknown generator target '{target}' (expected typescript, zod or openapi)")]
    UnknownTarget { target: String },

    #[error("Unknown namespace '{namespace}'")]
    UnknownNamespace { namespace: String },
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error writing output files.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn not_found(path: PathBuf) -> Self {
        Self::DirectoryNotFound { path }
    }

    pub fn no_contracts(path: PathBuf) -> Self {
        Self::NoContracts { path }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Validation("stale".into()).exit_code(), 2);
        assert_eq!(
            CliError::from(LoadError::not_found(PathBuf::from("contracts"))).exit_code(),
            1
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = GenerateError::UnknownTarget {
            target: "swift".into(),
        };
        assert!(err.to_string().contains("'swift'"));

        let err = CliError::from(ConfigError::invalid_value("naming.key_case", "unknown key case `x`"));
        assert_eq!(
            err.to_string(),
            "Failed to load configuration: Invalid configuration value for 'naming.key_case': unknown key case `x`"
        );
    }
}
