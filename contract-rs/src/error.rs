//! Error types for contract loading, generation and request processing.
//!
//! Three families of failure are kept apart:
//!
//! - [`ConfigurationError`]: a load-time defect in type or resource
//!   declarations. Whether it aborts is governed by the process-wide
//!   [`ErrorPolicy`].
//! - [`Issue`](crate::issue::Issue)s: expected per-field validation outcomes.
//!   They are aggregated into an [`IssueCollection`] and never raised one by one.
//! - [`SerializationError`]: an unexpected failure producing output for a
//!   record. Surfaced as one generic error, distinct from field issues.
//!
//! # Example
//! ```rust
//! use contract_rs::error::{ConfigurationError, ErrorPolicy};
//!
//! let err = ConfigurationError::UnknownType {
//!     name: "Ghost".to_string(),
//!     scope: "global".to_string(),
//! };
//! assert!(ErrorPolicy::Raise.apply(err).is_err());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::issue::IssueCollection;

// =============================================================================
// Configuration errors
// =============================================================================

/// Load-time defect in type, resource or namespace declarations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A name could not be resolved in the given scope chain.
    #[error("Unknown type `{name}` in scope {scope}")]
    UnknownType { name: String, scope: String },

    /// A name was registered twice with different definitions.
    #[error("Conflicting redefinition of `{name}` in scope {scope}")]
    ConflictingDefinition { name: String, scope: String },

    /// A definition violates the model invariants.
    #[error("Invalid definition for `{name}`: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// A placeholder was reserved but never populated.
    #[error("Type `{name}` was reserved in scope {scope} but never defined")]
    UndefinedPlaceholder { name: String, scope: String },

    /// An association's target type could not be determined.
    #[error("Cannot resolve target of association `{association}` on resource `{resource}`")]
    UnresolvableAssociation {
        resource: String,
        association: String,
    },

    /// A writable association points to a resource that does not accept nested writes.
    #[error(
        "Association `{association}` on `{resource}` is writable but `{target}` does not accept nested writes"
    )]
    NestedWritesUnsupported {
        resource: String,
        association: String,
        target: String,
    },

    /// A decode/encode transformer name is not registered.
    #[error("Unknown transformer `{name}`")]
    UnknownTransformer { name: String },
}

// =============================================================================
// Error policy
// =============================================================================

/// How configuration errors are handled.
///
/// One process-wide switch: `Raise` in CI, `Log` or `Silent` where a
/// declaration mistake must not crash boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the error to the caller
    #[default]
    Raise,
    /// Log the error at `warn` and continue
    Log,
    /// Drop the error and continue
    Silent,
}

static POLICY: AtomicU8 = AtomicU8::new(0);

impl ErrorPolicy {
    fn to_u8(self) -> u8 {
        match self {
            Self::Raise => 0,
            Self::Log => 1,
            Self::Silent => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Log,
            2 => Self::Silent,
            _ => Self::Raise,
        }
    }

    /// The current process-wide policy.
    pub fn current() -> Self {
        Self::from_u8(POLICY.load(Ordering::Relaxed))
    }

    /// Set the process-wide policy. Intended for boot and tests.
    pub fn set(policy: ErrorPolicy) {
        POLICY.store(policy.to_u8(), Ordering::Relaxed);
    }

    /// Handle an error under the current process-wide policy.
    pub fn handle(err: ConfigurationError) -> Result<(), ConfigurationError> {
        Self::current().apply(err)
    }

    /// Handle an error under this policy.
    pub fn apply(self, err: ConfigurationError) -> Result<(), ConfigurationError> {
        match self {
            Self::Raise => Err(err),
            Self::Log => {
                warn!(error = %err, "Configuration error ignored by policy");
                Ok(())
            }
            Self::Silent => Ok(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raise => "raise",
            Self::Log => "log",
            Self::Silent => "silent",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Serialization errors
// =============================================================================

/// Unexpected failure producing output for one record.
///
/// Signals a mapping bug rather than bad user input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to serialize {record}: {message}")]
pub struct SerializationError {
    /// Type name of the record being serialized
    pub record: String,
    /// Underlying failure
    pub message: String,
}

impl SerializationError {
    pub fn new(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Generator errors
// =============================================================================

/// Failure while emitting code for a namespace.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A type could not be resolved while generating.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Formatting into the output buffer failed.
    #[error("Failed to format output for `{schema}`: {source}")]
    Format {
        schema: String,
        #[source]
        source: fmt::Error,
    },

    /// Document serialization failed.
    #[error("Failed to render document: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline errors
// =============================================================================

/// Failure returned by the transformation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Inbound validation failed; the caller renders the collection (4xx).
    #[error("Request is invalid: {0}")]
    Invalid(IssueCollection),

    /// Producing output failed unexpectedly (5xx).
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The namespace or a type is misconfigured (5xx).
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl PipelineError {
    /// HTTP-like status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Invalid(_) => 400,
            Self::Serialization(_) | Self::Configuration(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// The issue collection, if this is a validation failure.
    pub fn issues(&self) -> Option<&IssueCollection> {
        match self {
            Self::Invalid(issues) => Some(issues),
            _ => None,
        }
    }
}

/// Result alias for configuration-time operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssueCode};

    fn unknown() -> ConfigurationError {
        ConfigurationError::UnknownType {
            name: "Ghost".to_string(),
            scope: "global".to_string(),
        }
    }

    #[test]
    fn test_policy_apply() {
        assert!(ErrorPolicy::Raise.apply(unknown()).is_err());
        assert!(ErrorPolicy::Log.apply(unknown()).is_ok());
        assert!(ErrorPolicy::Silent.apply(unknown()).is_ok());
    }

    #[test]
    fn test_policy_encoding() {
        for policy in [ErrorPolicy::Raise, ErrorPolicy::Log, ErrorPolicy::Silent] {
            assert_eq!(ErrorPolicy::from_u8(policy.to_u8()), policy);
        }
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Raise);
    }

    #[test]
    fn test_policy_serde() {
        let policy: ErrorPolicy = serde_json::from_str(r#""log""#).unwrap();
        assert_eq!(policy, ErrorPolicy::Log);
        assert_eq!(policy.to_string(), "log");
    }

    #[test]
    fn test_configuration_error_display() {
        assert_eq!(
            unknown().to_string(),
            "Unknown type `Ghost` in scope global"
        );
    }

    #[test]
    fn test_pipeline_error_status() {
        let invalid = PipelineError::Invalid(IssueCollection::from(vec![Issue::new(
            IssueCode::Required,
            vec!["number".into()],
        )]));
        assert_eq!(invalid.status_code(), 400);
        assert!(invalid.is_client_error());
        assert_eq!(invalid.issues().map(|c| c.len()), Some(1));

        let failed = PipelineError::from(SerializationError::new("Invoice", "boom"));
        assert_eq!(failed.status_code(), 500);
        assert!(!failed.is_client_error());
        assert!(failed.issues().is_none());
    }
}
