//! Policy errors.

use custodian_core::CoreError;
use thiserror::Error;

/// Result of policy authoring
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while authoring a policy against its schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Field not declared by the descriptor
    #[error("Field '{field}' not found in '{dtd}'.")]
    FieldNotFound { field: String, dtd: String },

    /// Subfield declared under a field that is not an entity
    #[error("Trying to lookup field '{field}' in a non-entity type.")]
    NonEntityLookup { field: String },
}

/// A policy set that fails structural conformance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformanceError {
    /// One or more policies are malformed
    #[error("{0}")]
    MalformedPolicySet(String),
}

impl From<PolicyError> for CoreError {
    fn from(err: PolicyError) -> Self {
        CoreError::Validation {
            field: "policy".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<ConformanceError> for CoreError {
    fn from(err: ConformanceError) -> Self {
        CoreError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
