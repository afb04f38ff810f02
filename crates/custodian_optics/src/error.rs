//! Optics errors.

use custodian_core::CoreError;
use custodian_schema::SchemaError;
use thiserror::Error;

/// Result of optic composition
pub type OpticsResult<T> = Result<T, OpticsError>;

/// Configuration errors raised while composing optics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpticsError {
    /// Outer focus type does not accept the inner optic's entity type
    #[error("{outer} cannot compose with {inner}: expected {expected}, found {found}")]
    CompositionMismatch {
        outer: String,
        inner: String,
        expected: String,
        found: String,
    },

    /// No lens registered for a single-selector path
    #[error("{path} has no associated optic.")]
    LensNotFound { path: String },

    /// Composed traversal does not have the requested runtime types
    #[error(
        "Could not compose a traversal for {path} with an {role} of {requested} (composed: {actual})."
    )]
    TypeMismatch {
        path: String,
        role: &'static str,
        requested: String,
        actual: String,
    },

    /// Descriptor or field lookup failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<OpticsError> for CoreError {
    fn from(err: OpticsError) -> Self {
        match err {
            OpticsError::Schema(inner) => inner.into(),
            OpticsError::CompositionMismatch { expected, found, .. } => CoreError::TypeMismatch {
                expected,
                actual: found,
            },
            OpticsError::TypeMismatch {
                requested, actual, ..
            } => CoreError::TypeMismatch {
                expected: requested,
                actual,
            },
            OpticsError::LensNotFound { path } => CoreError::NotFound {
                kind: "Lens".to_string(),
                id: path,
            },
        }
    }
}
