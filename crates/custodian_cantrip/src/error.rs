//! Cantrip errors.

use custodian_core::CoreError;
use custodian_optics::{OpticsError, ThrownError};
use custodian_schema::SchemaError;
use thiserror::Error;

/// Result of building or applying a cantrip
pub type CantripResult<T> = Result<T, CantripError>;

/// Errors raised while building or applying cantrips
#[derive(Debug, Clone, Error)]
pub enum CantripError {
    /// No operation with this name accepts the field type
    #[error("No Operation found with name: {name} for type: {type_name}")]
    OperationNotFound { name: String, type_name: String },

    /// The field's traversal could not be composed
    #[error(transparent)]
    Optics(#[from] OpticsError),

    /// The field could not be resolved in the schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An operation failed while transforming a value
    #[error("Operation failed: {0}")]
    Thrown(ThrownError),
}

impl From<CantripError> for CoreError {
    fn from(err: CantripError) -> Self {
        match err {
            CantripError::OperationNotFound { name, type_name } => CoreError::NotFound {
                kind: "Operation".to_string(),
                id: format!("{name} for type: {type_name}"),
            },
            CantripError::Optics(inner) => inner.into(),
            CantripError::Schema(inner) => inner.into(),
            CantripError::Thrown(inner) => CoreError::Internal {
                message: inner.to_string(),
            },
        }
    }
}
