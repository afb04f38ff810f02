//! Schema errors.

use custodian_core::CoreError;
use thiserror::Error;

/// Result of schema lookups and construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Configuration errors raised while building or querying schemas
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No descriptor registered under the name
    #[error("DataTypeDescriptor not found: {name}")]
    DtdNotFound { name: String },

    /// Field not declared by the descriptor
    #[error("Field \"{field}\" not found in {dtd}")]
    FieldNotFound { dtd: String, field: String },

    /// Field lookups need at least one selector
    #[error("Access path into {dtd} is empty")]
    EmptyAccessPath { dtd: String },

    /// Field is not an entity, yet deeper selectors were requested
    #[error("Field \"{field}\" of {dtd} has no associated DataTypeDescriptor")]
    NoAssociatedDtd { dtd: String, field: String },

    /// Two distinct descriptors share a name
    #[error("DataTypeDescriptor {name} must be unique.")]
    DuplicateDescriptor { name: String },

    /// `Nested`/`Reference` field names a descriptor outside the set
    #[error("Field \"{field}\" of {dtd} references unknown DataTypeDescriptor {target}")]
    UnresolvedReference {
        dtd: String,
        field: String,
        target: String,
    },

    /// Field type has no runtime type tag
    #[error("Field type {field_type} has no runtime type")]
    UnsupportedFieldType { field_type: String },
}

impl From<SchemaError> for CoreError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::DtdNotFound { name } => CoreError::NotFound {
                kind: "DataTypeDescriptor".to_string(),
                id: name,
            },
            SchemaError::DuplicateDescriptor { name } => CoreError::AlreadyExists {
                kind: "DataTypeDescriptor".to_string(),
                id: name,
            },
            other => CoreError::Validation {
                field: "schema".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
