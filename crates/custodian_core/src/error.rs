//! Core error types for CUSTODIAN.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Validation error
    Validation { field: String, reason: String },

    /// Not found
    NotFound { kind: String, id: String },

    /// Already exists
    AlreadyExists { kind: String, id: String },

    /// Runtime type tags disagree
    TypeMismatch { expected: String, actual: String },

    /// Configuration could not be parsed or is inconsistent
    InvalidConfig { reason: String },

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::AlreadyExists { kind, id } => write!(f, "{} already exists: {}", kind, id),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            Self::InvalidConfig { reason } => write!(f, "Invalid configuration: {}", reason),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotFound {
            kind: "DataTypeDescriptor".to_string(),
            id: "Person".to_string(),
        };
        assert_eq!(format!("{}", err), "DataTypeDescriptor not found: Person");

        let err = CoreError::TypeMismatch {
            expected: "String".to_string(),
            actual: "Integer".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Type mismatch: expected String, got Integer"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: CoreError = parse.unwrap_err().into();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::Internal {
            message: "x".to_string(),
        };
        let err2 = CoreError::Internal {
            message: "x".to_string(),
        };
        assert_eq!(err1, err2);
    }
}
