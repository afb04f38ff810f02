//! Engine and runtime errors.

use custodian_cantrip::CantripError;
use custodian_core::CoreError;
use custodian_policy::ConformanceError;
use thiserror::Error;

/// Result of a runtime operation
pub type CustodianResult<T> = Result<T, CustodianError>;

/// Errors raised while assembling a [`ChronicleContext`](crate::ChronicleContext)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Two providers serve the same connection
    #[error("Connection {connection} is provided by both {first} and {second}")]
    ConnectionAmbiguity {
        connection: String,
        first: String,
        second: String,
    },
}

/// Errors surfaced by the [`Custodian`](crate::Custodian) runtime
#[derive(Debug, Clone, Error)]
pub enum CustodianError {
    /// The requester did not declare the connection it asked for
    #[error("Connection {connection} is not declared as required by {requester}")]
    ConnectionNotDeclared {
        connection: String,
        requester: String,
    },

    /// No provider serves the connection
    #[error("No connection provider found for {connection}")]
    ConnectionProviderNotFound { connection: String },

    /// The request carries a policy the runtime does not know
    #[error("Policy {name} is not part of the policy set")]
    PolicyNotFound { name: String },

    /// A read request carries no policy
    #[error("Read request for {connection} must carry a policy")]
    MissingReadPolicy { connection: String },

    /// The policy engine rejected the request or the write connections
    #[error("Policy violation: {message}")]
    PolicyViolation { message: String },

    /// The cantrip for the grant could not be built
    #[error(transparent)]
    Cantrip(#[from] CantripError),

    /// The policy set is malformed
    #[error(transparent)]
    Conformance(#[from] ConformanceError),

    /// The runtime context is inconsistent
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<ContextError> for CoreError {
    fn from(err: ContextError) -> Self {
        CoreError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

impl From<CustodianError> for CoreError {
    fn from(err: CustodianError) -> Self {
        match err {
            CustodianError::ConnectionNotDeclared { .. }
            | CustodianError::MissingReadPolicy { .. }
            | CustodianError::PolicyViolation { .. } => CoreError::Validation {
                field: "connection request".to_string(),
                reason: err.to_string(),
            },
            CustodianError::ConnectionProviderNotFound { connection } => CoreError::NotFound {
                kind: "ConnectionProvider".to_string(),
                id: connection,
            },
            CustodianError::PolicyNotFound { name } => CoreError::NotFound {
                kind: "Policy".to_string(),
                id: name,
            },
            CustodianError::Cantrip(inner) => inner.into(),
            CustodianError::Conformance(inner) => inner.into(),
            CustodianError::Context(inner) => inner.into(),
        }
    }
}
