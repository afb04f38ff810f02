//! CUSTODIAN Policy Engine and Runtime
//!
//! This crate decides whether a processor may open a connection to a
//! governed data type, and what redaction applies to the data it reads.
//!
//! - [`ChroniclePolicyEngine`] checks a read request against a policy and
//!   every write connection against the policy set
//! - [`ChronicleContext`] is the immutable snapshot of providers, processor
//!   nodes, policies and ambient context those checks run against
//! - [`Custodian`] is the runtime facade that validates requests and hands
//!   out [`ConnectionGrant`]s carrying the cantrip for the requester

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod context;
pub mod engine;
pub mod error;
pub mod retention;
pub mod runtime;

pub use config::{CustodianConfig, PolicyMode};
pub use connection::{
    ConnectionName, ConnectionProvider, ConnectionRequest, DeclaredProcessorNode,
    ManagedDataType, ProcessorNode, SandboxProcessorNode, same_node,
};
pub use context::ChronicleContext;
pub use engine::{ChroniclePolicyEngine, PolicyEngine};
pub use error::{ContextError, CustodianError, CustodianResult};
pub use retention::{strategy_complies, verify_management_strategies};
pub use runtime::{ConnectionGrant, Custodian};
