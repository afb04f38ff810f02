//! CUSTODIAN Core Types
//!
//! This crate contains pure types with no I/O: the shared error taxonomy,
//! explicit runtime type tags, durations, and the dynamic [`Value`] model
//! that governed entities are represented with at runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod tag;
pub mod time;
pub mod value;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use tag::TypeTag;
pub use time::Duration;
pub use value::{Record, Value};
