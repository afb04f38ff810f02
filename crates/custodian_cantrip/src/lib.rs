//! CUSTODIAN Cantrips
//!
//! Named value transforms ([`Operation`]) and the pipelines that apply them
//! to the fields a policy marks for redaction ([`Cantrip`]).
//!
//! A [`CantripFactory`] turns a policy target's conditional usages into a
//! [`MultiCantrip`] of [`OpticalCantrip`]s, each pairing a composed
//! traversal with an operation from the [`OperationLibrary`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod cantrip;
pub mod empties;
pub mod error;
pub mod factory;
pub mod library;
pub mod operation;

pub use cache::CantripCache;
pub use cantrip::{Cantrip, MultiCantrip, OpticalCantrip};
pub use error::{CantripError, CantripResult};
pub use factory::CantripFactory;
pub use library::OperationLibrary;
pub use operation::Operation;
