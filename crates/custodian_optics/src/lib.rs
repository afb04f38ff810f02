//! CUSTODIAN Optics
//!
//! Generic, composable accessors over entity instances. A [`Lens`] focuses
//! exactly one field; a [`Traversal`] focuses zero or more. Every optic
//! carries explicit [`TypeTag`](custodian_core::TypeTag)s so composition is
//! checked when optics are assembled rather than when they are first used.
//!
//! The [`OpticsManifest`] assembles a single traversal for an arbitrary
//! dotted field path out of the per-field lenses registered at startup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod error;
pub mod lens;
pub mod manifest;
pub mod path;
pub mod signature;
pub mod traversal;
pub mod value;

pub use action::{Action, ThrownError};
pub use error::{OpticsError, OpticsResult};
pub use lens::Lens;
pub use manifest::OpticsManifest;
pub use path::OpticalAccessPath;
pub use signature::OpticSignature;
pub use traversal::{Traversal, TraversalImpl};
pub use value::{ValueLens, ValueTraversal};
