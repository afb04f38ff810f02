//! CUSTODIAN Policy Model
//!
//! Declarative rules describing which consumer use-cases may see which
//! fields, in which form, and for how long data may be retained.
//!
//! Policies are authored with [`PolicyBuilder`], validated against the
//! schema they reference, and grouped into a [`PolicySet`] for lookup by
//! the policy engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod conformance;
pub mod context;
pub mod error;
pub mod model;
pub mod result;
pub mod set;
pub mod strategy;
pub mod usage;

pub use builder::{PolicyBuilder, PolicyFieldBuilder, PolicyTargetBuilder};
pub use conformance::{DefaultPolicyConformanceCheck, PolicyConformanceCheck};
pub use context::{ConnectionContext, PolicyContextRule};
pub use error::{ConformanceError, PolicyError, PolicyResult};
pub use model::{
    Annotation, AnnotationParam, Policy, PolicyConfig, PolicyField, PolicyRetention, PolicyTarget,
    StorageMedium,
};
pub use result::{PolicyCheck, PolicyCheckResult};
pub use set::PolicySet;
pub use strategy::{DeletionTrigger, ManagementStrategy, StorageMedia, Trigger};
pub use usage::UsageType;
