//! CUSTODIAN Schema Model
//!
//! Static descriptions of entity shapes ([`DataTypeDescriptor`]), the
//! closed union of field types ([`FieldType`]), and a registry that
//! resolves field paths and nested descriptors ([`DataTypeDescriptorSet`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod error;
pub mod field;
pub mod set;

pub use descriptor::{DataTypeDescriptor, DataTypeDescriptorBuilder};
pub use error::{SchemaError, SchemaResult};
pub use field::FieldType;
pub use set::DataTypeDescriptorSet;
