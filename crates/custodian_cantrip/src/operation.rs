//! Named, typed value transforms.

use std::fmt;
use std::sync::Arc;

use custodian_core::{TypeTag, Value};
use custodian_optics::Action;

type OperationFn = Arc<dyn Fn(Value) -> Action<Value> + Send + Sync>;

/// A named transform from values of `input_type` to values of
/// `output_type`. Several operations may share a name; the
/// [`OperationLibrary`](crate::OperationLibrary) picks one by type.
#[derive(Clone)]
pub struct Operation {
    name: String,
    input_type: TypeTag,
    output_type: TypeTag,
    body: OperationFn,
}

impl Operation {
    /// Create an operation
    pub fn new<F>(name: impl Into<String>, input_type: TypeTag, output_type: TypeTag, body: F) -> Self
    where
        F: Fn(Value) -> Action<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input_type,
            output_type,
            body: Arc::new(body),
        }
    }

    /// Operation whose input and output types are the same
    pub fn mono<F>(name: impl Into<String>, tag: TypeTag, body: F) -> Self
    where
        F: Fn(Value) -> Action<Value> + Send + Sync + 'static,
    {
        Self::new(name, tag.clone(), tag, body)
    }

    /// Operation name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted input type
    #[must_use]
    pub fn input_type(&self) -> &TypeTag {
        &self.input_type
    }

    /// Produced output type; [`TypeTag::NOTHING`] fits every output
    #[must_use]
    pub fn output_type(&self) -> &TypeTag {
        &self.output_type
    }

    /// Apply to one value
    pub fn invoke(&self, value: Value) -> Action<Value> {
        (self.body)(value)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} -> {})", self.name, self.input_type, self.output_type)
    }
}
