//! Cantrips: transforms applied to every datum read through a connection.

use std::fmt;
use std::sync::Arc;

use custodian_core::Value;
use custodian_optics::{Action, ValueTraversal};

use crate::error::{CantripError, CantripResult};
use crate::operation::Operation;

/// A transform applied to each datum of type `V`
pub trait Cantrip<V = Value>: Send + Sync {
    /// Transform one datum
    fn invoke(&self, datum: &V) -> Action<V>;

    /// Transform one datum; `None` when it must be omitted.
    ///
    /// # Errors
    ///
    /// Returns [`CantripError::Thrown`] when an operation fails
    fn apply(&self, datum: &V) -> CantripResult<Option<V>> {
        match self.invoke(datum) {
            Action::Update(value) => Ok(Some(value)),
            Action::OmitFromParent | Action::OmitFromRoot => Ok(None),
            Action::Throw(err) => Err(CantripError::Thrown(err)),
        }
    }

    /// Transform each datum, dropping omitted ones
    ///
    /// # Errors
    ///
    /// Stops at the first [`CantripError::Thrown`]
    fn apply_all(&self, data: &[V]) -> CantripResult<Vec<V>> {
        let mut out = Vec::with_capacity(data.len());
        for datum in data {
            if let Some(value) = self.apply(datum)? {
                out.push(value);
            }
        }
        Ok(out)
    }
}

/// Applies one operation to every value a traversal focuses on
#[derive(Clone)]
pub struct OpticalCantrip {
    traversal: ValueTraversal,
    operation: Operation,
}

impl OpticalCantrip {
    /// Pair a traversal with the operation to run at its focus
    #[must_use]
    pub fn new(traversal: ValueTraversal, operation: Operation) -> Self {
        Self {
            traversal,
            operation,
        }
    }

    /// The traversal
    #[must_use]
    pub fn traversal(&self) -> &ValueTraversal {
        &self.traversal
    }

    /// The operation
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

impl Cantrip<Value> for OpticalCantrip {
    fn invoke(&self, datum: &Value) -> Action<Value> {
        self.traversal
            .modify_with_action(datum, |value| self.operation.invoke(value))
    }
}

impl fmt::Debug for OpticalCantrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpticalCantrip({}, {})", self.traversal, self.operation)
    }
}

/// Runs cantrips in order, feeding each the previous result.
///
/// Stops at the first omission or thrown error. With no cantrips it
/// returns its input unchanged.
pub struct MultiCantrip<V = Value> {
    cantrips: Vec<Arc<dyn Cantrip<V>>>,
}

impl<V> MultiCantrip<V> {
    /// Pipeline of the given cantrips
    #[must_use]
    pub fn new(cantrips: Vec<Arc<dyn Cantrip<V>>>) -> Self {
        Self { cantrips }
    }

    /// Pipeline that changes nothing
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            cantrips: Vec::new(),
        }
    }

    /// Whether the pipeline changes nothing
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.cantrips.is_empty()
    }

    /// Number of stages
    #[must_use]
    pub fn len(&self) -> usize {
        self.cantrips.len()
    }

    /// Whether there are no stages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cantrips.is_empty()
    }
}

impl<V> Default for MultiCantrip<V> {
    fn default() -> Self {
        Self::no_op()
    }
}

impl<V: Clone + Send + Sync> Cantrip<V> for MultiCantrip<V> {
    fn invoke(&self, datum: &V) -> Action<V> {
        let mut current = datum.clone();
        for cantrip in &self.cantrips {
            match cantrip.invoke(&current) {
                Action::Update(next) => current = next,
                stop => return stop,
            }
        }
        Action::Update(current)
    }
}

impl<V> fmt::Debug for MultiCantrip<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MultiCantrip({} stages)", self.cantrips.len())
    }
}
