//! Built-in `EMPTY` operations: replace a value with the empty value of its
//! type.

use custodian_core::{TypeTag, Value};
use custodian_optics::Action;
use once_cell::sync::Lazy;

use crate::operation::Operation;

/// Name shared by every emptying operation
pub const EMPTY: &str = "EMPTY";

static OPERATIONS: Lazy<Vec<Operation>> = Lazy::new(|| {
    vec![
        Operation::new(EMPTY, TypeTag::ANY, TypeTag::NOTHING, |_| {
            Action::Update(Value::Null)
        }),
        constant(TypeTag::STRING, Value::String(String::new())),
        constant(TypeTag::INTEGER, Value::Int(0)),
        constant(TypeTag::LONG, Value::Long(0)),
        constant(TypeTag::FLOAT, Value::Float(0.0)),
        constant(TypeTag::DOUBLE, Value::Double(0.0)),
        constant(TypeTag::BOOLEAN, Value::Bool(false)),
    ]
});

fn constant(tag: TypeTag, empty: Value) -> Operation {
    Operation::mono(EMPTY, tag, move |_| Action::Update(empty.clone()))
}

/// The emptying operations, for inclusion in an
/// [`OperationLibrary`](crate::OperationLibrary).
///
/// Types without a dedicated empty value fall back to an operation that
/// clears the value to [`Value::Null`].
#[must_use]
pub fn provide_operations() -> Vec<Operation> {
    OPERATIONS.clone()
}
