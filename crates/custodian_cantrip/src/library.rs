//! Operation lookup by name and type.

use custodian_core::TypeTag;
use indexmap::IndexMap;

use crate::empties;
use crate::operation::Operation;

/// Operations grouped by name.
///
/// Lookup prefers an exact type match, then an exact input whose output
/// fits, then any input that accepts the requested type.
#[derive(Debug, Clone, Default)]
pub struct OperationLibrary {
    by_name: IndexMap<String, Vec<Operation>>,
}

impl OperationLibrary {
    /// Create a library from a collection of operations
    #[must_use]
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> Self {
        let mut library = Self::default();
        for op in operations {
            library.register(op);
        }
        library
    }

    /// Library holding the built-in `EMPTY` operations
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(empties::provide_operations())
    }

    /// Add an operation
    pub fn register(&mut self, operation: Operation) {
        self.by_name
            .entry(operation.name().to_string())
            .or_default()
            .push(operation);
    }

    /// Add an operation, builder style
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.register(operation);
        self
    }

    /// Find an operation named `name` taking `input` and producing a value
    /// assignable to `output`
    #[must_use]
    pub fn find(&self, name: &str, input: &TypeTag, output: &TypeTag) -> Option<&Operation> {
        let candidates = self.by_name.get(name)?;
        let output_fits =
            |op: &Operation| *op.output_type() == TypeTag::NOTHING || output.is_assignable_from(op.output_type());

        candidates
            .iter()
            .find(|op| op.input_type() == input && op.output_type() == output)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|op| op.input_type() == input && output_fits(op))
            })
            .or_else(|| {
                candidates
                    .iter()
                    .find(|op| op.input_type().is_assignable_from(input) && output_fits(op))
            })
    }

    /// Whether any operation has this name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Distinct operation names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Total number of operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Whether the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
