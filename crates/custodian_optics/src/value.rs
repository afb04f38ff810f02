//! Optics over the dynamic [`Value`] entity model.
//!
//! Static types are all `Value`; the runtime types live in each optic's
//! [`OpticSignature`], which is what composition checks.

use custodian_core::{TypeTag, Value};
use custodian_schema::DataTypeDescriptor;

use crate::action::Action;
use crate::lens::Lens;
use crate::path::OpticalAccessPath;
use crate::signature::OpticSignature;
use crate::traversal::{collect_actions, Traversal, TraversalImpl, FOR_EACH};

/// Lens over dynamic entities
pub type ValueLens = Lens<Value, Value, Value, Value>;

/// Traversal over dynamic entities
pub type ValueTraversal = Traversal<Value, Value, Value, Value>;

impl ValueLens {
    /// Monomorphic lens over one field of a record.
    ///
    /// Reading a missing field yields [`Value::Null`]. Writing into a value
    /// that is not a record leaves it unchanged.
    #[must_use]
    pub fn record_field(entity: TypeTag, field: impl Into<String>, field_tag: TypeTag) -> Self {
        let dtd_name = entity.name().to_string();
        Self::record_field_at(dtd_name, entity, field.into(), field_tag)
    }

    /// Record-field lens for a declared descriptor field, keyed by the
    /// descriptor's name and typed by its runtime tag.
    #[must_use]
    pub fn descriptor_field(
        dtd: &DataTypeDescriptor,
        field: impl Into<String>,
        field_tag: TypeTag,
    ) -> Self {
        Self::record_field_at(dtd.name.clone(), dtd.type_tag.clone(), field.into(), field_tag)
    }

    fn record_field_at(dtd_name: String, entity: TypeTag, field: String, field_tag: TypeTag) -> Self {
        let path = OpticalAccessPath::new(dtd_name, [field.clone()]);
        let read = field.clone();
        Lens::mono(
            path,
            entity,
            field_tag,
            move |entity: &Value| entity.field(&read).cloned().unwrap_or(Value::Null),
            move |entity: &Value, value| match entity {
                Value::Record(record) => Value::Record(record.with_field(&field, value)),
                other => other.clone(),
            },
        )
    }
}

struct ValueElements;

impl TraversalImpl<Value, Value, Value, Value> for ValueElements {
    fn every<'a>(&'a self, entity: &'a Value) -> Box<dyn Iterator<Item = Value> + 'a> {
        match entity {
            Value::List(items) => Box::new(items.iter().cloned()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn modify(&self, entity: &Value, modifier: &dyn Fn(Value) -> Value) -> Value {
        match entity {
            Value::List(items) => Value::List(items.iter().cloned().map(modifier).collect()),
            other => other.clone(),
        }
    }

    fn modify_with_action(
        &self,
        entity: &Value,
        modifier: &dyn Fn(Value) -> Action<Value>,
    ) -> Action<Value> {
        match entity {
            Value::List(items) => collect_actions(items.iter().cloned(), modifier).map(Value::List),
            other => Action::Update(other.clone()),
        }
    }
}

struct ValueNullable;

impl TraversalImpl<Value, Value, Value, Value> for ValueNullable {
    fn every<'a>(&'a self, entity: &'a Value) -> Box<dyn Iterator<Item = Value> + 'a> {
        match entity {
            Value::Null => Box::new(std::iter::empty()),
            present => Box::new(std::iter::once(present.clone())),
        }
    }

    fn modify(&self, entity: &Value, modifier: &dyn Fn(Value) -> Value) -> Value {
        match entity {
            Value::Null => Value::Null,
            present => modifier(present.clone()),
        }
    }

    fn modify_with_action(
        &self,
        entity: &Value,
        modifier: &dyn Fn(Value) -> Action<Value>,
    ) -> Action<Value> {
        match entity {
            Value::Null => Action::Update(Value::Null),
            present => match modifier(present.clone()) {
                Action::OmitFromParent => Action::Update(Value::Null),
                other => other,
            },
        }
    }
}

impl ValueTraversal {
    /// Traversal over the elements of a list or array value.
    ///
    /// `container` is the tag of the sequence (`List<Pet>`, `Array<Long>`)
    /// and `item` the tag of its elements.
    #[must_use]
    pub fn value_elements(container: TypeTag, item: TypeTag) -> Self {
        let path = OpticalAccessPath::new(container.name(), [FOR_EACH]);
        Traversal::new(
            path.clone(),
            path,
            OpticSignature::mono(container, item),
            ValueElements,
        )
    }

    /// Traversal over a present value; [`Value::Null`] is skipped.
    ///
    /// Nullability is not part of the runtime type, so the traversal
    /// passes `source` and `target` through unchanged.
    #[must_use]
    pub fn value_nullable(source: TypeTag, target: TypeTag) -> Self {
        Traversal::new(
            OpticalAccessPath::root(source.name()),
            OpticalAccessPath::root(target.name()),
            OpticSignature::new(source.clone(), target.clone(), source, target),
            ValueNullable,
        )
    }
}
