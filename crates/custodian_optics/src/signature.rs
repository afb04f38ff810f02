//! Runtime type signatures of optics.

use custodian_core::TypeTag;
use std::fmt;

/// The four runtime types an optic connects: `S -> T` at the entity
/// level, and `A -> B` at the focused field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpticSignature {
    /// Entity type read from
    pub source_entity: TypeTag,
    /// Entity type produced
    pub target_entity: TypeTag,
    /// Focus type read
    pub source_field: TypeTag,
    /// Focus type written
    pub target_field: TypeTag,
    legs_monomorphic: bool,
}

impl OpticSignature {
    /// Polymorphic signature
    #[must_use]
    pub fn new(
        source_entity: TypeTag,
        target_entity: TypeTag,
        source_field: TypeTag,
        target_field: TypeTag,
    ) -> Self {
        let legs_monomorphic = source_entity == target_entity && source_field == target_field;
        Self {
            source_entity,
            target_entity,
            source_field,
            target_field,
            legs_monomorphic,
        }
    }

    /// Monomorphic signature: `S == T` and `A == B`
    #[must_use]
    pub fn mono(entity: TypeTag, field: TypeTag) -> Self {
        Self {
            source_entity: entity.clone(),
            target_entity: entity,
            source_field: field.clone(),
            target_field: field,
            legs_monomorphic: true,
        }
    }

    /// Whether entity and focus types are unchanged by writes, at every
    /// composed leg and not only at the endpoints
    #[must_use]
    pub fn is_monomorphic(&self) -> bool {
        self.legs_monomorphic
            && self.source_entity == self.target_entity
            && self.source_field == self.target_field
    }

    /// Whether `inner` may be composed under this optic's focus
    #[must_use]
    pub fn can_compose(&self, inner: &OpticSignature) -> bool {
        self.source_field.is_assignable_from(&inner.source_entity)
            && self.target_field.is_assignable_from(&inner.target_entity)
    }

    /// Signature of `self` composed with `inner`
    #[must_use]
    pub fn then(&self, inner: &OpticSignature) -> Self {
        Self {
            source_entity: self.source_entity.clone(),
            target_entity: self.target_entity.clone(),
            source_field: inner.source_field.clone(),
            target_field: inner.target_field.clone(),
            legs_monomorphic: self.is_monomorphic() && inner.is_monomorphic(),
        }
    }

    /// `A -> B` rendering of the focus
    #[must_use]
    pub fn focus(&self) -> String {
        format!("{} -> {}", self.source_field, self.target_field)
    }

    /// `S -> T` rendering of the entity
    #[must_use]
    pub fn entity(&self) -> String {
        format!("{} -> {}", self.source_entity, self.target_entity)
    }
}

impl fmt::Display for OpticSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}, {}>",
            self.source_entity, self.target_entity, self.source_field, self.target_field
        )
    }
}
