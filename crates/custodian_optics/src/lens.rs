//! Lenses: optics focusing exactly one field.

use std::fmt;
use std::sync::Arc;

use custodian_core::TypeTag;

use crate::action::Action;
use crate::error::{OpticsError, OpticsResult};
use crate::path::OpticalAccessPath;
use crate::signature::OpticSignature;
use crate::traversal::{Traversal, TraversalImpl};

type Getter<S, A> = Arc<dyn Fn(&S) -> A + Send + Sync>;
type Setter<S, T, B> = Arc<dyn Fn(&S, B) -> T + Send + Sync>;

/// Reads an `A` out of an `S`, and writes a `B` into an `S` to produce a `T`.
///
/// `S == T` and `A == B` for ordinary field access. Differing types model
/// cross-variant rewrites, such as turning a `Dog` record into a `Cat`.
pub struct Lens<S, T, A, B> {
    source_path: OpticalAccessPath,
    target_path: OpticalAccessPath,
    signature: OpticSignature,
    getter: Getter<S, A>,
    setter: Setter<S, T, B>,
}

impl<S, T, A, B> Clone for Lens<S, T, A, B> {
    fn clone(&self) -> Self {
        Self {
            source_path: self.source_path.clone(),
            target_path: self.target_path.clone(),
            signature: self.signature.clone(),
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<S, A> Lens<S, S, A, A>
where
    S: 'static,
    A: 'static,
{
    /// Monomorphic lens over the field at `path`
    #[must_use]
    pub fn mono(
        path: OpticalAccessPath,
        entity: TypeTag,
        field: TypeTag,
        getter: impl Fn(&S) -> A + Send + Sync + 'static,
        setter: impl Fn(&S, A) -> S + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            path.clone(),
            path,
            OpticSignature::mono(entity, field),
            getter,
            setter,
        )
    }
}

impl<S, T, A, B> Lens<S, T, A, B>
where
    S: 'static,
    T: 'static,
    A: 'static,
    B: 'static,
{
    /// Lens from its paths, signature and accessors
    #[must_use]
    pub fn new(
        source_path: OpticalAccessPath,
        target_path: OpticalAccessPath,
        signature: OpticSignature,
        getter: impl Fn(&S) -> A + Send + Sync + 'static,
        setter: impl Fn(&S, B) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            source_path,
            target_path,
            signature,
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// Path of the field read
    #[must_use]
    pub fn source_path(&self) -> &OpticalAccessPath {
        &self.source_path
    }

    /// Path of the field written
    #[must_use]
    pub fn target_path(&self) -> &OpticalAccessPath {
        &self.target_path
    }

    /// Runtime types connected by this lens
    #[must_use]
    pub fn signature(&self) -> &OpticSignature {
        &self.signature
    }

    /// Whether writes leave entity and focus types unchanged
    #[must_use]
    pub fn is_monomorphic(&self) -> bool {
        self.signature.is_monomorphic()
    }

    /// Read the focused field
    pub fn get(&self, entity: &S) -> A {
        (self.getter)(entity)
    }

    /// Produce a new entity with the focused field set to `value`
    pub fn set(&self, entity: &S, value: B) -> T {
        (self.setter)(entity, value)
    }

    /// Rewrite the focused field with `modifier`
    pub fn modify(&self, entity: &S, modifier: impl FnOnce(A) -> B) -> T {
        self.set(entity, modifier(self.get(entity)))
    }

    /// Lift `mapping` from the focus to the whole entity
    pub fn lift(
        &self,
        mapping: impl Fn(A) -> B + Send + Sync + 'static,
    ) -> Box<dyn Fn(&S) -> T + Send + Sync> {
        let lens = self.clone();
        Box::new(move |entity| lens.set(entity, mapping(lens.get(entity))))
    }

    /// Rewrite the focused field with a transform that may omit or throw.
    ///
    /// Anything but [`Action::Update`] is returned unchanged.
    pub fn modify_with_action(
        &self,
        entity: &S,
        modifier: &dyn Fn(A) -> Action<B>,
    ) -> Action<T> {
        match modifier(self.get(entity)) {
            Action::Update(value) => Action::Update(self.set(entity, value)),
            Action::OmitFromParent => Action::OmitFromParent,
            Action::OmitFromRoot => Action::OmitFromRoot,
            Action::Throw(err) => Action::Throw(err),
        }
    }

    /// Whether `other` may be composed under this lens's focus
    #[must_use]
    pub fn can_compose<S2, T2, A2, B2>(&self, other: &Lens<S2, T2, A2, B2>) -> bool {
        self.signature.can_compose(&other.signature)
    }

    /// Focus deeper: `other` reads and writes within this lens's focus.
    ///
    /// # Errors
    ///
    /// Returns [`OpticsError::CompositionMismatch`] naming both lenses when
    /// `other`'s entity types do not match this lens's focus types.
    pub fn compose<A2, B2>(&self, other: &Lens<A, B, A2, B2>) -> OpticsResult<Lens<S, T, A2, B2>>
    where
        A2: 'static,
        B2: 'static,
    {
        if !self.can_compose(other) {
            return Err(OpticsError::CompositionMismatch {
                outer: self.to_string(),
                inner: other.to_string(),
                expected: self.signature.focus(),
                found: other.signature.entity(),
            });
        }

        let outer_get = Arc::clone(&self.getter);
        let inner_get = Arc::clone(&other.getter);
        let getter = move |entity: &S| inner_get(&outer_get(entity));

        let outer_get = Arc::clone(&self.getter);
        let outer_set = Arc::clone(&self.setter);
        let inner_set = Arc::clone(&other.setter);
        let setter = move |entity: &S, value: B2| {
            let focus = outer_get(entity);
            outer_set(entity, inner_set(&focus, value))
        };

        Ok(Lens::new(
            self.source_path.compose(&other.source_path),
            self.target_path.compose(&other.target_path),
            self.signature.then(&other.signature),
            getter,
            setter,
        ))
    }

    /// View this lens as a traversal focusing exactly one element
    #[must_use]
    pub fn as_traversal(&self) -> Traversal<S, T, A, B> {
        Traversal::new(
            self.source_path.clone(),
            self.target_path.clone(),
            self.signature.clone(),
            LensTraversal(self.clone()),
        )
    }
}

struct LensTraversal<S, T, A, B>(Lens<S, T, A, B>);

impl<S, T, A, B> TraversalImpl<S, T, A, B> for LensTraversal<S, T, A, B>
where
    S: 'static,
    T: 'static,
    A: 'static,
    B: 'static,
{
    fn every<'a>(&'a self, entity: &'a S) -> Box<dyn Iterator<Item = A> + 'a> {
        Box::new(std::iter::once(self.0.get(entity)))
    }

    fn modify(&self, entity: &S, modifier: &dyn Fn(A) -> B) -> T {
        self.0.modify(entity, modifier)
    }

    fn modify_with_action(&self, entity: &S, modifier: &dyn Fn(A) -> Action<B>) -> Action<T> {
        self.0.modify_with_action(entity, modifier)
    }
}

impl<S, T, A, B> fmt::Display for Lens<S, T, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signature.is_monomorphic() {
            write!(f, "Lens({})", self.source_path)
        } else {
            write!(f, "Lens({} -> {})", self.source_path, self.target_path)
        }
    }
}

impl<S, T, A, B> fmt::Debug for Lens<S, T, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("source_path", &self.source_path)
            .field("target_path", &self.target_path)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
