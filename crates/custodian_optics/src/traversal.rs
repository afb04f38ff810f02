//! Traversals: optics focusing zero or more elements.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use custodian_core::TypeTag;
use indexmap::IndexMap;

use crate::action::Action;
use crate::error::{OpticsError, OpticsResult};
use crate::path::OpticalAccessPath;
use crate::signature::OpticSignature;

/// Behaviour behind a [`Traversal`].
///
/// Implementations must be pure: `every` is finite and restartable, and
/// no method has side effects beyond calling the supplied modifier.
pub trait TraversalImpl<S, T, A, B>: Send + Sync {
    /// Every focused element, in order
    fn every<'a>(&'a self, entity: &'a S) -> Box<dyn Iterator<Item = A> + 'a>;

    /// Rewrite every focused element
    fn modify(&self, entity: &S, modifier: &dyn Fn(A) -> B) -> T;

    /// Rewrite every focused element with a transform that may omit or throw.
    ///
    /// The first `OmitFromRoot` or `Throw` is returned as-is and no later
    /// element is visited. `OmitFromParent` removes the element from its
    /// immediate container.
    fn modify_with_action(&self, entity: &S, modifier: &dyn Fn(A) -> Action<B>) -> Action<T>;
}

/// Focuses zero or more `A`s inside an `S`, rewriting them as `B`s to
/// produce a `T`.
pub struct Traversal<S, T, A, B> {
    source_path: OpticalAccessPath,
    target_path: OpticalAccessPath,
    signature: OpticSignature,
    imp: Arc<dyn TraversalImpl<S, T, A, B>>,
}

impl<S, T, A, B> Clone for Traversal<S, T, A, B> {
    fn clone(&self) -> Self {
        Self {
            source_path: self.source_path.clone(),
            target_path: self.target_path.clone(),
            signature: self.signature.clone(),
            imp: Arc::clone(&self.imp),
        }
    }
}

impl<S, T, A, B> Traversal<S, T, A, B>
where
    S: 'static,
    T: 'static,
    A: 'static,
    B: 'static,
{
    /// Traversal from its paths, signature and behaviour
    #[must_use]
    pub fn new(
        source_path: OpticalAccessPath,
        target_path: OpticalAccessPath,
        signature: OpticSignature,
        imp: impl TraversalImpl<S, T, A, B> + 'static,
    ) -> Self {
        Self {
            source_path,
            target_path,
            signature,
            imp: Arc::new(imp),
        }
    }

    /// Path of the elements read
    #[must_use]
    pub fn source_path(&self) -> &OpticalAccessPath {
        &self.source_path
    }

    /// Path of the elements written
    #[must_use]
    pub fn target_path(&self) -> &OpticalAccessPath {
        &self.target_path
    }

    /// Runtime types connected by this traversal
    #[must_use]
    pub fn signature(&self) -> &OpticSignature {
        &self.signature
    }

    /// True iff every composed leg is monomorphic
    #[must_use]
    pub fn is_monomorphic(&self) -> bool {
        self.signature.is_monomorphic()
    }

    /// Every focused element of `entity`
    pub fn every<'a>(&'a self, entity: &'a S) -> impl Iterator<Item = A> + 'a {
        self.imp.every(entity)
    }

    /// Rewrite every focused element
    pub fn modify(&self, entity: &S, modifier: impl Fn(A) -> B) -> T {
        self.imp.modify(entity, &modifier)
    }

    /// Rewrite every focused element, honouring omissions and errors
    pub fn modify_with_action(&self, entity: &S, modifier: impl Fn(A) -> Action<B>) -> Action<T> {
        self.imp.modify_with_action(entity, &modifier)
    }

    /// Lift `modifier` from the focus to the whole entity
    pub fn lift(
        &self,
        modifier: impl Fn(A) -> B + Send + Sync + 'static,
    ) -> Box<dyn Fn(&S) -> T + Send + Sync> {
        let imp = Arc::clone(&self.imp);
        Box::new(move |entity| imp.modify(entity, &modifier))
    }

    /// Whether `inner` may be composed under this traversal's focus
    #[must_use]
    pub fn can_compose<S2, T2, A2, B2>(&self, inner: &Traversal<S2, T2, A2, B2>) -> bool {
        self.signature.can_compose(&inner.signature)
    }

    /// Focus deeper: `inner` traverses within each element of this one.
    ///
    /// # Errors
    ///
    /// Returns [`OpticsError::CompositionMismatch`] naming both traversals
    /// when `inner`'s entity types do not match this traversal's focus.
    pub fn compose<A2, B2>(
        &self,
        inner: &Traversal<A, B, A2, B2>,
    ) -> OpticsResult<Traversal<S, T, A2, B2>>
    where
        A2: 'static,
        B2: 'static,
    {
        if !self.can_compose(inner) {
            return Err(OpticsError::CompositionMismatch {
                outer: self.to_string(),
                inner: inner.to_string(),
                expected: self.signature.focus(),
                found: inner.signature.entity(),
            });
        }

        Ok(Traversal {
            source_path: self.source_path.compose(&inner.source_path),
            target_path: self.target_path.compose(&inner.target_path),
            signature: self.signature.then(&inner.signature),
            imp: Arc::new(Composed {
                outer: Arc::clone(&self.imp),
                inner: Arc::clone(&inner.imp),
            }),
        })
    }
}

struct Composed<S, T, A, B, A2, B2> {
    outer: Arc<dyn TraversalImpl<S, T, A, B>>,
    inner: Arc<dyn TraversalImpl<A, B, A2, B2>>,
}

impl<S, T, A, B, A2, B2> TraversalImpl<S, T, A2, B2> for Composed<S, T, A, B, A2, B2>
where
    S: 'static,
    T: 'static,
    A: 'static,
    B: 'static,
    A2: 'static,
    B2: 'static,
{
    fn every<'a>(&'a self, entity: &'a S) -> Box<dyn Iterator<Item = A2> + 'a> {
        Box::new(self.outer.every(entity).flat_map(move |focus| {
            let items: Vec<A2> = self.inner.every(&focus).collect();
            items
        }))
    }

    fn modify(&self, entity: &S, modifier: &dyn Fn(A2) -> B2) -> T {
        self.outer
            .modify(entity, &|focus: A| self.inner.modify(&focus, modifier))
    }

    fn modify_with_action(&self, entity: &S, modifier: &dyn Fn(A2) -> Action<B2>) -> Action<T> {
        self.outer.modify_with_action(entity, &|focus: A| {
            self.inner.modify_with_action(&focus, modifier)
        })
    }
}

/// Apply `modifier` to each item, dropping `OmitFromParent` items and
/// stopping at the first `OmitFromRoot` or `Throw`.
pub(crate) fn collect_actions<A, B>(
    items: impl IntoIterator<Item = A>,
    modifier: &dyn Fn(A) -> Action<B>,
) -> Action<Vec<B>> {
    let mut out = Vec::new();
    for item in items {
        match modifier(item) {
            Action::Update(value) => out.push(value),
            Action::OmitFromParent => {}
            Action::OmitFromRoot => return Action::OmitFromRoot,
            Action::Throw(err) => return Action::Throw(err),
        }
    }
    Action::Update(out)
}

/// Path segment used by the built-in element traversals
pub const FOR_EACH: &str = "forEach";

struct ListElements<A, B>(PhantomData<fn(A) -> B>);

impl<A, B> TraversalImpl<Vec<A>, Vec<B>, A, B> for ListElements<A, B>
where
    A: Clone + 'static,
    B: 'static,
{
    fn every<'a>(&'a self, entity: &'a Vec<A>) -> Box<dyn Iterator<Item = A> + 'a> {
        Box::new(entity.iter().cloned())
    }

    fn modify(&self, entity: &Vec<A>, modifier: &dyn Fn(A) -> B) -> Vec<B> {
        entity.iter().cloned().map(modifier).collect()
    }

    fn modify_with_action(
        &self,
        entity: &Vec<A>,
        modifier: &dyn Fn(A) -> Action<B>,
    ) -> Action<Vec<B>> {
        collect_actions(entity.iter().cloned(), modifier)
    }
}

struct NullableElement<A, B>(PhantomData<fn(A) -> B>);

impl<A, B> TraversalImpl<Option<A>, Option<B>, A, B> for NullableElement<A, B>
where
    A: Clone + 'static,
    B: 'static,
{
    fn every<'a>(&'a self, entity: &'a Option<A>) -> Box<dyn Iterator<Item = A> + 'a> {
        Box::new(entity.iter().cloned())
    }

    fn modify(&self, entity: &Option<A>, modifier: &dyn Fn(A) -> B) -> Option<B> {
        entity.clone().map(modifier)
    }

    fn modify_with_action(
        &self,
        entity: &Option<A>,
        modifier: &dyn Fn(A) -> Action<B>,
    ) -> Action<Option<B>> {
        match entity.clone() {
            None => Action::Update(None),
            Some(value) => match modifier(value) {
                Action::Update(next) => Action::Update(Some(next)),
                Action::OmitFromParent => Action::Update(None),
                Action::OmitFromRoot => Action::OmitFromRoot,
                Action::Throw(err) => Action::Throw(err),
            },
        }
    }
}

struct MapValues<K, A, B>(PhantomData<fn(K, A) -> B>);

impl<K, A, B> TraversalImpl<IndexMap<K, A>, IndexMap<K, B>, A, B> for MapValues<K, A, B>
where
    K: Clone + Hash + Eq + 'static,
    A: Clone + 'static,
    B: 'static,
{
    fn every<'a>(&'a self, entity: &'a IndexMap<K, A>) -> Box<dyn Iterator<Item = A> + 'a> {
        Box::new(entity.values().cloned())
    }

    fn modify(&self, entity: &IndexMap<K, A>, modifier: &dyn Fn(A) -> B) -> IndexMap<K, B> {
        entity
            .iter()
            .map(|(k, v)| (k.clone(), modifier(v.clone())))
            .collect()
    }

    fn modify_with_action(
        &self,
        entity: &IndexMap<K, A>,
        modifier: &dyn Fn(A) -> Action<B>,
    ) -> Action<IndexMap<K, B>> {
        let mut out = IndexMap::with_capacity(entity.len());
        for (key, value) in entity {
            match modifier(value.clone()) {
                Action::Update(next) => {
                    out.insert(key.clone(), next);
                }
                Action::OmitFromParent => {}
                Action::OmitFromRoot => return Action::OmitFromRoot,
                Action::Throw(err) => return Action::Throw(err),
            }
        }
        Action::Update(out)
    }
}

impl<A> Traversal<Vec<A>, Vec<A>, A, A>
where
    A: Clone + 'static,
{
    /// Traversal over every element of a list whose items carry `item`
    #[must_use]
    pub fn list(item: TypeTag) -> Self {
        let container = TypeTag::list_of(&item);
        let path = OpticalAccessPath::new(container.name(), [FOR_EACH]);
        Traversal::new(
            path.clone(),
            path,
            OpticSignature::mono(container, item),
            ListElements(PhantomData),
        )
    }
}

impl<A, B> Traversal<Vec<A>, Vec<B>, A, B>
where
    A: Clone + 'static,
    B: 'static,
{
    /// Traversal mapping list elements tagged `source` to elements tagged `target`
    #[must_use]
    pub fn list_map(source: TypeTag, target: TypeTag) -> Self {
        let source_container = TypeTag::list_of(&source);
        let target_container = TypeTag::list_of(&target);
        Traversal::new(
            OpticalAccessPath::new(source_container.name(), [FOR_EACH]),
            OpticalAccessPath::new(target_container.name(), [FOR_EACH]),
            OpticSignature::new(source_container, target_container, source, target),
            ListElements(PhantomData),
        )
    }
}

impl<A> Traversal<Option<A>, Option<A>, A, A>
where
    A: Clone + 'static,
{
    /// Traversal over a present optional value; absent values are skipped
    #[must_use]
    pub fn nullable(item: TypeTag) -> Self {
        let path = OpticalAccessPath::root(item.name());
        Traversal::new(
            path.clone(),
            path,
            OpticSignature::mono(item.clone(), item),
            NullableElement(PhantomData),
        )
    }
}

impl<K, A> Traversal<IndexMap<K, A>, IndexMap<K, A>, A, A>
where
    K: Clone + Hash + Eq + 'static,
    A: Clone + 'static,
{
    /// Traversal over every value of a map keyed by `key`
    #[must_use]
    pub fn map_values(key: TypeTag, value: TypeTag) -> Self {
        let container = TypeTag::map_of(&key, &value);
        let path = OpticalAccessPath::new(container.name(), ["values", FOR_EACH]);
        Traversal::new(
            path.clone(),
            path,
            OpticSignature::mono(container, value),
            MapValues(PhantomData),
        )
    }
}

impl<S, T, A, B> fmt::Display for Traversal<S, T, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signature.is_monomorphic() {
            write!(f, "Traversal({})", self.source_path)
        } else {
            write!(f, "Traversal({} -> {})", self.source_path, self.target_path)
        }
    }
}

impl<S, T, A, B> fmt::Debug for Traversal<S, T, A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("source_path", &self.source_path)
            .field("target_path", &self.target_path)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::Lens;
    use proptest::prelude::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Pet {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        pets: Vec<Pet>,
    }

    fn person_pets() -> Lens<Person, Person, Vec<Pet>, Vec<Pet>> {
        Lens::mono(
            OpticalAccessPath::new("Person", ["pets"]),
            TypeTag::new("Person"),
            TypeTag::new("List<Pet>"),
            |p: &Person| p.pets.clone(),
            |_: &Person, pets| Person { pets },
        )
    }

    fn pet_name() -> Lens<Pet, Pet, String, String> {
        Lens::mono(
            OpticalAccessPath::new("Pet", ["name"]),
            TypeTag::new("Pet"),
            TypeTag::STRING,
            |p: &Pet| p.name.clone(),
            |_: &Pet, name| Pet { name },
        )
    }

    fn pet_names() -> Traversal<Person, Person, String, String> {
        person_pets()
            .as_traversal()
            .compose(&Traversal::list(TypeTag::new("Pet")))
            .unwrap()
            .compose(&pet_name().as_traversal())
            .unwrap()
    }

    fn household() -> Person {
        Person {
            pets: ["Sundae", "Coconut", "Toffee"]
                .into_iter()
                .map(|n| Pet {
                    name: n.to_string(),
                })
                .collect(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_composed_every() {
        let names: Vec<String> = pet_names().every(&household()).collect();
        assert_eq!(names, strings(&["Sundae", "Coconut", "Toffee"]));
    }

    #[test]
    fn test_composed_path_and_display() {
        let traversal = pet_names();
        assert_eq!(
            traversal.source_path(),
            &OpticalAccessPath::new("Person", ["pets", FOR_EACH, "name"])
        );
        assert!(traversal.is_monomorphic());
        assert_eq!(traversal.to_string(), "Traversal(Person::pets.forEach.name)");
    }

    #[test]
    fn test_compose_rejects_mismatch_at_composition_time() {
        let strings_list: Traversal<Vec<String>, Vec<String>, String, String> =
            Traversal::list(TypeTag::STRING);
        let wrong: Traversal<String, String, String, String> = Lens::mono(
            OpticalAccessPath::new("Pet", ["name"]),
            TypeTag::new("Pet"),
            TypeTag::STRING,
            |s: &String| s.clone(),
            |_: &String, s| s,
        )
        .as_traversal();

        let err = strings_list.compose(&wrong).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("String"), "{message}");
        assert!(message.contains("Pet"), "{message}");
    }

    #[test]
    fn test_lift_doubles_each_string_in_order() {
        let doubled = Traversal::<Vec<String>, Vec<String>, String, String>::list(TypeTag::STRING)
            .lift(|s| format!("{s}{s}"));
        let result = doubled(&strings(&["a", "b", "c"]));
        assert_eq!(result, strings(&["aa", "bb", "cc"]));
    }

    #[test]
    fn test_omit_from_parent_shrinks_list() {
        let traversal = pet_names();
        let result = traversal.modify_with_action(&household(), |name| {
            if name == "Coconut" {
                Action::OmitFromParent
            } else {
                Action::Update(name)
            }
        });

        // Omitting the name omits the whole pet from the pets list.
        let pets: Vec<String> = match result {
            Action::Update(person) => person.pets.into_iter().map(|p| p.name).collect(),
            other => panic!("expected update, got {other:?}"),
        };
        assert_eq!(pets, strings(&["Sundae", "Toffee"]));
    }

    #[test]
    fn test_omit_from_root_short_circuits() {
        let list = Traversal::<Vec<String>, Vec<String>, String, String>::list(TypeTag::STRING);
        let visited = RefCell::new(Vec::new());
        let result = list.modify_with_action(&strings(&["a", "b", "c", "d"]), |s| {
            visited.borrow_mut().push(s.clone());
            if s == "b" {
                Action::OmitFromRoot
            } else {
                Action::Update(s)
            }
        });

        assert_eq!(result, Action::OmitFromRoot);
        assert_eq!(visited.into_inner(), strings(&["a", "b"]));
    }

    #[test]
    fn test_omit_from_root_bubbles_through_composition() {
        let result = pet_names().modify_with_action(&household(), |name| {
            if name == "Coconut" {
                Action::OmitFromRoot
            } else {
                Action::Update(name.to_uppercase())
            }
        });
        assert_eq!(result, Action::OmitFromRoot);
    }

    #[test]
    fn test_omit_from_parent_in_three_element_list() {
        let list = Traversal::<Vec<i32>, Vec<i32>, i32, i32>::list(TypeTag::INTEGER);
        let result = list.modify_with_action(&vec![1, 2, 3], |v| {
            if v == 2 {
                Action::OmitFromParent
            } else {
                Action::Update(v)
            }
        });
        assert_eq!(result, Action::Update(vec![1, 3]));
    }

    #[test]
    fn test_list_map_changes_element_type() {
        let lengths =
            Traversal::<Vec<String>, Vec<usize>, String, usize>::list_map(TypeTag::STRING, TypeTag::INTEGER);
        assert!(!lengths.is_monomorphic());
        assert_eq!(lengths.modify(&strings(&["ab", "c"]), |s| s.len()), vec![2, 1]);
    }

    #[test]
    fn test_nullable_traversal() {
        let nullable = Traversal::<Option<String>, Option<String>, String, String>::nullable(
            TypeTag::STRING,
        );
        assert_eq!(nullable.every(&None).count(), 0);
        assert_eq!(
            nullable.modify_with_action(&None, |_| Action::OmitFromRoot),
            Action::Update(None)
        );
        assert_eq!(
            nullable.modify_with_action(&Some("x".to_string()), |_| Action::OmitFromParent),
            Action::Update(None)
        );
        assert_eq!(
            nullable.modify(&Some("x".to_string()), |s| s.repeat(3)),
            Some("xxx".to_string())
        );
    }

    #[test]
    fn test_map_values_traversal() {
        let values =
            Traversal::<IndexMap<String, i64>, IndexMap<String, i64>, i64, i64>::map_values(
                TypeTag::STRING,
                TypeTag::LONG,
            );
        let mut scores = IndexMap::new();
        scores.insert("a".to_string(), 1);
        scores.insert("b".to_string(), 2);
        scores.insert("c".to_string(), 3);

        assert_eq!(values.every(&scores).sum::<i64>(), 6);

        let result = values.modify_with_action(&scores, |v| {
            if v == 2 {
                Action::OmitFromParent
            } else {
                Action::Update(v * 10)
            }
        });
        let updated = result.into_update().unwrap();
        assert_eq!(updated.get("a"), Some(&10));
        assert_eq!(updated.get("b"), None);
        assert_eq!(updated.get("c"), Some(&30));
    }

    proptest! {
        #[test]
        fn prop_lift_is_a_functor(items in prop::collection::vec("[a-z]{0,6}", 0..10)) {
            let list = Traversal::<Vec<String>, Vec<String>, String, String>::list(TypeTag::STRING);
            let f = |s: String| format!("{s}{s}");
            let lifted = list.lift(f);
            let after: Vec<String> = list.every(&lifted(&items)).collect();
            let expected: Vec<String> = list.every(&items).map(f).collect();
            prop_assert_eq!(after, expected);
        }

        #[test]
        fn prop_all_updates_preserve_length(items in prop::collection::vec(any::<i32>(), 0..20)) {
            let list = Traversal::<Vec<i32>, Vec<i32>, i32, i32>::list(TypeTag::INTEGER);
            let result = list.modify_with_action(&items, |v| Action::Update(v.wrapping_add(1)));
            let expected: Vec<i32> = items.iter().map(|v| v.wrapping_add(1)).collect();
            prop_assert_eq!(result, Action::Update(expected));
        }
    }
}
