//! Registry that assembles traversals for dotted field paths.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use custodian_core::TypeTag;
use custodian_schema::{DataTypeDescriptorSet, FieldType, SchemaError};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{OpticsError, OpticsResult};
use crate::path::OpticalAccessPath;
use crate::value::{ValueLens, ValueTraversal};

/// Per-field lenses plus the descriptors they range over.
///
/// Lenses are keyed by their single-selector source path
/// (`Person::name`). Composed traversals are memoized per access path.
pub struct OpticsManifest {
    lenses: IndexMap<OpticalAccessPath, ValueLens>,
    dtds: DataTypeDescriptorSet,
    composed: RwLock<HashMap<OpticalAccessPath, ValueTraversal>>,
}

impl OpticsManifest {
    /// Manifest over explicitly declared lenses
    #[must_use]
    pub fn new(lenses: impl IntoIterator<Item = ValueLens>, dtds: DataTypeDescriptorSet) -> Self {
        let lenses = lenses
            .into_iter()
            .map(|lens| (lens.source_path().clone(), lens))
            .collect();
        Self {
            lenses,
            dtds,
            composed: RwLock::new(HashMap::new()),
        }
    }

    /// Manifest with a record-field lens for every field of every
    /// descriptor. Tuple fields have no runtime type and get no lens.
    ///
    /// # Errors
    ///
    /// Returns an error if a field's runtime type cannot be resolved.
    pub fn from_descriptors(dtds: DataTypeDescriptorSet) -> OpticsResult<Self> {
        let mut lenses = Vec::new();
        for dtd in dtds.iter() {
            for (name, field_type) in &dtd.fields {
                if matches!(field_type.innermost(), FieldType::Tuple(_)) {
                    continue;
                }
                let tag = dtds.field_type_tag(field_type)?;
                lenses.push(ValueLens::descriptor_field(dtd, name.clone(), tag));
            }
        }
        Ok(Self::new(lenses, dtds))
    }

    /// Register (or replace) a lens, keyed by its source path
    #[must_use]
    pub fn with_lens(mut self, lens: ValueLens) -> Self {
        self.lenses.insert(lens.source_path().clone(), lens);
        self.composed
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self
    }

    /// Descriptors this manifest resolves paths against
    #[must_use]
    pub fn descriptors(&self) -> &DataTypeDescriptorSet {
        &self.dtds
    }

    /// Number of registered lenses
    #[must_use]
    pub fn lens_count(&self) -> usize {
        self.lenses.len()
    }

    /// Traversal for `path` that neither changes entity nor field type
    ///
    /// # Errors
    ///
    /// See [`OpticsManifest::compose_traversal`].
    pub fn compose_mono(
        &self,
        path: &OpticalAccessPath,
        entity: &TypeTag,
        field: &TypeTag,
    ) -> OpticsResult<ValueTraversal> {
        self.compose_traversal(path, entity, entity, field, field)
    }

    /// Traversal for `path` that may change entity and field types
    ///
    /// # Errors
    ///
    /// See [`OpticsManifest::compose_traversal`].
    pub fn compose_poly(
        &self,
        path: &OpticalAccessPath,
        source_entity: &TypeTag,
        target_entity: &TypeTag,
        source_field: &TypeTag,
        target_field: &TypeTag,
    ) -> OpticsResult<ValueTraversal> {
        self.compose_traversal(path, source_entity, target_entity, source_field, target_field)
    }

    /// Resolve a dotted field path into a single composed traversal.
    ///
    /// List, array and nullable fields are looked through when further
    /// selectors follow them; a nullable tail is unwrapped so the caller
    /// only sees present values.
    ///
    /// # Errors
    ///
    /// - the root descriptor, a field, or a nested descriptor is unknown
    /// - a selector has no registered lens
    /// - two legs of the path have mismatched runtime types
    /// - the result does not have the requested runtime types
    pub fn compose_traversal(
        &self,
        path: &OpticalAccessPath,
        source_entity: &TypeTag,
        target_entity: &TypeTag,
        source_field: &TypeTag,
        target_field: &TypeTag,
    ) -> OpticsResult<ValueTraversal> {
        let result = self.compose_inner(path)?;
        let signature = result.signature().clone();

        let checks = [
            (
                signature.source_entity.is_assignable_from(source_entity),
                "input entity type",
                source_entity,
                &signature.source_entity,
            ),
            (
                target_entity.is_assignable_from(&signature.target_entity),
                "output entity type",
                target_entity,
                &signature.target_entity,
            ),
            (
                signature.source_field.is_assignable_from(source_field),
                "input field type",
                source_field,
                &signature.source_field,
            ),
            (
                target_field.is_assignable_from(&signature.target_field),
                "output field type",
                target_field,
                &signature.target_field,
            ),
        ];

        for (ok, role, requested, actual) in checks {
            if !ok {
                return Err(OpticsError::TypeMismatch {
                    path: path.to_string(),
                    role,
                    requested: requested.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        Ok(result)
    }

    fn compose_inner(&self, path: &OpticalAccessPath) -> OpticsResult<ValueTraversal> {
        if let Some(cached) = self
            .composed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(cached.clone());
        }

        let dtd = self.dtds.get(path.dtd_name())?;
        let (head, rest) =
            path.selectors()
                .split_first()
                .ok_or_else(|| SchemaError::EmptyAccessPath {
                    dtd: dtd.name.clone(),
                })?;
        let field_type = dtd.field(head).ok_or_else(|| SchemaError::FieldNotFound {
            dtd: dtd.name.clone(),
            field: head.clone(),
        })?;

        let head_path = OpticalAccessPath::new(dtd.name.clone(), [head.clone()]);
        let lens = self
            .lenses
            .get(&head_path)
            .ok_or_else(|| OpticsError::LensNotFound {
                path: head_path.to_string(),
            })?;
        let mut traversal = lens.as_traversal();

        if rest.is_empty() {
            if let FieldType::Nullable(_) = field_type {
                let sig = traversal.signature().clone();
                traversal = traversal.compose(&ValueTraversal::value_nullable(
                    sig.source_field,
                    sig.target_field,
                ))?;
            }
        } else {
            let next = self
                .dtds
                .find_dtd(field_type)
                .ok_or_else(|| SchemaError::NoAssociatedDtd {
                    dtd: dtd.name.clone(),
                    field: head.clone(),
                })?;
            traversal = self.look_through(traversal, field_type)?;
            let tail = self.compose_inner(&OpticalAccessPath::new(next.name.clone(), rest.to_vec()))?;
            traversal = traversal.compose(&tail)?;
        }

        debug!(path = %path, traversal = %traversal, "composed traversal");
        self.composed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), traversal.clone());
        Ok(traversal)
    }

    /// Compose element/unwrap traversals until the focus is the entity
    /// behind `field_type`.
    fn look_through(
        &self,
        mut traversal: ValueTraversal,
        field_type: &FieldType,
    ) -> OpticsResult<ValueTraversal> {
        let mut current = field_type;
        loop {
            match current {
                FieldType::Nullable(item) => {
                    let sig = traversal.signature().clone();
                    traversal = traversal.compose(&ValueTraversal::value_nullable(
                        sig.source_field,
                        sig.target_field,
                    ))?;
                    current = item;
                }
                FieldType::List(item) | FieldType::Array(item) => {
                    let container = self.dtds.field_type_tag(current)?;
                    let item_tag = self.dtds.field_type_tag(item)?;
                    traversal =
                        traversal.compose(&ValueTraversal::value_elements(container, item_tag))?;
                    current = item;
                }
                _ => return Ok(traversal),
            }
        }
    }
}

impl fmt::Debug for OpticsManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpticsManifest")
            .field("lenses", &self.lenses.len())
            .field("descriptors", &self.dtds.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::lens::Lens;
    use crate::signature::OpticSignature;
    use custodian_core::{Record, Value};
    use custodian_schema::DataTypeDescriptor;

    fn location() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("TestLocation")
            .field("name", FieldType::String)
            .field("population", FieldType::Long)
            .build()
            .unwrap()
    }

    fn pet() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("TestPet")
            .field("name", FieldType::String)
            .field("likesFood", FieldType::list(FieldType::String))
            .build()
            .unwrap()
    }

    fn person() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("TestPerson")
            .field("name", FieldType::String)
            .field("nickname", FieldType::nullable(FieldType::String))
            .inner_type(pet())
            .field("pets", FieldType::list(FieldType::nested("TestPet")))
            .field("bestPet", FieldType::nullable(FieldType::nested("TestPet")))
            .field("hometown", FieldType::reference("TestLocation"))
            .field("coords", FieldType::Tuple(vec![FieldType::Double, FieldType::Double]))
            .build()
            .unwrap()
    }

    fn manifest() -> OpticsManifest {
        let dtds = DataTypeDescriptorSet::new([person(), location()]).unwrap();
        OpticsManifest::from_descriptors(dtds).unwrap()
    }

    fn sundae() -> Value {
        Record::new("TestPet")
            .with("name", "Sundae")
            .with("likesFood", vec!["kibble", "cheese"])
            .into()
    }

    fn coconut() -> Value {
        Record::new("TestPet")
            .with("name", "Coconut")
            .with("likesFood", vec!["carrots"])
            .into()
    }

    fn larry() -> Value {
        Record::new("TestPerson")
            .with("name", "Larry")
            .with("nickname", Value::Null)
            .with("pets", vec![sundae(), coconut()])
            .with("bestPet", sundae())
            .with(
                "hometown",
                Record::new("TestLocation")
                    .with("name", "Springfield")
                    .with("population", 30_000i64),
            )
            .into()
    }

    fn person_tag() -> TypeTag {
        TypeTag::new("TestPerson")
    }

    fn path(selectors: &[&str]) -> OpticalAccessPath {
        OpticalAccessPath::new("TestPerson", selectors.iter().copied())
    }

    #[test]
    fn test_from_descriptors_skips_tuples() {
        let manifest = manifest();
        // nine lenses across the three descriptors; TestPerson's coords tuple has none
        assert_eq!(manifest.lens_count(), 9);
    }

    #[test]
    fn test_debug_reports_counts() {
        let rendered = format!("{:?}", manifest());
        assert!(rendered.starts_with("OpticsManifest"), "{rendered}");
        assert!(rendered.contains("lenses: 9"), "{rendered}");
        assert!(rendered.contains("descriptors: 3"), "{rendered}");
    }

    #[test]
    fn test_compose_single_field() {
        let traversal = manifest()
            .compose_mono(&path(&["name"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        let names: Vec<Value> = traversal.every(&larry()).collect();
        assert_eq!(names, vec![Value::from("Larry")]);
    }

    #[test]
    fn test_compose_through_list_of_entities() {
        let traversal = manifest()
            .compose_mono(&path(&["pets", "name"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        assert!(traversal.is_monomorphic());

        let names: Vec<Value> = traversal.every(&larry()).collect();
        assert_eq!(names, vec![Value::from("Sundae"), Value::from("Coconut")]);

        let shouted = traversal.modify(&larry(), |v| match v {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        });
        let again: Vec<Value> = traversal.every(&shouted).collect();
        assert_eq!(again, vec![Value::from("SUNDAE"), Value::from("COCONUT")]);
    }

    #[test]
    fn test_compose_through_nested_lists() {
        let traversal = manifest()
            .compose_mono(&path(&["pets", "likesFood"]), &person_tag(), &TypeTag::new("List<String>"))
            .unwrap();
        assert_eq!(traversal.every(&larry()).count(), 2);
    }

    #[test]
    fn test_compose_through_nullable_and_reference() {
        let manifest = manifest();
        let best = manifest
            .compose_mono(&path(&["bestPet", "name"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        assert_eq!(best.every(&larry()).collect::<Vec<_>>(), vec![Value::from("Sundae")]);

        let town = manifest
            .compose_mono(&path(&["hometown", "population"]), &person_tag(), &TypeTag::LONG)
            .unwrap();
        assert_eq!(town.every(&larry()).collect::<Vec<_>>(), vec![Value::Long(30_000)]);
    }

    #[test]
    fn test_nullable_tail_skips_absent_values() {
        let nickname = manifest()
            .compose_mono(&path(&["nickname"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        assert_eq!(nickname.every(&larry()).count(), 0);
        assert_eq!(
            nickname.modify_with_action(&larry(), |_| Action::OmitFromRoot),
            Action::Update(larry())
        );
    }

    #[test]
    fn test_unknown_dtd() {
        let err = manifest()
            .compose_mono(
                &OpticalAccessPath::new("Car", ["wheels"]),
                &TypeTag::new("Car"),
                &TypeTag::INTEGER,
            )
            .unwrap_err();
        assert_eq!(
            err,
            OpticsError::Schema(SchemaError::DtdNotFound {
                name: "Car".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_field() {
        let err = manifest()
            .compose_mono(&path(&["pets", "age"]), &person_tag(), &TypeTag::INTEGER)
            .unwrap_err();
        assert_eq!(
            err,
            OpticsError::Schema(SchemaError::FieldNotFound {
                dtd: "TestPet".to_string(),
                field: "age".to_string()
            })
        );
    }

    #[test]
    fn test_selecting_into_primitive() {
        let err = manifest()
            .compose_mono(&path(&["name", "length"]), &person_tag(), &TypeTag::INTEGER)
            .unwrap_err();
        assert_eq!(
            err,
            OpticsError::Schema(SchemaError::NoAssociatedDtd {
                dtd: "TestPerson".to_string(),
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn test_missing_lens() {
        let err = manifest()
            .compose_mono(&path(&["coords"]), &person_tag(), &TypeTag::STRING)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "TestPerson::coords has no associated optic."
        );
    }

    #[test]
    fn test_requested_type_mismatch() {
        let err = manifest()
            .compose_mono(&path(&["pets", "name"]), &person_tag(), &TypeTag::INTEGER)
            .unwrap_err();
        match err {
            OpticsError::TypeMismatch {
                requested, actual, ..
            } => {
                assert_eq!(requested, "Integer");
                assert_eq!(actual, "String");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_registered_lens_with_wrong_tags_fails_composition() {
        let bad = Lens::mono(
            OpticalAccessPath::new("TestPerson", ["bestPet"]),
            person_tag(),
            TypeTag::new("TestDog"),
            |v: &Value| v.field("bestPet").cloned().unwrap_or(Value::Null),
            |v: &Value, _| v.clone(),
        );
        let manifest = manifest().with_lens(bad);
        let err = manifest
            .compose_mono(&path(&["bestPet", "name"]), &person_tag(), &TypeTag::STRING)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TestDog"), "{message}");
        assert!(message.contains("TestPet"), "{message}");
    }

    #[test]
    fn test_polymorphic_lens() {
        let retype = Lens::new(
            OpticalAccessPath::new("TestLocation", ["name"]),
            OpticalAccessPath::new("TestCity", ["name"]),
            OpticSignature::new(
                TypeTag::new("TestLocation"),
                TypeTag::new("TestCity"),
                TypeTag::STRING,
                TypeTag::STRING,
            ),
            |v: &Value| v.field("name").cloned().unwrap_or(Value::Null),
            |v: &Value, name| match v {
                Value::Record(r) => Value::Record(r.retyped("TestCity").with_field("name", name)),
                other => other.clone(),
            },
        );
        let manifest = manifest().with_lens(retype);

        let traversal = manifest
            .compose_poly(
                &OpticalAccessPath::new("TestLocation", ["name"]),
                &TypeTag::new("TestLocation"),
                &TypeTag::new("TestCity"),
                &TypeTag::STRING,
                &TypeTag::STRING,
            )
            .unwrap();
        assert!(!traversal.is_monomorphic());

        let town = Value::from(Record::new("TestLocation").with("name", "Springfield"));
        let city = traversal.modify(&town, |_| Value::from("Shelbyville"));
        let record = city.as_record().unwrap();
        assert_eq!(record.type_name(), "TestCity");
        assert_eq!(record.get("name"), Some(&Value::from("Shelbyville")));

        assert!(manifest
            .compose_mono(
                &OpticalAccessPath::new("TestLocation", ["name"]),
                &TypeTag::new("TestLocation"),
                &TypeTag::STRING,
            )
            .is_err());
    }

    #[test]
    fn test_compositions_are_memoized() {
        let manifest = manifest();
        let first = manifest
            .compose_mono(&path(&["pets", "name"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        let second = manifest
            .compose_mono(&path(&["pets", "name"]), &person_tag(), &TypeTag::STRING)
            .unwrap();
        assert_eq!(first.source_path(), second.source_path());
        assert!(manifest
            .composed
            .read()
            .unwrap()
            .contains_key(&OpticalAccessPath::new("TestPet", ["name"])));
    }
}
