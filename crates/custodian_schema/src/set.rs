//! Descriptor registry.

use custodian_core::TypeTag;
use indexmap::IndexMap;

use crate::descriptor::DataTypeDescriptor;
use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldType;

/// Registry indexing descriptors, and all of their inner types, by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTypeDescriptorSet {
    by_name: IndexMap<String, DataTypeDescriptor>,
}

impl DataTypeDescriptorSet {
    /// Index the given descriptors and everything nested within them.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::DuplicateDescriptor`] if two distinct descriptors
    ///   share a name
    /// - [`SchemaError::UnresolvedReference`] if a `Nested`/`Reference`
    ///   field names a descriptor that is not part of the set
    pub fn new(dtds: impl IntoIterator<Item = DataTypeDescriptor>) -> SchemaResult<Self> {
        let mut by_name: IndexMap<String, DataTypeDescriptor> = IndexMap::new();

        for dtd in dtds {
            let mut pending = vec![dtd];
            while let Some(next) = pending.pop() {
                pending.extend(next.inner_types.iter().cloned());
                match by_name.get(&next.name) {
                    Some(existing) if *existing != next => {
                        return Err(SchemaError::DuplicateDescriptor { name: next.name });
                    }
                    Some(_) => {}
                    None => {
                        by_name.insert(next.name.clone(), next);
                    }
                }
            }
        }

        let set = Self { by_name };
        set.check_references()?;
        Ok(set)
    }

    fn check_references(&self) -> SchemaResult<()> {
        for dtd in self.by_name.values() {
            for (field, field_type) in &dtd.fields {
                if let Some(target) = field_type.entity_name() {
                    if !self.by_name.contains_key(target) {
                        return Err(SchemaError::UnresolvedReference {
                            dtd: dtd.name.clone(),
                            field: field.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Descriptor by name
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DtdNotFound`] if the name is unknown.
    pub fn get(&self, name: &str) -> SchemaResult<&DataTypeDescriptor> {
        self.by_name.get(name).ok_or_else(|| SchemaError::DtdNotFound {
            name: name.to_string(),
        })
    }

    /// Descriptor by name, if registered
    #[must_use]
    pub fn get_or_none(&self, name: &str) -> Option<&DataTypeDescriptor> {
        self.by_name.get(name)
    }

    /// Whether a descriptor is registered under the name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Resolve an access path against a root descriptor.
    ///
    /// Every selector but the last must land on an entity field
    /// (possibly wrapped in lists, arrays or nullables).
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, names a missing field, or
    /// tries to select into a non-entity field.
    pub fn find_field_type_or_err<'a, S: AsRef<str>>(
        &'a self,
        dtd: &'a DataTypeDescriptor,
        access_path: &[S],
    ) -> SchemaResult<&'a FieldType> {
        let (last, init) = access_path.split_last().ok_or_else(|| {
            SchemaError::EmptyAccessPath {
                dtd: dtd.name.clone(),
            }
        })?;

        let mut current = dtd;
        for selector in init {
            let selector = selector.as_ref();
            let field_type = Self::direct_field(current, selector)?;
            current = self
                .find_dtd(field_type)
                .ok_or_else(|| SchemaError::NoAssociatedDtd {
                    dtd: current.name.clone(),
                    field: selector.to_string(),
                })?;
        }
        Self::direct_field(current, last.as_ref())
    }

    /// Resolve an access path, or `None` if any step fails
    #[must_use]
    pub fn find_field_type<'a, S: AsRef<str>>(
        &'a self,
        dtd: &'a DataTypeDescriptor,
        access_path: &[S],
    ) -> Option<&'a FieldType> {
        self.find_field_type_or_err(dtd, access_path).ok()
    }

    fn direct_field<'a>(dtd: &'a DataTypeDescriptor, field: &str) -> SchemaResult<&'a FieldType> {
        dtd.field(field).ok_or_else(|| SchemaError::FieldNotFound {
            dtd: dtd.name.clone(),
            field: field.to_string(),
        })
    }

    /// Descriptor a field type refers to, looking through `Array`, `List`
    /// and `Nullable`; `None` for primitives, opaque types and tuples.
    #[must_use]
    pub fn find_dtd(&self, field_type: &FieldType) -> Option<&DataTypeDescriptor> {
        field_type.entity_name().and_then(|name| self.by_name.get(name))
    }

    /// Runtime type tag of a field type.
    ///
    /// Nullability is not part of the runtime type, so `Nullable(x)` has
    /// the same tag as `x`.
    ///
    /// # Errors
    ///
    /// Returns an error for tuples and for entity references that do not
    /// resolve within the set.
    pub fn field_type_tag(&self, field_type: &FieldType) -> SchemaResult<TypeTag> {
        if let Some(tag) = field_type.leaf_tag() {
            return Ok(tag);
        }
        match field_type {
            FieldType::Array(item) => Ok(TypeTag::array_of(&self.field_type_tag(item)?)),
            FieldType::List(item) => Ok(TypeTag::list_of(&self.field_type_tag(item)?)),
            FieldType::Nullable(item) => self.field_type_tag(item),
            FieldType::Nested(name) | FieldType::Reference(name) => {
                Ok(self.get(name)?.type_tag.clone())
            }
            other => Err(SchemaError::UnsupportedFieldType {
                field_type: other.to_string(),
            }),
        }
    }

    /// Registered descriptors
    pub fn iter(&self) -> impl Iterator<Item = &DataTypeDescriptor> {
        self.by_name.values()
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
