//! Data type descriptors and their builder.

use custodian_core::TypeTag;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldType;

/// Static description of one entity shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeDescriptor {
    /// Unique schema name
    pub name: String,
    /// Fields in declaration order
    pub fields: IndexMap<String, FieldType>,
    /// Descriptors reachable through `Nested` fields
    pub inner_types: Vec<DataTypeDescriptor>,
    /// Runtime type of entities described by this descriptor
    pub type_tag: TypeTag,
}

impl DataTypeDescriptor {
    /// Start building a descriptor
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DataTypeDescriptorBuilder {
        DataTypeDescriptorBuilder::new(name)
    }

    /// Declared type of a direct field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    /// Inner descriptor by name, searching the whole inner graph
    #[must_use]
    pub fn inner_type(&self, name: &str) -> Option<&DataTypeDescriptor> {
        self.inner_types.iter().find_map(|inner| {
            if inner.name == name {
                Some(inner)
            } else {
                inner.inner_type(name)
            }
        })
    }

    /// Every transitively nested descriptor, depth-first
    #[must_use]
    pub fn all_inner_types(&self) -> Vec<&DataTypeDescriptor> {
        let mut out = Vec::new();
        for inner in &self.inner_types {
            out.push(inner);
            out.extend(inner.all_inner_types());
        }
        out
    }
}

/// Builder for [`DataTypeDescriptor`]
#[derive(Debug, Clone)]
pub struct DataTypeDescriptorBuilder {
    name: String,
    fields: IndexMap<String, FieldType>,
    inner_types: Vec<DataTypeDescriptor>,
    type_tag: Option<TypeTag>,
}

impl DataTypeDescriptorBuilder {
    /// Create a builder for the named descriptor
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            inner_types: Vec::new(),
            type_tag: None,
        }
    }

    /// Declare a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Declare a `Nested` field and register its descriptor as an inner type
    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, descriptor: DataTypeDescriptor) -> Self {
        self.fields
            .insert(name.into(), FieldType::Nested(descriptor.name.clone()));
        self.inner_types.push(descriptor);
        self
    }

    /// Register an inner type without declaring a field for it
    #[must_use]
    pub fn inner_type(mut self, descriptor: DataTypeDescriptor) -> Self {
        self.inner_types.push(descriptor);
        self
    }

    /// Override the runtime type tag (defaults to the descriptor name)
    #[must_use]
    pub fn type_tag(mut self, tag: TypeTag) -> Self {
        self.type_tag = Some(tag);
        self
    }

    /// Build the descriptor
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateDescriptor`] if two distinct inner
    /// types within the descriptor graph share a name.
    pub fn build(self) -> SchemaResult<DataTypeDescriptor> {
        let mut seen: IndexMap<&str, &DataTypeDescriptor> = IndexMap::new();
        let mut inner_types: Vec<DataTypeDescriptor> = Vec::new();

        for inner in &self.inner_types {
            for candidate in std::iter::once(inner).chain(inner.all_inner_types()) {
                if candidate.name == self.name {
                    return Err(SchemaError::DuplicateDescriptor {
                        name: candidate.name.clone(),
                    });
                }
                match seen.get(candidate.name.as_str()) {
                    Some(existing) if *existing != candidate => {
                        return Err(SchemaError::DuplicateDescriptor {
                            name: candidate.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(candidate.name.as_str(), candidate);
                    }
                }
            }
            if !inner_types.iter().any(|t| t.name == inner.name) {
                inner_types.push(inner.clone());
            }
        }

        let type_tag = self
            .type_tag
            .unwrap_or_else(|| TypeTag::new(self.name.clone()));

        Ok(DataTypeDescriptor {
            name: self.name,
            fields: self.fields,
            inner_types,
            type_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("Pet")
            .field("name", FieldType::String)
            .field("species", FieldType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_declares_fields_in_order() {
        let person = DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer)
            .nested("pet", pet())
            .build()
            .unwrap();

        let names: Vec<&str> = person.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "age", "pet"]);
        assert_eq!(person.field("pet"), Some(&FieldType::nested("Pet")));
        assert_eq!(person.inner_types.len(), 1);
        assert_eq!(person.type_tag, TypeTag::new("Person"));
    }

    #[test]
    fn test_identical_inner_types_are_deduplicated() {
        let person = DataTypeDescriptor::builder("Person")
            .nested("pet", pet())
            .inner_type(pet())
            .field("pets", FieldType::list(FieldType::nested("Pet")))
            .build()
            .unwrap();
        assert_eq!(person.inner_types.len(), 1);
    }

    #[test]
    fn test_conflicting_inner_types_are_rejected() {
        let other_pet = DataTypeDescriptor::builder("Pet")
            .field("legs", FieldType::Integer)
            .build()
            .unwrap();

        let result = DataTypeDescriptor::builder("Person")
            .nested("pet", pet())
            .nested("otherPet", other_pet)
            .build();

        assert_eq!(
            result,
            Err(SchemaError::DuplicateDescriptor {
                name: "Pet".to_string()
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "DataTypeDescriptor Pet must be unique."
        );
    }

    #[test]
    fn test_inner_type_search_is_transitive() {
        let toy = DataTypeDescriptor::builder("Toy")
            .field("label", FieldType::String)
            .build()
            .unwrap();
        let pet = DataTypeDescriptor::builder("Pet").nested("toy", toy).build().unwrap();
        let person = DataTypeDescriptor::builder("Person").nested("pet", pet).build().unwrap();

        assert!(person.inner_type("Toy").is_some());
        assert_eq!(person.all_inner_types().len(), 2);
    }

    #[test]
    fn test_custom_type_tag() {
        let dtd = DataTypeDescriptor::builder("Person")
            .type_tag(TypeTag::new("com.example.Person"))
            .build()
            .unwrap();
        assert_eq!(dtd.type_tag.name(), "com.example.Person");
    }
}
