//! Fluent construction of policies, validated against their schemas.
//!
//! Field names are checked against the target's [`DataTypeDescriptor`] as
//! they are declared. The first validation failure is kept and reported by
//! [`PolicyBuilder::build`], so declarations can be chained without `?`:
//!
//! ```ignore
//! let policy = Policy::builder("PersonAnalytics", "Analytics")
//!     .description("Aggregate statistics over people")
//!     .target(&person, Duration::from_days(2), |t| {
//!         t.retention(StorageMedium::Ram, false)
//!             .field("name", |f| f.raw_usage(UsageType::Join))
//!             .field("pets", |f| f.field("name", |f| f.conditional_usage("EMPTY", UsageType::Egress)))
//!     })
//!     .build()?;
//! ```

use std::collections::BTreeSet;

use custodian_core::Duration;
use custodian_schema::DataTypeDescriptor;
use indexmap::IndexMap;

use crate::context::PolicyContextRule;
use crate::error::{PolicyError, PolicyResult};
use crate::model::{Annotation, Policy, PolicyConfig, PolicyField, PolicyRetention, PolicyTarget, StorageMedium};
use crate::strategy::{DeletionTrigger, Trigger};
use crate::usage::UsageType;

/// Builder of [`Policy`] values
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    name: String,
    egress_type: String,
    description: String,
    allowed_context: PolicyContextRule,
    targets: Vec<PolicyTarget>,
    configs: IndexMap<String, PolicyConfig>,
    error: Option<PolicyError>,
}

impl PolicyBuilder {
    /// Start a policy with an empty description and no context restriction
    #[must_use]
    pub fn new(name: impl Into<String>, egress_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            egress_type: egress_type.into(),
            description: String::new(),
            allowed_context: PolicyContextRule::All,
            targets: Vec::new(),
            configs: IndexMap::new(),
            error: None,
        }
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict the contexts in which the policy applies
    #[must_use]
    pub fn allowed_context(mut self, rule: PolicyContextRule) -> Self {
        self.allowed_context = rule;
        self
    }

    /// Add a target for `dtd`.
    ///
    /// A zero `max_age` means the data may not be held at all.
    #[must_use]
    pub fn target<F>(mut self, dtd: &DataTypeDescriptor, max_age: Duration, block: F) -> Self
    where
        F: FnOnce(PolicyTargetBuilder) -> PolicyTargetBuilder,
    {
        match block(PolicyTargetBuilder::new(dtd, max_age)).build() {
            Ok(target) => self.targets.push(target),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Add a named configuration bundle
    #[must_use]
    pub fn config<I, K, V>(mut self, name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config: PolicyConfig = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.configs.insert(name.into(), config);
        self
    }

    /// Build the policy
    ///
    /// # Errors
    ///
    /// Returns the first field validation failure recorded while building
    pub fn build(self) -> PolicyResult<Policy> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(Policy {
            name: self.name,
            egress_type: self.egress_type,
            description: self.description,
            allowed_context: self.allowed_context,
            targets: self.targets,
            configs: self.configs,
        })
    }
}

/// Builder of [`PolicyTarget`] values
#[derive(Debug, Clone)]
pub struct PolicyTargetBuilder {
    dtd: DataTypeDescriptor,
    max_age: Duration,
    retentions: Vec<PolicyRetention>,
    fields: Vec<PolicyField>,
    annotations: Vec<Annotation>,
    error: Option<PolicyError>,
}

impl PolicyTargetBuilder {
    /// Start a target for `dtd`
    #[must_use]
    pub fn new(dtd: &DataTypeDescriptor, max_age: Duration) -> Self {
        Self {
            dtd: dtd.clone(),
            max_age,
            retentions: Vec::new(),
            fields: Vec::new(),
            annotations: Vec::new(),
            error: None,
        }
    }

    /// Allow retention on `medium`
    #[must_use]
    pub fn retention(mut self, medium: StorageMedium, encryption_required: bool) -> Self {
        let retention = PolicyRetention::new(medium, encryption_required);
        if !self.retentions.contains(&retention) {
            self.retentions.push(retention);
        }
        self
    }

    /// Require deletion when `trigger` fires for the values of `field`.
    /// Nested fields are dot-delimited.
    #[must_use]
    pub fn deletion_trigger(mut self, trigger: Trigger, field: impl Into<String>) -> Self {
        self.annotations
            .push(DeletionTrigger::new(trigger, field).to_annotation());
        self
    }

    /// Attach an annotation
    #[must_use]
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declare rules for a top-level field
    #[must_use]
    pub fn field<F>(mut self, name: &str, block: F) -> Self
    where
        F: FnOnce(PolicyFieldBuilder) -> PolicyFieldBuilder,
    {
        let built = PolicyFieldBuilder::child_of(&self.dtd, Vec::new(), name)
            .and_then(|builder| block(builder).build());
        match built {
            Ok(field) => self.fields.push(field),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Build the target
    ///
    /// # Errors
    ///
    /// Returns the first field validation failure
    pub fn build(self) -> PolicyResult<PolicyTarget> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(PolicyTarget {
            schema_name: self.dtd.name,
            max_age: self.max_age,
            retentions: self.retentions,
            fields: self.fields,
            annotations: self.annotations,
        })
    }
}

/// Builder of [`PolicyField`] values
#[derive(Debug, Clone)]
pub struct PolicyFieldBuilder {
    dtd: Option<DataTypeDescriptor>,
    field_path: Vec<String>,
    raw_usages: BTreeSet<UsageType>,
    redacted_usages: IndexMap<String, BTreeSet<UsageType>>,
    subfields: Vec<PolicyField>,
    annotations: Vec<Annotation>,
    error: Option<PolicyError>,
}

impl PolicyFieldBuilder {
    /// Builder for field `name` of `parent`, which must declare it.
    ///
    /// The new builder carries the field's entity descriptor when the field
    /// holds a nested entity, possibly through lists or nullability.
    fn child_of(
        parent: &DataTypeDescriptor,
        mut field_path: Vec<String>,
        name: &str,
    ) -> PolicyResult<Self> {
        let field_type = parent.field(name).ok_or_else(|| PolicyError::FieldNotFound {
            field: name.to_string(),
            dtd: parent.name.clone(),
        })?;
        let dtd = match field_type.innermost() {
            custodian_schema::FieldType::Nested(entity) => parent.inner_type(entity).cloned(),
            _ => None,
        };
        field_path.push(name.to_string());
        Ok(Self {
            dtd,
            field_path,
            raw_usages: BTreeSet::new(),
            redacted_usages: IndexMap::new(),
            subfields: Vec::new(),
            annotations: Vec::new(),
            error: None,
        })
    }

    /// Allow the raw value for `usage`
    #[must_use]
    pub fn raw_usage(mut self, usage: UsageType) -> Self {
        self.raw_usages.insert(usage);
        self
    }

    /// Allow the raw value for each of `usages`
    #[must_use]
    pub fn raw_usages(mut self, usages: impl IntoIterator<Item = UsageType>) -> Self {
        self.raw_usages.extend(usages);
        self
    }

    /// Allow `usage` once the operation named `label` has been applied.
    /// Repeated calls for the same label accumulate.
    #[must_use]
    pub fn conditional_usage(mut self, label: impl Into<String>, usage: UsageType) -> Self {
        self.redacted_usages
            .entry(label.into())
            .or_default()
            .insert(usage);
        self
    }

    /// Attach an annotation
    #[must_use]
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declare rules for a field of this field's entity
    #[must_use]
    pub fn field<F>(mut self, name: &str, block: F) -> Self
    where
        F: FnOnce(PolicyFieldBuilder) -> PolicyFieldBuilder,
    {
        let built = match &self.dtd {
            Some(dtd) => Self::child_of(dtd, self.field_path.clone(), name)
                .and_then(|builder| block(builder).build()),
            None => Err(PolicyError::NonEntityLookup {
                field: name.to_string(),
            }),
        };
        match built {
            Ok(field) => self.subfields.push(field),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Build the field
    ///
    /// # Errors
    ///
    /// Returns the first subfield validation failure
    pub fn build(self) -> PolicyResult<PolicyField> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(PolicyField {
            field_path: self.field_path,
            raw_usages: self.raw_usages,
            redacted_usages: self.redacted_usages,
            subfields: self.subfields,
            annotations: self.annotations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodian_schema::FieldType;

    fn person() -> DataTypeDescriptor {
        let pet = DataTypeDescriptor::builder("Pet")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer)
            .build()
            .unwrap();
        DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .field("tags", FieldType::list(FieldType::String))
            .field("pets", FieldType::list(FieldType::nested("Pet")))
            .field("bestPet", FieldType::nullable(FieldType::nested("Pet")))
            .inner_type(pet)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_policy() {
        let policy = PolicyBuilder::new("PersonPolicy", "Analytics")
            .description("People")
            .allowed_context(PolicyContextRule::key_present("consent"))
            .target(&person(), Duration::from_days(2), |t| {
                t.retention(StorageMedium::Ram, false)
                    .retention(StorageMedium::Ram, false)
                    .deletion_trigger(Trigger::PackageUninstalled, "name")
                    .field("name", |f| f.raw_usage(UsageType::Join))
                    .field("pets", |f| {
                        f.field("name", |f| {
                            f.conditional_usage("EMPTY", UsageType::Egress)
                                .conditional_usage("EMPTY", UsageType::Join)
                        })
                    })
            })
            .config("storage", [("table", "people")])
            .build()
            .unwrap();

        assert_eq!(policy.name, "PersonPolicy");
        assert_eq!(policy.egress_type, "Analytics");
        assert_eq!(policy.description, "People");
        assert_eq!(policy.configs["storage"]["table"], "people");

        let target = policy.target("Person").unwrap();
        assert_eq!(target.retentions.len(), 1);
        assert_eq!(target.max_age, Duration::from_days(2));
        assert_eq!(target.deletion_triggers().len(), 1);

        let pets = target.field("pets").unwrap();
        let pet_name = &pets.subfields[0];
        assert_eq!(pet_name.field_path, vec!["pets", "name"]);
        assert_eq!(pet_name.redacted_usages["EMPTY"].len(), 2);
    }

    #[test]
    fn test_defaults() {
        let policy = PolicyBuilder::new("Bare", "Egress").build().unwrap();
        assert_eq!(policy.description, "");
        assert_eq!(policy.allowed_context, PolicyContextRule::All);
        assert!(policy.targets.is_empty());
    }

    #[test]
    fn test_unknown_field() {
        let err = PolicyBuilder::new("Bad", "Egress")
            .target(&person(), Duration::zero(), |t| {
                t.field("age", |f| f.raw_usage(UsageType::Any))
            })
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'age' not found in 'Person'.");
    }

    #[test]
    fn test_unknown_nested_field() {
        let err = PolicyBuilder::new("Bad", "Egress")
            .target(&person(), Duration::zero(), |t| {
                t.field("bestPet", |f| f.field("color", |f| f))
            })
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'color' not found in 'Pet'.");
    }

    #[test]
    fn test_subfield_of_primitive() {
        let err = PolicyBuilder::new("Bad", "Egress")
            .target(&person(), Duration::zero(), |t| {
                t.field("tags", |f| f.field("length", |f| f))
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Trying to lookup field 'length' in a non-entity type."
        );
    }

    #[test]
    fn test_first_error_wins() {
        let err = PolicyBuilder::new("Bad", "Egress")
            .target(&person(), Duration::zero(), |t| {
                t.field("first", |f| f).field("second", |f| f)
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::FieldNotFound {
                field: "first".to_string(),
                dtd: "Person".to_string()
            }
        );
    }
}
