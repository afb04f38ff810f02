//! Builds redaction pipelines from policy targets.

use std::sync::Arc;

use custodian_optics::{OpticalAccessPath, OpticsManifest};
use custodian_policy::{Policy, PolicyField, UsageType};
use custodian_schema::DataTypeDescriptor;
use tracing::debug;

use crate::cantrip::{Cantrip, MultiCantrip, OpticalCantrip};
use crate::error::{CantripError, CantripResult};
use crate::library::OperationLibrary;

/// A redaction required by a policy field for the requested usage
#[derive(Debug)]
struct ConditionalUsage<'a> {
    field_path: &'a [String],
    operation: &'a str,
}

/// Turns the conditional usages of a policy target into a [`MultiCantrip`]
#[derive(Debug, Clone)]
pub struct CantripFactory {
    optics: Arc<OpticsManifest>,
    operations: Arc<OperationLibrary>,
}

impl CantripFactory {
    /// Create a factory over a manifest and an operation library
    #[must_use]
    pub fn new(optics: Arc<OpticsManifest>, operations: Arc<OperationLibrary>) -> Self {
        Self { optics, operations }
    }

    /// The optics manifest
    #[must_use]
    pub fn optics(&self) -> &OpticsManifest {
        &self.optics
    }

    /// Build the pipeline applying every redaction `policy` requires on
    /// `dtd` for `usage`.
    ///
    /// Redactions run in pre-order of the policy's field tree: a field's
    /// own redactions before those of its subfields. Without a policy, a
    /// target for `dtd`, or a manifest entry for `dtd`, the pipeline is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be resolved, its traversal cannot
    /// be composed, or no operation matches its type
    pub fn build_cantrip(
        &self,
        dtd: &DataTypeDescriptor,
        policy: Option<&Policy>,
        usage: UsageType,
    ) -> CantripResult<MultiCantrip> {
        let Some(target) = policy.and_then(|p| p.target(&dtd.name)) else {
            return Ok(MultiCantrip::no_op());
        };
        let dtds = self.optics.descriptors();
        if !dtds.contains(&dtd.name) {
            return Ok(MultiCantrip::no_op());
        }

        let mut usages = Vec::new();
        for field in &target.fields {
            collect_conditional_usages(field, usage, &mut usages);
        }

        let mut cantrips: Vec<Arc<dyn Cantrip>> = Vec::with_capacity(usages.len());
        for conditional in usages {
            let field_type = dtds.find_field_type_or_err(dtd, conditional.field_path)?;
            let field_tag = dtds.field_type_tag(field_type)?;
            let path = OpticalAccessPath::from_dtd(dtd, conditional.field_path.iter());
            let traversal = self
                .optics
                .compose_mono(&path, &dtd.type_tag, &field_tag)?;
            let operation = self
                .operations
                .find(conditional.operation, &field_tag, &field_tag)
                .ok_or_else(|| CantripError::OperationNotFound {
                    name: conditional.operation.to_string(),
                    type_name: field_tag.to_string(),
                })?;
            debug!(path = %path, operation = %operation, "redaction stage");
            cantrips.push(Arc::new(OpticalCantrip::new(traversal, operation.clone())));
        }

        debug!(
            dtd = %dtd.name,
            usage = %usage,
            stages = cantrips.len(),
            "built cantrip"
        );
        Ok(MultiCantrip::new(cantrips))
    }
}

fn collect_conditional_usages<'a>(
    field: &'a PolicyField,
    usage: UsageType,
    out: &mut Vec<ConditionalUsage<'a>>,
) {
    for operation in field.redactions_for(usage) {
        out.push(ConditionalUsage {
            field_path: &field.field_path,
            operation,
        });
    }
    for subfield in &field.subfields {
        collect_conditional_usages(subfield, usage, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empties::EMPTY;
    use custodian_core::{Duration, Record, TypeTag, Value};
    use custodian_optics::Action;
    use custodian_policy::{PolicyBuilder, StorageMedium};
    use custodian_schema::{DataTypeDescriptorSet, FieldType};

    use crate::operation::Operation;

    fn pet() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("Pet")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer)
            .build()
            .unwrap()
    }

    fn person() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .field("nickname", FieldType::nullable(FieldType::String))
            .field("age", FieldType::Integer)
            .field("pets", FieldType::list(FieldType::nested("Pet")))
            .inner_type(pet())
            .build()
            .unwrap()
    }

    fn factory() -> CantripFactory {
        let dtds = DataTypeDescriptorSet::new([person()]).unwrap();
        let optics = OpticsManifest::from_descriptors(dtds).unwrap();
        let reverse = Operation::mono("Reversed", TypeTag::STRING, |v| match v {
            Value::String(s) => Action::Update(Value::String(s.chars().rev().collect())),
            other => Action::Update(other),
        });
        let operations = OperationLibrary::with_defaults().with_operation(reverse);
        CantripFactory::new(Arc::new(optics), Arc::new(operations))
    }

    fn larry() -> Value {
        Record::new("Person")
            .with("name", "Larry")
            .with("nickname", Value::Null)
            .with("age", 42)
            .with(
                "pets",
                vec![
                    Value::from(Record::new("Pet").with("name", "Sundae").with("age", 3)),
                    Value::from(Record::new("Pet").with("name", "Coconut").with("age", 5)),
                ],
            )
            .into()
    }

    fn policy() -> Policy {
        PolicyBuilder::new("Redacting", "Analytics")
            .description("redacts")
            .target(&person(), Duration::from_days(1), |t| {
                t.retention(StorageMedium::Ram, false)
                    .field("name", |f| {
                        f.raw_usage(UsageType::Join)
                            .conditional_usage("Reversed", UsageType::Egress)
                            .conditional_usage(EMPTY, UsageType::Sandbox)
                    })
                    .field("nickname", |f| f.conditional_usage(EMPTY, UsageType::Any))
                    .field("age", |f| f.conditional_usage(EMPTY, UsageType::Egress))
                    .field("pets", |f| {
                        f.field("name", |f| f.conditional_usage(EMPTY, UsageType::Egress))
                    })
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_no_policy_or_target_is_no_op() {
        let factory = factory();
        assert!(factory
            .build_cantrip(&person(), None, UsageType::Egress)
            .unwrap()
            .is_no_op());

        let unrelated = PolicyBuilder::new("Other", "Analytics")
            .target(&pet(), Duration::zero(), |t| t)
            .build()
            .unwrap();
        assert!(factory
            .build_cantrip(&person(), Some(&unrelated), UsageType::Egress)
            .unwrap()
            .is_no_op());
    }

    #[test]
    fn test_unknown_descriptor_is_no_op() {
        let stranger = DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .build()
            .unwrap();
        let dtds = DataTypeDescriptorSet::new([pet()]).unwrap();
        let factory = CantripFactory::new(
            Arc::new(OpticsManifest::from_descriptors(dtds).unwrap()),
            Arc::new(OperationLibrary::with_defaults()),
        );
        let policy = PolicyBuilder::new("P", "Analytics")
            .target(&stranger, Duration::zero(), |t| {
                t.field("name", |f| f.conditional_usage(EMPTY, UsageType::Any))
            })
            .build()
            .unwrap();
        assert!(factory
            .build_cantrip(&stranger, Some(&policy), UsageType::Egress)
            .unwrap()
            .is_no_op());
    }

    #[test]
    fn test_egress_redactions() {
        let cantrip = factory()
            .build_cantrip(&person(), Some(&policy()), UsageType::Egress)
            .unwrap();
        // name (Reversed), nickname (ANY), age, pets.name
        assert_eq!(cantrip.len(), 4);

        let out = cantrip.apply(&larry()).unwrap().unwrap();
        assert_eq!(out.field("name"), Some(&Value::from("yrraL")));
        assert_eq!(out.field("nickname"), Some(&Value::Null));
        assert_eq!(out.field("age"), Some(&Value::Int(0)));
        let pets = out.field("pets").and_then(Value::as_list).unwrap();
        assert_eq!(pets[0].field("name"), Some(&Value::from("")));
        assert_eq!(pets[1].field("age"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_usage_selects_redactions() {
        let factory = factory();
        let sandbox = factory
            .build_cantrip(&person(), Some(&policy()), UsageType::Sandbox)
            .unwrap();
        let out = sandbox.apply(&larry()).unwrap().unwrap();
        assert_eq!(out.field("name"), Some(&Value::from("")));
        assert_eq!(out.field("age"), Some(&Value::Int(42)));

        let join = factory
            .build_cantrip(&person(), Some(&policy()), UsageType::Join)
            .unwrap();
        assert_eq!(join.len(), 1);
    }

    #[test]
    fn test_missing_operation() {
        let policy = PolicyBuilder::new("Hashing", "Analytics")
            .target(&person(), Duration::zero(), |t| {
                t.field("age", |f| f.conditional_usage("HASH", UsageType::Egress))
            })
            .build()
            .unwrap();
        let err = factory()
            .build_cantrip(&person(), Some(&policy), UsageType::Egress)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No Operation found with name: HASH for type: Integer"
        );
    }
}
