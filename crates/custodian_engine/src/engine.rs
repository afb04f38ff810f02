//! Policy decisions for connection requests and write connections.

use custodian_policy::{Policy, PolicyCheck, PolicyCheckResult, PolicyField, UsageType};
use custodian_schema::{DataTypeDescriptor, DataTypeDescriptorSet};
use tracing::debug;

use crate::connection::ConnectionRequest;
use crate::context::ChronicleContext;
use crate::retention::{strategy_complies, verify_management_strategies};

/// Decides whether data may flow under a policy
pub trait PolicyEngine: Send + Sync {
    /// Check a read request against `policy`.
    ///
    /// Every violation is reported, not just the first.
    fn check_policy(
        &self,
        policy: &Policy,
        request: &ConnectionRequest,
        context: &ChronicleContext,
    ) -> PolicyCheckResult;

    /// Check that every write-capable data type is stored the way at
    /// least one policy governing it allows
    fn check_write_connections(&self, context: &ChronicleContext) -> PolicyCheckResult;
}

/// The default [`PolicyEngine`].
///
/// A read is allowed when the ambient context satisfies the policy, the
/// policy targets the data type, every field of the data type is usable
/// raw or redacted for the requester's usage, and every data type the
/// policy targets is retained within its retention clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChroniclePolicyEngine;

impl ChroniclePolicyEngine {
    /// Create the engine
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PolicyEngine for ChroniclePolicyEngine {
    fn check_policy(
        &self,
        policy: &Policy,
        request: &ConnectionRequest,
        context: &ChronicleContext,
    ) -> PolicyCheckResult {
        let usage = request.requester.usage_type();
        let mut checks = Vec::new();

        if !policy.allowed_context.invoke(context.connection_context()) {
            checks.push(PolicyCheck::new(
                "Connection context fails to meet required policy conditions",
            ));
        }

        match context.find_data_type(&request.connection_name) {
            None => checks.push(PolicyCheck::new(format!(
                "{} is not a registered connection",
                request.connection_name
            ))),
            Some(data_type) => {
                let dtd = &data_type.descriptor;
                match policy.target(&dtd.name) {
                    None => checks.push(PolicyCheck::new(format!(
                        "{} is not found in the given policy",
                        dtd.name
                    ))),
                    Some(target) => {
                        let walk = FieldWalk {
                            root: &dtd.name,
                            usage,
                            dtds: context.dtds(),
                        };
                        walk.check(dtd, &target.fields, "", &mut checks);
                    }
                }
            }
        }

        checks.extend(verify_management_strategies(policy, context.data_types()));

        debug!(
            policy = %policy.name,
            connection = %request.connection_name,
            usage = %usage,
            violations = checks.len(),
            "checked policy"
        );
        PolicyCheckResult::from_checks(checks)
    }

    fn check_write_connections(&self, context: &ChronicleContext) -> PolicyCheckResult {
        let mut checks = Vec::new();
        for data_type in context.data_types().filter(|dt| dt.is_write_capable()) {
            let name = &data_type.descriptor.name;
            let mut targets = context.policy_set().targets_for(name).peekable();
            if targets.peek().is_none() {
                checks.push(PolicyCheck::new(format!(
                    "{name} must have a corresponding policy"
                )));
                continue;
            }
            if !targets.any(|(_, target)| strategy_complies(&data_type.management_strategy, target))
            {
                checks.push(PolicyCheck::new(format!(
                    "{name} management is less restrained than every policy retention"
                )));
            }
        }
        debug!(violations = checks.len(), "checked write connections");
        PolicyCheckResult::from_checks(checks)
    }
}

/// Walks a descriptor in lockstep with the policy's field tree
struct FieldWalk<'a> {
    root: &'a str,
    usage: UsageType,
    dtds: &'a DataTypeDescriptorSet,
}

impl FieldWalk<'_> {
    fn check(
        &self,
        dtd: &DataTypeDescriptor,
        policy_fields: &[PolicyField],
        prefix: &str,
        checks: &mut Vec<PolicyCheck>,
    ) {
        for (name, field_type) in &dtd.fields {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            let Some(policy_field) = policy_fields.iter().find(|f| f.name() == name) else {
                checks.push(self.violation(&path));
                continue;
            };

            let inner = field_type.entity_name().and_then(|entity| {
                self.dtds
                    .get_or_none(entity)
                    .or_else(|| dtd.inner_type(entity))
            });
            match inner {
                Some(inner) => self.check(inner, &policy_field.subfields, &path, checks),
                None => {
                    if !policy_field.allows_raw(self.usage)
                        && !policy_field.allows_redacted(self.usage)
                    {
                        checks.push(self.violation(&path));
                    }
                }
            }
        }
    }

    fn violation(&self, path: &str) -> PolicyCheck {
        PolicyCheck::new(format!(
            "{}.{} is not allowed for {}",
            self.root,
            path,
            self.usage.label()
        ))
    }
}
