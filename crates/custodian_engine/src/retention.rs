//! Validation of how data is stored against the retention clauses of the
//! policies governing it.

use custodian_policy::{ManagementStrategy, Policy, PolicyCheck, PolicyTarget};

use crate::connection::ManagedDataType;

/// Whether `strategy` is allowed by `target`.
///
/// Pass-through always complies. A stored strategy needs one retention
/// clause it fully satisfies and every deletion trigger the target
/// declares; a target without retention clauses admits nothing stored.
#[must_use]
pub fn strategy_complies(strategy: &ManagementStrategy, target: &PolicyTarget) -> bool {
    match strategy {
        ManagementStrategy::PassThru => true,
        ManagementStrategy::Stored { .. } => {
            target
                .retentions
                .iter()
                .any(|retention| strategy.satisfies_retention(retention, target.max_age))
                && target
                    .deletion_triggers()
                    .iter()
                    .all(|trigger| strategy.satisfies(trigger))
        }
    }
}

/// Violations of `policy`'s retention and deletion rules by the given
/// data types. Data types the policy does not target are ignored.
pub fn verify_management_strategies<'a>(
    policy: &Policy,
    data_types: impl IntoIterator<Item = &'a ManagedDataType>,
) -> Vec<PolicyCheck> {
    let mut checks = Vec::new();
    for data_type in data_types {
        let dtd = &data_type.descriptor.name;
        let Some(target) = policy.target(dtd) else {
            continue;
        };
        let strategy = &data_type.management_strategy;
        if matches!(strategy, ManagementStrategy::PassThru) {
            continue;
        }

        if target.retentions.is_empty() {
            checks.push(PolicyCheck::new(format!("{dtd} is not allowed to be retained")));
        } else if !target
            .retentions
            .iter()
            .any(|retention| strategy.satisfies_retention(retention, target.max_age))
        {
            let max_age_ms = target.max_age.as_millis();
            checks.extend(target.retentions.iter().map(|retention| {
                PolicyCheck::new(format!(
                    "{dtd} requires {retention} with maxAgeMs = {max_age_ms}"
                ))
            }));
        }

        checks.extend(
            target
                .deletion_triggers()
                .iter()
                .filter(|trigger| !strategy.satisfies(trigger))
                .map(|trigger| PolicyCheck::new(format!("{dtd} must honor {trigger}"))),
        );
    }
    checks
}
