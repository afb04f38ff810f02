//! Structural checks applied to a policy set before it is used.

use tracing::debug;

use crate::error::ConformanceError;
use crate::model::Policy;

/// Validates that a collection of policies is well formed
pub trait PolicyConformanceCheck: Send + Sync {
    /// Check every policy
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::MalformedPolicySet`] listing each issue
    fn check_policies_conform(&self, policies: &[Policy]) -> Result<(), ConformanceError>;
}

/// Requires a description on every policy and at least one retention on
/// every target.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicyConformanceCheck;

impl DefaultPolicyConformanceCheck {
    fn issues(policy: &Policy) -> Vec<String> {
        let mut issues = Vec::new();
        if policy.description.is_empty() {
            issues.push(format!(
                "Policy: \"{}\" has an empty description",
                policy.name
            ));
        }
        for target in &policy.targets {
            if target.retentions.is_empty() {
                issues.push(format!(
                    "Target \"{}\" from policy: \"{}\" does not specify any retention rules",
                    target.schema_name, policy.name
                ));
            }
        }
        issues
    }
}

impl PolicyConformanceCheck for DefaultPolicyConformanceCheck {
    fn check_policies_conform(&self, policies: &[Policy]) -> Result<(), ConformanceError> {
        let issues: Vec<String> = policies.iter().flat_map(Self::issues).collect();
        if issues.is_empty() {
            return Ok(());
        }
        debug!(count = issues.len(), "malformed policies");
        Err(ConformanceError::MalformedPolicySet(format!(
            "Malformed policies found: {}",
            issues.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PolicyBuilder;
    use crate::model::StorageMedium;
    use custodian_core::Duration;
    use custodian_schema::{DataTypeDescriptor, FieldType};

    fn dtd() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_conforming_policies() {
        let policy = PolicyBuilder::new("Good", "Analytics")
            .description("described")
            .target(&dtd(), Duration::from_days(1), |t| {
                t.retention(StorageMedium::Ram, false)
            })
            .build()
            .unwrap();
        assert!(DefaultPolicyConformanceCheck
            .check_policies_conform(&[policy])
            .is_ok());
        assert!(DefaultPolicyConformanceCheck.check_policies_conform(&[]).is_ok());
    }

    #[test]
    fn test_reports_every_issue() {
        let undescribed = PolicyBuilder::new("NoDescription", "Analytics")
            .target(&dtd(), Duration::from_days(1), |t| {
                t.retention(StorageMedium::Disk, true)
            })
            .build()
            .unwrap();
        let no_retention = PolicyBuilder::new("NoRetention", "Analytics")
            .description("described")
            .target(&dtd(), Duration::from_days(1), |t| t)
            .build()
            .unwrap();

        let err = DefaultPolicyConformanceCheck
            .check_policies_conform(&[undescribed, no_retention])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed policies found: Policy: \"NoDescription\" has an empty description, \
             Target \"Person\" from policy: \"NoRetention\" does not specify any retention rules"
        );
    }
}
