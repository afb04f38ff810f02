//! Indexed collection of policies.

use indexmap::IndexMap;

use crate::model::{Policy, PolicyTarget};
use crate::strategy::ManagementStrategy;

/// The policies known to a runtime, with retention requirements
/// pre-rendered per data type.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    policies: Vec<Policy>,
    strategies: IndexMap<String, Vec<ManagementStrategy>>,
}

impl PolicySet {
    /// Index a collection of policies
    #[must_use]
    pub fn new(policies: impl IntoIterator<Item = Policy>) -> Self {
        let policies: Vec<Policy> = policies.into_iter().collect();
        let mut strategies: IndexMap<String, Vec<ManagementStrategy>> = IndexMap::new();
        for target in policies.iter().flat_map(|p| p.targets.iter()) {
            let entry = strategies.entry(target.schema_name.clone()).or_default();
            for strategy in target.retentions_as_strategies() {
                if !entry.contains(&strategy) {
                    entry.push(strategy);
                }
            }
        }
        Self {
            policies,
            strategies,
        }
    }

    /// Policy by name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// Whether this exact policy is in the set
    #[must_use]
    pub fn contains(&self, policy: &Policy) -> bool {
        self.position(policy).is_some()
    }

    /// Index of this exact policy in the set.
    ///
    /// Names need not be unique, so this is the only stable identity of a
    /// policy within one set.
    #[must_use]
    pub fn position(&self, policy: &Policy) -> Option<usize> {
        self.policies.iter().position(|p| p == policy)
    }

    /// Every target governing `schema_name`, with its policy
    pub fn targets_for<'a>(
        &'a self,
        schema_name: &'a str,
    ) -> impl Iterator<Item = (&'a Policy, &'a PolicyTarget)> + 'a {
        self.policies.iter().flat_map(move |policy| {
            policy
                .targets
                .iter()
                .filter(move |t| t.schema_name == schema_name)
                .map(move |t| (policy, t))
        })
    }

    /// Management strategies the policies allow for `dtd_name`
    #[must_use]
    pub fn find_management_strategies(&self, dtd_name: &str) -> &[ManagementStrategy] {
        self.strategies
            .get(dtd_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over the policies
    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    /// Policies as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[Policy] {
        &self.policies
    }

    /// Number of policies
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl FromIterator<Policy> for PolicySet {
    fn from_iter<I: IntoIterator<Item = Policy>>(iter: I) -> Self {
        Self::new(iter)
    }
}
