//! Runtime configuration.

use custodian_core::CoreResult;
use serde::{Deserialize, Serialize};

/// What the runtime does when a policy check fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyMode {
    /// Reject the request, or refuse to start
    #[default]
    Strict,
    /// Log the violation and carry on
    Log,
}

/// Configuration of a [`Custodian`](crate::Custodian) runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodianConfig {
    /// Enforcement mode
    pub policy_mode: PolicyMode,
    /// Whether to run the policy conformance check at startup
    pub enforce_conformance: bool,
}

impl Default for CustodianConfig {
    fn default() -> Self {
        Self {
            policy_mode: PolicyMode::Strict,
            enforce_conformance: true,
        }
    }
}

impl CustodianConfig {
    /// Parse a JSON configuration; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`](custodian_core::CoreError::InvalidConfig)
    /// if the input is not a valid configuration
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the enforcement mode
    #[must_use]
    pub fn policy_mode(mut self, mode: PolicyMode) -> Self {
        self.policy_mode = mode;
        self
    }

    /// Enable or disable the startup conformance check
    #[must_use]
    pub fn enforce_conformance(mut self, enforce: bool) -> Self {
        self.enforce_conformance = enforce;
        self
    }
}
