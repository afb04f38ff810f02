//! Outcomes of checking requests against policies.

use std::fmt;

/// A single violation message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyCheck(pub String);

impl PolicyCheck {
    /// Create a check message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Message text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of checking a request against a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyCheckResult {
    /// Every rule is met
    Pass,
    /// One or more rules are violated
    Fail(Vec<PolicyCheck>),
}

impl PolicyCheckResult {
    /// `Pass` when there are no violations, `Fail` otherwise
    #[must_use]
    pub fn from_checks(checks: Vec<PolicyCheck>) -> Self {
        if checks.is_empty() {
            Self::Pass
        } else {
            Self::Fail(checks)
        }
    }

    /// Whether the check passed
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Violations, empty on pass
    #[must_use]
    pub fn violations(&self) -> &[PolicyCheck] {
        match self {
            Self::Pass => &[],
            Self::Fail(checks) => checks,
        }
    }

    /// Combined failure message, `[first, second]`
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Pass => None,
            Self::Fail(checks) => {
                let joined: Vec<&str> = checks.iter().map(PolicyCheck::message).collect();
                Some(format!("[{}]", joined.join(", ")))
            }
        }
    }
}
