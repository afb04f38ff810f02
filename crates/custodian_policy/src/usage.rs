//! Usage types: the consumption contexts policies gate on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A labelled consumption context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageType {
    /// Every usage
    Any,
    /// Data leaves the process
    Egress,
    /// Data is joined with other data
    Join,
    /// Data is processed inside a sandbox
    Sandbox,
}

impl UsageType {
    /// Lower-case label used in violation messages
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Egress => "egress",
            Self::Join => "join",
            Self::Sandbox => "sandbox",
        }
    }

    /// Whether a set of raw usages permits this usage.
    ///
    /// `Any` permits everything, and data allowed to egress may also be
    /// processed in a sandbox.
    #[must_use]
    pub fn permitted_by(self, usages: &BTreeSet<UsageType>) -> bool {
        usages.contains(&self)
            || usages.contains(&Self::Any)
            || (self == Self::Sandbox && usages.contains(&Self::Egress))
    }

    /// Whether a conditional usage set applies to this usage
    #[must_use]
    pub fn matched_by(self, usages: &BTreeSet<UsageType>) -> bool {
        usages.contains(&self) || usages.contains(&Self::Any)
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Egress => write!(f, "EGRESS"),
            Self::Join => write!(f, "JOIN"),
            Self::Sandbox => write!(f, "SANDBOX"),
        }
    }
}
