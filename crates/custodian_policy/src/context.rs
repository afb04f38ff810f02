//! Connection contexts and the rules policies evaluate against them.

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ambient key/value facts about the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionContext {
    /// Context entries
    pub entries: IndexMap<String, serde_json::Value>,
}

impl ConnectionContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up an entry
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Whether an entry is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

type Predicate = Arc<dyn Fn(&ConnectionContext) -> bool + Send + Sync>;

/// A named predicate over a [`ConnectionContext`].
///
/// Rules compose with [`PolicyContextRule::and`], [`PolicyContextRule::or`]
/// and `!`.
#[derive(Clone)]
pub enum PolicyContextRule {
    /// Always satisfied
    All,
    /// Both operands satisfied
    And(Box<PolicyContextRule>, Box<PolicyContextRule>),
    /// Either operand satisfied
    Or(Box<PolicyContextRule>, Box<PolicyContextRule>),
    /// Operand not satisfied
    Not(Box<PolicyContextRule>),
    /// Entry present with exactly this value
    KeyEquals {
        /// Context key
        key: String,
        /// Required value
        value: serde_json::Value,
    },
    /// Entry present
    KeyPresent(String),
    /// String entry matching a pattern
    KeyMatches {
        /// Context key
        key: String,
        /// Pattern the value must match
        pattern: Regex,
    },
    /// Caller-supplied predicate
    Custom {
        /// Rule name
        name: String,
        /// Predicate body
        predicate: Predicate,
    },
}

impl PolicyContextRule {
    /// Rule requiring `key` to equal `value`
    #[must_use]
    pub fn key_equals(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::KeyEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Rule requiring `key` to be present
    #[must_use]
    pub fn key_present(key: impl Into<String>) -> Self {
        Self::KeyPresent(key.into())
    }

    /// Rule requiring the string at `key` to match `pattern`
    #[must_use]
    pub fn key_matches(key: impl Into<String>, pattern: Regex) -> Self {
        Self::KeyMatches {
            key: key.into(),
            pattern,
        }
    }

    /// Rule backed by an arbitrary predicate
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ConnectionContext) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Conjunction
    #[must_use]
    pub fn and(self, other: PolicyContextRule) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction
    #[must_use]
    pub fn or(self, other: PolicyContextRule) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Rule name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::All => "All",
            Self::And(..) => "And",
            Self::Or(..) => "Or",
            Self::Not(_) => "Not",
            Self::KeyEquals { .. } => "KeyEquals",
            Self::KeyPresent(_) => "KeyPresent",
            Self::KeyMatches { .. } => "KeyMatches",
            Self::Custom { name, .. } => name,
        }
    }

    /// Immediate sub-rules
    #[must_use]
    pub fn operands(&self) -> Vec<&PolicyContextRule> {
        match self {
            Self::And(a, b) | Self::Or(a, b) => vec![a, b],
            Self::Not(inner) => vec![inner],
            _ => Vec::new(),
        }
    }

    /// Evaluate against a context
    #[must_use]
    pub fn invoke(&self, context: &ConnectionContext) -> bool {
        match self {
            Self::All => true,
            Self::And(a, b) => a.invoke(context) && b.invoke(context),
            Self::Or(a, b) => a.invoke(context) || b.invoke(context),
            Self::Not(inner) => !inner.invoke(context),
            Self::KeyEquals { key, value } => context.get(key) == Some(value),
            Self::KeyPresent(key) => context.contains_key(key),
            Self::KeyMatches { key, pattern } => context
                .get(key)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
            Self::Custom { predicate, .. } => predicate(context),
        }
    }
}

impl Default for PolicyContextRule {
    fn default() -> Self {
        Self::All
    }
}

impl Not for PolicyContextRule {
    type Output = PolicyContextRule;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

impl PartialEq for PolicyContextRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::All, Self::All) => true,
            (Self::And(a1, b1), Self::And(a2, b2)) | (Self::Or(a1, b1), Self::Or(a2, b2)) => {
                a1 == a2 && b1 == b2
            }
            (Self::Not(a), Self::Not(b)) => a == b,
            (
                Self::KeyEquals { key: k1, value: v1 },
                Self::KeyEquals { key: k2, value: v2 },
            ) => k1 == k2 && v1 == v2,
            (Self::KeyPresent(a), Self::KeyPresent(b)) => a == b,
            (
                Self::KeyMatches {
                    key: k1,
                    pattern: p1,
                },
                Self::KeyMatches {
                    key: k2,
                    pattern: p2,
                },
            ) => k1 == k2 && p1.as_str() == p2.as_str(),
            (
                Self::Custom {
                    name: n1,
                    predicate: p1,
                },
                Self::Custom {
                    name: n2,
                    predicate: p2,
                },
            ) => n1 == n2 && Arc::ptr_eq(p1, p2),
            _ => false,
        }
    }
}

impl fmt::Debug for PolicyContextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for PolicyContextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::And(a, b) => write!(f, "({a} and {b})"),
            Self::Or(a, b) => write!(f, "({a} or {b})"),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::KeyEquals { key, value } => write!(f, "{key} == {value}"),
            Self::KeyPresent(key) => write!(f, "{key} present"),
            Self::KeyMatches { key, pattern } => write!(f, "{key} ~ /{}/", pattern.as_str()),
            Self::Custom { name, .. } => write!(f, "{name}"),
        }
    }
}
