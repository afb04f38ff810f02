//! Policy data model.

use std::collections::BTreeSet;
use std::fmt;

use custodian_core::Duration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::builder::PolicyBuilder;
use crate::context::PolicyContextRule;
use crate::strategy::{DeletionTrigger, ManagementStrategy, StorageMedia};
use crate::usage::UsageType;

/// Storage medium a retention clause allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageMedium {
    /// Volatile memory
    Ram,
    /// Persistent storage
    Disk,
}

impl StorageMedium {
    /// The riskiest management media this medium admits
    #[must_use]
    pub fn as_media(&self) -> StorageMedia {
        match self {
            Self::Ram => StorageMedia::Memory,
            Self::Disk => StorageMedia::LocalDisk,
        }
    }
}

impl fmt::Display for StorageMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ram => write!(f, "RAM"),
            Self::Disk => write!(f, "DISK"),
        }
    }
}

/// One allowed way to retain data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRetention {
    /// Allowed medium
    pub medium: StorageMedium,
    /// Whether data must be encrypted at rest
    pub encryption_required: bool,
}

impl PolicyRetention {
    /// Create a retention clause
    #[must_use]
    pub fn new(medium: StorageMedium, encryption_required: bool) -> Self {
        Self {
            medium,
            encryption_required,
        }
    }
}

impl fmt::Display for PolicyRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PolicyRetention(medium={}, encryptionRequired={})",
            self.medium, self.encryption_required
        )
    }
}

/// Annotation parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationParam {
    /// String parameter
    Str(String),
    /// Numeric parameter
    Num(i64),
    /// Boolean parameter
    Bool(bool),
}

/// Named metadata attached to targets and fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name
    pub name: String,
    /// Parameters by name
    #[serde(default)]
    pub params: IndexMap<String, AnnotationParam>,
}

impl Annotation {
    /// Annotation without parameters
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: AnnotationParam) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// String parameter by name
    #[must_use]
    pub fn str_param(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(AnnotationParam::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Usage rules for one field of a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyField {
    /// Path from the target root to this field
    pub field_path: Vec<String>,
    /// Usages for which the raw value is allowed
    #[serde(default)]
    pub raw_usages: BTreeSet<UsageType>,
    /// Usages allowed after applying the named operation
    #[serde(default)]
    pub redacted_usages: IndexMap<String, BTreeSet<UsageType>>,
    /// Rules for fields of this field's entity
    #[serde(default)]
    pub subfields: Vec<PolicyField>,
    /// Field annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PolicyField {
    /// Field name: the last path element
    #[must_use]
    pub fn name(&self) -> &str {
        self.field_path.last().map_or("", String::as_str)
    }

    /// Dotted path
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.field_path.join(".")
    }

    /// Whether the raw value may be used for `usage`
    #[must_use]
    pub fn allows_raw(&self, usage: UsageType) -> bool {
        usage.permitted_by(&self.raw_usages)
    }

    /// Whether some redaction makes the field usable for `usage`
    #[must_use]
    pub fn allows_redacted(&self, usage: UsageType) -> bool {
        self.redacted_usages
            .values()
            .any(|usages| usage.matched_by(usages))
    }

    /// Operations that must be applied for `usage`, in declaration order
    pub fn redactions_for(&self, usage: UsageType) -> impl Iterator<Item = &str> {
        self.redacted_usages
            .iter()
            .filter(move |(_, usages)| usage.matched_by(usages))
            .map(|(op, _)| op.as_str())
    }
}

/// Rules for one data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTarget {
    /// Name of the data type descriptor this target governs
    pub schema_name: String,
    /// Maximum age of retained data; zero means no retention
    pub max_age: Duration,
    /// Allowed retention forms
    #[serde(default)]
    pub retentions: Vec<PolicyRetention>,
    /// Field rules
    #[serde(default)]
    pub fields: Vec<PolicyField>,
    /// Target annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PolicyTarget {
    /// Top-level field rule by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&PolicyField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Deletion triggers carried in the target's annotations
    #[must_use]
    pub fn deletion_triggers(&self) -> BTreeSet<DeletionTrigger> {
        self.annotations
            .iter()
            .filter_map(DeletionTrigger::from_annotation)
            .collect()
    }

    /// Management strategies the retention clauses describe.
    ///
    /// A zero max age admits only pass-through.
    #[must_use]
    pub fn retentions_as_strategies(&self) -> Vec<ManagementStrategy> {
        if self.max_age.is_zero() {
            return vec![ManagementStrategy::PassThru];
        }
        let triggers = self.deletion_triggers();
        self.retentions
            .iter()
            .map(|retention| ManagementStrategy::Stored {
                encrypted: retention.encryption_required,
                media: retention.medium.as_media(),
                ttl: Some(self.max_age),
                deletion_triggers: triggers.clone(),
            })
            .collect()
    }
}

/// Named key/value configuration bundle attached to a policy
pub type PolicyConfig = IndexMap<String, String>;

/// A named rule set governing how data may be consumed
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Unique name
    pub name: String,
    /// Egress label
    pub egress_type: String,
    /// Human-readable description
    pub description: String,
    /// Rule the connection context must satisfy
    pub allowed_context: PolicyContextRule,
    /// Per-type rules
    pub targets: Vec<PolicyTarget>,
    /// Named configuration bundles
    pub configs: IndexMap<String, PolicyConfig>,
}

impl Policy {
    /// Start building a policy
    #[must_use]
    pub fn builder(name: impl Into<String>, egress_type: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(name, egress_type)
    }

    /// Target governing the named schema
    #[must_use]
    pub fn target(&self, schema_name: &str) -> Option<&PolicyTarget> {
        self.targets.iter().find(|t| t.schema_name == schema_name)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy({}, {})", self.name, self.egress_type)
    }
}
