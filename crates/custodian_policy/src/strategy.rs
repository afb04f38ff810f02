//! Management strategies: how a connection provider holds its data.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use custodian_core::Duration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationParam, PolicyRetention};

/// Where stored data lives, ordered by risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageMedia {
    /// Held in memory for at most the life of the process
    Memory,
    /// Persisted to local disk
    LocalDisk,
    /// Persisted to an external device
    RemoteDisk,
}

impl StorageMedia {
    /// Risk level: higher is more dangerous
    #[must_use]
    pub fn danger(&self) -> u8 {
        match self {
            Self::Memory => 0,
            Self::LocalDisk => 1,
            Self::RemoteDisk => 2,
        }
    }
}

impl fmt::Display for StorageMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "MEMORY"),
            Self::LocalDisk => write!(f, "LOCAL_DISK"),
            Self::RemoteDisk => write!(f, "REMOTE_DISK"),
        }
    }
}

/// Event that must cause stored data to be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// The package named by the target field was uninstalled
    PackageUninstalled,
}

impl Trigger {
    /// Canonical name, as stored in annotations
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PackageUninstalled => "PACKAGE_UNINSTALLED",
        }
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PACKAGE_UNINSTALLED" => Ok(Self::PackageUninstalled),
            other => Err(format!("unknown deletion trigger: {other}")),
        }
    }
}

/// A trigger bound to the field holding its triggering values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeletionTrigger {
    /// Triggering event
    pub trigger: Trigger,
    /// Dotted path of the field holding the triggering values
    pub target_field: String,
}

impl DeletionTrigger {
    /// Annotation name used to carry deletion triggers on policy targets
    pub const ANNOTATION_NAME: &'static str = "deletionTrigger";
    /// Annotation parameter holding the trigger name
    pub const TRIGGER_KEY: &'static str = "trigger";
    /// Annotation parameter holding the target field
    pub const FIELD_KEY: &'static str = "field";

    /// Create a deletion trigger
    #[must_use]
    pub fn new(trigger: Trigger, target_field: impl Into<String>) -> Self {
        Self {
            trigger,
            target_field: target_field.into(),
        }
    }

    /// Render as a policy annotation
    #[must_use]
    pub fn to_annotation(&self) -> Annotation {
        let mut params = IndexMap::new();
        params.insert(
            Self::TRIGGER_KEY.to_string(),
            AnnotationParam::Str(self.trigger.name().to_string()),
        );
        params.insert(
            Self::FIELD_KEY.to_string(),
            AnnotationParam::Str(self.target_field.clone()),
        );
        Annotation {
            name: Self::ANNOTATION_NAME.to_string(),
            params,
        }
    }

    /// Parse from a policy annotation; `None` if it is not a well-formed
    /// deletion trigger.
    #[must_use]
    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        if annotation.name != Self::ANNOTATION_NAME {
            return None;
        }
        let trigger = annotation.str_param(Self::TRIGGER_KEY)?.parse().ok()?;
        let field = annotation.str_param(Self::FIELD_KEY)?;
        Some(Self::new(trigger, field))
    }
}

impl fmt::Display for DeletionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeletionTrigger({}, {})",
            self.trigger.name(),
            self.target_field
        )
    }
}

/// How data behind a connection is held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementStrategy {
    /// Never held: passed straight from writer to reader
    PassThru,
    /// Held in storage
    Stored {
        /// Whether the data is encrypted at rest
        encrypted: bool,
        /// Storage location
        media: StorageMedia,
        /// Maximum age of stored data; `None` is unbounded
        ttl: Option<Duration>,
        /// Connected deletion triggers
        deletion_triggers: BTreeSet<DeletionTrigger>,
    },
}

impl ManagementStrategy {
    /// Stored strategy without deletion triggers
    #[must_use]
    pub fn stored(encrypted: bool, media: StorageMedia, ttl: Option<Duration>) -> Self {
        Self::Stored {
            encrypted,
            media,
            ttl,
            deletion_triggers: BTreeSet::new(),
        }
    }

    /// Add a deletion trigger; no-op for [`ManagementStrategy::PassThru`]
    #[must_use]
    pub fn with_deletion_trigger(mut self, trigger: DeletionTrigger) -> Self {
        if let Self::Stored {
            deletion_triggers, ..
        } = &mut self
        {
            deletion_triggers.insert(trigger);
        }
        self
    }

    /// Time-to-live, with `default` standing in for an unbounded ttl
    #[must_use]
    pub fn ttl_or(&self, default: Duration) -> Duration {
        match self {
            Self::PassThru => Duration::zero(),
            Self::Stored { ttl, .. } => ttl.unwrap_or(default),
        }
    }

    /// Whether data survives the process
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        match self {
            Self::PassThru => false,
            Self::Stored { media, .. } => *media != StorageMedia::Memory,
        }
    }

    /// Whether the strategy connects the given deletion trigger
    #[must_use]
    pub fn satisfies(&self, trigger: &DeletionTrigger) -> bool {
        match self {
            Self::PassThru => true,
            Self::Stored {
                deletion_triggers, ..
            } => deletion_triggers.contains(trigger),
        }
    }

    /// Whether the strategy meets a retention clause with the given
    /// maximum age: media no riskier than allowed, encrypted if required,
    /// and a bounded ttl no longer than `max_age`.
    #[must_use]
    pub fn satisfies_retention(&self, retention: &PolicyRetention, max_age: Duration) -> bool {
        match self {
            Self::PassThru => true,
            Self::Stored {
                encrypted,
                media,
                ttl,
                ..
            } => {
                media.danger() <= retention.medium.as_media().danger()
                    && (*encrypted || !retention.encryption_required)
                    && ttl.is_some_and(|ttl| ttl <= max_age)
            }
        }
    }

    /// Order by restraint: `Less` means `self` is more restrained.
    ///
    /// Pass-through is the most restrained; stored strategies compare by
    /// media risk, then encryption, then ttl.
    #[must_use]
    pub fn compare_restraint(&self, other: &ManagementStrategy) -> Ordering {
        match (self, other) {
            (Self::PassThru, Self::PassThru) => Ordering::Equal,
            (Self::PassThru, _) => Ordering::Less,
            (_, Self::PassThru) => Ordering::Greater,
            (
                Self::Stored {
                    encrypted: a_enc,
                    media: a_media,
                    ttl: a_ttl,
                    ..
                },
                Self::Stored {
                    encrypted: b_enc,
                    media: b_media,
                    ttl: b_ttl,
                    ..
                },
            ) => a_media
                .danger()
                .cmp(&b_media.danger())
                .then_with(|| b_enc.cmp(a_enc))
                .then_with(|| {
                    a_ttl
                        .unwrap_or(Duration::zero())
                        .cmp(&b_ttl.unwrap_or(Duration::zero()))
                }),
        }
    }

    /// The most restrained strategy of a collection
    pub fn most_restrained<'a>(
        strategies: impl IntoIterator<Item = &'a ManagementStrategy>,
    ) -> Option<&'a ManagementStrategy> {
        strategies.into_iter().min_by(|a, b| a.compare_restraint(b))
    }

    /// Describe the strategy as annotations for downstream tooling
    #[must_use]
    pub fn to_annotations(&self) -> Vec<Annotation> {
        let flag = |name: &str| Annotation::new(name);
        match self {
            Self::PassThru => vec![flag("inMemory")],
            Self::Stored {
                encrypted,
                media,
                ttl,
                ..
            } => {
                let mut out = vec![match media {
                    StorageMedia::Memory => flag("inMemory"),
                    StorageMedia::LocalDisk => flag("persistent"),
                    StorageMedia::RemoteDisk => flag("remotePersistent"),
                }];
                if *encrypted {
                    out.push(flag("encrypted"));
                }
                if let Some(ttl) = ttl {
                    out.push(
                        flag("ttl").with_param("value", AnnotationParam::Str(ttl.to_string())),
                    );
                }
                out
            }
        }
    }
}
