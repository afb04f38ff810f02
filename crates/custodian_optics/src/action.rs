//! Per-element transform outcomes.

use std::fmt;
use std::sync::Arc;

/// Error carried by [`Action::Throw`]
pub type ThrownError = Arc<dyn std::error::Error + Send + Sync>;

/// Outcome of transforming one focused element.
///
/// Produced and consumed within a single transform invocation.
#[derive(Clone)]
pub enum Action<T> {
    /// Replace the element
    Update(T),
    /// Drop the element from its immediate parent, or make it absent if optional
    OmitFromParent,
    /// Stop and drop the whole root entity
    OmitFromRoot,
    /// Stop and surface the error to the caller
    Throw(ThrownError),
}

impl<T> Action<T> {
    /// Wrap an error as [`Action::Throw`]
    pub fn throw(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Throw(Arc::new(err))
    }

    /// Map the updated value, passing every other signal through
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Action<U> {
        match self {
            Self::Update(v) => Action::Update(f(v)),
            Self::OmitFromParent => Action::OmitFromParent,
            Self::OmitFromRoot => Action::OmitFromRoot,
            Self::Throw(err) => Action::Throw(err),
        }
    }

    /// Chain another transform onto an updated value
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Action<U>) -> Action<U> {
        match self {
            Self::Update(v) => f(v),
            Self::OmitFromParent => Action::OmitFromParent,
            Self::OmitFromRoot => Action::OmitFromRoot,
            Self::Throw(err) => Action::Throw(err),
        }
    }

    /// Whether this is an [`Action::Update`]
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update(_))
    }

    /// The updated value, if any
    pub fn into_update(self) -> Option<T> {
        match self {
            Self::Update(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update(v) => f.debug_tuple("Update").field(v).finish(),
            Self::OmitFromParent => write!(f, "OmitFromParent"),
            Self::OmitFromRoot => write!(f, "OmitFromRoot"),
            Self::Throw(err) => write!(f, "Throw({})", err),
        }
    }
}

/// Thrown errors compare by message.
impl<T: PartialEq> PartialEq for Action<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Update(a), Self::Update(b)) => a == b,
            (Self::OmitFromParent, Self::OmitFromParent) => true,
            (Self::OmitFromRoot, Self::OmitFromRoot) => true,
            (Self::Throw(a), Self::Throw(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
