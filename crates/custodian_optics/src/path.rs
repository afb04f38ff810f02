//! Access paths from a root schema to a field.

use custodian_schema::DataTypeDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A descriptor name plus the chain of field selectors leading into it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpticalAccessPath {
    dtd_name: String,
    selectors: Vec<String>,
}

impl OpticalAccessPath {
    /// Create a path rooted at `dtd_name`
    #[must_use]
    pub fn new<I, S>(dtd_name: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dtd_name: dtd_name.into(),
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    /// Path with no selectors, denoting the root entity itself
    #[must_use]
    pub fn root(dtd_name: impl Into<String>) -> Self {
        Self {
            dtd_name: dtd_name.into(),
            selectors: Vec::new(),
        }
    }

    /// Path rooted at a descriptor
    #[must_use]
    pub fn from_dtd<I, S>(dtd: &DataTypeDescriptor, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(dtd.name.clone(), selectors)
    }

    /// Root descriptor name
    #[must_use]
    pub fn dtd_name(&self) -> &str {
        &self.dtd_name
    }

    /// Field selectors, outermost first
    #[must_use]
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// Concatenate another path's selectors onto this one.
    ///
    /// The result keeps this path's root; an empty-selector path on
    /// either side leaves the other path's selectors unchanged.
    #[must_use]
    pub fn compose(&self, other: &OpticalAccessPath) -> Self {
        let mut selectors = self.selectors.clone();
        selectors.extend(other.selectors.iter().cloned());
        Self {
            dtd_name: self.dtd_name.clone(),
            selectors,
        }
    }

    /// Extend the path by one selector
    #[must_use]
    pub fn child(&self, selector: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.selectors.push(selector.into());
        next
    }
}

impl fmt::Display for OpticalAccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.selectors.is_empty() {
            return write!(f, "{}", self.dtd_name);
        }
        write!(f, "{}::{}", self.dtd_name, self.selectors.join("."))
    }
}
