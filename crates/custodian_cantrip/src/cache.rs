//! Shared cache of built cantrips.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use custodian_policy::UsageType;
use tracing::debug;

use crate::cantrip::MultiCantrip;
use crate::error::CantripResult;

type CacheKey = (Option<usize>, String, UsageType);

/// Cantrips keyed by policy, descriptor name and usage.
///
/// The policy is identified by its index in the runtime's policy set,
/// since two distinct policies may share a name.
///
/// Reads take a shared lock. A miss builds outside the lock, so two
/// concurrent misses may both build; the first insert wins.
#[derive(Debug, Default)]
pub struct CantripCache {
    entries: RwLock<HashMap<CacheKey, Arc<MultiCantrip>>>,
}

impl CantripCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached cantrip for the key, built with `build` on a miss.
    ///
    /// # Errors
    ///
    /// Returns the build error; failures are not cached
    pub fn get_or_build<F>(
        &self,
        policy_index: Option<usize>,
        dtd_name: &str,
        usage: UsageType,
        build: F,
    ) -> CantripResult<Arc<MultiCantrip>>
    where
        F: FnOnce() -> CantripResult<MultiCantrip>,
    {
        let key = (policy_index, dtd_name.to_string(), usage);

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            debug!(dtd = dtd_name, usage = %usage, "cantrip cache hit");
            return Ok(Arc::clone(hit));
        }

        let built = Arc::new(build()?);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(built)))
    }

    /// Drop every cached cantrip
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached cantrips
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
