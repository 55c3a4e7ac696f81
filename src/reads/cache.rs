//! In-memory mirror of on-chain reads.

use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::reads::types::{ReadKey, ReadValue};

/// Thread-safe cache of read results keyed by entity.
///
/// An absent entry means "no data yet": never fetched, invalidated, or the
/// last fetch failed.
#[derive(Debug, Clone, Default)]
pub struct ReadCache {
    inner: Arc<DashMap<ReadKey, ReadValue>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: ReadKey, value: ReadValue) {
        self.inner.insert(key, value);
        metrics::record_cache_size(self.inner.len());
    }

    pub fn value(&self, key: &ReadKey) -> Option<ReadValue> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Drop the given entries. Returns how many were present.
    pub fn invalidate(&self, keys: &[ReadKey]) -> usize {
        let removed = keys
            .iter()
            .filter(|key| self.inner.remove(*key).is_some())
            .count();
        metrics::record_cache_size(self.inner.len());
        removed
    }

    /// Drop every entry matching `predicate`.
    pub fn invalidate_where(&self, predicate: impl Fn(&ReadKey) -> bool) {
        self.inner.retain(|key, _| !predicate(key));
        metrics::record_cache_size(self.inner.len());
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
