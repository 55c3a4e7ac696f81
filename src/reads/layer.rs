//! Read layer: gateway reads mirrored into the cache.
//!
//! # Error Semantics
//! A failed read is "no data yet". It is logged, counted, and the cache
//! entry stays absent so the next poll or refresh retries it.

use futures_util::future::join_all;
use std::sync::Arc;

use crate::blockchain::BlockchainResult;
use crate::contracts::ChainGateway;
use crate::observability::metrics;
use crate::reads::cache::ReadCache;
use crate::reads::types::{ReadKey, ReadValue};

#[derive(Clone)]
pub struct ReadLayer {
    gateway: Arc<dyn ChainGateway>,
    cache: ReadCache,
}

impl ReadLayer {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self {
            gateway,
            cache: ReadCache::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ChainGateway> {
        &self.gateway
    }

    /// Issue the read and store the result.
    pub async fn fetch(&self, key: &ReadKey) -> BlockchainResult<ReadValue> {
        match self.gateway.read(key).await {
            Ok(value) => {
                self.cache.insert(key.clone(), value.clone());
                Ok(value)
            }
            Err(e) => {
                metrics::record_read_error(key.kind());
                tracing::warn!(read = key.kind(), key = ?key, error = %e, "Read failed");
                Err(e)
            }
        }
    }

    /// Fetch an amount-valued key, mapping failures to `None`.
    pub async fn fetch_amount(&self, key: &ReadKey) -> Option<alloy::primitives::U256> {
        self.fetch(key).await.ok().and_then(|v| v.as_amount())
    }

    /// Issue all reads concurrently. Order of completion is unspecified;
    /// the result vector follows the order of `keys`.
    pub async fn fetch_many(&self, keys: &[ReadKey]) -> Vec<Option<ReadValue>> {
        join_all(keys.iter().map(|key| async move { self.fetch(key).await.ok() })).await
    }

    /// Cached value, if any.
    pub fn cached(&self, key: &ReadKey) -> Option<ReadValue> {
        self.cache.value(key)
    }

    /// Drop every cached read scoped to `owner`.
    pub fn forget_owner(&self, owner: alloy::primitives::Address) {
        self.cache.invalidate_where(|key| key.owner() == Some(owner));
    }

    /// Drop the keys from the cache and re-issue them.
    ///
    /// Returns how many reads came back successfully.
    pub async fn refresh(&self, keys: &[ReadKey]) -> usize {
        self.cache.invalidate(keys);
        let results = self.fetch_many(keys).await;
        let refreshed = results.iter().filter(|r| r.is_some()).count();
        tracing::debug!(
            requested = keys.len(),
            refreshed = refreshed,
            "Dependent reads refreshed"
        );
        refreshed
    }
}

impl std::fmt::Debug for ReadLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadLayer")
            .field("cached", &self.cache.len())
            .finish()
    }
}
