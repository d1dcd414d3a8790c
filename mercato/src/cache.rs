//! Time-bucketed best-price cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use mercato_core::{MercatoError, Quote};

/// `(SYMBOL, bucket)`
pub(crate) type CacheKey = (String, i64);

/// Quotes keyed by symbol and time bucket.
///
/// A bucket rollover changes the key, so entries expire logically at the bucket
/// edge; the time-to-live of two bucket widths only reclaims memory.
#[derive(Clone)]
pub(crate) struct QuoteCache {
    inner: Cache<CacheKey, Quote>,
}

impl QuoteCache {
    pub(crate) fn new(capacity: u64, bucket_width: Duration) -> Self {
        let ttl = bucket_width.max(Duration::from_secs(1)).saturating_mul(2);
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub(crate) async fn get(&self, key: &CacheKey) -> Option<Quote> {
        self.inner.get(key).await
    }

    /// Return the cached quote or run `load` once for all concurrent callers.
    ///
    /// Errors are handed to every waiter and never stored.
    pub(crate) async fn get_or_load<F>(&self, key: CacheKey, load: F) -> Result<Quote, MercatoError>
    where
        F: core::future::Future<Output = Result<Quote, MercatoError>>,
    {
        self.inner
            .try_get_with(key, load)
            .await
            .map_err(|e: Arc<MercatoError>| MercatoError::clone(&e))
    }
}
