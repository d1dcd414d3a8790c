use std::sync::Arc;
use std::time::Duration;

use mercato_core::connector::ConnectorKey;
use mercato_core::{MercatoConnector, MercatoError, Quote, time_bucket};

use crate::Mercato;
use crate::router::util::validate_symbol;

/// Pick the winning quote from per-provider outcomes listed in priority order.
///
/// The first realtime success wins; otherwise the first success. Failures are
/// ignored. Returns `None` when every provider failed.
#[must_use]
pub fn select_best(outcomes: Vec<(ConnectorKey, Result<Quote, MercatoError>)>) -> Option<Quote> {
    let mut fallback = None;
    for (_, res) in outcomes {
        let Ok(q) = res else { continue };
        if q.realtime {
            return Some(q);
        }
        if fallback.is_none() {
            fallback = Some(q);
        }
    }
    fallback
}

impl Mercato {
    /// Resolve the best available price for a ticker.
    ///
    /// Behavior:
    /// - Answers from the cache when the current time bucket already holds a
    ///   quote for the symbol.
    /// - Otherwise queries the first `best_price_fast_providers` fast equity
    ///   connectors plus the first slow one concurrently and waits for all of them.
    ///   A realtime quote beats a delayed one; ties go to priority order.
    /// - Concurrent misses for the same symbol and bucket share one fan-out.
    ///   Failures are not cached.
    ///
    /// # Errors
    /// `InvalidQuery` for malformed symbols, `Unsupported` when no connector can
    /// quote, and `NotFound` when every provider failed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "mercato::router::best_price", skip(self), fields(symbol = %symbol))
    )]
    pub async fn best_price(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let symbol = validate_symbol(symbol)?;
        let bucket = time_bucket(self.clock.now(), self.cfg.bucket_width);
        let legs = self.best_price_legs();
        if legs.is_empty() {
            return Err(MercatoError::unsupported("best-price"));
        }
        let timeout = self.cfg.provider_timeout;
        let key = (symbol.clone(), bucket);
        self.cache
            .get_or_load(key, async move {
                // detached so calls already in flight finish even if the caller goes away
                let task = tokio::spawn(fan_out(legs, symbol, timeout));
                task.await.unwrap_or_else(|e| {
                    Err(MercatoError::connector("mercato", format!("best-price task failed: {e}")))
                })
            })
            .await
    }

    /// Cached best price for the symbol in the current bucket, without fetching.
    pub async fn cached_price(&self, symbol: &str) -> Option<Quote> {
        let symbol = validate_symbol(symbol).ok()?;
        let bucket = time_bucket(self.clock.now(), self.cfg.bucket_width);
        self.cache.get(&(symbol, bucket)).await
    }

    /// Connectors a best-price fan-out asks, in priority order.
    #[must_use]
    pub fn best_price_providers(&self) -> Vec<&'static str> {
        self.best_price_legs().iter().map(|c| c.name()).collect()
    }

    fn best_price_legs(&self) -> Vec<Arc<dyn MercatoConnector>> {
        let mut legs: Vec<Arc<dyn MercatoConnector>> = self
            .fast_equity_quoters()
            .take(self.cfg.best_price_fast_providers)
            .cloned()
            .collect();
        legs.extend(
            self.slow_connectors()
                .find(|c| c.as_quote_provider().is_some())
                .cloned(),
        );
        legs
    }
}

async fn fan_out(
    legs: Vec<Arc<dyn MercatoConnector>>,
    symbol: String,
    timeout: Duration,
) -> Result<Quote, MercatoError> {
    let calls = legs.iter().map(|c| {
        let symbol = symbol.as_str();
        async move {
            let res = match c.as_quote_provider() {
                Some(qp) => {
                    Mercato::provider_call_with_timeout(c.name(), "quote", timeout, qp.quote(symbol))
                        .await
                }
                None => Err(MercatoError::unsupported("quote")),
            };
            (c.key(), res)
        }
    });
    let outcomes = futures::future::join_all(calls).await;

    #[cfg(feature = "tracing")]
    for (key, res) in &outcomes {
        if let Err(e) = res {
            tracing::debug!(connector = %key, symbol = %symbol, error = %e, "best-price leg failed");
        }
    }

    select_best(outcomes).ok_or_else(|| MercatoError::not_found(format!("price for {symbol}")))
}
