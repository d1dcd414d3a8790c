use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use mercato_core::{
    AssetClass, Clock, LatencyClass, MercatoConfig, MercatoConnector, MercatoError, RealtimeConfig,
    SystemClock,
};

use crate::cache::QuoteCache;
use crate::realtime::RealtimeBuilder;

/// Orchestrator that routes requests across registered providers.
///
/// Registration order is priority order: earlier connectors win ties in search
/// deduplication and best-price selection.
pub struct Mercato {
    pub(crate) connectors: Vec<Arc<dyn MercatoConnector>>,
    pub(crate) cfg: MercatoConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cache: QuoteCache,
}

/// Builder for constructing a `Mercato` orchestrator with custom configuration.
pub struct MercatoBuilder {
    connectors: Vec<Arc<dyn MercatoConnector>>,
    cfg: MercatoConfig,
    clock: Arc<dyn Clock>,
}

impl Default for MercatoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MercatoBuilder {
    /// Create a builder with default configuration and no connectors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            cfg: MercatoConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Register a provider connector. Call in descending priority.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn MercatoConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: MercatoConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the per-provider call timeout. Expiry is reported as `UpstreamUnreachable`.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Set the best-price cache bucket width.
    #[must_use]
    pub const fn bucket_width(mut self, width: Duration) -> Self {
        self.cfg.bucket_width = width;
        self
    }

    /// Bound the number of cached best-price entries.
    #[must_use]
    pub const fn cache_capacity(mut self, entries: u64) -> Self {
        self.cfg.cache_capacity = entries;
        self
    }

    /// Cap aggregated search results.
    #[must_use]
    pub const fn max_results(mut self, n: usize) -> Self {
        self.cfg.max_results = n;
        self
    }

    /// How many text-search hits each provider prices during search.
    #[must_use]
    pub const fn search_candidates(mut self, n: usize) -> Self {
        self.cfg.search_candidates = n;
        self
    }

    /// How many fast equity providers best-price consults (one slow provider is added).
    #[must_use]
    pub const fn best_price_fast_providers(mut self, n: usize) -> Self {
        self.cfg.best_price_fast_providers = n;
        self
    }

    /// Realtime manager defaults handed out by [`Mercato::realtime`].
    #[must_use]
    pub const fn realtime(mut self, cfg: RealtimeConfig) -> Self {
        self.cfg.realtime = cfg;
        self
    }

    /// Time source for cache buckets and report timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the `Mercato` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connectors were registered or two connectors
    /// share a name.
    pub fn build(self) -> Result<Mercato, MercatoError> {
        if self.connectors.is_empty() {
            return Err(MercatoError::InvalidArg(
                "no connectors registered; add at least one via with_connector(...)".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &self.connectors {
            if !seen.insert(c.name()) {
                return Err(MercatoError::InvalidArg(format!(
                    "connector '{}' registered twice",
                    c.name()
                )));
            }
        }
        if self.cfg.max_results == 0 {
            return Err(MercatoError::InvalidArg("max_results must be at least 1".into()));
        }
        let cache = QuoteCache::new(self.cfg.cache_capacity, self.cfg.bucket_width);
        Ok(Mercato {
            connectors: self.connectors,
            cfg: self.cfg,
            clock: self.clock,
            cache,
        })
    }
}

impl Mercato {
    /// Start building a new `Mercato` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use mercato_connectors::{FinnhubConnector, CoinGeckoConnector};
    ///
    /// let mercato = mercato::Mercato::builder()
    ///     .with_connector(Arc::new(FinnhubConnector::new(finnhub_cfg)?))
    ///     .with_connector(Arc::new(CoinGeckoConnector::new(gecko_cfg)?))
    ///     .build()?;
    /// let report = mercato.search("apple").await?;
    /// ```
    #[must_use]
    pub fn builder() -> MercatoBuilder {
        MercatoBuilder::new()
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &MercatoConfig {
        &self.cfg
    }

    /// Registered connectors in priority order.
    #[must_use]
    pub fn connectors(&self) -> &[Arc<dyn MercatoConnector>] {
        &self.connectors
    }

    /// Look up a registered connector by name.
    #[must_use]
    pub fn connector(&self, name: &str) -> Option<&Arc<dyn MercatoConnector>> {
        self.connectors.iter().find(|c| c.name() == name)
    }

    /// A realtime manager builder seeded with this orchestrator's realtime settings.
    #[must_use]
    pub fn realtime(&self) -> RealtimeBuilder {
        RealtimeBuilder::new().config(self.cfg.realtime)
    }

    /// Names of the fast equity connectors search tries in turn.
    #[must_use]
    pub fn equity_providers(&self) -> Vec<&'static str> {
        self.fast_equity_quoters().map(|c| c.name()).collect()
    }

    /// Fast connectors that quote equities, in priority order.
    pub(crate) fn fast_equity_quoters(&self) -> impl Iterator<Item = &Arc<dyn MercatoConnector>> {
        self.connectors.iter().filter(|c| {
            c.latency() == LatencyClass::Fast
                && c.supports_kind(AssetClass::Equity)
                && c.as_quote_provider().is_some()
        })
    }

    /// Connectors able to search coins, in priority order.
    pub(crate) fn crypto_searchers(&self) -> impl Iterator<Item = &Arc<dyn MercatoConnector>> {
        self.connectors.iter().filter(|c| {
            c.latency() == LatencyClass::Fast
                && c.supports_kind(AssetClass::Crypto)
                && c.as_search_provider().is_some()
        })
    }

    /// Last-resort connectors, in priority order.
    pub(crate) fn slow_connectors(&self) -> impl Iterator<Item = &Arc<dyn MercatoConnector>> {
        self.connectors
            .iter()
            .filter(|c| c.latency() == LatencyClass::Slow)
    }

    /// Wrap a provider future with the configured timeout.
    ///
    /// Expiry maps to `UpstreamUnreachable` so callers treat a hung provider like
    /// an unreachable one.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "mercato::core::provider_call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, MercatoError>
    where
        Fut: core::future::Future<Output = Result<T, MercatoError>>,
    {
        let res = (tokio::time::timeout(timeout, fut).await).unwrap_or_else(|_| {
            Err(MercatoError::unreachable(
                connector_name,
                format!("{capability} timed out after {}ms", timeout.as_millis()),
            ))
        });
        #[cfg(feature = "tracing")]
        if let Err(e) = &res
            && e.is_actionable()
        {
            tracing::warn!(connector = connector_name, capability, error = %e, "provider call failed");
        }
        res
    }
}
