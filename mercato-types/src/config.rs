//! Configuration types shared across orchestrators and connectors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reconnect policy for realtime connections.
///
/// The default is a fixed five second delay retried forever: `factor` 1, no
/// jitter, `max_attempts` unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt, in milliseconds.
    pub min_backoff_ms: u64,
    /// Upper bound for the delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied after each consecutive failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
    /// Stop reconnecting after this many consecutive failed attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 5_000,
            max_backoff_ms: 5_000,
            factor: 1,
            jitter_percent: 0,
            max_attempts: None,
        }
    }
}

impl BackoffConfig {
    /// Fixed delay, retried forever.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            min_backoff_ms: ms,
            max_backoff_ms: ms,
            factor: 1,
            jitter_percent: 0,
            max_attempts: None,
        }
    }
}

/// Configuration for a request budget over a fixed window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of calls that may be made within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60),
        }
    }
}

/// Snapshot of a quota budget at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Configured maximum calls per window.
    pub limit: u64,
    /// Remaining calls available in the current window.
    pub remaining: u64,
    /// Time remaining until the current window resets.
    pub reset_in: Duration,
}

/// Settings for the realtime subscription manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum symbols subscribed upstream per connection.
    pub max_symbols: usize,
    /// Reconnect policy shared by both connections.
    pub backoff: BackoffConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_symbols: 30,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Global configuration for the `Mercato` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercatoConfig {
    /// Timeout for individual provider calls. Expiry maps to `UpstreamUnreachable`.
    pub provider_timeout: Duration,
    /// Width of the best-price cache time bucket.
    pub bucket_width: Duration,
    /// Maximum cached best-price entries.
    pub cache_capacity: u64,
    /// Cap on aggregated search results.
    pub max_results: usize,
    /// How many text-search candidates a provider prices per search.
    pub search_candidates: usize,
    /// Number of fast equity providers queried by best-price (a slow provider is added).
    pub best_price_fast_providers: usize,
    /// Realtime manager settings.
    pub realtime: RealtimeConfig,
}

impl Default for MercatoConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            bucket_width: Duration::from_secs(30),
            cache_capacity: 10_000,
            max_results: 10,
            search_candidates: 3,
            best_price_fast_providers: 2,
            realtime: RealtimeConfig::default(),
        }
    }
}

/// Credentials and transport settings for one provider connector.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key or token.
    pub api_key: Option<String>,
    /// Secondary secret for providers with header-pair auth.
    pub api_secret: Option<String>,
    /// Override for the upstream base URL (tests, proxies).
    pub base_url: Option<String>,
    /// Override for the streaming endpoint.
    pub stream_url: Option<String>,
    /// HTTP timeout for a single upstream call.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: None,
            stream_url: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    /// Config with an API key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Set the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the streaming URL override.
    #[must_use]
    pub fn stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    /// Set the secondary secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(secret.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The API key, ignoring blank values.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// The secondary secret, ignoring blank values.
    #[must_use]
    pub fn secret_value(&self) -> Option<&str> {
        self.api_secret.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("stream_url", &self.stream_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
