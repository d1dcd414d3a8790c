//! Server settings loaded from environment variables.
//!
//! Provider keys are optional: a provider whose key is missing is left out of
//! the connector set. CoinGecko and Alpha Vantage always run, keyless and on the
//! demo key respectively. Numeric settings that are present but malformed stop
//! startup.

use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use mercato_core::{BackoffConfig, MercatoConfig, ProviderConfig, QuotaConfig};
use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Configuration errors raised while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed.
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Settings for the six provider connectors.
///
/// `None` means the provider is disabled.
#[derive(Debug, Clone, Default)]
pub struct Providers {
    /// Finnhub, keyed by `FINNHUB_API_KEY`.
    pub finnhub: Option<ProviderConfig>,
    /// Alpaca, keyed by `ALPACA_API_KEY_ID` plus `ALPACA_API_SECRET_KEY`.
    pub alpaca: Option<ProviderConfig>,
    /// FMP, keyed by `FMP_API_KEY`.
    pub fmp: Option<ProviderConfig>,
    /// EODHD, keyed by `EODHD_API_KEY`.
    pub eodhd: Option<ProviderConfig>,
    /// CoinGecko; the key is optional.
    pub coingecko: ProviderConfig,
    /// Alpha Vantage; falls back to the public demo key.
    pub alphavantage: ProviderConfig,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// Orchestrator settings.
    pub mercato: MercatoConfig,
    /// Provider credentials.
    pub providers: Providers,
    /// Alpha Vantage daily call budget, replacing the published free tier.
    pub alphavantage_daily_limit: Option<u64>,
}

impl ServerConfig {
    /// Read the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("MERCATO_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw.parse().map_err(|e: AddrParseError| ConfigError::Invalid {
            key: "MERCATO_BIND",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let mut mercato = MercatoConfig::default();
        if let Some(ms) = read::<u64, _>(&get, "MERCATO_PROVIDER_TIMEOUT_MS")? {
            mercato.provider_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = read::<u64, _>(&get, "MERCATO_BUCKET_SECS")? {
            mercato.bucket_width = Duration::from_secs(secs);
        }
        if let Some(n) = read::<usize, _>(&get, "MERCATO_REALTIME_MAX_SYMBOLS")? {
            mercato.realtime.max_symbols = n;
        }
        if let Some(ms) = read::<u64, _>(&get, "MERCATO_RECONNECT_DELAY_MS")? {
            mercato.realtime.backoff = BackoffConfig::fixed(Duration::from_millis(ms));
        }
        let alphavantage_daily_limit = read::<u64, _>(&get, "ALPHAVANTAGE_DAILY_LIMIT")?;

        // provider calls never outlive the orchestrator's own bound
        let timeout = mercato.provider_timeout;
        let keyed = |var: &str| get(var).map(|k| ProviderConfig::with_key(k).timeout(timeout));
        let keyless = || ProviderConfig::default().timeout(timeout);

        let alpaca = match (get("ALPACA_API_KEY_ID"), get("ALPACA_API_SECRET_KEY")) {
            (Some(id), Some(secret)) => {
                Some(ProviderConfig::with_key(id).secret(secret).timeout(timeout))
            }
            _ => None,
        };

        let providers = Providers {
            finnhub: keyed("FINNHUB_API_KEY"),
            alpaca,
            fmp: keyed("FMP_API_KEY"),
            eodhd: keyed("EODHD_API_KEY"),
            coingecko: keyed("COINGECKO_API_KEY").unwrap_or_else(keyless),
            alphavantage: keyed("ALPHAVANTAGE_API_KEY").unwrap_or_else(keyless),
        };

        Ok(Self {
            bind,
            mercato,
            providers,
            alphavantage_daily_limit,
        })
    }

    /// Alpha Vantage quota: the configured daily limit or the published free tier.
    #[must_use]
    pub fn alphavantage_quota(&self, free_tier: &QuotaConfig) -> QuotaConfig {
        self.alphavantage_daily_limit.map_or_else(
            || free_tier.clone(),
            |limit| QuotaConfig {
                limit,
                window: Duration::from_secs(86_400),
            },
        )
    }
}

/// Parse an optional variable. Zero is rejected: every numeric setting is a
/// duration, a size or a budget.
fn read<T, F>(get: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = get(key) else {
        return Ok(None);
    };
    match value.parse::<T>() {
        Ok(n) if n == T::default() => Err(ConfigError::Invalid {
            key,
            value,
            reason: "must be greater than zero".into(),
        }),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
