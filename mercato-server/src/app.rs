//! Wiring from [`ServerConfig`] to a running orchestrator.

use std::sync::Arc;

use mercato::{Mercato, RealtimeManager};
use mercato_connectors::{
    AlpacaConnector, AlphaVantageConnector, CoinGeckoConnector, EodhdConnector, FinnhubConnector,
    FmpConnector,
};
use mercato_core::{MercatoConnector, MercatoError};

use crate::config::ServerConfig;

/// Rate-limited connectors for every configured provider, in priority order:
/// FMP, Alpaca, Finnhub, EODHD, CoinGecko, Alpha Vantage.
///
/// FMP and Alpaca lead so they are the two fast legs of a best-price fan-out
/// and the first two equity providers a search consults.
///
/// # Errors
/// Propagates connector construction failures (invalid base URLs).
pub fn connectors(cfg: &ServerConfig) -> Result<Vec<Arc<dyn MercatoConnector>>, MercatoError> {
    let p = &cfg.providers;
    let mut out = Vec::new();
    if let Some(c) = &p.fmp {
        out.push(FmpConnector::rate_limited(c.clone())?.build());
    }
    if let Some(c) = &p.alpaca {
        out.push(AlpacaConnector::rate_limited(c.clone())?.build());
    }
    if let Some(c) = &p.finnhub {
        out.push(FinnhubConnector::rate_limited(c.clone())?.build());
    }
    if let Some(c) = &p.eodhd {
        out.push(EodhdConnector::rate_limited(c.clone())?.build());
    }
    out.push(CoinGeckoConnector::rate_limited(p.coingecko.clone())?.build());
    let av_quota = cfg.alphavantage_quota(&AlphaVantageConnector::FREE_TIER);
    out.push(
        AlphaVantageConnector::builder(p.alphavantage.clone())?
            .with_quota(&av_quota)
            .build(),
    );
    Ok(out)
}

/// Orchestrator over [`connectors`] with the configured settings.
///
/// # Errors
/// Propagates connector and builder failures.
pub fn orchestrator(cfg: &ServerConfig) -> Result<Mercato, MercatoError> {
    let mut builder = Mercato::builder().config(cfg.mercato.clone());
    for c in connectors(cfg)? {
        builder = builder.with_connector(c);
    }
    builder.build()
}

/// Socket connectors for the realtime manager: Finnhub primary, Alpaca backup.
#[must_use]
pub fn stream_connectors(
    mercato: &Mercato,
) -> (Option<Arc<dyn MercatoConnector>>, Option<Arc<dyn MercatoConnector>>) {
    (
        mercato.connector(FinnhubConnector::KEY.as_str()).cloned(),
        mercato.connector(AlpacaConnector::KEY.as_str()).cloned(),
    )
}

/// Orchestrator and, when a streaming provider is configured, a started
/// realtime manager.
///
/// # Errors
/// Propagates connector and builder failures.
pub fn build(cfg: &ServerConfig) -> Result<(Mercato, Option<RealtimeManager>), MercatoError> {
    let mercato = orchestrator(cfg)?;
    let realtime = match stream_connectors(&mercato) {
        (None, None) => {
            tracing::warn!(
                target: "mercato_server::app",
                "no streaming provider configured; /api/stream is disabled"
            );
            None
        }
        (primary, backup) => {
            let mut rt = mercato.realtime();
            if let Some(c) = primary {
                rt = rt.primary(c);
            }
            if let Some(c) = backup {
                rt = rt.backup(c);
            }
            Some(rt.start()?)
        }
    };
    Ok((mercato, realtime))
}
