//! mercato HTTP server.
//!
//! # Environment Variables
//!
//! ## Provider keys (a missing key disables the provider)
//! - `FMP_API_KEY`: first quote and search provider, plus fundamentals
//! - `ALPACA_API_KEY_ID`, `ALPACA_API_SECRET_KEY`: backup quotes and the backup price stream
//! - `FINNHUB_API_KEY`: quotes, search and the primary price stream
//! - `EODHD_API_KEY`: quotes, search and end-of-day data
//! - `COINGECKO_API_KEY`: optional; CoinGecko runs keyless without it
//! - `ALPHAVANTAGE_API_KEY`: optional; falls back to the demo key
//!
//! ## Optional
//! - `MERCATO_BIND`: listen address (default: 0.0.0.0:8080)
//! - `MERCATO_PROVIDER_TIMEOUT_MS`: per-provider call timeout (default: 10000)
//! - `MERCATO_BUCKET_SECS`: best-price cache bucket width (default: 30)
//! - `MERCATO_REALTIME_MAX_SYMBOLS`: symbols per stream connection (default: 30)
//! - `MERCATO_RECONNECT_DELAY_MS`: stream reconnect delay (default: 5000)
//! - `ALPHAVANTAGE_DAILY_LIMIT`: Alpha Vantage calls per day (default: 25)
//! - `RUST_LOG`: log filter (default: info)

use std::sync::Arc;

use mercato_server::{AppState, MemoryStore, ServerConfig, app, router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind,
        provider_timeout_ms = config.mercato.provider_timeout.as_millis() as u64,
        bucket_secs = config.mercato.bucket_width.as_secs(),
        max_symbols = config.mercato.realtime.max_symbols,
        "configuration loaded"
    );

    let (mercato, realtime) = app::build(&config)?;
    let providers: Vec<&str> = mercato.connectors().iter().map(|c| c.name()).collect();
    tracing::info!(providers = ?providers, "providers registered");

    let realtime = realtime.map(Arc::new);
    let mut state = AppState::new(Arc::new(mercato), Arc::new(MemoryStore::new()));
    if let Some(live) = &realtime {
        state = state.with_realtime(Arc::clone(live));
    }

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(live) = realtime {
        live.shutdown().await;
    }
    tracing::info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
