//! Mercato aggregates market data across several upstream providers.
//!
//! Overview
//! - Connectors implement the `mercato_core` role traits; registration order is
//!   priority order.
//! - `search` fans a free-text query out in tiers (fast equity, crypto, slow
//!   fallback), prices the candidates, and deduplicates by symbol.
//! - `best_price` asks a few providers at once, prefers realtime quotes, and
//!   caches the winner per symbol and time bucket so concurrent callers share
//!   one upstream fan-out.
//! - `proxy` forwards allow-listed raw endpoints to a named provider.
//! - `realtime` keeps a primary and a backup socket subscribed to the same
//!   symbols and reconnects each on its own schedule.
//!
//! Provider failures never fail a search; they are reported as diagnostics on
//! the `SearchReport`. Single-answer operations fail with the most useful error.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use mercato::Mercato;
//!
//! let mercato = Mercato::builder()
//!     .with_connector(finnhub.clone())
//!     .with_connector(alpaca.clone())
//!     .with_connector(coingecko)
//!     .with_connector(alphavantage)
//!     .build()?;
//!
//! let report = mercato.search("apple").await?;
//! let quote = mercato.best_price("AAPL").await?;
//!
//! let live = mercato.realtime().primary(finnhub).backup(alpaca).start()?;
//! let id = live.subscribe("AAPL", |p| println!("{} {}", p.symbol, p.price))?;
//! live.unsubscribe_callback(id);
//! live.shutdown().await;
//! ```
#![warn(missing_docs)]

mod cache;
pub(crate) mod core;
pub mod realtime;
mod router;

pub use core::{Mercato, MercatoBuilder};
pub use realtime::{RealtimeBuilder, RealtimeManager, SubscriptionId};
pub use router::best_price::select_best;
pub use router::util::{
    MAX_QUERY_CHARS, MIN_QUERY_CHARS, dedup_by_symbol, validate_query, validate_symbol,
};

pub use mercato_middleware::{ConnectorBuilder, QuotaAwareConnector, QuotaMiddleware};

// Re-export core types for convenience
pub use mercato_core::{
    AssetClass, BackoffConfig, CandidateMatch, Capability, Clock, ConnectionState, LatencyClass,
    ManualClock, MercatoConfig, MercatoConnector, MercatoError, ProviderConfig, ProxyParams, Quote,
    RealtimeConfig, RealtimePrice, SearchReport, StreamEvent, StreamHandle, StreamProvider,
    StreamRole, SystemClock,
};
