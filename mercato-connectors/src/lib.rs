//! mercato-connectors
//!
//! One connector per upstream market-data provider. Every connector is built
//! from a [`ProviderConfig`](mercato_core::ProviderConfig), shares the same HTTP
//! error mapping, and exposes only the role traits its provider supports.
//!
//! The two realtime providers also implement
//! [`StreamProvider`](mercato_core::StreamProvider): Finnhub is the primary
//! stream, Alpaca the authenticated backup.
#![warn(missing_docs)]

mod builder;
mod http;

mod alpaca;
mod alphavantage;
mod coingecko;
mod eodhd;
mod finnhub;
mod fmp;

pub use alpaca::AlpacaConnector;
pub use alphavantage::AlphaVantageConnector;
pub use coingecko::CoinGeckoConnector;
pub use eodhd::EodhdConnector;
pub use finnhub::FinnhubConnector;
pub use fmp::FmpConnector;
