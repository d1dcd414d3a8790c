//! Normalized quote shapes shared by every provider.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;

/// Broad asset class of a quoted instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Listed stock.
    #[default]
    Equity,
    /// Cryptocurrency.
    Crypto,
    /// ETF or mutual fund.
    Fund,
    /// Commodity or commodity future.
    Commodity,
}

impl AssetClass {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Crypto => "crypto",
            Self::Fund => "fund",
            Self::Commodity => "commodity",
        }
    }
}

/// A single normalized price observation for a symbol from one provider.
///
/// Quotes are never mutated after construction; a newer observation replaces an
/// older one wholesale. Build through [`Quote::builder`] so the non-negative price
/// invariant is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Canonical uppercase ticker (e.g. `AAPL`, `BTC`).
    pub symbol: String,
    /// Display name; falls back to the symbol.
    pub name: String,
    /// Last price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Absolute change against the previous close.
    #[serde(with = "rust_decimal::serde::float")]
    pub change: Decimal,
    /// Percent change against the previous close.
    #[serde(with = "rust_decimal::serde::float")]
    pub change_percent: Decimal,
    /// Traded volume for the session (0 when unknown).
    pub volume: u64,
    /// Market capitalization when the provider reports one.
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub market_cap: Option<Decimal>,
    /// Asset class.
    pub asset_class: AssetClass,
    /// Exchange or market tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// ISO currency code.
    pub currency: String,
    /// Provider observation time, or aggregation time when the provider has none.
    pub timestamp: DateTime<Utc>,
    /// Connector key of the originating provider.
    pub source: String,
    /// True when the quote came from a live channel.
    pub realtime: bool,
}

impl Quote {
    /// Start building a quote for `symbol` originating from `source`.
    pub fn builder(symbol: impl Into<String>, source: impl Into<String>) -> QuoteBuilder {
        QuoteBuilder {
            symbol: symbol.into(),
            source: source.into(),
            name: None,
            price: Decimal::ZERO,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            volume: 0,
            market_cap: None,
            asset_class: AssetClass::Equity,
            exchange: None,
            currency: None,
            timestamp: None,
            realtime: false,
        }
    }
}

/// Builder for [`Quote`].
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    symbol: String,
    source: String,
    name: Option<String>,
    price: Decimal,
    change: Decimal,
    change_percent: Decimal,
    volume: u64,
    market_cap: Option<Decimal>,
    asset_class: AssetClass,
    exchange: Option<String>,
    currency: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    realtime: bool,
}

impl QuoteBuilder {
    /// Display name. Empty names are ignored.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = Some(name);
        }
        self
    }

    /// Last price.
    #[must_use]
    pub const fn price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// Absolute change.
    #[must_use]
    pub const fn change(mut self, change: Decimal) -> Self {
        self.change = change;
        self
    }

    /// Percent change.
    #[must_use]
    pub const fn change_percent(mut self, pct: Decimal) -> Self {
        self.change_percent = pct;
        self
    }

    /// Session volume.
    #[must_use]
    pub const fn volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    /// Market capitalization; zero is treated as unknown.
    #[must_use]
    pub fn market_cap(mut self, cap: Option<Decimal>) -> Self {
        self.market_cap = cap.filter(|c| !c.is_zero());
        self
    }

    /// Asset class.
    #[must_use]
    pub const fn asset_class(mut self, class: AssetClass) -> Self {
        self.asset_class = class;
        self
    }

    /// Exchange or market tag. Empty tags are ignored.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        let exchange = exchange.into();
        if !exchange.trim().is_empty() {
            self.exchange = Some(exchange);
        }
        self
    }

    /// ISO currency code; defaults to `USD`.
    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        if !currency.trim().is_empty() {
            self.currency = Some(currency.to_ascii_uppercase());
        }
        self
    }

    /// Observation time; defaults to the build time.
    #[must_use]
    pub const fn timestamp(mut self, ts: Option<DateTime<Utc>>) -> Self {
        self.timestamp = ts;
        self
    }

    /// Mark the quote as coming from a live channel.
    #[must_use]
    pub const fn realtime(mut self, yes: bool) -> Self {
        self.realtime = yes;
        self
    }

    /// Finish the quote.
    ///
    /// # Errors
    /// Returns `Data` when the symbol is blank or the price is negative.
    pub fn build(self) -> Result<Quote, MercatoError> {
        let symbol = self.symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(MercatoError::Data(format!(
                "{}: quote without symbol",
                self.source
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(MercatoError::Data(format!(
                "{}: negative price {} for {symbol}",
                self.source, self.price
            )));
        }
        Ok(Quote {
            name: self.name.unwrap_or_else(|| symbol.clone()),
            symbol,
            price: self.price,
            change: self.change,
            change_percent: self.change_percent,
            volume: self.volume,
            market_cap: self.market_cap,
            asset_class: self.asset_class,
            exchange: self.exchange,
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            source: self.source,
            realtime: self.realtime,
        })
    }
}

/// A single price update pushed by a realtime stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimePrice {
    /// Uppercase ticker.
    pub symbol: String,
    /// Trade or mid price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Exchange time of the event.
    pub timestamp: DateTime<Utc>,
    /// Trade size when the frame carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// Best bid when the frame carries one.
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bid: Option<Decimal>,
    /// Best ask when the frame carries one.
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ask: Option<Decimal>,
    /// Connector key of the stream that produced the update.
    pub source: String,
}

/// Lifecycle of one realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Socket handshake in progress.
    Connecting,
    /// Socket open; ready for providers that need no authentication.
    Connected,
    /// Provider acknowledged credentials.
    Authenticated,
}

/// One search hit before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    /// Provider-native identifier used for follow-up price calls.
    pub id: String,
    /// Uppercase ticker.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Asset class.
    pub asset_class: AssetClass,
    /// Exchange or market tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// ISO currency code, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CandidateMatch {
    /// Candidate whose provider id is the ticker itself.
    pub fn ticker(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        let symbol = symbol.into().trim().to_ascii_uppercase();
        Self {
            id: symbol.clone(),
            symbol,
            name: name.into(),
            asset_class: AssetClass::Equity,
            exchange: None,
            currency: None,
        }
    }
}
