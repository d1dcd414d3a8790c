//! Alpaca market data: snapshot quotes and the authenticated backup stream.

use async_trait::async_trait;
use chrono::Utc;
use mercato_core::connector::{
    ConnectorKey, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider,
};
use mercato_core::normalize::{
    datetime_opt, decimal_opt, is_sentinel_price, string_or_empty, u64_or_zero,
};
use mercato_core::{
    AssetClass, MercatoError, ProviderConfig, Quote, RealtimePrice, StreamEvent, StreamProvider,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::http::{Http, passthrough};

const DEFAULT_BASE: &str = "https://data.alpaca.markets";
const DEFAULT_STREAM: &str = "wss://stream.data.alpaca.markets/v2/iex";
const ENDPOINTS: &[&str] = &["snapshot", "bars", "trades", "quotes", "latest-trade"];

/// Alpaca data API connector (IEX feed).
pub struct AlpacaConnector {
    http: Http,
    cfg: ProviderConfig,
}

impl AlpacaConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("alpaca");

    /// Build from provider settings; `api_key` is the key id, `api_secret` the secret key.
    ///
    /// # Errors
    /// Fails when the base URL is invalid or the HTTP client cannot be built.
    pub fn new(cfg: ProviderConfig) -> Result<Self, MercatoError> {
        Ok(Self {
            http: Http::new(Self::KEY.as_str(), &cfg, DEFAULT_BASE)?,
            cfg,
        })
    }

    fn credentials(&self) -> Result<(&str, &str), MercatoError> {
        let key = self
            .cfg
            .key()
            .ok_or_else(|| MercatoError::misconfigured(Self::KEY.as_str(), "ALPACA_API_KEY_ID is not set"))?;
        let secret = self.cfg.secret_value().ok_or_else(|| {
            MercatoError::misconfigured(Self::KEY.as_str(), "ALPACA_API_SECRET_KEY is not set")
        })?;
        Ok((key, secret))
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value, MercatoError> {
        let (key, secret) = self.credentials()?;
        let headers = [
            ("APCA-API-KEY-ID", key.to_string()),
            ("APCA-API-SECRET-KEY", secret.to_string()),
        ];
        self.http.get_json(segments, query, &headers).await
    }
}

/// `(price - prev) / prev * 100`, zero when `prev` is missing.
fn percent_change(change: Decimal, prev: Option<Decimal>) -> Decimal {
    match prev {
        Some(p) if !p.is_zero() => (change / p * Decimal::ONE_HUNDRED).round_dp(4),
        _ => Decimal::ZERO,
    }
}

#[async_trait]
impl QuoteProvider for AlpacaConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let body = match self
            .get(
                &["v2", "stocks", symbol.as_str(), "snapshot"],
                &[("feed", "iex".to_string())],
            )
            .await
        {
            Err(MercatoError::UpstreamError {
                status: 404 | 422, ..
            }) => return Err(MercatoError::not_found(format!("quote for {symbol}"))),
            other => other?,
        };

        let price = decimal_opt(body.pointer("/latestTrade/p"))
            .filter(|p| !p.is_zero())
            .or_else(|| decimal_opt(body.pointer("/dailyBar/c")));
        if is_sentinel_price(price) {
            return Err(MercatoError::not_found(format!("quote for {symbol}")));
        }
        let price = price.unwrap_or_default();
        let prev = decimal_opt(body.pointer("/prevDailyBar/c")).filter(|p| !p.is_zero());
        let change = prev.map_or(Decimal::ZERO, |p| price - p);

        Quote::builder(&symbol, Self::KEY.as_str())
            .price(price)
            .change(change)
            .change_percent(percent_change(change, prev))
            .volume(u64_or_zero(body.pointer("/dailyBar/v")))
            .exchange(string_or_empty(body.pointer("/latestTrade/x")))
            .timestamp(
                datetime_opt(body.pointer("/latestTrade/t"))
                    .or_else(|| datetime_opt(body.pointer("/dailyBar/t"))),
            )
            .realtime(true)
            .build()
    }
}

#[async_trait]
impl EndpointProvider for AlpacaConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let symbol = params.require_symbol(endpoint)?;
        let mut query = passthrough(&params.extra, &["start", "end"]);
        if !params.extra.contains_key("feed") {
            query.push(("feed", "iex".to_string()));
        }
        if let Some(from) = params.from {
            query.push(("start", from.to_string()));
        }
        if let Some(to) = params.to {
            query.push(("end", to.to_string()));
        }
        let tail: &[&str] = match endpoint {
            "snapshot" => &["snapshot"],
            "bars" => {
                if !params.extra.contains_key("timeframe") {
                    query.push(("timeframe", "1Day".to_string()));
                }
                &["bars"]
            }
            "trades" => &["trades"],
            "quotes" => &["quotes"],
            _ => &["trades", "latest"],
        };
        let mut segments = vec!["v2", "stocks", symbol.as_str()];
        segments.extend_from_slice(tail);
        self.get(&segments, &query).await
    }
}

fn decode_message(msg: &Value, source: &str) -> Option<StreamEvent> {
    match msg.get("T").and_then(Value::as_str)? {
        "success" if msg.get("msg").and_then(Value::as_str) == Some("authenticated") => {
            Some(StreamEvent::Authenticated)
        }
        "error" => Some(StreamEvent::Error(format!(
            "{} ({})",
            string_or_empty(msg.get("msg")),
            string_or_empty(msg.get("code"))
        ))),
        "t" => {
            let price = decimal_opt(msg.get("p"))?;
            let volume = u64_or_zero(msg.get("s"));
            Some(StreamEvent::Price(RealtimePrice {
                symbol: string_or_empty(msg.get("S")).to_ascii_uppercase(),
                price,
                timestamp: datetime_opt(msg.get("t")).unwrap_or_else(Utc::now),
                volume: (volume > 0).then_some(volume),
                bid: None,
                ask: None,
                source: source.to_string(),
            }))
        }
        "q" => {
            let bid = decimal_opt(msg.get("bp")).filter(|p| !p.is_zero())?;
            let ask = decimal_opt(msg.get("ap")).filter(|p| !p.is_zero())?;
            Some(StreamEvent::Price(RealtimePrice {
                symbol: string_or_empty(msg.get("S")).to_ascii_uppercase(),
                price: (bid + ask) / Decimal::TWO,
                timestamp: datetime_opt(msg.get("t")).unwrap_or_else(Utc::now),
                volume: None,
                bid: Some(bid),
                ask: Some(ask),
                source: source.to_string(),
            }))
        }
        // "success"/"connected", "subscription" acks
        _ => None,
    }
}

impl StreamProvider for AlpacaConnector {
    fn stream_url(&self) -> Result<String, MercatoError> {
        self.credentials()?;
        Ok(self
            .cfg
            .stream_url
            .clone()
            .unwrap_or_else(|| DEFAULT_STREAM.to_string()))
    }

    fn open_frames(&self) -> Result<Vec<String>, MercatoError> {
        let (key, secret) = self.credentials()?;
        Ok(vec![
            json!({"action": "auth", "key": key, "secret": secret}).to_string(),
        ])
    }

    fn requires_auth(&self) -> bool {
        true
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        if symbols.is_empty() {
            return Vec::new();
        }
        vec![json!({"action": "subscribe", "trades": symbols, "quotes": symbols}).to_string()]
    }

    fn unsubscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        if symbols.is_empty() {
            return Vec::new();
        }
        vec![json!({"action": "unsubscribe", "trades": symbols, "quotes": symbols}).to_string()]
    }

    fn decode(&self, text: &str) -> Result<Vec<StreamEvent>, MercatoError> {
        let v: Value = serde_json::from_str(text).map_err(|e| MercatoError::Data(e.to_string()))?;
        let messages = match v {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            other => return Err(MercatoError::Data(format!("unexpected alpaca frame: {other}"))),
        };
        Ok(messages
            .iter()
            .filter_map(|m| decode_message(m, Self::KEY.as_str()))
            .collect())
    }
}

impl MercatoConnector for AlpacaConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Alpaca"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        matches!(kind, AssetClass::Equity | AssetClass::Fund)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }
    fn as_endpoint_provider(&self) -> Option<&dyn EndpointProvider> {
        Some(self as &dyn EndpointProvider)
    }
    fn as_stream_provider(&self) -> Option<&dyn StreamProvider> {
        Some(self as &dyn StreamProvider)
    }
}
