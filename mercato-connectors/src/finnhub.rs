//! Finnhub: realtime quotes, symbol search, and the primary trade websocket.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use mercato_core::connector::{
    ConnectorKey, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider, SearchProvider,
};
use mercato_core::normalize::{
    decimal_opt, decimal_or_zero, is_sentinel_price, string_or_empty, u64_or_zero, unix_timestamp,
};
use mercato_core::{
    AssetClass, CandidateMatch, MercatoError, ProviderConfig, Quote, RealtimePrice, StreamEvent,
    StreamProvider,
};
use serde_json::{Value, json};

use crate::http::{Http, passthrough, require_key};

const DEFAULT_BASE: &str = "https://finnhub.io/api/v1";
const DEFAULT_STREAM: &str = "wss://ws.finnhub.io";
const ENDPOINTS: &[&str] = &["quote", "search", "profile2", "candle", "company-news", "metric"];

/// Finnhub REST and websocket connector.
pub struct FinnhubConnector {
    http: Http,
    cfg: ProviderConfig,
}

impl FinnhubConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("finnhub");

    /// Build from provider settings.
    ///
    /// # Errors
    /// Fails when the base URL is invalid or the HTTP client cannot be built.
    pub fn new(cfg: ProviderConfig) -> Result<Self, MercatoError> {
        Ok(Self {
            http: Http::new(Self::KEY.as_str(), &cfg, DEFAULT_BASE)?,
            cfg,
        })
    }

    fn token(&self) -> Result<String, MercatoError> {
        require_key(Self::KEY.as_str(), &self.cfg, "FINNHUB_API_KEY").map(str::to_string)
    }

    async fn get(&self, segments: &[&str], mut query: Vec<(&str, String)>) -> Result<Value, MercatoError> {
        query.push(("token", self.token()?));
        self.http.get_json(segments, &query, &[]).await
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

fn asset_class(kind: &str) -> AssetClass {
    match kind {
        "ETP" | "ETF" => AssetClass::Fund,
        "Crypto" => AssetClass::Crypto,
        _ => AssetClass::Equity,
    }
}

#[async_trait]
impl QuoteProvider for FinnhubConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let body = self.get(&["quote"], vec![("symbol", symbol.clone())]).await?;
        let price = decimal_opt(body.get("c"));
        if is_sentinel_price(price) {
            return Err(MercatoError::not_found(format!("quote for {symbol}")));
        }
        Quote::builder(&symbol, Self::KEY.as_str())
            .price(price.unwrap_or_default())
            .change(decimal_or_zero(body.get("d")))
            .change_percent(decimal_or_zero(body.get("dp")))
            .timestamp(unix_timestamp(body.get("t")))
            .realtime(true)
            .build()
    }
}

#[async_trait]
impl SearchProvider for FinnhubConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        let body = self.get(&["search"], vec![("q", query.trim().to_string())]).await?;
        let hits: Vec<CandidateMatch> = body
            .get("result")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let symbol = string_or_empty(row.get("symbol"));
                        if symbol.is_empty() {
                            return None;
                        }
                        let mut hit = CandidateMatch::ticker(symbol, string_or_empty(row.get("description")));
                        hit.asset_class = asset_class(&string_or_empty(row.get("type")));
                        Some(hit)
                    })
                    .collect()
            })
            .unwrap_or_default();
        if hits.is_empty() {
            return Err(MercatoError::not_found(format!("search results for {query}")));
        }
        Ok(hits)
    }
}

#[async_trait]
impl EndpointProvider for FinnhubConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let mut query = passthrough(&params.extra, &["token", "symbol", "from", "to"]);
        let segments: &[&str] = match endpoint {
            "search" => {
                if !params.extra.contains_key("q") {
                    query.push(("q", params.require_symbol(endpoint)?));
                }
                &["search"]
            }
            "quote" => {
                query.push(("symbol", params.require_symbol(endpoint)?));
                &["quote"]
            }
            "profile2" => {
                query.push(("symbol", params.require_symbol(endpoint)?));
                &["stock", "profile2"]
            }
            "metric" => {
                query.push(("symbol", params.require_symbol(endpoint)?));
                if !params.extra.contains_key("metric") {
                    query.push(("metric", "all".to_string()));
                }
                &["stock", "metric"]
            }
            "candle" => {
                query.push(("symbol", params.require_symbol(endpoint)?));
                if !params.extra.contains_key("resolution") {
                    query.push(("resolution", "D".to_string()));
                }
                let to = params.to.unwrap_or_else(|| Utc::now().date_naive());
                let from = params.from.unwrap_or_else(|| days_before(to, 30));
                let unix = |d: NaiveDate| {
                    d.and_hms_opt(0, 0, 0)
                        .map_or(0, |t| t.and_utc().timestamp())
                        .to_string()
                };
                query.push(("from", unix(from)));
                query.push(("to", unix(to)));
                &["stock", "candle"]
            }
            _ => {
                query.push(("symbol", params.require_symbol(endpoint)?));
                let to = params.to.unwrap_or_else(|| Utc::now().date_naive());
                let from = params.from.unwrap_or_else(|| days_before(to, 7));
                query.push(("from", from.to_string()));
                query.push(("to", to.to_string()));
                &["company-news"]
            }
        };
        self.get(segments, query).await
    }
}

impl StreamProvider for FinnhubConnector {
    fn stream_url(&self) -> Result<String, MercatoError> {
        let token = self.token()?;
        let base = self.cfg.stream_url.as_deref().unwrap_or(DEFAULT_STREAM);
        Ok(format!("{base}?token={token}"))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .map(|s| json!({"type": "subscribe", "symbol": s}).to_string())
            .collect()
    }

    fn unsubscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .map(|s| json!({"type": "unsubscribe", "symbol": s}).to_string())
            .collect()
    }

    fn decode(&self, text: &str) -> Result<Vec<StreamEvent>, MercatoError> {
        let v: Value = serde_json::from_str(text).map_err(|e| MercatoError::Data(e.to_string()))?;
        match v.get("type").and_then(Value::as_str) {
            Some("trade") => Ok(v
                .get("data")
                .and_then(Value::as_array)
                .map(|trades| {
                    trades
                        .iter()
                        .filter_map(|t| {
                            let symbol = string_or_empty(t.get("s"));
                            let price = decimal_opt(t.get("p"))?;
                            if symbol.is_empty() {
                                return None;
                            }
                            let volume = u64_or_zero(t.get("v"));
                            Some(StreamEvent::Price(RealtimePrice {
                                symbol: symbol.to_ascii_uppercase(),
                                price,
                                timestamp: unix_timestamp(t.get("t")).unwrap_or_else(Utc::now),
                                volume: (volume > 0).then_some(volume),
                                bid: None,
                                ask: None,
                                source: Self::KEY.as_str().to_string(),
                            }))
                        })
                        .collect()
                })
                .unwrap_or_default()),
            Some("ping") => Ok(Vec::new()),
            Some("error") => Ok(vec![StreamEvent::Error(
                string_or_empty(v.get("msg")),
            )]),
            _ => Err(MercatoError::Data(format!("unrecognized finnhub frame: {text}"))),
        }
    }
}

impl MercatoConnector for FinnhubConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Finnhub"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        matches!(kind, AssetClass::Equity | AssetClass::Fund)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }
    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        Some(self as &dyn SearchProvider)
    }
    fn as_endpoint_provider(&self) -> Option<&dyn EndpointProvider> {
        Some(self as &dyn EndpointProvider)
    }
    fn as_stream_provider(&self) -> Option<&dyn StreamProvider> {
        Some(self as &dyn StreamProvider)
    }
}
