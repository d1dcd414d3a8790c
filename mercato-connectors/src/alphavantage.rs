//! Alpha Vantage: slow, heavily rate-limited quotes plus historical series and indicators.

use async_trait::async_trait;
use mercato_core::connector::{
    ConnectorKey, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider, SearchProvider,
};
use mercato_core::normalize::{
    datetime_opt, decimal_opt, decimal_or_zero, is_sentinel_price, string_opt, string_or_empty,
    u64_or_zero,
};
use mercato_core::{
    AssetClass, CandidateMatch, LatencyClass, MercatoError, ProviderConfig, Quote,
};
use serde_json::Value;

use crate::http::{Http, passthrough};

const DEFAULT_BASE: &str = "https://www.alphavantage.co";
const DEMO_KEY: &str = "demo";
const ENDPOINTS: &[&str] = &[
    "GLOBAL_QUOTE",
    "SYMBOL_SEARCH",
    "TIME_SERIES_DAILY",
    "TIME_SERIES_INTRADAY",
    "SMA",
    "EMA",
    "RSI",
    "MACD",
    "OVERVIEW",
];

/// Alpha Vantage connector. Without a key it uses the public `demo` key, which
/// only answers for a handful of symbols.
pub struct AlphaVantageConnector {
    http: Http,
    cfg: ProviderConfig,
}

impl AlphaVantageConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("alphavantage");

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

    async fn query(&self, function: &str, mut query: Vec<(&str, String)>) -> Result<Value, MercatoError> {
        query.push(("function", function.to_string()));
        query.push(("apikey", self.cfg.key().unwrap_or(DEMO_KEY).to_string()));
        self.http.get_json(&["query"], &query, &[]).await
    }
}

fn asset_class(kind: &str) -> AssetClass {
    match kind {
        "ETF" | "Mutual Fund" => AssetClass::Fund,
        _ => AssetClass::Equity,
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let body = self
            .query("GLOBAL_QUOTE", vec![("symbol", symbol.clone())])
            .await?;
        let row = body
            .get("Global Quote")
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| MercatoError::not_found(format!("quote for {symbol}")))?;
        let price = decimal_opt(row.get("05. price"));
        if is_sentinel_price(price) {
            return Err(MercatoError::not_found(format!("quote for {symbol}")));
        }
        let reported = string_opt(row.get("01. symbol")).unwrap_or_else(|| symbol.clone());
        Quote::builder(reported, Self::KEY.as_str())
            .price(price.unwrap_or_default())
            .change(decimal_or_zero(row.get("09. change")))
            .change_percent(decimal_or_zero(row.get("10. change percent")))
            .volume(u64_or_zero(row.get("06. volume")))
            .timestamp(datetime_opt(row.get("07. latest trading day")))
            .build()
    }
}

#[async_trait]
impl SearchProvider for AlphaVantageConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        let body = self
            .query("SYMBOL_SEARCH", vec![("keywords", query.trim().to_string())])
            .await?;
        let hits: Vec<CandidateMatch> = body
            .get("bestMatches")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let symbol = string_or_empty(row.get("1. symbol"));
                        if symbol.is_empty() {
                            return None;
                        }
                        let mut hit = CandidateMatch::ticker(symbol, string_or_empty(row.get("2. name")));
                        hit.asset_class = asset_class(&string_or_empty(row.get("3. type")));
                        hit.exchange = string_opt(row.get("4. region"));
                        hit.currency = string_opt(row.get("8. currency"));
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
impl EndpointProvider for AlphaVantageConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let mut query = passthrough(&params.extra, &["function", "apikey"]);
        let has = |k: &str| params.extra.contains_key(k);
        if endpoint == "SYMBOL_SEARCH" {
            if !has("keywords") {
                query.push(("keywords", params.require_symbol(endpoint)?));
            }
        } else if !has("symbol") {
            query.push(("symbol", params.require_symbol(endpoint)?));
        }
        match endpoint {
            "TIME_SERIES_INTRADAY" if !has("interval") => query.push(("interval", "5min".to_string())),
            "SMA" | "EMA" | "RSI" | "MACD" => {
                for (k, v) in [("interval", "daily"), ("time_period", "14"), ("series_type", "close")] {
                    if !has(k) && !(endpoint == "MACD" && k == "time_period") {
                        query.push((k, v.to_string()));
                    }
                }
            }
            _ => {}
        }
        self.query(endpoint, query).await
    }
}

impl MercatoConnector for AlphaVantageConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Alpha Vantage"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        matches!(kind, AssetClass::Equity | AssetClass::Fund)
    }

    fn latency(&self) -> LatencyClass {
        LatencyClass::Slow
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
}
