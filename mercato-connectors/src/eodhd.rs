//! EOD Historical Data: delayed real-time quotes and bulk end-of-day prices.

use async_trait::async_trait;
use mercato_core::connector::{
    BatchQuoteProvider, ConnectorKey, EndpointProvider, MercatoConnector, ProxyParams,
    QuoteProvider, SearchProvider,
};
use mercato_core::normalize::{
    decimal_opt, decimal_or_zero, is_sentinel_price, string_opt, string_or_empty, u64_or_zero,
    unix_timestamp,
};
use mercato_core::{AssetClass, CandidateMatch, MercatoError, ProviderConfig, Quote};
use serde_json::Value;

use crate::http::{Http, passthrough, require_key};

const DEFAULT_BASE: &str = "https://eodhd.com/api";
const ENDPOINTS: &[&str] = &["real-time", "eod", "eod-bulk-last-day", "search", "fundamentals"];

/// EODHD connector. Bare tickers are treated as US listings.
pub struct EodhdConnector {
    http: Http,
    cfg: ProviderConfig,
}

/// `AAPL` -> `AAPL.US`; tickers that already carry an exchange suffix pass through.
fn listing(symbol: &str) -> String {
    let s = symbol.trim().to_ascii_uppercase();
    if s.contains('.') { s } else { format!("{s}.US") }
}

/// `AAPL.US` -> `AAPL`; other exchange suffixes are kept.
fn display_symbol(code: &str) -> String {
    let c = code.trim().to_ascii_uppercase();
    c.strip_suffix(".US").map(str::to_string).unwrap_or(c)
}

impl EodhdConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("eodhd");

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

    async fn get(&self, segments: &[&str], mut query: Vec<(&str, String)>) -> Result<Value, MercatoError> {
        let key = require_key(Self::KEY.as_str(), &self.cfg, "EODHD_API_KEY")?;
        query.push(("api_token", key.to_string()));
        query.push(("fmt", "json".to_string()));
        self.http.get_json(segments, &query, &[]).await
    }

    fn quote_from_row(row: &Value) -> Result<Option<Quote>, MercatoError> {
        let code = string_or_empty(row.get("code"));
        // "NA" strings read as None
        let price = decimal_opt(row.get("close"));
        if code.is_empty() || is_sentinel_price(price) {
            return Ok(None);
        }
        Quote::builder(display_symbol(&code), Self::KEY.as_str())
            .price(price.unwrap_or_default())
            .change(decimal_or_zero(row.get("change")))
            .change_percent(decimal_or_zero(row.get("change_p")))
            .volume(u64_or_zero(row.get("volume")))
            .timestamp(unix_timestamp(row.get("timestamp")))
            .build()
            .map(Some)
    }
}

#[async_trait]
impl QuoteProvider for EodhdConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let body = self
            .get(&["real-time", listing(symbol).as_str()], Vec::new())
            .await?;
        Self::quote_from_row(&body)?
            .ok_or_else(|| MercatoError::not_found(format!("quote for {}", symbol.trim())))
    }
}

#[async_trait]
impl BatchQuoteProvider for EodhdConnector {
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> {
        let Some((first, rest)) = targets.split_first() else {
            return Ok(Vec::new());
        };
        let mut query = Vec::new();
        if !rest.is_empty() {
            let others = rest
                .iter()
                .map(|t| listing(&t.id))
                .collect::<Vec<_>>()
                .join(",");
            query.push(("s", others));
        }
        let body = self
            .get(&["real-time", listing(&first.id).as_str()], query)
            .await?;
        // one symbol answers with an object, several with an array
        let rows = match body {
            Value::Array(rows) => rows,
            obj @ Value::Object(_) => vec![obj],
            _ => Vec::new(),
        };
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(q) = Self::quote_from_row(row)? {
                out.push(q);
            }
        }
        Ok(out)
    }
}

fn asset_class(kind: &str) -> AssetClass {
    match kind.to_ascii_uppercase().as_str() {
        "ETF" | "FUND" => AssetClass::Fund,
        "CRYPTO" => AssetClass::Crypto,
        _ => AssetClass::Equity,
    }
}

#[async_trait]
impl SearchProvider for EodhdConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        let body = self
            .get(&["search", query.trim()], vec![("limit", "10".to_string())])
            .await?;
        let hits: Vec<CandidateMatch> = body
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let code = string_or_empty(row.get("Code"));
                        if code.is_empty() {
                            return None;
                        }
                        let exchange = string_or_empty(row.get("Exchange"));
                        let symbol = if exchange.is_empty() || exchange == "US" {
                            code
                        } else {
                            format!("{code}.{exchange}")
                        };
                        let mut hit = CandidateMatch::ticker(symbol, string_or_empty(row.get("Name")));
                        hit.asset_class = asset_class(&string_or_empty(row.get("Type")));
                        hit.exchange = (!exchange.is_empty()).then_some(exchange);
                        hit.currency = string_opt(row.get("Currency"));
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
impl EndpointProvider for EodhdConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let mut query = passthrough(&params.extra, &["api_token", "fmt", "from", "to"]);
        if let Some(from) = params.from {
            query.push(("from", from.to_string()));
        }
        if let Some(to) = params.to {
            query.push(("to", to.to_string()));
        }
        let target = match endpoint {
            // exchange code, not a ticker
            "eod-bulk-last-day" => params
                .symbol
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("US")
                .to_ascii_uppercase(),
            "search" => params.require_symbol(endpoint)?,
            _ => listing(&params.require_symbol(endpoint)?),
        };
        self.get(&[endpoint, target.as_str()], query).await
    }
}

impl MercatoConnector for EodhdConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "EOD Historical Data"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        matches!(kind, AssetClass::Equity | AssetClass::Fund)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        Some(self as &dyn QuoteProvider)
    }
    fn as_batch_quote_provider(&self) -> Option<&dyn BatchQuoteProvider> {
        Some(self as &dyn BatchQuoteProvider)
    }
    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        Some(self as &dyn SearchProvider)
    }
    fn as_endpoint_provider(&self) -> Option<&dyn EndpointProvider> {
        Some(self as &dyn EndpointProvider)
    }
}
