//! Financial Modeling Prep: quick quotes, search, and fundamentals.

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

const DEFAULT_BASE: &str = "https://financialmodelingprep.com";
const ENDPOINTS: &[&str] = &[
    "quote",
    "search",
    "profile",
    "key-metrics",
    "ratios",
    "income-statement",
    "historical-price-full",
];

/// Financial Modeling Prep v3 connector.
pub struct FmpConnector {
    http: Http,
    cfg: ProviderConfig,
}

impl FmpConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("fmp");

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

    async fn get(&self, path: &[&str], mut query: Vec<(&str, String)>) -> Result<Value, MercatoError> {
        let key = require_key(Self::KEY.as_str(), &self.cfg, "FMP_API_KEY")?;
        query.push(("apikey", key.to_string()));
        let mut segments = vec!["api", "v3"];
        segments.extend_from_slice(path);
        self.http.get_json(&segments, &query, &[]).await
    }
}

fn quote_from_row(row: &Value) -> Result<Option<Quote>, MercatoError> {
    let symbol = string_or_empty(row.get("symbol"));
    let price = decimal_opt(row.get("price"));
    if symbol.is_empty() || is_sentinel_price(price) {
        return Ok(None);
    }
    let class = match string_or_empty(row.get("exchange")).as_str() {
        "CRYPTO" => AssetClass::Crypto,
        "COMMODITY" => AssetClass::Commodity,
        _ => AssetClass::Equity,
    };
    Quote::builder(symbol, FmpConnector::KEY.as_str())
        .name(string_or_empty(row.get("name")))
        .price(price.unwrap_or_default())
        .change(decimal_or_zero(row.get("change")))
        .change_percent(decimal_or_zero(row.get("changesPercentage")))
        .volume(u64_or_zero(row.get("volume")))
        .market_cap(decimal_opt(row.get("marketCap")))
        .asset_class(class)
        .exchange(string_or_empty(row.get("exchange")))
        .timestamp(unix_timestamp(row.get("timestamp")))
        .build()
        .map(Some)
}

fn rows(body: &Value) -> &[Value] {
    body.as_array().map_or(&[][..], Vec::as_slice)
}

#[async_trait]
impl QuoteProvider for FmpConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let body = self.get(&["quote", symbol.as_str()], Vec::new()).await?;
        let quote = match rows(&body).first() {
            Some(row) => quote_from_row(row)?,
            None => None,
        };
        quote.ok_or_else(|| MercatoError::not_found(format!("quote for {symbol}")))
    }
}

#[async_trait]
impl BatchQuoteProvider for FmpConnector {
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let joined = targets
            .iter()
            .map(|t| t.id.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let body = self.get(&["quote", joined.as_str()], Vec::new()).await?;
        let mut out = Vec::new();
        for row in rows(&body) {
            if let Some(q) = quote_from_row(row)? {
                out.push(q);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl SearchProvider for FmpConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        let body = self
            .get(
                &["search"],
                vec![("query", query.trim().to_string()), ("limit", "10".to_string())],
            )
            .await?;
        let hits: Vec<CandidateMatch> = rows(&body)
            .iter()
            .filter_map(|row| {
                let symbol = string_or_empty(row.get("symbol"));
                if symbol.is_empty() {
                    return None;
                }
                let mut hit = CandidateMatch::ticker(symbol, string_or_empty(row.get("name")));
                hit.exchange = string_opt(row.get("exchangeShortName"));
                hit.currency = string_opt(row.get("currency"));
                if matches!(hit.exchange.as_deref(), Some("ETF" | "MUTUAL_FUND")) {
                    hit.asset_class = AssetClass::Fund;
                }
                Some(hit)
            })
            .collect();
        if hits.is_empty() {
            return Err(MercatoError::not_found(format!("search results for {query}")));
        }
        Ok(hits)
    }
}

#[async_trait]
impl EndpointProvider for FmpConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let mut query = passthrough(&params.extra, &["apikey", "from", "to"]);
        if endpoint == "search" {
            if !params.extra.contains_key("query") {
                query.push(("query", params.require_symbol(endpoint)?));
            }
            return self.get(&["search"], query).await;
        }
        let symbol = params.require_symbol(endpoint)?;
        if let Some(from) = params.from {
            query.push(("from", from.to_string()));
        }
        if let Some(to) = params.to {
            query.push(("to", to.to_string()));
        }
        self.get(&[endpoint, symbol.as_str()], query).await
    }
}

impl MercatoConnector for FmpConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Financial Modeling Prep"
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
