//! CoinGecko: coin search and batch USD pricing by coin id.

use async_trait::async_trait;
use mercato_core::connector::{
    BatchQuoteProvider, ConnectorKey, EndpointProvider, MercatoConnector, ProxyParams,
    QuoteProvider, SearchProvider,
};
use mercato_core::normalize::{
    decimal_opt, decimal_or_zero, is_sentinel_price, string_or_empty, u64_or_zero, unix_timestamp,
};
use mercato_core::{AssetClass, CandidateMatch, MercatoError, ProviderConfig, Quote};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::{Http, passthrough};

const DEFAULT_BASE: &str = "https://api.coingecko.com/api/v3";
const ENDPOINTS: &[&str] = &["search", "simple-price", "coin", "market-chart", "markets"];

/// Tickers resolvable without a search round-trip.
const KNOWN_COINS: &[(&str, &str, &str)] = &[
    ("BTC", "bitcoin", "Bitcoin"),
    ("ETH", "ethereum", "Ethereum"),
    ("USDT", "tether", "Tether"),
    ("BNB", "binancecoin", "BNB"),
    ("SOL", "solana", "Solana"),
    ("XRP", "ripple", "XRP"),
    ("USDC", "usd-coin", "USDC"),
    ("ADA", "cardano", "Cardano"),
    ("DOGE", "dogecoin", "Dogecoin"),
    ("DOT", "polkadot", "Polkadot"),
    ("LTC", "litecoin", "Litecoin"),
];

/// Candidate for a coin id or a well-known ticker.
fn target_for(raw: &str) -> CandidateMatch {
    let trimmed = raw.trim();
    let known = KNOWN_COINS.iter().find(|(ticker, id, _)| {
        ticker.eq_ignore_ascii_case(trimmed) || id.eq_ignore_ascii_case(trimmed)
    });
    let (id, symbol, name) = match known {
        Some((ticker, id, name)) => ((*id).to_string(), (*ticker).to_string(), (*name).to_string()),
        None => {
            let id = trimmed.to_ascii_lowercase();
            (id.clone(), id.to_ascii_uppercase(), trimmed.to_string())
        }
    };
    CandidateMatch {
        id,
        symbol,
        name,
        asset_class: AssetClass::Crypto,
        exchange: None,
        currency: Some("USD".to_string()),
    }
}

/// CoinGecko public (or demo-key) API connector.
pub struct CoinGeckoConnector {
    http: Http,
    cfg: ProviderConfig,
}

impl CoinGeckoConnector {
    /// Static connector key for priority configuration.
    pub const KEY: ConnectorKey = ConnectorKey::new("coingecko");

    /// Build from provider settings. The API key is optional.
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
        if let Some(key) = self.cfg.key() {
            query.push(("x_cg_demo_api_key", key.to_string()));
        }
        self.http.get_json(segments, &query, &[]).await
    }
}

#[async_trait]
impl SearchProvider for CoinGeckoConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        let body = self
            .get(&["search"], vec![("query", query.trim().to_string())])
            .await?;
        let hits: Vec<CandidateMatch> = body
            .get("coins")
            .and_then(Value::as_array)
            .map(|coins| {
                coins
                    .iter()
                    .filter_map(|c| {
                        let id = string_or_empty(c.get("id"));
                        if id.is_empty() {
                            return None;
                        }
                        Some(CandidateMatch {
                            symbol: string_or_empty(c.get("symbol")).to_ascii_uppercase(),
                            name: string_or_empty(c.get("name")),
                            id,
                            asset_class: AssetClass::Crypto,
                            exchange: None,
                            currency: Some("USD".to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        if hits.is_empty() {
            return Err(MercatoError::not_found(format!("coins matching {query}")));
        }
        Ok(hits)
    }
}

#[async_trait]
impl BatchQuoteProvider for CoinGeckoConnector {
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let ids = targets
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let body = self
            .get(
                &["simple", "price"],
                vec![
                    ("ids", ids),
                    ("vs_currencies", "usd".to_string()),
                    ("include_24hr_change", "true".to_string()),
                    ("include_market_cap", "true".to_string()),
                    ("include_24hr_vol", "true".to_string()),
                    ("include_last_updated_at", "true".to_string()),
                ],
            )
            .await?;

        let mut out = Vec::with_capacity(targets.len());
        for target in targets {
            let Some(row) = body.get(&target.id) else {
                continue;
            };
            let price = decimal_opt(row.get("usd"));
            if is_sentinel_price(price) {
                continue;
            }
            let price = price.unwrap_or_default();
            let pct = decimal_or_zero(row.get("usd_24h_change"));
            // absolute move implied by the 24h percent
            let base = Decimal::ONE_HUNDRED + pct;
            let change = if base.is_zero() {
                Decimal::ZERO
            } else {
                (price - price * Decimal::ONE_HUNDRED / base).round_dp(8)
            };
            let symbol = if target.symbol.is_empty() {
                target.id.to_ascii_uppercase()
            } else {
                target.symbol.clone()
            };
            out.push(
                Quote::builder(symbol, Self::KEY.as_str())
                    .name(target.name.clone())
                    .price(price)
                    .change(change)
                    .change_percent(pct)
                    .volume(u64_or_zero(row.get("usd_24h_vol")))
                    .market_cap(decimal_opt(row.get("usd_market_cap")))
                    .asset_class(AssetClass::Crypto)
                    .timestamp(unix_timestamp(row.get("last_updated_at")))
                    .build()?,
            );
        }
        Ok(out)
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let target = target_for(symbol);
        self.quotes(std::slice::from_ref(&target))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MercatoError::not_found(format!("quote for {symbol}")))
    }
}

#[async_trait]
impl EndpointProvider for CoinGeckoConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(Self::KEY.as_str(), endpoint));
        }
        params.validate()?;
        let mut query = passthrough(&params.extra, &["x_cg_demo_api_key"]);
        let coin = || {
            params
                .symbol
                .as_deref()
                .map(|s| target_for(s).id)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| MercatoError::InvalidArg(format!("endpoint '{endpoint}' needs a coin id")))
        };
        let has = |k: &str| params.extra.contains_key(k);
        match endpoint {
            "search" => {
                if !has("query") {
                    query.push(("query", params.require_symbol(endpoint)?.to_ascii_lowercase()));
                }
                self.get(&["search"], query).await
            }
            "simple-price" => {
                if !has("ids") {
                    query.push(("ids", coin()?));
                }
                if !has("vs_currencies") {
                    query.push(("vs_currencies", "usd".to_string()));
                }
                self.get(&["simple", "price"], query).await
            }
            "coin" => {
                let id = coin()?;
                self.get(&["coins", id.as_str()], query).await
            }
            "market-chart" => {
                let id = coin()?;
                if !has("vs_currency") {
                    query.push(("vs_currency", "usd".to_string()));
                }
                if !has("days") {
                    query.push(("days", "30".to_string()));
                }
                self.get(&["coins", id.as_str(), "market_chart"], query).await
            }
            _ => {
                if !has("vs_currency") {
                    query.push(("vs_currency", "usd".to_string()));
                }
                self.get(&["coins", "markets"], query).await
            }
        }
    }
}

impl MercatoConnector for CoinGeckoConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "CoinGecko"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        kind == AssetClass::Crypto
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
