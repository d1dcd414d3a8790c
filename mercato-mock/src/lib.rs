//! Mock mercato connector with deterministic fixture data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mercato_core::connector::{
    BatchQuoteProvider, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider,
    SearchProvider,
};
use mercato_core::normalize::{decimal_opt, u64_or_zero, unix_timestamp};
use mercato_core::{
    AssetClass, CandidateMatch, LatencyClass, MercatoError, Quote, RealtimePrice, StreamEvent,
    StreamProvider,
};
use serde_json::{Value, json};

mod fixtures;

const ENDPOINTS: &[&str] = &["quote", "search"];

/// Mock connector for CI-safe tests and demos. Provides deterministic data from static fixtures.
pub struct MockConnector {
    name: &'static str,
    kinds: Vec<AssetClass>,
    latency: LatencyClass,
    realtime: bool,
    calls: AtomicUsize,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Connector named `mercato-mock` that serves every asset class.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "mercato-mock",
            kinds: vec![
                AssetClass::Equity,
                AssetClass::Crypto,
                AssetClass::Fund,
                AssetClass::Commodity,
            ],
            latency: LatencyClass::Fast,
            realtime: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Rename; useful when registering several mocks.
    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Restrict the advertised asset classes.
    #[must_use]
    pub fn with_kinds(mut self, kinds: &[AssetClass]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    /// Advertise a latency class.
    #[must_use]
    pub const fn with_latency(mut self, latency: LatencyClass) -> Self {
        self.latency = latency;
        self
    }

    /// Mark produced quotes as realtime.
    #[must_use]
    pub const fn with_realtime(mut self, yes: bool) -> Self {
        self.realtime = yes;
        self
    }

    /// Number of upstream-equivalent calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, id: &str) -> Result<(), MercatoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match id.trim().to_ascii_uppercase().as_str() {
            "FAIL" => Err(MercatoError::upstream(self.name, 500, "forced failure")),
            "DOWN" => Err(MercatoError::unreachable(self.name, "connection refused")),
            "TIMEOUT" => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err(MercatoError::not_found(format!("quote for {id}")))
            }
            _ => Ok(()),
        }
    }
}

impl MercatoConnector for MockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        self.kinds.contains(&kind)
    }

    fn latency(&self) -> LatencyClass {
        self.latency
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
    fn as_stream_provider(&self) -> Option<&dyn StreamProvider> {
        Some(self as &dyn StreamProvider)
    }
}

#[async_trait]
impl QuoteProvider for MockConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        self.enter(symbol).await?;
        fixtures::quotes::by_id(symbol, self.name, self.realtime)
            .filter(|q| self.kinds.contains(&q.asset_class))
            .ok_or_else(|| MercatoError::not_found(format!("quote for {symbol}")))
    }
}

#[async_trait]
impl BatchQuoteProvider for MockConnector {
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> {
        for t in targets {
            self.enter(&t.id).await?;
        }
        Ok(targets
            .iter()
            .filter_map(|t| fixtures::quotes::by_id(&t.id, self.name, self.realtime))
            .filter(|q| self.kinds.contains(&q.asset_class))
            .collect())
    }
}

#[async_trait]
impl SearchProvider for MockConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        self.enter(query).await?;
        let hits: Vec<CandidateMatch> = fixtures::search::matches(query)
            .into_iter()
            .filter(|c| self.kinds.contains(&c.asset_class))
            .collect();
        if hits.is_empty() {
            return Err(MercatoError::not_found(format!("search results for {query}")));
        }
        Ok(hits)
    }
}

#[async_trait]
impl EndpointProvider for MockConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        ENDPOINTS
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        if !self.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(self.name, endpoint));
        }
        params.validate()?;
        match endpoint {
            "quote" => {
                let symbol = params.require_symbol(endpoint)?;
                let q = self.quote(&symbol).await?;
                serde_json::to_value(q).map_err(|e| MercatoError::Data(e.to_string()))
            }
            _ => {
                let query = params
                    .extra
                    .get("q")
                    .cloned()
                    .or_else(|| params.symbol.clone())
                    .unwrap_or_default();
                let hits = self.search(&query).await?;
                serde_json::to_value(hits).map_err(|e| MercatoError::Data(e.to_string()))
            }
        }
    }
}

impl StreamProvider for MockConnector {
    fn stream_url(&self) -> Result<String, MercatoError> {
        Ok(format!("mock://{}", self.name))
    }

    fn open_frames(&self) -> Result<Vec<String>, MercatoError> {
        Ok(vec![json!({"action": "auth", "key": "mock"}).to_string()])
    }

    fn requires_auth(&self) -> bool {
        true
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
        let v: Value =
            serde_json::from_str(text).map_err(|e| MercatoError::Data(e.to_string()))?;
        match v.get("type").and_then(Value::as_str) {
            Some("auth") if v.get("status").and_then(Value::as_str) == Some("ok") => {
                Ok(vec![StreamEvent::Authenticated])
            }
            Some("auth") => Ok(vec![StreamEvent::Error("auth rejected".into())]),
            Some("trade") => {
                let symbol = v
                    .get("s")
                    .and_then(Value::as_str)
                    .ok_or_else(|| MercatoError::Data("trade without symbol".into()))?;
                let price = decimal_opt(v.get("p"))
                    .ok_or_else(|| MercatoError::Data("trade without price".into()))?;
                let volume = u64_or_zero(v.get("v"));
                Ok(vec![StreamEvent::Price(RealtimePrice {
                    symbol: symbol.to_ascii_uppercase(),
                    price,
                    timestamp: unix_timestamp(v.get("t")).unwrap_or_else(Utc::now),
                    volume: (volume > 0).then_some(volume),
                    bid: None,
                    ask: None,
                    source: self.name.to_string(),
                })])
            }
            Some("ping") => Ok(Vec::new()),
            _ => Err(MercatoError::Data(format!("unknown frame: {text}"))),
        }
    }
}
