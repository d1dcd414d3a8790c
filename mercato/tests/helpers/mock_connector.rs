#![allow(dead_code)]
#![allow(clippy::type_complexity)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use mercato_core::connector::{
    BatchQuoteProvider, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider,
    SearchProvider,
};
use mercato_core::{
    AssetClass, CandidateMatch, LatencyClass, MercatoError, Quote, RealtimePrice, StreamEvent,
    StreamProvider,
};
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};

type QuoteFn = Arc<dyn Fn(&str) -> Result<Quote, MercatoError> + Send + Sync>;
type SearchFn = Arc<dyn Fn(&str) -> Result<Vec<CandidateMatch>, MercatoError> + Send + Sync>;
type BatchFn = Arc<dyn Fn(&[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> + Send + Sync>;

/// Scriptable connector for orchestrator tests.
///
/// Capabilities exist only when a closure is configured, so a connector built
/// without `quote_fn` has no quote role at all.
pub struct MockConnector {
    pub name: &'static str,
    pub kinds: Vec<AssetClass>,
    pub latency: LatencyClass,
    pub delay_ms: u64,
    pub quote_fn: Option<QuoteFn>,
    pub search_fn: Option<SearchFn>,
    pub batch_fn: Option<BatchFn>,
    pub endpoints: &'static [&'static str],
    /// `Some(requires_auth)` enables the line-based stream codec.
    pub stream_auth: Option<bool>,
    pub quote_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub proxy_calls: AtomicUsize,
}

impl MockConnector {
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::new()
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn proxy_calls(&self) -> usize {
        self.proxy_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.quote_calls() + self.search_calls() + self.batch_calls() + self.proxy_calls()
    }

    async fn pause(&self) {
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}

pub struct MockConnectorBuilder {
    name: &'static str,
    kinds: Vec<AssetClass>,
    latency: LatencyClass,
    delay_ms: u64,
    quote_fn: Option<QuoteFn>,
    search_fn: Option<SearchFn>,
    batch_fn: Option<BatchFn>,
    endpoints: &'static [&'static str],
    stream_auth: Option<bool>,
}

impl MockConnectorBuilder {
    pub fn new() -> Self {
        Self {
            name: "mock",
            kinds: vec![AssetClass::Equity],
            latency: LatencyClass::Fast,
            delay_ms: 0,
            quote_fn: None,
            search_fn: None,
            batch_fn: None,
            endpoints: &[],
            stream_auth: None,
        }
    }

    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn kinds(mut self, kinds: &[AssetClass]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn slow(mut self) -> Self {
        self.latency = LatencyClass::Slow;
        self
    }

    pub fn delay(mut self, d: Duration) -> Self {
        self.delay_ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_quote_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Quote, MercatoError> + Send + Sync + 'static,
    {
        self.quote_fn = Some(Arc::new(f));
        self
    }

    /// Every quote succeeds at `price`.
    pub fn returns_price(self, price: &'static str, realtime: bool) -> Self {
        let source = self.name;
        self.with_quote_fn(move |s| Ok(super::quote(s, source, price, realtime)))
    }

    /// Every quote fails with a clone of `err`.
    pub fn quote_fails(self, err: MercatoError) -> Self {
        self.with_quote_fn(move |_| Err(err.clone()))
    }

    pub fn with_search_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<CandidateMatch>, MercatoError> + Send + Sync + 'static,
    {
        self.search_fn = Some(Arc::new(f));
        self
    }

    pub fn with_batch_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> + Send + Sync + 'static,
    {
        self.batch_fn = Some(Arc::new(f));
        self
    }

    pub fn endpoints(mut self, endpoints: &'static [&'static str]) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn streams(mut self, requires_auth: bool) -> Self {
        self.stream_auth = Some(requires_auth);
        self
    }

    pub fn build(self) -> Arc<MockConnector> {
        Arc::new(MockConnector {
            name: self.name,
            kinds: self.kinds,
            latency: self.latency,
            delay_ms: self.delay_ms,
            quote_fn: self.quote_fn,
            search_fn: self.search_fn,
            batch_fn: self.batch_fn,
            endpoints: self.endpoints,
            stream_auth: self.stream_auth,
            quote_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            proxy_calls: AtomicUsize::new(0),
        })
    }
}

impl MercatoConnector for MockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Test"
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        self.kinds.contains(&kind)
    }

    fn latency(&self) -> LatencyClass {
        self.latency
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        self.quote_fn.as_ref().map(|_| self as &dyn QuoteProvider)
    }
    fn as_batch_quote_provider(&self) -> Option<&dyn BatchQuoteProvider> {
        self.batch_fn.as_ref().map(|_| self as &dyn BatchQuoteProvider)
    }
    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        self.search_fn.as_ref().map(|_| self as &dyn SearchProvider)
    }
    fn as_endpoint_provider(&self) -> Option<&dyn EndpointProvider> {
        (!self.endpoints.is_empty()).then_some(self as &dyn EndpointProvider)
    }
    fn as_stream_provider(&self) -> Option<&dyn StreamProvider> {
        self.stream_auth.map(|_| self as &dyn StreamProvider)
    }
}

#[async_trait]
impl QuoteProvider for MockConnector {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.quote_fn {
            Some(f) => f(symbol),
            None => Err(MercatoError::unsupported("quote")),
        }
    }
}

#[async_trait]
impl BatchQuoteProvider for MockConnector {
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.batch_fn {
            Some(f) => f(targets),
            None => Err(MercatoError::unsupported("batch-quote")),
        }
    }
}

#[async_trait]
impl SearchProvider for MockConnector {
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.search_fn {
            Some(f) => f(query),
            None => Err(MercatoError::unsupported("search")),
        }
    }
}

#[async_trait]
impl EndpointProvider for MockConnector {
    fn endpoints(&self) -> &'static [&'static str] {
        self.endpoints
    }

    async fn call(&self, endpoint: &str, params: &ProxyParams) -> Result<Value, MercatoError> {
        self.proxy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "provider": self.name,
            "endpoint": endpoint,
            "symbol": params.symbol,
        }))
    }
}

/// Line protocol: `sub:A,B`, `unsub:A`, inbound `auth-ok`, `px:SYM:PRICE`, `err:MSG`.
impl StreamProvider for MockConnector {
    fn stream_url(&self) -> Result<String, MercatoError> {
        Ok(format!("mock://{}", self.name))
    }

    fn open_frames(&self) -> Result<Vec<String>, MercatoError> {
        Ok(if self.stream_auth == Some(true) {
            vec!["auth".to_string()]
        } else {
            Vec::new()
        })
    }

    fn requires_auth(&self) -> bool {
        self.stream_auth == Some(true)
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        vec![format!("sub:{}", symbols.join(","))]
    }

    fn unsubscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        vec![format!("unsub:{}", symbols.join(","))]
    }

    fn decode(&self, text: &str) -> Result<Vec<StreamEvent>, MercatoError> {
        if text == "auth-ok" {
            return Ok(vec![StreamEvent::Authenticated]);
        }
        if let Some(msg) = text.strip_prefix("err:") {
            return Ok(vec![StreamEvent::Error(msg.to_string())]);
        }
        let Some(rest) = text.strip_prefix("px:") else {
            return Err(MercatoError::Data(format!("unknown frame: {text}")));
        };
        let (symbol, price) = rest
            .split_once(':')
            .ok_or_else(|| MercatoError::Data(format!("bad price frame: {text}")))?;
        let price = price
            .parse()
            .map_err(|_| MercatoError::Data(format!("bad price: {price}")))?;
        Ok(vec![StreamEvent::Price(RealtimePrice {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
            volume: None,
            bid: None,
            ask: None,
            source: self.name.to_string(),
        })])
    }
}
