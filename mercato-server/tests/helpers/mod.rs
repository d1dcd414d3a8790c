#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use mercato::{AssetClass, Mercato, MercatoConnector};
use mercato_mock::MockConnector;
use mercato_server::{AppState, MemoryStore, router};
use serde_json::Value;
use tower::ServiceExt;

/// Realtime equity quoter registered as `finnhub`.
pub fn equities() -> Arc<dyn MercatoConnector> {
    Arc::new(
        MockConnector::new()
            .named("finnhub")
            .with_kinds(&[AssetClass::Equity, AssetClass::Fund])
            .with_realtime(true),
    )
}

/// Crypto searcher registered as `coingecko`.
pub fn crypto() -> Arc<dyn MercatoConnector> {
    Arc::new(
        MockConnector::new()
            .named("coingecko")
            .with_kinds(&[AssetClass::Crypto]),
    )
}

pub fn mercato_with(connectors: Vec<Arc<dyn MercatoConnector>>) -> Arc<Mercato> {
    let mut b = Mercato::builder();
    for c in connectors {
        b = b.with_connector(c);
    }
    Arc::new(b.build().unwrap())
}

pub fn mercato() -> Arc<Mercato> {
    mercato_with(vec![equities(), crypto()])
}

pub fn state() -> AppState {
    AppState::new(mercato(), Arc::new(MemoryStore::new()))
}

pub fn app() -> Router {
    router(state())
}

pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, "GET", uri, None).await
}

/// Assert a failed envelope with the given status.
pub fn assert_failure(status: StatusCode, body: &Value, expected: StatusCode) {
    assert_eq!(status, expected, "body: {body}");
    assert_eq!(body["success"], Value::Bool(false));
    assert!(body["error"].is_string());
    assert!(body.get("data").is_none());
}
