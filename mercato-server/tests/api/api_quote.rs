use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{app, assert_failure, get};

#[tokio::test]
async fn best_price_in_the_data_envelope() {
    let (status, body) = get(&app(), "/api/quote?symbol=aapl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let q = &body["data"];
    assert_eq!(q["symbol"], json!("AAPL"));
    assert_eq!(q["price"], json!(190.0));
    assert_eq!(q["source"], json!("finnhub"));
    assert_eq!(q["realtime"], json!(true));
    assert_eq!(q["assetClass"], json!("equity"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn missing_or_malformed_symbol_is_a_bad_request() {
    let app = app();
    let (status, body) = get(&app, "/api/quote").await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/api/quote?symbol=not%20a%20ticker").await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let (status, body) = get(&app(), "/api/quote?symbol=ZZZZ").await;
    assert_failure(status, &body, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_provider_failing_is_not_found() {
    let (status, body) = get(&app(), "/api/quote?symbol=FAIL").await;
    assert_failure(status, &body, StatusCode::NOT_FOUND);
}
