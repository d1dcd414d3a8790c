use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{app, assert_failure, get};

#[tokio::test]
async fn symbol_search_uses_the_results_envelope() {
    let (status, body) = get(&app(), "/api/search?query=AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["query"], json!("AAPL"));
    assert_eq!(body["providers"], json!(["finnhub"]));
    assert_eq!(body["errors"], json!([]));
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["symbol"], json!("AAPL"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn coin_names_resolve_through_the_crypto_tier() {
    let (status, body) = get(&app(), "/api/search?query=bitcoin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["symbol"], json!("BTC"));
    assert_eq!(body["results"][0]["source"], json!("coingecko"));
    assert_eq!(body["providers"], json!(["coingecko"]));
}

#[tokio::test]
async fn short_queries_return_an_empty_report() {
    let (status, body) = get(&app(), "/api/search?query=a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn empty_query_is_a_bad_request() {
    let app = app();
    let (status, body) = get(&app, "/api/search").await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    let long = "x".repeat(65);
    let (status, body) = get(&app, &format!("/api/search?query={long}")).await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failures_are_diagnostics_not_errors() {
    let (status, body) = get(&app(), "/api/search?query=FAIL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["results"], json!([]));
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e.as_str())
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&"finnhub: HTTP 500: forced failure"));
    assert!(errors.contains(&"coingecko: HTTP 500: forced failure"));
}
