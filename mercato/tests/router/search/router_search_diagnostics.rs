use mercato::{AssetClass, Mercato, MercatoError};

use crate::helpers::{MockConnector, hit, quote};

#[tokio::test]
async fn provider_failures_become_diagnostics() {
    let finnhub = MockConnector::builder()
        .name("finnhub")
        .with_quote_fn(|s| Err(MercatoError::not_found(format!("quote for {s}"))))
        .with_search_fn(|_| Err(MercatoError::unreachable("finnhub", "connection refused")))
        .build();
    let fmp = MockConnector::builder()
        .name("fmp")
        .with_quote_fn(|s| Ok(quote(s, "fmp", "12.5", false)))
        .with_search_fn(|_| Err(MercatoError::upstream("fmp", 500, "boom")))
        .build();
    let eodhd = MockConnector::builder()
        .name("eodhd")
        .with_quote_fn(|s| Ok(quote(s, "eodhd", "12.4", false)))
        .with_search_fn(|_| Ok(vec![hit("NVDA", "NVDA", "NVIDIA", AssetClass::Equity)]))
        .build();

    let m = Mercato::builder()
        .with_connector(finnhub)
        .with_connector(fmp)
        .with_connector(eodhd)
        .build()
        .unwrap();

    let report = m.search("graphics chips").await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].source, "eodhd");
    assert_eq!(
        report.errors,
        vec![
            "finnhub: unreachable: connection refused".to_string(),
            "fmp: HTTP 500: boom".to_string(),
        ]
    );
}

#[tokio::test]
async fn missing_credentials_and_quota_are_reported_distinctly() {
    let keyless = MockConnector::builder()
        .name("alpaca")
        .quote_fails(MercatoError::misconfigured("alpaca", "ALPACA_API_KEY_ID is not set"))
        .build();
    let limited = MockConnector::builder()
        .name("fmp")
        .quote_fails(MercatoError::QuotaExceeded {
            remaining: 0,
            reset_in_ms: 1_000,
        })
        .build();
    let m = Mercato::builder()
        .with_connector(keyless)
        .with_connector(limited)
        .build()
        .unwrap();

    let report = m.search("TSLA").await.unwrap();
    assert!(report.results.is_empty());
    // unconfigured providers are silent; quota rejections are worth showing
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("fmp: "));
}
