use mercato::{AssetClass, Mercato, MercatoError};

use crate::helpers::{AAPL, MockConnector, dec};

#[tokio::test]
async fn ticker_answered_by_primary_stops_the_equity_tier() {
    let primary = MockConnector::builder()
        .name("primary")
        .returns_price("195.00", true)
        .with_search_fn(|q| Err(MercatoError::not_found(format!("search results for {q}"))))
        .build();
    let backup = MockConnector::builder()
        .name("backup")
        .returns_price("190.00", true)
        .build();
    let coins = MockConnector::builder()
        .name("coins")
        .kinds(&[AssetClass::Crypto])
        .with_search_fn(|q| Err(MercatoError::not_found(format!("search results for {q}"))))
        .build();
    let slow = MockConnector::builder()
        .name("slow")
        .slow()
        .returns_price("189.00", false)
        .build();

    let m = Mercato::builder()
        .with_connector(primary.clone())
        .with_connector(backup.clone())
        .with_connector(coins.clone())
        .with_connector(slow.clone())
        .build()
        .unwrap();

    let report = m.search("aapl").await.unwrap();

    assert_eq!(report.query, "aapl");
    assert_eq!(report.results.len(), 1);
    let q = &report.results[0];
    assert_eq!(q.symbol, AAPL);
    assert_eq!(q.price, dec("195.00"));
    assert_eq!(q.source, "primary");
    assert_eq!(report.providers, vec!["primary".to_string()]);
    assert!(report.errors.is_empty());

    assert_eq!(primary.quote_calls(), 1);
    assert_eq!(primary.search_calls(), 0);
    assert_eq!(backup.total_calls(), 0);
    assert_eq!(slow.total_calls(), 0);
    assert_eq!(coins.search_calls(), 1);
}

#[tokio::test]
async fn unknown_ticker_falls_back_to_text_search() {
    let primary = MockConnector::builder()
        .name("primary")
        .with_quote_fn(|s| match s {
            "AAPL" => Ok(crate::helpers::quote(s, "primary", "195", true)),
            _ => Err(MercatoError::not_found(format!("quote for {s}"))),
        })
        .with_search_fn(|_| {
            Ok(vec![crate::helpers::hit(
                "AAPL",
                "AAPL",
                "Apple Inc.",
                AssetClass::Equity,
            )])
        })
        .build();

    let m = Mercato::builder()
        .with_connector(primary.clone())
        .build()
        .unwrap();

    let report = m.search("apple").await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].symbol, "AAPL");
    // name comes from the search hit when the quote carries none
    assert_eq!(report.results[0].name, "Apple Inc.");
    assert_eq!(primary.quote_calls(), 2);
    assert_eq!(primary.search_calls(), 1);
}

#[tokio::test]
async fn hard_quote_failure_skips_the_search_fallback() {
    let primary = MockConnector::builder()
        .name("primary")
        .quote_fails(MercatoError::upstream("primary", 503, "maintenance"))
        .with_search_fn(|_| Ok(Vec::new()))
        .build();
    let backup = MockConnector::builder()
        .name("backup")
        .returns_price("190.00", true)
        .build();

    let m = Mercato::builder()
        .with_connector(primary.clone())
        .with_connector(backup.clone())
        .build()
        .unwrap();

    let report = m.search("MSFT").await.unwrap();
    assert_eq!(primary.search_calls(), 0);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].source, "backup");
    assert_eq!(report.providers, vec!["backup".to_string()]);
    assert_eq!(report.errors, vec!["primary: HTTP 503: maintenance".to_string()]);
}
