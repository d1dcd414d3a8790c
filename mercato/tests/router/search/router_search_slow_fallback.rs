use mercato::{AssetClass, Mercato, MercatoError};

use crate::helpers::{MockConnector, hit, quote};

fn nothing_fast() -> std::sync::Arc<MockConnector> {
    MockConnector::builder()
        .name("finnhub")
        .with_quote_fn(|s| Err(MercatoError::not_found(format!("quote for {s}"))))
        .with_search_fn(|q| Err(MercatoError::not_found(format!("search results for {q}"))))
        .build()
}

#[tokio::test]
async fn slow_providers_only_run_when_nothing_else_answered() {
    let slow = MockConnector::builder()
        .name("alphavantage")
        .slow()
        .with_quote_fn(|s| Ok(quote(s, "alphavantage", "55.10", false)))
        .with_search_fn(|_| Ok(vec![hit("IBM", "IBM", "IBM", AssetClass::Equity)]))
        .build();
    let m = Mercato::builder()
        .with_connector(nothing_fast())
        .with_connector(slow.clone())
        .build()
        .unwrap();

    let report = m.search("big blue").await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].symbol, "IBM");
    assert_eq!(report.providers, vec!["alphavantage".to_string()]);
    assert_eq!(slow.search_calls(), 1);
}

#[tokio::test]
async fn first_slow_provider_with_results_ends_the_search() {
    let first = MockConnector::builder()
        .name("slow-a")
        .slow()
        .with_quote_fn(|s| Ok(quote(s, "slow-a", "1", false)))
        .build();
    let second = MockConnector::builder()
        .name("slow-b")
        .slow()
        .with_quote_fn(|s| Ok(quote(s, "slow-b", "2", false)))
        .build();
    let m = Mercato::builder()
        .with_connector(nothing_fast())
        .with_connector(first.clone())
        .with_connector(second.clone())
        .build()
        .unwrap();

    let report = m.search("IBM").await.unwrap();
    assert_eq!(report.results[0].source, "slow-a");
    assert_eq!(second.total_calls(), 0);
}

#[tokio::test]
async fn slow_providers_are_skipped_after_a_fast_hit() {
    let fast = MockConnector::builder()
        .name("finnhub")
        .returns_price("100", true)
        .build();
    let slow = MockConnector::builder()
        .name("alphavantage")
        .slow()
        .returns_price("99", false)
        .build();
    let m = Mercato::builder()
        .with_connector(fast)
        .with_connector(slow.clone())
        .build()
        .unwrap();

    let report = m.search("IBM").await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(slow.total_calls(), 0);
}
