use mercato::{AssetClass, Mercato, MercatoError};

use crate::helpers::MockConnector;

#[tokio::test]
async fn one_character_queries_make_no_upstream_calls() {
    let equity = MockConnector::builder()
        .returns_price("1", true)
        .with_search_fn(|_| Ok(Vec::new()))
        .build();
    let coins = MockConnector::builder()
        .name("coins")
        .kinds(&[AssetClass::Crypto])
        .with_search_fn(|_| Ok(Vec::new()))
        .build();
    let m = Mercato::builder()
        .with_connector(equity.clone())
        .with_connector(coins.clone())
        .build()
        .unwrap();

    for q in ["a", " b ", "é"] {
        let report = m.search(q).await.unwrap();
        assert!(report.results.is_empty());
        assert!(report.providers.is_empty());
        assert!(report.errors.is_empty());
    }
    assert_eq!(equity.total_calls(), 0);
    assert_eq!(coins.total_calls(), 0);
}

#[tokio::test]
async fn blank_and_overlong_queries_are_rejected() {
    let equity = MockConnector::builder().returns_price("1", true).build();
    let m = Mercato::builder()
        .with_connector(equity.clone())
        .build()
        .unwrap();

    assert!(matches!(m.search("   ").await, Err(MercatoError::InvalidQuery(_))));
    let long = "x".repeat(mercato::MAX_QUERY_CHARS + 1);
    assert!(matches!(m.search(&long).await, Err(MercatoError::InvalidQuery(_))));
    assert_eq!(equity.total_calls(), 0);
}
