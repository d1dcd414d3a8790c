use std::time::Duration;

use mercato::{Mercato, MercatoError};

use crate::helpers::MockConnector;

#[tokio::test(start_paused = true)]
async fn hung_provider_is_cut_off_at_the_timeout() {
    let hung = MockConnector::builder()
        .name("hung")
        .delay(Duration::from_secs(60))
        .returns_price("1", true)
        .build();
    let ok = MockConnector::builder()
        .name("ok")
        .returns_price("2", false)
        .build();
    let m = Mercato::builder()
        .with_connector(hung)
        .with_connector(ok)
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let started = tokio::time::Instant::now();
    let q = m.best_price("AAPL").await.unwrap();
    assert_eq!(q.source, "ok");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn timeouts_read_as_unreachable_in_search_diagnostics() {
    let hung = MockConnector::builder()
        .name("hung")
        .delay(Duration::from_secs(60))
        .returns_price("1", true)
        .build();
    let m = Mercato::builder()
        .with_connector(hung)
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let report = m.search("AAPL").await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(
        report.errors,
        vec!["hung: unreachable: quote timed out after 50ms".to_string()]
    );

    let err = m.best_price("AAPL").await.unwrap_err();
    assert!(matches!(err, MercatoError::NotFound { .. }));
}
