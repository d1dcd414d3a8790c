use std::sync::Arc;
use std::time::Duration;

use mercato::{ManualClock, Mercato};

use crate::helpers::{MockConnector, t0};

#[tokio::test]
async fn same_bucket_reuses_one_fan_out() {
    let primary = MockConnector::builder()
        .name("primary")
        .returns_price("195.00", true)
        .build();
    let backup = MockConnector::builder()
        .name("backup")
        .returns_price("194.90", true)
        .build();
    let clock = ManualClock::new(t0());
    let m = Mercato::builder()
        .with_connector(primary.clone())
        .with_connector(backup.clone())
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    assert!(m.cached_price("AAPL").await.is_none());
    let first = m.best_price("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(29));
    let second = m.best_price("aapl").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.source, "primary");
    assert_eq!(primary.quote_calls(), 1);
    assert_eq!(backup.quote_calls(), 1);
    assert_eq!(m.cached_price("AAPL").await, Some(first));
}

#[tokio::test]
async fn next_bucket_fetches_again() {
    let primary = MockConnector::builder()
        .name("primary")
        .returns_price("195.00", true)
        .build();
    let clock = ManualClock::new(t0());
    let m = Mercato::builder()
        .with_connector(primary.clone())
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    m.best_price("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(30));
    assert!(m.cached_price("AAPL").await.is_none());
    m.best_price("AAPL").await.unwrap();
    assert_eq!(primary.quote_calls(), 2);
}

#[tokio::test]
async fn concurrent_misses_share_the_fan_out() {
    let primary = MockConnector::builder()
        .name("primary")
        .delay(Duration::from_millis(50))
        .returns_price("195.00", true)
        .build();
    let m = Mercato::builder()
        .with_connector(primary.clone())
        .clock(Arc::new(ManualClock::new(t0())))
        .build()
        .unwrap();

    let (a, b, c) = tokio::join!(
        m.best_price("AAPL"),
        m.best_price("AAPL"),
        m.best_price("AAPL")
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(primary.quote_calls(), 1);
}

#[tokio::test]
async fn bucket_width_is_configurable() {
    let primary = MockConnector::builder()
        .name("primary")
        .returns_price("195.00", true)
        .build();
    let clock = ManualClock::new(t0());
    let m = Mercato::builder()
        .with_connector(primary.clone())
        .bucket_width(Duration::from_secs(5))
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    m.best_price("AAPL").await.unwrap();
    clock.advance(Duration::from_secs(6));
    m.best_price("AAPL").await.unwrap();
    assert_eq!(primary.quote_calls(), 2);
}
