use mercato::{Mercato, MercatoError};

use crate::helpers::{MockConnector, dec};

#[tokio::test]
async fn realtime_quote_beats_a_higher_priority_delayed_one() {
    let delayed = MockConnector::builder()
        .name("delayed")
        .returns_price("100.00", false)
        .build();
    let live = MockConnector::builder()
        .name("live")
        .returns_price("101.00", true)
        .build();
    let m = Mercato::builder()
        .with_connector(delayed)
        .with_connector(live)
        .build()
        .unwrap();

    let q = m.best_price("MSFT").await.unwrap();
    assert_eq!(q.source, "live");
    assert_eq!(q.price, dec("101.00"));
    assert!(q.realtime);
}

#[tokio::test]
async fn priority_breaks_ties_between_realtime_quotes() {
    let a = MockConnector::builder()
        .name("a")
        .delay(std::time::Duration::from_millis(40))
        .returns_price("10", true)
        .build();
    let b = MockConnector::builder().name("b").returns_price("11", true).build();
    let m = Mercato::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .unwrap();

    // "b" answers first but "a" is registered first
    assert_eq!(m.best_price("X").await.unwrap().source, "a");
}

#[tokio::test]
async fn delayed_quote_is_used_when_realtime_providers_fail() {
    let primary = MockConnector::builder()
        .name("primary")
        .quote_fails(MercatoError::upstream("primary", 502, "bad gateway"))
        .build();
    let backup = MockConnector::builder()
        .name("backup")
        .quote_fails(MercatoError::not_found("quote for IBM"))
        .build();
    let slow = MockConnector::builder()
        .name("slow")
        .slow()
        .returns_price("180.25", false)
        .build();
    let m = Mercato::builder()
        .with_connector(primary)
        .with_connector(backup)
        .with_connector(slow)
        .build()
        .unwrap();

    let q = m.best_price("IBM").await.unwrap();
    assert_eq!(q.source, "slow");
    assert!(!q.realtime);
}

#[tokio::test]
async fn only_the_configured_number_of_fast_providers_is_asked() {
    let a = MockConnector::builder().name("a").returns_price("1", false).build();
    let b = MockConnector::builder().name("b").returns_price("2", false).build();
    let c = MockConnector::builder().name("c").returns_price("3", true).build();
    let slow_a = MockConnector::builder()
        .name("slow-a")
        .slow()
        .returns_price("4", false)
        .build();
    let slow_b = MockConnector::builder()
        .name("slow-b")
        .slow()
        .returns_price("5", false)
        .build();
    let m = Mercato::builder()
        .with_connector(a.clone())
        .with_connector(b.clone())
        .with_connector(c.clone())
        .with_connector(slow_a.clone())
        .with_connector(slow_b.clone())
        .build()
        .unwrap();

    let q = m.best_price("AAPL").await.unwrap();
    assert_eq!(q.source, "a");
    assert_eq!(a.quote_calls(), 1);
    assert_eq!(b.quote_calls(), 1);
    assert_eq!(c.quote_calls(), 0);
    assert_eq!(slow_a.quote_calls(), 1);
    assert_eq!(slow_b.quote_calls(), 0);
}

#[test]
fn fan_out_takes_the_first_fast_providers_and_one_slow_one() {
    let quoting = |name: &'static str| MockConnector::builder().name(name).returns_price("1", false);
    let m = Mercato::builder()
        .with_connector(quoting("fundamentals").build())
        .with_connector(MockConnector::builder().name("search-only").build())
        .with_connector(quoting("backup").build())
        .with_connector(quoting("third").build())
        .with_connector(quoting("history").slow().build())
        .with_connector(quoting("history2").slow().build())
        .build()
        .unwrap();

    assert_eq!(m.best_price_providers(), vec!["fundamentals", "backup", "history"]);
    assert_eq!(m.equity_providers(), vec!["fundamentals", "backup", "third"]);
}
