use mercato::{ConnectionState, RealtimeBuilder, StreamRole};

use crate::helpers::MockConnector;
use crate::helpers::ws::{accept, settle, transport, wait_for};

fn ticker(i: usize) -> String {
    format!("S{i:02}")
}

#[tokio::test]
async fn thirty_first_symbol_waits_for_a_free_slot() {
    let (ws, mut peers) = transport();
    let finnhub = MockConnector::builder().name("finnhub").streams(false).build();
    let live = RealtimeBuilder::new()
        .primary(finnhub)
        .transport(ws)
        .start()
        .unwrap();
    let mut peer = accept(&mut peers).await;
    wait_for(|| live.state(StreamRole::Primary) == ConnectionState::Connected).await;

    for i in 0..30 {
        live.subscribe(&ticker(i), |_| {}).unwrap();
        assert_eq!(peer.next_frame().await, format!("sub:{}", ticker(i)));
    }

    live.subscribe(&ticker(30), |_| {}).unwrap();
    settle().await;
    assert!(peer.sent().is_empty());
    assert_eq!(live.subscribed_symbols().len(), 31);
    assert_eq!(live.upstream_symbols(StreamRole::Primary).len(), 30);

    assert!(live.unsubscribe(&ticker(0)));
    assert_eq!(peer.next_frame().await, "unsub:S00");
    assert_eq!(peer.next_frame().await, "sub:S30");
    assert!(
        live.upstream_symbols(StreamRole::Primary)
            .contains(&ticker(30))
    );
}

#[tokio::test]
async fn unsubscribing_twice_is_a_no_op() {
    let (ws, mut peers) = transport();
    let finnhub = MockConnector::builder().name("finnhub").streams(false).build();
    let live = RealtimeBuilder::new()
        .primary(finnhub)
        .transport(ws)
        .start()
        .unwrap();
    let mut peer = accept(&mut peers).await;

    live.subscribe("AAPL", |_| {}).unwrap();
    assert_eq!(peer.next_frame().await, "sub:AAPL");

    assert!(live.unsubscribe("AAPL"));
    assert_eq!(peer.next_frame().await, "unsub:AAPL");
    assert!(!live.unsubscribe("AAPL"));
    assert!(!live.unsubscribe("NEVER"));
    settle().await;
    assert!(peer.sent().is_empty());
    assert!(live.subscribed_symbols().is_empty());
}

#[tokio::test]
async fn replay_on_ready_respects_the_ceiling() {
    let (ws, mut peers) = transport();
    let alpaca = MockConnector::builder().name("alpaca").streams(true).build();
    let live = RealtimeBuilder::new()
        .backup(alpaca)
        .max_symbols(2)
        .transport(ws)
        .start()
        .unwrap();
    let mut peer = accept(&mut peers).await;
    assert_eq!(peer.next_frame().await, "auth");

    for s in ["A", "B", "C"] {
        live.subscribe(s, |_| {}).unwrap();
    }
    peer.push("auth-ok");
    assert_eq!(peer.next_frame().await, "sub:A,B");
    settle().await;
    assert!(peer.sent().is_empty());

    assert!(live.unsubscribe("B"));
    assert_eq!(peer.next_frame().await, "unsub:B");
    assert_eq!(peer.next_frame().await, "sub:C");
}
