use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use mercato_server::{AppState, MemoryStore, router};
use tower::ServiceExt;

use crate::helpers::{app, assert_failure, get, mercato};

#[tokio::test]
async fn stream_without_realtime_fails() {
    let (status, body) = get(&app(), "/api/stream?symbols=AAPL").await;
    assert_failure(status, &body, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn subscriptions_live_as_long_as_the_response() {
    let m = mercato();
    let finnhub = m.connector("finnhub").cloned().unwrap();
    let live = Arc::new(m.realtime().primary(finnhub).start().unwrap());
    let app = router(
        AppState::new(Arc::clone(&m), Arc::new(MemoryStore::new())).with_realtime(Arc::clone(&live)),
    );

    let (status, body) = get(&app, "/api/stream").await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);

    // a bad symbol rolls back the ones registered before it
    let (status, body) = get(&app, "/api/stream?symbols=AAPL,not%20a%20ticker").await;
    assert_failure(status, &body, StatusCode::BAD_REQUEST);
    assert!(live.subscribed_symbols().is_empty());

    let resp = app
        .clone()
        .oneshot(
            Request::get("/api/stream?symbols=AAPL,%20msft")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(live.subscribed_symbols(), vec!["AAPL", "MSFT"]);

    drop(resp);
    tokio::time::timeout(Duration::from_secs(5), async {
        while !live.subscribed_symbols().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stream registrations were not released");

    live.shutdown().await;
}
