//! Server-sent events of realtime prices.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use mercato_core::{MercatoError, RealtimePrice};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::AppState;
use crate::error::ApiError;

/// `?symbols=A,B`
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    symbols: Option<String>,
}

/// Stream `price` events for the requested symbols until the client goes away.
///
/// Each symbol is registered with the realtime manager for the lifetime of the
/// response; dropping the response removes the registrations.
pub async fn prices(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let live = state
        .realtime
        .clone()
        .ok_or_else(|| MercatoError::unsupported("realtime stream"))?;
    let symbols: Vec<String> = params
        .symbols
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if symbols.is_empty() {
        return Err(MercatoError::InvalidQuery("symbols is required".into()).into());
    }

    let (tx, rx) = mpsc::unbounded_channel::<RealtimePrice>();
    let mut ids = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        let tx = tx.clone();
        match live.subscribe(symbol, move |p| {
            let _ = tx.send(p.clone());
        }) {
            Ok(id) => ids.push(id),
            Err(e) => {
                for id in ids {
                    live.unsubscribe_callback(id);
                }
                return Err(e.into());
            }
        }
    }
    tracing::info!(target: "mercato_server::stream", symbols = ?symbols, "stream opened");

    // resolves once the response body, and with it the receiver, is dropped
    tokio::spawn(async move {
        tx.closed().await;
        for id in ids {
            live.unsubscribe_callback(id);
        }
        tracing::info!(target: "mercato_server::stream", symbols = ?symbols, "stream closed");
    });

    let events = UnboundedReceiverStream::new(rx)
        .map(|p| Event::default().event("price").json_data(&p));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
