use axum::extract::State;
use mercato_core::{ConnectionState, StreamRole};
use serde::Serialize;

use super::AppState;
use crate::envelope::Envelope;

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
    providers: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    realtime: Option<RealtimeHealth>,
}

/// Connection states and symbol count of the realtime manager.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeHealth {
    primary: ConnectionState,
    backup: ConnectionState,
    subscribed_symbols: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Envelope<Health> {
    let realtime = state.realtime.as_ref().map(|live| RealtimeHealth {
        primary: live.state(StreamRole::Primary),
        backup: live.state(StreamRole::Backup),
        subscribed_symbols: live.subscribed_symbols().len(),
    });
    Envelope::ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        providers: state.mercato.connectors().iter().map(|c| c.name()).collect(),
        realtime,
    })
}
