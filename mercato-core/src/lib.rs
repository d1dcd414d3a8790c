//! mercato-core
//!
//! Traits and utilities shared across the mercato workspace.
//!
//! - `connector`: the `MercatoConnector` trait and its role traits.
//! - `stream`: the realtime codec trait and `StreamHandle`.
//! - `normalize`: lenient readers for provider JSON.
//! - `time`: clocks and cache time buckets.
//!
//! Async runtime (Tokio)
//! ---------------------
//! `stream::StreamHandle` wraps `tokio::task::JoinHandle<()>` and a
//! `tokio::sync::oneshot::Sender<()>` for cooperative shutdown, so streaming code
//! must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Connector capability traits and the primary `MercatoConnector` interface.
pub mod connector;
/// Middleware traits implemented by connector wrappers.
pub mod middleware;
pub mod normalize;
/// Realtime codec trait and stream task handles.
pub mod stream;
pub mod time;

pub use connector::{
    BatchQuoteProvider, EndpointProvider, MercatoConnector, ProxyParams, QuoteProvider,
    SearchProvider,
};
pub use middleware::{CallGuard, Middleware};
pub use mercato_types::*;
pub use stream::{StreamEvent, StreamHandle, StreamProvider};
pub use time::{Clock, ManualClock, SystemClock, time_bucket};
