//! Realtime price subscriptions over a primary and a backup provider socket.
//!
//! Both connections carry the same registered symbols, up to `max_symbols` each,
//! and every price pushed by either one reaches the subscribed callbacks. Each
//! connection reconnects on its own according to the configured
//! [`BackoffConfig`](mercato_core::BackoffConfig).

mod backoff;
mod connection;
mod registry;
mod transport;

use std::sync::Arc;

use mercato_core::stream::StreamHandle;
use mercato_core::{
    BackoffConfig, ConnectionState, MercatoConnector, MercatoError, RealtimeConfig, RealtimePrice,
    StreamRole,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

pub use backoff::{Backoff, jitter_wait};
pub use registry::{PriceCallback, SubscriptionId};
pub use transport::{TungsteniteConnect, WsConnect, WsSession};

use crate::router::util::validate_symbol;
use connection::Connection;
use registry::Registry;

/// Running subscription manager. Dropping it stops both connections.
pub struct RealtimeManager {
    registry: Arc<Registry>,
    handles: Mutex<Vec<StreamHandle>>,
}

impl RealtimeManager {
    /// Register `callback` for `symbol`.
    ///
    /// The symbol is subscribed upstream on every ready connection with spare
    /// capacity; otherwise it waits for a reconnect or a freed slot.
    ///
    /// # Errors
    /// `InvalidQuery` when `symbol` is not ticker-shaped.
    pub fn subscribe<F>(&self, symbol: &str, callback: F) -> Result<SubscriptionId, MercatoError>
    where
        F: Fn(&RealtimePrice) + Send + Sync + 'static,
    {
        let symbol = validate_symbol(symbol)?;
        Ok(self.registry.subscribe(symbol, Arc::new(callback)))
    }

    /// Remove every callback for `symbol`. Returns `false` if nothing was subscribed.
    pub fn unsubscribe(&self, symbol: &str) -> bool {
        validate_symbol(symbol).is_ok_and(|s| self.registry.unsubscribe(&s))
    }

    /// Remove a single callback.
    pub fn unsubscribe_callback(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe_callback(id)
    }

    /// Current state of one connection. Unconfigured roles read as `Disconnected`.
    #[must_use]
    pub fn state(&self, role: StreamRole) -> ConnectionState {
        self.registry.state(role)
    }

    /// Registered symbols in registration order.
    #[must_use]
    pub fn subscribed_symbols(&self) -> Vec<String> {
        self.registry.symbols()
    }

    /// Symbols currently subscribed on one connection's socket.
    #[must_use]
    pub fn upstream_symbols(&self, role: StreamRole) -> Vec<String> {
        self.registry.upstream_symbols(role)
    }

    /// Stop both connection tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for h in handles {
            h.stop().await;
        }
    }
}

/// Configures and starts a [`RealtimeManager`].
pub struct RealtimeBuilder {
    primary: Option<Arc<dyn MercatoConnector>>,
    backup: Option<Arc<dyn MercatoConnector>>,
    cfg: RealtimeConfig,
    transport: Arc<dyn WsConnect>,
}

impl Default for RealtimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeBuilder {
    /// Builder with default settings and the `tokio-tungstenite` transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            primary: None,
            backup: None,
            cfg: RealtimeConfig::default(),
            transport: Arc::new(TungsteniteConnect),
        }
    }

    /// Connector for the primary socket.
    #[must_use]
    pub fn primary(mut self, c: Arc<dyn MercatoConnector>) -> Self {
        self.primary = Some(c);
        self
    }

    /// Connector for the backup socket.
    #[must_use]
    pub fn backup(mut self, c: Arc<dyn MercatoConnector>) -> Self {
        self.backup = Some(c);
        self
    }

    /// Replace all realtime settings.
    #[must_use]
    pub const fn config(mut self, cfg: RealtimeConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Per-connection ceiling on upstream symbols.
    #[must_use]
    pub const fn max_symbols(mut self, n: usize) -> Self {
        self.cfg.max_symbols = n;
        self
    }

    /// Reconnect policy.
    #[must_use]
    pub const fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.cfg.backoff = backoff;
        self
    }

    /// Socket transport; tests substitute an in-memory one.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn WsConnect>) -> Self {
        self.transport = transport;
        self
    }

    /// Spawn the connection tasks. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// `InvalidArg` when neither connection is configured or `max_symbols` is
    /// zero; `Unsupported` when a connector has no streaming codec.
    pub fn start(self) -> Result<RealtimeManager, MercatoError> {
        if self.primary.is_none() && self.backup.is_none() {
            return Err(MercatoError::InvalidArg(
                "realtime needs a primary or a backup connector".into(),
            ));
        }
        if self.cfg.max_symbols == 0 {
            return Err(MercatoError::InvalidArg("max_symbols must be at least 1".into()));
        }
        let roles = [
            (StreamRole::Primary, self.primary),
            (StreamRole::Backup, self.backup),
        ];
        for (_, c) in &roles {
            if let Some(c) = c
                && c.as_stream_provider().is_none()
            {
                return Err(MercatoError::unsupported(format!("stream ({})", c.name())));
            }
        }

        let registry = Arc::new(Registry::new(self.cfg.max_symbols));
        let mut handles = Vec::new();
        for (role, connector) in roles {
            let Some(connector) = connector else { continue };
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            registry.attach(role, cmd_tx);
            let (stop_tx, stop_rx) = oneshot::channel();
            let conn = Connection {
                role,
                connector,
                transport: Arc::clone(&self.transport),
                registry: Arc::clone(&registry),
                backoff: Backoff::new(self.cfg.backoff),
            };
            let join = tokio::spawn(conn.run(stop_rx, cmd_rx));
            handles.push(StreamHandle::new(join, stop_tx));
        }

        Ok(RealtimeManager {
            registry,
            handles: Mutex::new(handles),
        })
    }
}
