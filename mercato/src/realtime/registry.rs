use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mercato_core::{ConnectionState, RealtimePrice, StreamRole};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Callback invoked for every price pushed for a subscribed symbol.
pub type PriceCallback = Arc<dyn Fn(&RealtimePrice) + Send + Sync>;

/// Handle for one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Frame requests from the registry to a connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
}

struct Upstream {
    state: ConnectionState,
    ready: bool,
    /// Symbols subscribed on the live socket, in subscription order.
    symbols: Vec<String>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Upstream {
    fn send(&self, cmd: Command) {
        // a closed channel means the connection task is gone; nothing to tell it
        let _ = self.commands.send(cmd);
    }

    /// Subscribe registered symbols not yet upstream while capacity allows.
    fn promote(&mut self, order: &[String], max_symbols: usize) {
        if !self.ready {
            return;
        }
        let room = max_symbols.saturating_sub(self.symbols.len());
        let pending: Vec<String> = order
            .iter()
            .filter(|s| !self.symbols.contains(s))
            .take(room)
            .cloned()
            .collect();
        if pending.is_empty() {
            return;
        }
        self.symbols.extend(pending.iter().cloned());
        self.send(Command::Subscribe(pending));
    }
}

#[derive(Default)]
struct Inner {
    /// Symbols in first-registration order.
    order: Vec<String>,
    callbacks: HashMap<String, Vec<(SubscriptionId, PriceCallback)>>,
    upstreams: HashMap<StreamRole, Upstream>,
    next_id: u64,
}

impl Inner {
    fn remove_symbol(&mut self, symbol: &str, max_symbols: usize) {
        self.callbacks.remove(symbol);
        self.order.retain(|s| s != symbol);
        let Self {
            order, upstreams, ..
        } = self;
        for up in upstreams.values_mut() {
            if let Some(pos) = up.symbols.iter().position(|s| s == symbol) {
                up.symbols.remove(pos);
                if up.ready {
                    up.send(Command::Unsubscribe(vec![symbol.to_string()]));
                }
            }
            up.promote(order, max_symbols);
        }
    }
}

/// Shared subscription state for both realtime connections.
///
/// Callers and connection tasks all go through one lock; callbacks are cloned
/// out and invoked after it is released.
pub(crate) struct Registry {
    inner: Mutex<Inner>,
    max_symbols: usize,
}

impl Registry {
    pub(crate) fn new(max_symbols: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_symbols,
        }
    }

    pub(crate) fn attach(&self, role: StreamRole, commands: mpsc::UnboundedSender<Command>) {
        self.inner.lock().upstreams.insert(
            role,
            Upstream {
                state: ConnectionState::Disconnected,
                ready: false,
                symbols: Vec::new(),
                commands,
            },
        );
    }

    pub(crate) fn subscribe(&self, symbol: String, callback: PriceCallback) -> SubscriptionId {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        let entry = inner.callbacks.entry(symbol.clone()).or_default();
        let fresh = entry.is_empty();
        entry.push((id, callback));
        if fresh {
            inner.order.push(symbol.clone());
            for up in inner.upstreams.values_mut() {
                if up.ready && up.symbols.len() < self.max_symbols {
                    up.symbols.push(symbol.clone());
                    up.send(Command::Subscribe(vec![symbol.clone()]));
                }
            }
        }
        id
    }

    /// Drop every callback for `symbol`. Returns false when it was not subscribed.
    pub(crate) fn unsubscribe(&self, symbol: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.callbacks.contains_key(symbol) {
            return false;
        }
        inner.remove_symbol(symbol, self.max_symbols);
        true
    }

    /// Drop one callback; the symbol goes with its last callback.
    pub(crate) fn unsubscribe_callback(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let Some(symbol) = inner
            .callbacks
            .iter()
            .find(|(_, cbs)| cbs.iter().any(|(cid, _)| *cid == id))
            .map(|(s, _)| s.clone())
        else {
            return false;
        };
        let now_empty = inner.callbacks.get_mut(&symbol).is_some_and(|cbs| {
            cbs.retain(|(cid, _)| *cid != id);
            cbs.is_empty()
        });
        if now_empty {
            inner.remove_symbol(&symbol, self.max_symbols);
        }
        true
    }

    pub(crate) fn state(&self, role: StreamRole) -> ConnectionState {
        self.inner
            .lock()
            .upstreams
            .get(&role)
            .map_or(ConnectionState::Disconnected, |up| up.state)
    }

    pub(crate) fn symbols(&self) -> Vec<String> {
        self.inner.lock().order.clone()
    }

    pub(crate) fn upstream_symbols(&self, role: StreamRole) -> Vec<String> {
        self.inner
            .lock()
            .upstreams
            .get(&role)
            .map(|up| up.symbols.clone())
            .unwrap_or_default()
    }

    /// Record a non-ready state. Upstream symbols are forgotten; they are replayed
    /// when the connection is ready again.
    pub(crate) fn set_state(&self, role: StreamRole, state: ConnectionState) {
        if let Some(up) = self.inner.lock().upstreams.get_mut(&role) {
            up.state = state;
            up.ready = false;
            up.symbols.clear();
        }
    }

    /// Mark the connection ready and return the symbols it must subscribe now:
    /// up to `max_symbols` registered symbols in registration order.
    pub(crate) fn mark_ready(&self, role: StreamRole, state: ConnectionState) -> Vec<String> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(up) = inner.upstreams.get_mut(&role) else {
            return Vec::new();
        };
        up.state = state;
        up.ready = true;
        up.symbols = inner.order.iter().take(self.max_symbols).cloned().collect();
        up.symbols.clone()
    }

    /// Invoke the callbacks registered for the update's symbol.
    pub(crate) fn dispatch(&self, price: &RealtimePrice) -> usize {
        let callbacks: Vec<PriceCallback> = self
            .inner
            .lock()
            .callbacks
            .get(&price.symbol)
            .map(|cbs| cbs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for cb in &callbacks {
            cb(price);
        }
        callbacks.len()
    }
}
