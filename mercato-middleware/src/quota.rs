//! Quota-aware connector wrapper.
//!
//! Budgets are counted per fixed window. Raw endpoint calls count like any
//! other call; calls rejected by the allow-list do not.

use std::sync::Arc;
use std::time::Duration;

use mercato_core::connector::MercatoConnector;
use mercato_core::{CallGuard, Capability, MercatoError, Middleware};
use mercato_types::{AssetClass, LatencyClass, QuotaConfig, QuotaState};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Wrapper that enforces a call budget on an inner connector.
pub struct QuotaAwareConnector {
    inner: Arc<dyn MercatoConnector>,
    config: QuotaConfig,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    calls_made_in_window: u64,
    last_reset: Instant,
}

impl QuotaAwareConnector {
    /// Create a new quota-aware wrapper around an existing connector.
    pub fn new(inner: Arc<dyn MercatoConnector>, config: QuotaConfig) -> Self {
        Self {
            inner,
            config,
            runtime: Mutex::new(QuotaRuntime {
                calls_made_in_window: 0,
                last_reset: Instant::now(),
            }),
        }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn MercatoConnector> {
        &self.inner
    }

    fn roll_window(&self, rt: &mut QuotaRuntime, now: Instant) {
        let window = self.config.window.max(Duration::from_millis(1));
        let elapsed = now.duration_since(rt.last_reset);
        if elapsed >= window {
            rt.calls_made_in_window = 0;
            // keep windows aligned to their original boundaries across idle gaps
            let windows_passed = elapsed.as_nanos() / window.as_nanos();
            let boundary_offset = Duration::from_nanos(
                (windows_passed * window.as_nanos())
                    .try_into()
                    .unwrap_or(u64::MAX),
            );
            rt.last_reset += boundary_offset;
        }
    }

    /// Current budget snapshot.
    pub fn state(&self) -> QuotaState {
        let mut rt = self.runtime.lock();
        let now = Instant::now();
        self.roll_window(&mut rt, now);
        QuotaState {
            limit: self.config.limit,
            remaining: self.config.limit.saturating_sub(rt.calls_made_in_window),
            reset_in: self
                .config
                .window
                .saturating_sub(now.duration_since(rt.last_reset)),
        }
    }

    /// Check whether a call should be allowed and consume one unit if so.
    ///
    /// # Errors
    /// Returns `MercatoError::QuotaExceeded` when the window budget is exhausted.
    pub fn should_allow_call(&self) -> Result<(), MercatoError> {
        let mut rt = self.runtime.lock();
        let now = Instant::now();
        self.roll_window(&mut rt, now);

        if rt.calls_made_in_window < self.config.limit {
            rt.calls_made_in_window += 1;
            return Ok(());
        }

        let reset_in_ms = self
            .config
            .window
            .saturating_sub(now.duration_since(rt.last_reset))
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);
        drop(rt);

        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "mercato::middleware::quota",
            connector = self.inner.name(),
            reset_in_ms,
            "quota exhausted"
        );

        Err(MercatoError::QuotaExceeded {
            remaining: 0,
            reset_in_ms,
        })
    }
}

impl CallGuard for QuotaAwareConnector {
    fn pre_call(&self, _capability: Capability) -> Result<(), MercatoError> {
        self.should_allow_call()
    }

    fn map_error(&self, err: MercatoError, _capability: Capability) -> MercatoError {
        match err {
            // provider-side rate limiting means our budget is stale: spend the rest
            MercatoError::UpstreamError { status: 429, .. } => {
                let mut rt = self.runtime.lock();
                rt.calls_made_in_window = self.config.limit;
                err
            }
            other => other,
        }
    }
}

impl MercatoConnector for QuotaAwareConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    fn supports_kind(&self, kind: AssetClass) -> bool {
        self.inner.supports_kind(kind)
    }

    fn latency(&self) -> LatencyClass {
        self.inner.latency()
    }

    mercato_core::mercato_connector_accessors!(inner);
}

mercato_core::mercato_delegate_provider_impls!(QuotaAwareConnector, inner);

/// Middleware config for constructing a [`QuotaAwareConnector`].
pub struct QuotaMiddleware {
    /// Budget applied to the wrapped connector.
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Wrap `config` as a middleware layer.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn MercatoConnector>) -> Arc<dyn MercatoConnector> {
        Arc::new(QuotaAwareConnector::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaAwareConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": u64::try_from(self.config.window.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
