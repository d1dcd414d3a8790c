//! Middleware traits for wrapping `MercatoConnector` implementations.

use std::sync::Arc;

use mercato_types::{Capability, MercatoError};

use crate::connector::MercatoConnector;

/// Trait implemented by connector middleware layers.
///
/// A middleware consumes an inner `MercatoConnector` and returns a wrapped connector
/// that augments or restricts behavior (e.g. quotas).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner connector and return the wrapped connector.
    fn apply(self: Box<Self>, inner: Arc<dyn MercatoConnector>) -> Arc<dyn MercatoConnector>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}

/// Hooks run by wrappers generated with `mercato_delegate_provider_impls!`.
pub trait CallGuard: Send + Sync {
    /// Runs before the inner call; an error short-circuits it.
    ///
    /// # Errors
    /// Implementation-defined rejection, e.g. `QuotaExceeded`.
    fn pre_call(&self, capability: Capability) -> Result<(), MercatoError>;

    /// Maps an error returned by the inner call.
    fn map_error(&self, err: MercatoError, capability: Capability) -> MercatoError {
        let _ = capability;
        err
    }
}
