//! Builder for composing connectors with middleware layers.
//!
//! Layers form an onion around the raw connector. `layers[0]` is the outermost
//! layer; `build()` applies them innermost first so the result reads
//! `layers[0](layers[1](...(raw)))`.

use std::sync::Arc;

use mercato_core::Middleware;
use mercato_core::connector::MercatoConnector;
use mercato_types::QuotaConfig;

use crate::quota::QuotaMiddleware;

/// Generic middleware builder for composing a connector with layered wrappers.
pub struct ConnectorBuilder {
    raw: Arc<dyn MercatoConnector>,
    layers: Vec<Box<dyn Middleware>>,
}

impl ConnectorBuilder {
    /// Create a new builder from a raw, unwrapped connector.
    #[must_use]
    pub fn new(raw: Arc<dyn MercatoConnector>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Add or replace quota configuration as the outermost layer.
    #[must_use]
    pub fn with_quota(mut self, cfg: &QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != "QuotaAwareConnector");
        self.layers
            .insert(0, Box::new(QuotaMiddleware::new(cfg.clone())));
        self
    }

    /// Remove quota if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != "QuotaAwareConnector");
        self
    }

    /// Push an arbitrary middleware as the new outermost layer.
    #[must_use]
    pub fn layer(mut self, m: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, m);
        self
    }

    /// Names and configuration of the layers, outermost first.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, serde_json::Value)> {
        self.layers
            .iter()
            .map(|m| (m.name(), m.config_json()))
            .collect()
    }

    /// Build the wrapped connector.
    #[must_use]
    pub fn build(self) -> Arc<dyn MercatoConnector> {
        self.layers
            .into_iter()
            .rev()
            .fold(self.raw, |inner, layer| layer.apply(inner))
    }
}
