use mercato_core::{MercatoError, ProxyParams};
use serde_json::Value;

use crate::Mercato;

impl Mercato {
    /// Call an allow-listed raw endpoint on a named provider and return its JSON unchanged.
    ///
    /// # Errors
    /// `InvalidArg` for an unknown provider or an inverted date range,
    /// `UnsupportedEndpoint` when the provider does not allow `endpoint`, and any
    /// upstream error the provider reports.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "mercato::router::proxy", skip(self, params))
    )]
    pub async fn proxy(
        &self,
        provider: &str,
        endpoint: &str,
        params: &ProxyParams,
    ) -> Result<Value, MercatoError> {
        let c = self
            .connector(provider)
            .ok_or_else(|| MercatoError::InvalidArg(format!("unknown provider '{provider}'")))?;
        let ep = c
            .as_endpoint_provider()
            .ok_or_else(|| MercatoError::unsupported_endpoint(provider, endpoint))?;
        if !ep.allows(endpoint) {
            return Err(MercatoError::unsupported_endpoint(provider, endpoint));
        }
        params.validate()?;
        Self::provider_call_with_timeout(
            c.name(),
            "proxy",
            self.cfg.provider_timeout,
            ep.call(endpoint, params),
        )
        .await
    }

    /// Allow-listed endpoints per provider, in priority order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<(&'static str, &'static [&'static str])> {
        self.connectors
            .iter()
            .filter_map(|c| c.as_endpoint_provider().map(|ep| (c.name(), ep.endpoints())))
            .collect()
    }
}
