use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::MercatoError;
use crate::stream::StreamProvider;
pub use mercato_types::ConnectorKey;
use mercato_types::{AssetClass, CandidateMatch, LatencyClass, Quote};

/// Focused role trait for connectors that provide quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a point-in-time quote for `symbol`.
    ///
    /// For providers keyed by something other than a ticker (coin ids), `symbol`
    /// is the provider-native id returned by search.
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError>;
}

/// Focused role trait for connectors that price several search hits in one call.
#[async_trait]
pub trait BatchQuoteProvider: Send + Sync {
    /// Price `targets` by their provider-native ids. Quotes take symbol and name
    /// from the matching target; targets without data are omitted.
    async fn quotes(&self, targets: &[CandidateMatch]) -> Result<Vec<Quote>, MercatoError>;
}

/// Focused role trait for connectors that can search instruments.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Free-text search, best match first.
    async fn search(&self, query: &str) -> Result<Vec<CandidateMatch>, MercatoError>;
}

/// Parameters for a raw provider endpoint call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyParams {
    /// Target symbol, when the endpoint is symbol scoped.
    pub symbol: Option<String>,
    /// Inclusive start date for ranged endpoints.
    pub from: Option<NaiveDate>,
    /// Inclusive end date for ranged endpoints.
    pub to: Option<NaiveDate>,
    /// Additional provider-specific query parameters, passed through verbatim.
    pub extra: BTreeMap<String, String>,
}

impl ProxyParams {
    /// Params targeting a symbol.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    /// Check the date range.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `from` is after `to`.
    pub fn validate(&self) -> Result<(), MercatoError> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(MercatoError::InvalidArg(format!(
                "from ({from}) must not be after to ({to})"
            )));
        }
        Ok(())
    }

    /// The uppercased symbol, required by the endpoint.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no symbol was supplied.
    pub fn require_symbol(&self, endpoint: &str) -> Result<String, MercatoError> {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase)
            .ok_or_else(|| MercatoError::InvalidArg(format!("endpoint '{endpoint}' needs a symbol")))
    }
}

/// Focused role trait for connectors that expose allow-listed raw endpoints.
#[async_trait]
pub trait EndpointProvider: Send + Sync {
    /// Endpoint names accepted by [`call`](Self::call).
    fn endpoints(&self) -> &'static [&'static str];

    /// Whether `endpoint` is allow-listed.
    fn allows(&self, endpoint: &str) -> bool {
        self.endpoints().contains(&endpoint)
    }

    /// Call an allow-listed endpoint and return the upstream JSON unchanged.
    async fn call(
        &self,
        endpoint: &str,
        params: &ProxyParams,
    ) -> Result<serde_json::Value, MercatoError>;
}

/// Main connector trait implemented by provider crates. Exposes capability discovery.
pub trait MercatoConnector: Send + Sync {
    /// A stable identifier for priority lists and result attribution (e.g. "finnhub").
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this connector claims to support a given asset class.
    ///
    /// Default: `false` for all classes. Connectors must opt in explicitly.
    fn supports_kind(&self, kind: AssetClass) -> bool {
        let _ = kind;
        false
    }

    /// Latency class used by search and best-price routing.
    fn latency(&self) -> LatencyClass {
        LatencyClass::Fast
    }

    /// Advertise quote capability.
    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        None
    }
    /// Advertise batch quote capability.
    fn as_batch_quote_provider(&self) -> Option<&dyn BatchQuoteProvider> {
        None
    }
    /// Advertise search capability.
    fn as_search_provider(&self) -> Option<&dyn SearchProvider> {
        None
    }
    /// Advertise raw endpoint capability.
    fn as_endpoint_provider(&self) -> Option<&dyn EndpointProvider> {
        None
    }
    /// Advertise a realtime stream codec.
    fn as_stream_provider(&self) -> Option<&dyn StreamProvider> {
        None
    }
}

/// Generate `as_*_provider` accessors for a wrapper that implements
/// `MercatoConnector` by delegating to an inner field.
///
/// The stream codec is forwarded directly; it performs no upstream calls.
#[macro_export]
macro_rules! mercato_connector_accessors {
    ($inner:ident) => {
        fn as_quote_provider(&self) -> Option<&dyn $crate::connector::QuoteProvider> {
            if self.$inner.as_quote_provider().is_some() {
                Some(self as &dyn $crate::connector::QuoteProvider)
            } else {
                None
            }
        }
        fn as_batch_quote_provider(&self) -> Option<&dyn $crate::connector::BatchQuoteProvider> {
            if self.$inner.as_batch_quote_provider().is_some() {
                Some(self as &dyn $crate::connector::BatchQuoteProvider)
            } else {
                None
            }
        }
        fn as_search_provider(&self) -> Option<&dyn $crate::connector::SearchProvider> {
            if self.$inner.as_search_provider().is_some() {
                Some(self as &dyn $crate::connector::SearchProvider)
            } else {
                None
            }
        }
        fn as_endpoint_provider(&self) -> Option<&dyn $crate::connector::EndpointProvider> {
            if self.$inner.as_endpoint_provider().is_some() {
                Some(self as &dyn $crate::connector::EndpointProvider)
            } else {
                None
            }
        }
        fn as_stream_provider(&self) -> Option<&dyn $crate::stream::StreamProvider> {
            self.$inner.as_stream_provider()
        }
    };
}

/// Generate the role trait impls for a wrapper type `$self_ty`, delegating to an
/// inner field `$inner` and running the wrapper's [`CallGuard`](crate::CallGuard)
/// hooks around every call.
#[macro_export]
macro_rules! mercato_delegate_provider_impls {
    ($self_ty:ty, $inner:ident) => {
        #[async_trait::async_trait]
        impl $crate::connector::QuoteProvider for $self_ty {
            async fn quote(
                &self,
                symbol: &str,
            ) -> Result<$crate::Quote, $crate::MercatoError> {
                let cap = $crate::Capability::Quote;
                <Self as $crate::CallGuard>::pre_call(self, cap)?;
                let inner = self
                    .$inner
                    .as_quote_provider()
                    .ok_or_else(|| $crate::MercatoError::unsupported(cap.as_str()))?;
                inner
                    .quote(symbol)
                    .await
                    .map_err(|e| <Self as $crate::CallGuard>::map_error(self, e, cap))
            }
        }

        #[async_trait::async_trait]
        impl $crate::connector::BatchQuoteProvider for $self_ty {
            async fn quotes(
                &self,
                targets: &[$crate::CandidateMatch],
            ) -> Result<Vec<$crate::Quote>, $crate::MercatoError> {
                let cap = $crate::Capability::BatchQuote;
                <Self as $crate::CallGuard>::pre_call(self, cap)?;
                let inner = self
                    .$inner
                    .as_batch_quote_provider()
                    .ok_or_else(|| $crate::MercatoError::unsupported(cap.as_str()))?;
                inner
                    .quotes(targets)
                    .await
                    .map_err(|e| <Self as $crate::CallGuard>::map_error(self, e, cap))
            }
        }

        #[async_trait::async_trait]
        impl $crate::connector::SearchProvider for $self_ty {
            async fn search(
                &self,
                query: &str,
            ) -> Result<Vec<$crate::CandidateMatch>, $crate::MercatoError> {
                let cap = $crate::Capability::Search;
                <Self as $crate::CallGuard>::pre_call(self, cap)?;
                let inner = self
                    .$inner
                    .as_search_provider()
                    .ok_or_else(|| $crate::MercatoError::unsupported(cap.as_str()))?;
                inner
                    .search(query)
                    .await
                    .map_err(|e| <Self as $crate::CallGuard>::map_error(self, e, cap))
            }
        }

        #[async_trait::async_trait]
        impl $crate::connector::EndpointProvider for $self_ty {
            fn endpoints(&self) -> &'static [&'static str] {
                self.$inner
                    .as_endpoint_provider()
                    .map_or(&[], |p| p.endpoints())
            }

            async fn call(
                &self,
                endpoint: &str,
                params: &$crate::connector::ProxyParams,
            ) -> Result<serde_json::Value, $crate::MercatoError> {
                let cap = $crate::Capability::Proxy;
                let inner = self
                    .$inner
                    .as_endpoint_provider()
                    .ok_or_else(|| $crate::MercatoError::unsupported(cap.as_str()))?;
                if !inner.allows(endpoint) {
                    return Err($crate::MercatoError::unsupported_endpoint(
                        self.$inner.name(),
                        endpoint,
                    ));
                }
                <Self as $crate::CallGuard>::pre_call(self, cap)?;
                inner
                    .call(endpoint, params)
                    .await
                    .map_err(|e| <Self as $crate::CallGuard>::map_error(self, e, cap))
            }
        }
    };
}
