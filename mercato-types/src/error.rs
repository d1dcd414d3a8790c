use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the mercato workspace.
///
/// Caller errors (`InvalidQuery`, `UnsupportedEndpoint`, `InvalidArg`) are meant to
/// reach the HTTP boundary. Provider-level failures (`UpstreamError`,
/// `UpstreamUnreachable`, `MisconfiguredCredentials`, `NotFound`) are usually
/// recorded as diagnostics by the orchestrator instead of failing a request.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MercatoError {
    /// The caller supplied a query that cannot be processed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The requested provider sub-endpoint is not in the provider's allow-list.
    #[error("unsupported endpoint '{endpoint}' for {provider}")]
    UnsupportedEndpoint {
        /// Provider key.
        provider: String,
        /// Endpoint name that was rejected.
        endpoint: String,
    },

    /// A provider needs a secret that is not configured.
    #[error("{provider} is not configured: {detail}")]
    MisconfiguredCredentials {
        /// Provider key.
        provider: String,
        /// Which secret is missing.
        detail: String,
    },

    /// The provider answered with a non-success status or an error payload.
    #[error("{provider} returned {status}: {message}")]
    UpstreamError {
        /// Provider key.
        provider: String,
        /// HTTP status (or the status implied by an error payload).
        status: u16,
        /// Message extracted from the response.
        message: String,
    },

    /// Transport failure: DNS, connect, TLS, or timeout.
    #[error("{provider} unreachable: {message}")]
    UpstreamUnreachable {
        /// Provider key.
        provider: String,
        /// Human-readable cause.
        message: String,
    },

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "quote for AAPL".
        what: String,
    },

    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested.
        capability: String,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with the returned or expected data.
    #[error("data issue: {0}")]
    Data(String),

    /// An individual connector returned an opaque error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The request exceeds the configured quota budget for the current window.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// Streaming connection failure.
    #[error("stream error: {0}")]
    Stream(String),

    /// All selected providers failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<MercatoError>),
}

impl MercatoError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `UpstreamError`.
    pub fn upstream(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Helper: build an `UpstreamUnreachable` error.
    pub fn unreachable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnreachable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Helper: build a `MisconfiguredCredentials` error.
    pub fn misconfigured(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MisconfiguredCredentials {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    /// Helper: build an `UnsupportedEndpoint` error.
    pub fn unsupported_endpoint(provider: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::UnsupportedEndpoint {
            provider: provider.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Returns true if this error should be surfaced to users as a diagnostic.
    ///
    /// Capability absence, benign not-found results and unconfigured providers are
    /// not actionable. Aggregates are classified based on their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Unsupported { .. }
            | Self::NotFound { .. }
            | Self::MisconfiguredCredentials { .. } => false,
            Self::AllProvidersFailed(inner) => inner.iter().any(Self::is_actionable),
            _ => true,
        }
    }

    /// True for errors caused by the caller rather than a provider.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuery(_) | Self::InvalidArg(_) | Self::UnsupportedEndpoint { .. }
        )
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}
