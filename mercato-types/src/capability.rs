use core::fmt;
use serde::{Deserialize, Serialize};

/// High-level capability labels for routing, errors, and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Point-in-time quote for a single symbol.
    Quote,
    /// Batch pricing by provider-native ids.
    BatchQuote,
    /// Free-text instrument search.
    Search,
    /// Raw allow-listed provider endpoint passthrough.
    Proxy,
    /// Realtime price stream.
    Stream,
    /// Multi-provider best-price resolution.
    BestPrice,
}

impl Capability {
    /// Stable, kebab-case identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::BatchQuote => "batch-quote",
            Self::Search => "search",
            Self::Proxy => "proxy",
            Self::Stream => "stream",
            Self::BestPrice => "best-price",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Capability> for &'static str {
    fn from(c: Capability) -> Self {
        c.as_str()
    }
}
