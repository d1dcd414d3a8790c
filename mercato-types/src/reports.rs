//! Report envelopes produced by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quote::Quote;

/// Summary of an aggregated search.
///
/// Provider failures never fail a search; they are listed in `errors` as
/// `"<provider>: <message>"` strings and the remaining providers' results are
/// still returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// The query as received, trimmed.
    pub query: String,
    /// Deduplicated, bounded results in provider priority order.
    pub results: Vec<Quote>,
    /// Connectors that contributed at least one surviving result.
    pub providers: Vec<String>,
    /// Provider-level diagnostics.
    pub errors: Vec<String>,
    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,
}

impl SearchReport {
    /// Empty report for `query`.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            providers: Vec::new(),
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}
