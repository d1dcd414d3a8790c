use std::collections::HashSet;

use mercato_core::normalize::{canonical_symbol, is_symbol_shaped};
use mercato_core::MercatoError;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_CHARS: usize = 64;

/// Queries shorter than this (after trimming) return an empty report.
pub const MIN_QUERY_CHARS: usize = 2;

/// Trim and bound a free-text query.
///
/// # Errors
/// `InvalidQuery` for empty or whitespace-only input, or input longer than
/// [`MAX_QUERY_CHARS`].
pub fn validate_query(raw: &str) -> Result<&str, MercatoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MercatoError::InvalidQuery("query must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(MercatoError::InvalidQuery(format!(
            "query must be at most {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

/// Canonicalize a ticker for best-price and realtime use.
///
/// # Errors
/// `InvalidQuery` when the input is empty or not shaped like a ticker.
pub fn validate_symbol(raw: &str) -> Result<String, MercatoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MercatoError::InvalidQuery("symbol must not be empty".into()));
    }
    if !is_symbol_shaped(trimmed) {
        return Err(MercatoError::InvalidQuery(format!("'{trimmed}' is not a valid symbol")));
    }
    Ok(canonical_symbol(trimmed))
}

/// Keep the first item per uppercased symbol, preserving order, up to `limit` items.
pub fn dedup_by_symbol<T, I, F>(items: I, limit: usize, symbol_of: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(symbol_of(item).to_ascii_uppercase()))
        .take(limit)
        .collect()
}

/// `"<provider>: <message>"` for errors worth showing; `None` for benign ones.
pub(crate) fn diagnostic(provider: &str, err: &MercatoError) -> Option<String> {
    if !err.is_actionable() {
        return None;
    }
    let message = match err {
        MercatoError::UpstreamError { status, message, .. } => format!("HTTP {status}: {message}"),
        MercatoError::UpstreamUnreachable { message, .. } => format!("unreachable: {message}"),
        other => other.to_string(),
    };
    Some(format!("{provider}: {message}"))
}
