//! Quote, search and raw provider routes.

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use mercato_core::{MercatoError, ProxyParams, Quote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::envelope::{Envelope, SearchEnvelope};
use crate::error::ApiError;

/// `?symbol=`
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    symbol: Option<String>,
}

/// `?query=`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

/// One provider and its allow-listed endpoints.
#[derive(Debug, Serialize)]
pub struct ProviderEndpoints {
    provider: &'static str,
    endpoints: &'static [&'static str],
}

/// Best price for a symbol.
pub async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Envelope<Quote>, ApiError> {
    let symbol = params.symbol.unwrap_or_default();
    let quote = state.mercato.best_price(&symbol).await?;
    Ok(Envelope::ok(quote))
}

/// Aggregated search. Provider failures show up in `errors`, never as a failed response.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<SearchEnvelope, ApiError> {
    let query = params.query.unwrap_or_default();
    let report = state.mercato.search(&query).await?;
    if !report.errors.is_empty() {
        tracing::info!(
            target: "mercato_server::search",
            query = %report.query,
            errors = ?report.errors,
            "search completed with provider errors"
        );
    }
    Ok(report.into())
}

/// Configured providers and the raw endpoints each allows.
pub async fn providers(State(state): State<AppState>) -> Envelope<Vec<ProviderEndpoints>> {
    Envelope::ok(
        state
            .mercato
            .endpoints()
            .into_iter()
            .map(|(provider, endpoints)| ProviderEndpoints {
                provider,
                endpoints,
            })
            .collect(),
    )
}

/// Raw allow-listed call: `endpoint` is required, `symbol`, `from` and `to` are
/// typed, everything else passes through.
pub async fn proxy(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(mut query): Query<HashMap<String, String>>,
) -> Result<Envelope<Value>, ApiError> {
    let endpoint = query
        .remove("endpoint")
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| MercatoError::InvalidArg("endpoint is required".into()))?;
    let params = ProxyParams {
        symbol: query.remove("symbol"),
        from: date(query.remove("from"), "from")?,
        to: date(query.remove("to"), "to")?,
        extra: query.into_iter().collect::<BTreeMap<_, _>>(),
    };
    let body = state.mercato.proxy(&provider, endpoint.trim(), &params).await?;
    Ok(Envelope::ok(body))
}

fn date(raw: Option<String>, field: &str) -> Result<Option<NaiveDate>, MercatoError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                MercatoError::InvalidArg(format!("{field} must be a YYYY-MM-DD date, got '{s}'"))
            })
        })
        .transpose()
}
