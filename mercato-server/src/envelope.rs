//! JSON response envelopes.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use mercato_core::SearchReport;
use serde::Serialize;

/// `{success, data?, error?, timestamp}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    /// Successful envelope around `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed envelope with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Search responses carry the report fields at the top level:
/// `{success, query, results, providers, errors, timestamp}`.
#[derive(Debug, Serialize)]
pub struct SearchEnvelope {
    /// Always true; search never fails on provider errors.
    pub success: bool,
    /// The aggregated report.
    #[serde(flatten)]
    pub report: SearchReport,
}

impl From<SearchReport> for SearchEnvelope {
    fn from(report: SearchReport) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

impl IntoResponse for SearchEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
