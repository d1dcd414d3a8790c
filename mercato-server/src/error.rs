//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mercato_core::MercatoError;

use crate::envelope::Envelope;

/// Error returned by every handler; renders as a failed [`Envelope`].
#[derive(Debug)]
pub struct ApiError(pub MercatoError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

impl From<MercatoError> for ApiError {
    fn from(e: MercatoError) -> Self {
        Self(e)
    }
}

/// Map the error taxonomy onto HTTP statuses.
#[must_use]
pub fn status_for(err: &MercatoError) -> StatusCode {
    match err {
        MercatoError::InvalidQuery(_)
        | MercatoError::InvalidArg(_)
        | MercatoError::UnsupportedEndpoint { .. } => StatusCode::BAD_REQUEST,
        MercatoError::NotFound { .. } => StatusCode::NOT_FOUND,
        MercatoError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        MercatoError::UpstreamError { .. }
        | MercatoError::UpstreamUnreachable { .. }
        | MercatoError::AllProvidersFailed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(target: "mercato_server::http", status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(target: "mercato_server::http", status = status.as_u16(), error = %self.0, "request rejected");
        }
        (status, Json(Envelope::<()>::failure(self.0.to_string()))).into_response()
    }
}
