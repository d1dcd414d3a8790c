//! HTTP routes.
//!
//! | route | handler |
//! |---|---|
//! | `GET /health` | [`health::health`] |
//! | `GET /api/quote?symbol=` | [`market::quote`] |
//! | `GET /api/search?query=` | [`market::search`] |
//! | `GET /api/providers` | [`market::providers`] |
//! | `GET /api/providers/{provider}?endpoint=&symbol=&from=&to=` | [`market::proxy`] |
//! | `GET /api/stream?symbols=A,B` | [`stream::prices`] |
//! | `/api/{profiles,recommendations,portfolios}` | [`records::routes`] |

use std::sync::Arc;

use axum::Router;
use axum::http::Uri;
use axum::routing::get;
use mercato::{Mercato, RealtimeManager};
use mercato_core::{MercatoError, PortfolioRecommendation, SavedPortfolio, UserProfile};

use crate::error::ApiError;
use crate::store::PersistenceGateway;

pub mod health;
pub mod market;
pub mod records;
pub mod stream;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Quote, search and proxy orchestrator.
    pub mercato: Arc<Mercato>,
    /// Realtime manager; `None` when no streaming provider is configured.
    pub realtime: Option<Arc<RealtimeManager>>,
    /// Record storage.
    pub store: Arc<dyn PersistenceGateway>,
}

impl AppState {
    /// State without realtime streaming.
    pub fn new(mercato: Arc<Mercato>, store: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            mercato,
            realtime: None,
            store,
        }
    }

    /// Attach a running realtime manager.
    #[must_use]
    pub fn with_realtime(mut self, realtime: Arc<RealtimeManager>) -> Self {
        self.realtime = Some(realtime);
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/quote", get(market::quote))
        .route("/api/search", get(market::search))
        .route("/api/providers", get(market::providers))
        .route("/api/providers/{provider}", get(market::proxy))
        .route("/api/stream", get(stream::prices))
        .merge(records::routes::<UserProfile>())
        .merge(records::routes::<PortfolioRecommendation>())
        .merge(records::routes::<SavedPortfolio>())
        .fallback(unknown_route)
        .with_state(state)
}

async fn unknown_route(uri: Uri) -> ApiError {
    MercatoError::not_found(format!("route {}", uri.path())).into()
}
