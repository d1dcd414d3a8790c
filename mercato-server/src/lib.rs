//! mercato-server
//!
//! JSON over HTTP for the mercato orchestrator. Responses use a common
//! envelope, `{success, data | results, error?, timestamp}`, and failures map
//! onto HTTP statuses by error kind:
//!
//! | error | status |
//! |---|---|
//! | `InvalidQuery`, `InvalidArg`, `UnsupportedEndpoint` | 400 |
//! | `NotFound` | 404 |
//! | `QuotaExceeded` | 429 |
//! | `UpstreamError`, `UpstreamUnreachable` | 502 |
//! | anything else | 500 |
//!
//! The binary reads its settings from the environment (see [`config`]); the
//! library half exists so the router can be driven in tests.
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod envelope;
pub mod error;
pub mod routes;
pub mod store;

pub use config::{ConfigError, ServerConfig};
pub use envelope::{Envelope, SearchEnvelope};
pub use error::ApiError;
pub use routes::{AppState, router};
pub use store::{MemoryStore, PersistenceGateway, Scope};
