//! Mercato data transfer objects, error taxonomy, and configuration primitives.
#![warn(missing_docs)]

mod capability;
mod config;
mod connector;
mod error;
mod quote;
mod records;
mod reports;

pub use capability::Capability;
pub use config::{
    BackoffConfig, MercatoConfig, ProviderConfig, QuotaConfig, QuotaState, RealtimeConfig,
};
pub use connector::{ConnectorKey, LatencyClass, StreamRole};
pub use error::MercatoError;
pub use quote::{AssetClass, CandidateMatch, ConnectionState, Quote, QuoteBuilder, RealtimePrice};
pub use records::{
    Allocation, Collection, Holding, PortfolioRecommendation, Record, RiskTolerance,
    SavedPortfolio, UserProfile, Validate,
};
pub use reports::SearchReport;
