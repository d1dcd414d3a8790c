use std::sync::Arc;
use std::time::Duration;

use mercato_core::connector::MercatoConnector;
use mercato_core::{MercatoError, ProviderConfig, QuotaConfig};
use mercato_middleware::ConnectorBuilder;

use crate::{
    AlpacaConnector, AlphaVantageConnector, CoinGeckoConnector, EodhdConnector, FinnhubConnector,
    FmpConnector,
};

macro_rules! connector_builders {
    ($($ty:ident => $limit:expr, per $secs:expr;)*) => {$(
        impl $ty {
            /// Published free-tier call budget for this provider.
            pub const FREE_TIER: QuotaConfig = QuotaConfig {
                limit: $limit,
                window: Duration::from_secs($secs),
            };

            /// Builder over an unwrapped connector, for manual composition.
            ///
            /// # Errors
            /// Propagates connector construction failures.
            pub fn builder(cfg: ProviderConfig) -> Result<ConnectorBuilder, MercatoError> {
                let raw: Arc<dyn MercatoConnector> = Arc::new(Self::new(cfg)?);
                Ok(ConnectorBuilder::new(raw))
            }

            /// Builder preloaded with [`Self::FREE_TIER`].
            ///
            /// Users can further customize before calling `.build()`.
            ///
            /// # Errors
            /// Propagates connector construction failures.
            pub fn rate_limited(cfg: ProviderConfig) -> Result<ConnectorBuilder, MercatoError> {
                Ok(Self::builder(cfg)?.with_quota(&Self::FREE_TIER))
            }
        }
    )*};
}

connector_builders! {
    FinnhubConnector => 60, per 60;
    AlpacaConnector => 200, per 60;
    CoinGeckoConnector => 30, per 60;
    AlphaVantageConnector => 25, per 86_400;
    FmpConnector => 250, per 86_400;
    EodhdConnector => 20, per 86_400;
}
