#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod builder;
mod quota;

pub use crate::builder::ConnectorBuilder;
pub use crate::quota::{QuotaAwareConnector, QuotaMiddleware};
