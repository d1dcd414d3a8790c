// Re-export helpers so tests can `use helpers::*;`
#![allow(dead_code)]

pub mod mock_connector;
pub mod ws;

pub use mock_connector::MockConnector;

use chrono::{DateTime, TimeZone, Utc};
use mercato_core::{AssetClass, CandidateMatch, Quote};
use rust_decimal::Decimal;

pub const AAPL: &str = "AAPL";
pub const MSFT: &str = "MSFT";

/// Quote with only the fields routing cares about.
pub fn quote(symbol: &str, source: &str, price: &str, realtime: bool) -> Quote {
    Quote::builder(symbol.to_ascii_uppercase(), source)
        .price(price.parse::<Decimal>().expect("valid test price"))
        .realtime(realtime)
        .build()
        .expect("valid test quote")
}

pub fn hit(id: &str, symbol: &str, name: &str, class: AssetClass) -> CandidateMatch {
    CandidateMatch {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        asset_class: class,
        exchange: None,
        currency: Some("USD".to_string()),
    }
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}

/// Fixed instant at the start of a 30 second bucket.
pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_010, 0).single().expect("valid instant")
}
