use chrono::{TimeZone, Utc};
use mercato_core::{AssetClass, Quote};
use rust_decimal::Decimal;

struct Row {
    id: &'static str,
    symbol: &'static str,
    name: &'static str,
    price: &'static str,
    prev: &'static str,
    class: AssetClass,
    exchange: &'static str,
}

const ROWS: &[Row] = &[
    Row { id: "AAPL", symbol: "AAPL", name: "Apple Inc.", price: "190.00", prev: "188.00", class: AssetClass::Equity, exchange: "NASDAQ" },
    Row { id: "MSFT", symbol: "MSFT", name: "Microsoft Corp", price: "420.00", prev: "418.00", class: AssetClass::Equity, exchange: "NASDAQ" },
    Row { id: "TSLA", symbol: "TSLA", name: "Tesla, Inc.", price: "250.00", prev: "255.00", class: AssetClass::Equity, exchange: "NASDAQ" },
    Row { id: "GOOGL", symbol: "GOOGL", name: "Alphabet Inc. Class A", price: "150.00", prev: "148.00", class: AssetClass::Equity, exchange: "NASDAQ" },
    Row { id: "SPY", symbol: "SPY", name: "SPDR S&P 500 ETF Trust", price: "500.00", prev: "498.00", class: AssetClass::Fund, exchange: "NYSEARCA" },
    Row { id: "bitcoin", symbol: "BTC", name: "Bitcoin", price: "65000.00", prev: "64000.00", class: AssetClass::Crypto, exchange: "" },
    Row { id: "ethereum", symbol: "ETH", name: "Ethereum", price: "3200.00", prev: "3100.00", class: AssetClass::Crypto, exchange: "" },
];

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or(Decimal::ZERO)
}

/// Look up by ticker or provider id (coin id for crypto rows).
pub fn by_id(id: &str, source: &str, realtime: bool) -> Option<Quote> {
    let row = ROWS
        .iter()
        .find(|r| r.id.eq_ignore_ascii_case(id) || r.symbol.eq_ignore_ascii_case(id))?;
    let price = dec(row.price);
    let prev = dec(row.prev);
    let change = price - prev;
    let pct = if prev.is_zero() {
        Decimal::ZERO
    } else {
        (change / prev * Decimal::ONE_HUNDRED).round_dp(4)
    };
    Quote::builder(row.symbol, source)
        .name(row.name)
        .price(price)
        .change(change)
        .change_percent(pct)
        .volume(1_000_000)
        .asset_class(row.class)
        .exchange(row.exchange)
        .timestamp(Utc.timestamp_opt(1_700_000_000, 0).single())
        .realtime(realtime)
        .build()
        .ok()
}

pub fn all() -> impl Iterator<Item = (&'static str, &'static str, &'static str, AssetClass)> {
    ROWS.iter().map(|r| (r.id, r.symbol, r.name, r.class))
}
