use mercato::{AssetClass, Mercato, MercatoError};

use crate::helpers::{MockConnector, dec, hit};

fn coin_gecko() -> std::sync::Arc<MockConnector> {
    MockConnector::builder()
        .name("coingecko")
        .kinds(&[AssetClass::Crypto])
        .with_search_fn(|q| {
            if q.eq_ignore_ascii_case("bitcoin") {
                Ok(vec![hit("bitcoin", "BTC", "Bitcoin", AssetClass::Crypto)])
            } else {
                Err(MercatoError::not_found(format!("search results for {q}")))
            }
        })
        .with_batch_fn(|targets| {
            Ok(targets
                .iter()
                .filter(|t| t.id == "bitcoin")
                .map(|_| {
                    mercato::Quote::builder("BTC", "coingecko")
                        .name("Bitcoin")
                        .price(dec("95000"))
                        .change_percent(dec("2.1"))
                        .asset_class(AssetClass::Crypto)
                        .build()
                        .unwrap()
                })
                .collect())
        })
        .build()
}

#[tokio::test]
async fn coin_names_resolve_through_the_crypto_tier() {
    let equity = MockConnector::builder()
        .name("finnhub")
        .with_quote_fn(|s| Err(MercatoError::not_found(format!("quote for {s}"))))
        .with_search_fn(|q| Err(MercatoError::not_found(format!("search results for {q}"))))
        .build();
    let coins = coin_gecko();
    let slow = MockConnector::builder()
        .name("alphavantage")
        .slow()
        .returns_price("1", false)
        .build();

    let m = Mercato::builder()
        .with_connector(equity.clone())
        .with_connector(coins.clone())
        .with_connector(slow.clone())
        .build()
        .unwrap();

    let report = m.search("bitcoin").await.unwrap();

    assert_eq!(report.results.len(), 1);
    let btc = &report.results[0];
    assert_eq!(btc.symbol, "BTC");
    assert_eq!(btc.name, "Bitcoin");
    assert_eq!(btc.price, dec("95000"));
    assert_eq!(btc.change_percent, dec("2.1"));
    assert_eq!(btc.asset_class, AssetClass::Crypto);
    assert!(!btc.realtime);
    assert_eq!(report.providers, vec!["coingecko".to_string()]);
    assert!(report.errors.is_empty());

    assert_eq!(coins.search_calls(), 1);
    assert_eq!(coins.batch_calls(), 1);
    assert_eq!(slow.total_calls(), 0);
}

#[tokio::test]
async fn crypto_results_follow_equity_results() {
    let equity = MockConnector::builder()
        .name("finnhub")
        .with_quote_fn(|s| Err(MercatoError::not_found(format!("quote for {s}"))))
        .with_search_fn(|_| Ok(vec![hit("BTCS", "BTCS", "BTCS Inc.", AssetClass::Equity)]))
        .build();
    let coins = coin_gecko();
    let m = Mercato::builder()
        .with_connector(coins)
        .with_connector(equity.clone())
        .build()
        .unwrap();

    // the equity connector cannot price its hit, so only the coin survives
    let report = m.search("bitcoin").await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(equity.quote_calls(), 2);

    let equity = MockConnector::builder()
        .name("finnhub")
        .with_quote_fn(|s| match s {
            "BTCS" => Ok(crate::helpers::quote(s, "finnhub", "4.20", true)),
            _ => Err(MercatoError::not_found(format!("quote for {s}"))),
        })
        .with_search_fn(|_| Ok(vec![hit("BTCS", "BTCS", "BTCS Inc.", AssetClass::Equity)]))
        .build();
    let m = Mercato::builder()
        .with_connector(coin_gecko())
        .with_connector(equity)
        .build()
        .unwrap();
    let report = m.search("bitcoin").await.unwrap();
    let symbols: Vec<&str> = report.results.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BTCS", "BTC"]);
    // providers are listed in registration order
    assert_eq!(
        report.providers,
        vec!["coingecko".to_string(), "finnhub".to_string()]
    );
}
