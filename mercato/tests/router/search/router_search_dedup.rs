use mercato::{AssetClass, Mercato, MercatoError, dedup_by_symbol};
use proptest::prelude::*;

use crate::helpers::{MockConnector, dec, hit, quote};

fn searcher(
    name: &'static str,
    symbols: &'static [&'static str],
    price: &'static str,
) -> std::sync::Arc<MockConnector> {
    MockConnector::builder()
        .name(name)
        .with_quote_fn(move |s| {
            if symbols.contains(&s) {
                Ok(quote(s, name, price, false))
            } else {
                Err(MercatoError::not_found(format!("quote for {s}")))
            }
        })
        .with_search_fn(move |_| {
            Ok(symbols
                .iter()
                .map(|s| hit(s, s, s, AssetClass::Equity))
                .collect())
        })
        .build()
}

#[tokio::test]
async fn duplicates_keep_the_higher_priority_provider() {
    let a = searcher("a", &["AAPL", "APLE"], "10");
    let b = searcher("b", &["AAPL", "MSFT"], "20");
    let m = Mercato::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .unwrap();

    // not ticker shaped, so every equity connector is consulted
    let report = m.search("apple inc").await.unwrap();
    let got: Vec<(&str, &str)> = report
        .results
        .iter()
        .map(|q| (q.symbol.as_str(), q.source.as_str()))
        .collect();
    assert_eq!(got, vec![("AAPL", "a"), ("APLE", "a"), ("MSFT", "b")]);
    assert_eq!(report.results[0].price, dec("10"));
    assert_eq!(report.providers, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn results_are_capped() {
    let a = searcher("a", &["AAPL", "APLE", "APPN"], "10");
    let b = searcher("b", &["MSFT"], "20");
    let m = Mercato::builder()
        .with_connector(a)
        .with_connector(b)
        .max_results(2)
        .build()
        .unwrap();

    let report = m.search("apple inc").await.unwrap();
    assert_eq!(report.results.len(), 2);
    // b's only result was cut, so it is not listed as a contributor
    assert_eq!(report.providers, vec!["a".to_string()]);
}

#[tokio::test]
async fn candidates_per_provider_are_bounded() {
    let a = searcher("a", &["AAPL", "APLE", "APPN", "APPF"], "10");
    let m = Mercato::builder()
        .with_connector(a.clone())
        .search_candidates(2)
        .build()
        .unwrap();

    let report = m.search("apple inc").await.unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(a.quote_calls(), 2);
}

#[tokio::test]
async fn hits_of_unsupported_kinds_are_not_priced() {
    let a = MockConnector::builder()
        .name("a")
        .with_quote_fn(|s| Ok(quote(s, "a", "1", false)))
        .with_search_fn(|_| {
            Ok(vec![
                hit("SPY", "SPY", "SPDR S&P 500", AssetClass::Fund),
                hit("SPOT", "SPOT", "Spotify", AssetClass::Equity),
            ])
        })
        .build();
    let m = Mercato::builder().with_connector(a.clone()).build().unwrap();

    let report = m.search("s and p").await.unwrap();
    let symbols: Vec<&str> = report.results.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SPOT"]);
    assert_eq!(a.quote_calls(), 1);
}

proptest! {
    #[test]
    fn dedup_keeps_first_of_each_symbol(
        items in proptest::collection::vec(("[A-Ca-c]{1,2}", 0u8..4), 0..40),
        limit in 1usize..20,
    ) {
        let kept = dedup_by_symbol(items.clone(), limit, |(s, _)| s.as_str());

        prop_assert!(kept.len() <= limit);
        let mut seen = std::collections::HashSet::new();
        for (s, _) in &kept {
            prop_assert!(seen.insert(s.to_ascii_uppercase()));
        }
        // every kept item is the first occurrence of its symbol
        for item in &kept {
            let first = items
                .iter()
                .find(|(s, _)| s.eq_ignore_ascii_case(&item.0))
                .unwrap();
            prop_assert_eq!(first, item);
        }
        let distinct: std::collections::HashSet<String> =
            items.iter().map(|(s, _)| s.to_ascii_uppercase()).collect();
        prop_assert_eq!(kept.len(), distinct.len().min(limit));
    }
}
