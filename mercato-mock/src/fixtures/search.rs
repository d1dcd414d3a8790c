use mercato_core::CandidateMatch;

use super::quotes;

/// Case-insensitive match on id, symbol, or name.
pub fn matches(query: &str) -> Vec<CandidateMatch> {
    let q = query.trim().to_ascii_lowercase();
    quotes::all()
        .filter(|(id, symbol, name, _)| {
            id.to_ascii_lowercase().contains(&q)
                || symbol.to_ascii_lowercase() == q
                || name.to_ascii_lowercase().contains(&q)
        })
        .map(|(id, symbol, name, class)| CandidateMatch {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            asset_class: class,
            exchange: None,
            currency: Some("USD".to_string()),
        })
        .collect()
}
