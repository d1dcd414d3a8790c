use std::collections::HashSet;
use std::sync::Arc;

use mercato_core::normalize::{canonical_symbol, is_symbol_shaped};
use mercato_core::{CandidateMatch, MercatoConnector, MercatoError, Quote, SearchReport};

use crate::Mercato;
use crate::router::util::{MIN_QUERY_CHARS, dedup_by_symbol, diagnostic, validate_query};

/// What one connector contributed to a search.
struct Leg {
    provider: &'static str,
    quotes: Vec<Quote>,
    errors: Vec<MercatoError>,
}

impl Leg {
    const fn new(provider: &'static str) -> Self {
        Self {
            provider,
            quotes: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl Mercato {
    /// Aggregate a free-text search across providers.
    ///
    /// Behavior:
    /// - Fast equity connectors run one after another in priority order. Each
    ///   tries the query as a ticker first and falls back to its own text search,
    ///   pricing the top candidates. A symbol-shaped query stops at the first
    ///   connector that prices it.
    /// - Crypto connectors run concurrently with the equity tier; their results
    ///   follow the equity results.
    /// - Slow connectors are consulted only when nothing else produced a result.
    /// - Results are deduplicated by symbol (first wins) and capped at
    ///   `max_results`. Provider failures become report diagnostics, never errors.
    ///
    /// # Errors
    /// `InvalidQuery` for blank or overlong queries.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "mercato::router::search", skip(self), fields(query = %query))
    )]
    pub async fn search(&self, query: &str) -> Result<SearchReport, MercatoError> {
        let query = validate_query(query)?;
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(self.report(query, Vec::new()));
        }
        let symbol = canonical_symbol(query);
        let shaped = is_symbol_shaped(query);

        let (mut legs, crypto) = futures::join!(
            self.equity_tier(query, &symbol, shaped),
            self.crypto_tier(query)
        );
        legs.extend(crypto);

        if legs.iter().all(|l| l.quotes.is_empty()) {
            for c in self.slow_connectors() {
                let leg = self.equity_leg(c, query, &symbol, shaped).await;
                let done = !leg.quotes.is_empty();
                legs.push(leg);
                if done {
                    break;
                }
            }
        }

        Ok(self.report(query, legs))
    }

    fn report(&self, query: &str, legs: Vec<Leg>) -> SearchReport {
        let mut errors = Vec::new();
        let mut tagged = Vec::new();
        for leg in legs {
            errors.extend(leg.errors.iter().filter_map(|e| diagnostic(leg.provider, e)));
            tagged.extend(leg.quotes.into_iter().map(|q| (leg.provider, q)));
        }
        let kept = dedup_by_symbol(tagged, self.cfg.max_results, |(_, q)| q.symbol.as_str());
        let contributing: HashSet<&str> = kept.iter().map(|(p, _)| *p).collect();
        let providers = self
            .connectors
            .iter()
            .map(|c| c.name())
            .filter(|name| contributing.contains(name))
            .map(str::to_string)
            .collect();
        SearchReport {
            query: query.to_string(),
            results: kept.into_iter().map(|(_, q)| q).collect(),
            providers,
            errors,
            timestamp: self.clock.now(),
        }
    }

    async fn equity_tier(&self, query: &str, symbol: &str, shaped: bool) -> Vec<Leg> {
        let mut legs = Vec::new();
        for c in self.fast_equity_quoters() {
            let leg = self.equity_leg(c, query, symbol, shaped).await;
            let found = !leg.quotes.is_empty();
            legs.push(leg);
            if shaped && found {
                break;
            }
        }
        legs
    }

    /// Symbol-first lookup on one connector with a text-search fallback.
    async fn equity_leg(
        &self,
        c: &Arc<dyn MercatoConnector>,
        query: &str,
        symbol: &str,
        shaped: bool,
    ) -> Leg {
        let mut leg = Leg::new(c.name());
        let timeout = self.cfg.provider_timeout;

        if shaped && let Some(qp) = c.as_quote_provider() {
            match Self::provider_call_with_timeout(c.name(), "quote", timeout, qp.quote(symbol)).await
            {
                Ok(q) => {
                    leg.quotes.push(q);
                    return leg;
                }
                Err(e @ MercatoError::NotFound { .. }) => leg.errors.push(e),
                Err(e) => {
                    leg.errors.push(e);
                    return leg;
                }
            }
        }

        let Some(sp) = c.as_search_provider() else {
            return leg;
        };
        match Self::provider_call_with_timeout(c.name(), "search", timeout, sp.search(query)).await {
            Ok(hits) => {
                let hits: Vec<CandidateMatch> = hits
                    .into_iter()
                    .filter(|h| c.supports_kind(h.asset_class))
                    .take(self.cfg.search_candidates)
                    .collect();
                self.price_candidates(c, &hits, &mut leg).await;
            }
            Err(e) => leg.errors.push(e),
        }
        leg
    }

    async fn crypto_tier(&self, query: &str) -> Vec<Leg> {
        let tasks = self.crypto_searchers().map(|c| async move {
            let mut leg = Leg::new(c.name());
            let Some(sp) = c.as_search_provider() else {
                return leg;
            };
            match Self::provider_call_with_timeout(
                c.name(),
                "search",
                self.cfg.provider_timeout,
                sp.search(query),
            )
            .await
            {
                Ok(hits) => {
                    let ids: Vec<CandidateMatch> =
                        hits.into_iter().take(self.cfg.search_candidates).collect();
                    self.price_candidates(c, &ids, &mut leg).await;
                }
                Err(e) => leg.errors.push(e),
            }
            leg
        });
        futures::future::join_all(tasks).await
    }

    /// Price search hits on the connector that produced them, batching when possible.
    async fn price_candidates(
        &self,
        c: &Arc<dyn MercatoConnector>,
        hits: &[CandidateMatch],
        leg: &mut Leg,
    ) {
        if hits.is_empty() {
            return;
        }
        let timeout = self.cfg.provider_timeout;
        if let Some(bp) = c.as_batch_quote_provider() {
            match Self::provider_call_with_timeout(c.name(), "batch-quote", timeout, bp.quotes(hits))
                .await
            {
                Ok(quotes) => leg.quotes.extend(quotes),
                Err(e) => leg.errors.push(e),
            }
            return;
        }
        let Some(qp) = c.as_quote_provider() else {
            return;
        };
        let calls = hits.iter().map(|hit| async move {
            let res =
                Self::provider_call_with_timeout(c.name(), "quote", timeout, qp.quote(&hit.id))
                    .await;
            (hit, res)
        });
        for (hit, res) in futures::future::join_all(calls).await {
            match res {
                Ok(mut q) => {
                    // ticker quotes rarely carry a display name
                    if q.name == q.symbol && !hit.name.is_empty() {
                        q.name.clone_from(&hit.name);
                    }
                    leg.quotes.push(q);
                }
                Err(e) => leg.errors.push(e),
            }
        }
    }
}
