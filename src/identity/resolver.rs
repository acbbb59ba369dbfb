//! Greedy cross-venue market matching and canonical id assignment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::normalize::normalize;
use super::similarity::similarity;
use crate::domain::{CanonicalMarket, VenueMarket};
use crate::error::{Error, Result};
use crate::store::MarketStore;

/// Matches Venue-A and Venue-B market listings into canonical clusters and
/// persists them. Runs on a periodic "market-sync" trigger, not the hot path.
pub struct MarketIdentityResolver {
    similarity_threshold: f64,
    id_counter: AtomicU64,
}

impl MarketIdentityResolver {
    #[must_use]
    pub fn new(similarity_threshold: f64) -> Self {
        Self { similarity_threshold, id_counter: AtomicU64::new(0) }
    }

    /// Match venue listings and persist the resulting clusters.
    ///
    /// # Errors
    /// Returns `Error::Matching` only if the caller passed no markets at
    /// all from either venue; persistence failures propagate from `store`.
    pub async fn sync(
        &self,
        venue_a_markets: &[VenueMarket],
        venue_b_markets: &[VenueMarket],
        store: &dyn MarketStore,
    ) -> Result<Vec<CanonicalMarket>> {
        if venue_a_markets.is_empty() && venue_b_markets.is_empty() {
            return Err(Error::Matching("no markets available from either venue".into()));
        }

        let pairs = self.match_markets(venue_a_markets, venue_b_markets);
        let mut clusters = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let cluster = self.build_cluster(pair)?;
            store.upsert(&cluster).await?;
            clusters.push(cluster);
        }

        info!(clusters = clusters.len(), "market-sync complete");
        Ok(clusters)
    }

    /// Greedy one-to-one matching: for each Venue-A market, the single
    /// highest-similarity unmatched Venue-B candidate scoring at or above
    /// the threshold is paired (first maximum wins ties); unmatched
    /// markets on either side surface as single-sided clusters.
    fn match_markets<'a>(
        &self,
        venue_a_markets: &'a [VenueMarket],
        venue_b_markets: &'a [VenueMarket],
    ) -> Vec<(Option<&'a VenueMarket>, Option<&'a VenueMarket>, f64)> {
        let normalized_a: Vec<_> = venue_a_markets.iter().map(|m| normalize(&m.full_text())).collect();
        let normalized_b: Vec<_> = venue_b_markets.iter().map(|m| normalize(&m.full_text())).collect();

        let mut b_available: Vec<bool> = vec![true; venue_b_markets.len()];
        let mut pairs = Vec::new();

        for (i, a_market) in venue_a_markets.iter().enumerate() {
            let mut best: Option<(usize, f64)> = None;
            for (j, available) in b_available.iter().enumerate() {
                if !available {
                    continue;
                }
                let score = similarity(&normalized_a[i], &normalized_b[j]);
                if score >= self.similarity_threshold {
                    match best {
                        Some((_, best_score)) if score <= best_score => {}
                        _ => best = Some((j, score)),
                    }
                }
            }

            match best {
                Some((j, score)) => {
                    b_available[j] = false;
                    debug!(a = %a_market.venue_market_id, b = %venue_b_markets[j].venue_market_id, score, "matched markets");
                    pairs.push((Some(a_market), Some(&venue_b_markets[j]), score));
                }
                None => pairs.push((Some(a_market), None, 0.0)),
            }
        }

        for (j, available) in b_available.iter().enumerate() {
            if *available {
                pairs.push((None, Some(&venue_b_markets[j]), 0.0));
            }
        }

        pairs
    }

    fn build_cluster(
        &self,
        (a, b, score): (Option<&VenueMarket>, Option<&VenueMarket>, f64),
    ) -> Result<CanonicalMarket> {
        let title_source = match (a, b) {
            (Some(a), Some(b)) if a.title.len() <= b.title.len() => &a.title,
            (Some(_), Some(b)) => &b.title,
            (Some(a), None) => &a.title,
            (None, Some(b)) => &b.title,
            (None, None) => unreachable!("at least one side must be present"),
        };

        let canonical_id = self.generate_canonical_id(title_source);
        let title = match (a, b) {
            (Some(a), _) => a.title.clone(),
            (None, Some(b)) => b.title.clone(),
            (None, None) => unreachable!(),
        };

        CanonicalMarket::new(
            canonical_id,
            title,
            a.map(|m| m.venue_market_id.clone()),
            b.map(|m| m.venue_market_id.clone()),
            score,
        )
    }

    /// Deterministic slug of `title`, lowercase with whitespace replaced by
    /// `-`, truncated to 50 characters, with a wall-clock collision-breaking
    /// suffix. Note (§9): re-running sync against the same markets produces
    /// a fresh id each time — the spec preserves this as an observable
    /// quirk rather than keying canonical ids by content hash.
    fn generate_canonical_id(&self, title: &str) -> crate::domain::CanonicalId {
        let slug: String = title.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
        let truncated = &slug[..slug.len().min(50)];
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let counter = self.id_counter.fetch_add(1, Ordering::Relaxed);
        crate::domain::CanonicalId::from(format!("{truncated}-{nanos}-{counter}"))
    }
}
