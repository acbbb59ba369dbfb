//! Fused per-canonical-id book state and the canonical-mapping index.
//!
//! The index is many-readers/single-writer, published atomically by
//! replacing the `Arc` rather than mutating in place (spec §5, §9 "State
//! sharing"). The fused book per canonical id retains only the latest
//! snapshot per venue — coalesced updates, so backpressure cannot grow an
//! unbounded queue (spec §5 "Backpressure").

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{CanonicalId, CanonicalMarket, OrderBook, Venue, VenueMarketId};

const DEDUP_COST_DELTA: Decimal = dec!(0.0005);

#[derive(Default)]
struct FusedEntry {
    book_a: Option<OrderBook>,
    book_b: Option<OrderBook>,
    last_emitted_cost: Option<Decimal>,
    last_emitted_at: Option<DateTime<Utc>>,
}

pub struct FusedBookState {
    index: RwLock<Arc<HashMap<(Venue, VenueMarketId), CanonicalId>>>,
    entries: DashMap<CanonicalId, FusedEntry>,
}

impl FusedBookState {
    #[must_use]
    pub fn new() -> Self {
        Self { index: RwLock::new(Arc::new(HashMap::new())), entries: DashMap::new() }
    }

    /// Add (or refresh) one canonical mapping's venue market ids in the
    /// index. The whole map is replaced, never mutated in place.
    pub fn register_mapping(&self, mapping: &CanonicalMarket) {
        let mut guard = self.index.write();
        let mut next = (**guard).clone();
        if let Some(id) = mapping.venue_a_market_id() {
            next.insert((Venue::A, id.clone()), mapping.canonical_id().clone());
        }
        if let Some(id) = mapping.venue_b_market_id() {
            next.insert((Venue::B, id.clone()), mapping.canonical_id().clone());
        }
        *guard = Arc::new(next);
    }

    #[must_use]
    pub fn canonical_id_for(&self, venue: Venue, venue_market_id: &VenueMarketId) -> Option<CanonicalId> {
        let index = Arc::clone(&self.index.read());
        index.get(&(venue, venue_market_id.clone())).cloned()
    }

    /// Replace the latest book for `venue` on `canonical_id`. Last-write-wins.
    pub fn update(&self, canonical_id: &CanonicalId, venue: Venue, book: OrderBook) {
        let mut entry = self.entries.entry(canonical_id.clone()).or_default();
        match venue {
            Venue::A => entry.book_a = Some(book),
            Venue::B => entry.book_b = Some(book),
        }
    }

    /// The fused pair for a canonical id, if both sides have reported at least once.
    #[must_use]
    pub fn get_pair(&self, canonical_id: &CanonicalId) -> Option<(OrderBook, OrderBook)> {
        let entry = self.entries.get(canonical_id)?;
        match (&entry.book_a, &entry.book_b) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    }

    /// Duplicate-suppression policy (spec §4.4): emit only if `combined_cost`
    /// differs from the last emission by more than 0.0005, or more than 1s
    /// has elapsed since it.
    pub fn should_emit(&self, canonical_id: &CanonicalId, combined_cost: Decimal) -> bool {
        let mut entry = self.entries.entry(canonical_id.clone()).or_default();
        let now = Utc::now();
        let emit = match (entry.last_emitted_cost, entry.last_emitted_at) {
            (Some(prev_cost), Some(prev_at)) => {
                (combined_cost - prev_cost).abs() > DEDUP_COST_DELTA
                    || now - prev_at > ChronoDuration::seconds(1)
            }
            _ => true,
        };
        if emit {
            entry.last_emitted_cost = Some(combined_cost);
            entry.last_emitted_at = Some(now);
        }
        emit
    }
}

impl Default for FusedBookState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Price, PriceLevel, Volume};
    use rust_decimal_macros::dec;

    fn sample_book() -> OrderBook {
        OrderBook::new(
            vec![PriceLevel::new(Price::new(dec!(0.44)).unwrap(), Volume::new(dec!(10)).unwrap())],
            vec![PriceLevel::new(Price::new(dec!(0.46)).unwrap(), Volume::new(dec!(10)).unwrap())],
            Utc::now(),
        )
    }

    #[test]
    fn register_mapping_is_queryable_both_venues() {
        let state = FusedBookState::new();
        let mapping = CanonicalMarket::new(
            CanonicalId::from("c1".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            Some(VenueMarketId::from("b1")),
            0.9,
        )
        .unwrap();
        state.register_mapping(&mapping);
        assert_eq!(
            state.canonical_id_for(Venue::A, &VenueMarketId::from("a1")),
            Some(CanonicalId::from("c1".to_string()))
        );
        assert_eq!(
            state.canonical_id_for(Venue::B, &VenueMarketId::from("b1")),
            Some(CanonicalId::from("c1".to_string()))
        );
    }

    #[test]
    fn get_pair_requires_both_sides() {
        let state = FusedBookState::new();
        let id = CanonicalId::from("c1".to_string());
        assert!(state.get_pair(&id).is_none());
        state.update(&id, Venue::A, sample_book());
        assert!(state.get_pair(&id).is_none());
        state.update(&id, Venue::B, sample_book());
        assert!(state.get_pair(&id).is_some());
    }

    #[test]
    fn should_emit_true_on_first_call() {
        let state = FusedBookState::new();
        let id = CanonicalId::from("c1".to_string());
        assert!(state.should_emit(&id, dec!(0.95)));
    }

    #[test]
    fn should_emit_false_for_near_identical_repeat() {
        let state = FusedBookState::new();
        let id = CanonicalId::from("c1".to_string());
        assert!(state.should_emit(&id, dec!(0.95)));
        assert!(!state.should_emit(&id, dec!(0.9501)));
    }

    #[test]
    fn should_emit_true_when_delta_exceeds_threshold() {
        let state = FusedBookState::new();
        let id = CanonicalId::from("c1".to_string());
        assert!(state.should_emit(&id, dec!(0.95)));
        assert!(state.should_emit(&id, dec!(0.94)));
    }
}
