//! In-memory order book store, keyed by `(venue, venue_market_id)`.
//!
//! Single writer per key (the owning Venue Client), many readers (the
//! Detector). Unknown keys return `None`, not an error — spec §4.2.

use dashmap::DashMap;

use crate::domain::{OrderBook, Venue, VenueMarketId};

#[derive(Default)]
pub struct OrderBookStore {
    books: DashMap<(Venue, VenueMarketId), OrderBook>,
}

impl OrderBookStore {
    #[must_use]
    pub fn new() -> Self {
        Self { books: DashMap::new() }
    }

    /// Replace the snapshot for `(venue, venue_market_id)` atomically.
    pub fn update(&self, venue: Venue, venue_market_id: VenueMarketId, book: OrderBook) {
        self.books.insert((venue, venue_market_id), book);
    }

    /// Fetch a consistent snapshot for one key. Readers may observe a
    /// snapshot older than the latest write (spec §5 eventual consistency).
    #[must_use]
    pub fn get(&self, venue: Venue, venue_market_id: &VenueMarketId) -> Option<OrderBook> {
        self.books
            .get(&(venue, venue_market_id.clone()))
            .map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Price, PriceLevel, Volume};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_book() -> OrderBook {
        OrderBook::new(
            vec![PriceLevel::new(Price::new(dec!(0.44)).unwrap(), Volume::new(dec!(10)).unwrap())],
            vec![PriceLevel::new(Price::new(dec!(0.46)).unwrap(), Volume::new(dec!(10)).unwrap())],
            Utc::now(),
        )
    }

    #[test]
    fn unknown_key_returns_none() {
        let store = OrderBookStore::new();
        assert!(store.get(Venue::A, &VenueMarketId::from("missing")).is_none());
    }

    #[test]
    fn update_then_get_returns_latest_snapshot() {
        let store = OrderBookStore::new();
        let id = VenueMarketId::from("m1");
        store.update(Venue::A, id.clone(), sample_book());
        let fetched = store.get(Venue::A, &id).expect("present");
        assert_eq!(fetched.best_bid().unwrap().value(), dec!(0.44));
    }

    #[test]
    fn venues_are_keyed_independently() {
        let store = OrderBookStore::new();
        let id = VenueMarketId::from("shared-id");
        store.update(Venue::A, id.clone(), sample_book());
        assert!(store.get(Venue::A, &id).is_some());
        assert!(store.get(Venue::B, &id).is_none());
    }
}
