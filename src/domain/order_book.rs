//! Order book snapshot types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{Price, Volume};

/// One price/size entry in an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub size: Volume,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }
}

/// A full order-book snapshot for one `VenueMarket`, replaced atomically
/// on each update (no delta-merging at this level — see spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Descending by price.
    pub bids: Vec<PriceLevel>,
    /// Ascending by price.
    pub asks: Vec<PriceLevel>,
    pub timestamp: DateTime<Utc>,
}

impl OrderBook {
    #[must_use]
    pub const fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, timestamp: DateTime<Utc>) -> Self {
        Self { bids, asks, timestamp }
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Mid-price of the best bid and best ask, or `None` if either side is empty.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        let mid = (bid.value() + ask.value()) / Decimal::from(2);
        Price::new(mid).ok()
    }

    /// Sum of sizes across both sides — the liquidity depth used for sizing.
    #[must_use]
    pub fn depth(&self) -> Volume {
        let bid_depth: Decimal = self.bids.iter().map(|l| l.size.value()).sum();
        let ask_depth: Decimal = self.asks.iter().map(|l| l.size.value()).sum();
        Volume::new(bid_depth + ask_depth).unwrap_or(Volume::zero())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() || self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, size: Decimal) -> PriceLevel {
        PriceLevel::new(Price::new(price).unwrap(), Volume::new(size).unwrap())
    }

    #[test]
    fn mid_price_averages_best_bid_and_ask() {
        let book = OrderBook::new(
            vec![level(dec!(0.44), dec!(1000))],
            vec![level(dec!(0.46), dec!(1000))],
            Utc::now(),
        );
        assert_eq!(book.mid_price().unwrap().value(), dec!(0.45));
    }

    #[test]
    fn mid_price_none_when_one_side_empty() {
        let book = OrderBook::new(vec![], vec![level(dec!(0.46), dec!(1000))], Utc::now());
        assert!(book.mid_price().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn depth_sums_both_sides() {
        let book = OrderBook::new(
            vec![level(dec!(0.44), dec!(1000))],
            vec![level(dec!(0.46), dec!(1000))],
            Utc::now(),
        );
        assert_eq!(book.depth().value(), dec!(2000));
    }
}
