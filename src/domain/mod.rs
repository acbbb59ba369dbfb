//! Core domain types for the arbitrage engine.
//!
//! - [`ids`] — identifiers (`Venue`, `VenueMarketId`, `CanonicalId`, `OpportunityId`, `TradeId`)
//! - [`market`] — `VenueMarket` and the cross-venue `CanonicalMarket` cluster
//! - [`money`] — constrained `Price` and `Volume` types
//! - [`order_book`] — `OrderBook` / `PriceLevel`
//! - [`opportunity`] — `ArbitrageOpportunity`
//! - [`trade`] — `Trade`, one leg of an execution

pub mod ids;
pub mod market;
pub mod money;
pub mod opportunity;
pub mod order_book;
pub mod trade;

pub use ids::{CanonicalId, OpportunityId, TradeId, Venue, VenueMarketId};
pub use market::{Confidence, CanonicalMarket, VenueMarket};
pub use money::{Price, Volume};
pub use opportunity::{ArbitrageOpportunity, ChosenLeg, OpportunityStatus};
pub use order_book::{OrderBook, PriceLevel};
pub use trade::{Side, Trade, TradeStatus};
