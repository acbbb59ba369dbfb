//! Outbound venue REST API: order placement, cancellation, status query.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Side, VenueMarket, VenueMarketId};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub venue_market_id: VenueMarketId,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderResponse {
    pub order_id: String,
}

/// A venue's outbound order API, separate from its inbound `VenueClient`
/// stream (spec §4.5 "Issue both `place_order` calls... one per venue").
#[async_trait]
pub trait VenueApi: Send + Sync {
    async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse>;
    async fn cancel_order(&self, order_id: &str) -> Result<()>;
    async fn order_status(&self, order_id: &str) -> Result<OrderStatus>;

    /// Current active listings on this venue, for market-sync (spec §4.3).
    async fn list_markets(&self) -> Result<Vec<VenueMarket>>;
}
