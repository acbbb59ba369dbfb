//! Per-venue wire protocol: encode outbound control messages, decode
//! inbound frames into venue-agnostic [`DecodedFrame`]s.

use tokio_tungstenite::tungstenite::Message;

use crate::domain::{PriceLevel, VenueMarketId};
use crate::error::Result;

/// The venue-agnostic meaning of one decoded text frame.
pub enum DecodedFrame {
    OrderBook { venue_market_id: VenueMarketId, bids: Vec<PriceLevel>, asks: Vec<PriceLevel> },
    AuthResult { success: bool },
    Other,
}

pub trait VenueCodec: Send + Sync {
    /// Whether a post-open authentication handshake is required (spec §4.1:
    /// true for Venue B, false for Venue A).
    fn requires_auth(&self) -> bool;

    fn encode_auth(&self, api_key: &str) -> Message;

    fn encode_subscribe(&self, venue_market_id: &VenueMarketId) -> Message;

    fn encode_unsubscribe(&self, venue_market_id: &VenueMarketId) -> Message;

    fn encode_ping(&self) -> Message;

    /// Decode one text frame. Malformed payloads are returned as `Err` and
    /// dropped by the caller without disturbing the stream (spec §4.1
    /// "Malformed messages are logged and dropped").
    fn decode(&self, raw: &str) -> Result<DecodedFrame>;
}
