//! Venue Client contract: a normalized streaming connection to one venue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{PriceLevel, Venue, VenueMarketId};
use crate::error::Result;

/// Normalized events a `VenueClient` emits, independent of the venue's wire format.
#[derive(Debug, Clone)]
pub enum VenueEvent {
    OrderBook {
        venue_market_id: VenueMarketId,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        timestamp: DateTime<Utc>,
    },
    Connected,
    Disconnected {
        reason: String,
    },
    Error {
        kind: String,
    },
}

/// `Idle -> Connecting -> (AuthPending only for venues that require it) ->
/// Open -> Closing -> Idle`, with `Reconnecting` branching off `Open` on
/// stream close or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    AuthPending,
    Open,
    Closing,
    Reconnecting { attempt: u32 },
}

/// One long-lived streaming connection to a venue.
///
/// Implementations own the desired-subscription set, which survives
/// reconnects: `subscribe`/`unsubscribe` mutate it unconditionally and, if
/// the stream is currently open, also send the corresponding venue message.
#[async_trait]
pub trait VenueClient: Send + Sync {
    fn venue(&self) -> Venue;

    fn state(&self) -> ConnectionState;

    /// Open the stream, complete authentication if the venue requires it,
    /// and re-issue every subscription in the desired set. Spawns the
    /// background heartbeat/reconnect task that keeps the connection alive
    /// until `disconnect()` is called.
    async fn connect(&self) -> Result<()>;

    /// Idempotent: add to the desired-subscription set, and, if open, send
    /// the subscribe message immediately.
    async fn subscribe(&self, venue_market_id: VenueMarketId) -> Result<()>;

    /// Idempotent: remove from the desired-subscription set, and, if open,
    /// send the unsubscribe message immediately.
    async fn unsubscribe(&self, venue_market_id: VenueMarketId) -> Result<()>;

    /// Cancel any pending reconnect, close the stream, clear the
    /// desired-subscription set.
    async fn disconnect(&self);
}
