//! Venue connectivity: inbound market-data streams and outbound order APIs.

pub mod api;
pub mod client;
pub mod codec;
pub mod reconnect;
pub mod traits;
pub mod venue_a;
pub mod venue_a_api;
pub mod venue_b;
pub mod venue_b_api;

pub use api::{OrderStatus, PlaceOrderRequest, PlaceOrderResponse, VenueApi};
pub use client::WebSocketVenueClient;
pub use codec::{DecodedFrame, VenueCodec};
pub use reconnect::ReconnectPolicy;
pub use traits::{ConnectionState, VenueClient, VenueEvent};
pub use venue_a::VenueACodec;
pub use venue_a_api::VenueAApi;
pub use venue_b::VenueBCodec;
pub use venue_b_api::VenueBApi;

/// Convenience alias for Venue A's concrete streaming client.
pub type VenueAClient = WebSocketVenueClient<VenueACodec>;
/// Convenience alias for Venue B's concrete streaming client.
pub type VenueBClient = WebSocketVenueClient<VenueBCodec>;
