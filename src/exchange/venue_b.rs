//! Venue B wire protocol. Requires a post-open authentication handshake
//! (spec §4.1: send the API key, wait up to 5s for an auth-success reply).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::codec::{DecodedFrame, VenueCodec};
use crate::domain::{Price, PriceLevel, Volume, VenueMarketId};
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundMessage<'a> {
    Auth { api_key: &'a str },
    Subscribe { market_id: &'a str },
    Unsubscribe { market_id: &'a str },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundMessage {
    AuthSuccess,
    AuthFailure { reason: String },
    BookUpdate { market_id: String, bids: Vec<[Decimal; 2]>, asks: Vec<[Decimal; 2]> },
}

#[derive(Debug, Default)]
pub struct VenueBCodec;

impl VenueCodec for VenueBCodec {
    fn requires_auth(&self) -> bool {
        true
    }

    fn encode_auth(&self, api_key: &str) -> Message {
        encode(&OutboundMessage::Auth { api_key })
    }

    fn encode_subscribe(&self, venue_market_id: &VenueMarketId) -> Message {
        encode(&OutboundMessage::Subscribe { market_id: venue_market_id.as_str() })
    }

    fn encode_unsubscribe(&self, venue_market_id: &VenueMarketId) -> Message {
        encode(&OutboundMessage::Unsubscribe { market_id: venue_market_id.as_str() })
    }

    fn encode_ping(&self) -> Message {
        Message::Ping(Vec::new())
    }

    fn decode(&self, raw: &str) -> Result<DecodedFrame> {
        let msg: InboundMessage =
            serde_json::from_str(raw).map_err(|e| Error::Protocol(e.to_string()))?;
        match msg {
            InboundMessage::AuthSuccess => Ok(DecodedFrame::AuthResult { success: true }),
            InboundMessage::AuthFailure { reason } => {
                debug!(reason, "venue B rejected auth");
                Ok(DecodedFrame::AuthResult { success: false })
            }
            InboundMessage::BookUpdate { market_id, bids, asks } => Ok(DecodedFrame::OrderBook {
                venue_market_id: VenueMarketId::from(market_id),
                bids: levels(bids)?,
                asks: levels(asks)?,
            }),
        }
    }
}

fn encode(msg: &OutboundMessage<'_>) -> Message {
    Message::Text(serde_json::to_string(msg).unwrap_or_default())
}

fn levels(raw: Vec<[Decimal; 2]>) -> Result<Vec<PriceLevel>> {
    raw.into_iter()
        .map(|[price, size]| {
            let price = Price::new(price).map_err(|e| Error::Protocol(e.to_string()))?;
            let size = Volume::new(size).map_err(|e| Error::Protocol(e.to_string()))?;
            Ok(PriceLevel::new(price, size))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_auth_success() {
        let codec = VenueBCodec;
        match codec.decode(r#"{"type":"auth_success"}"#).unwrap() {
            DecodedFrame::AuthResult { success } => assert!(success),
            _ => panic!("expected AuthResult"),
        }
    }

    #[test]
    fn decodes_auth_failure() {
        let codec = VenueBCodec;
        let raw = r#"{"type":"auth_failure","reason":"bad key"}"#;
        match codec.decode(raw).unwrap() {
            DecodedFrame::AuthResult { success } => assert!(!success),
            _ => panic!("expected AuthResult"),
        }
    }

    #[test]
    fn decodes_book_update() {
        let codec = VenueBCodec;
        let raw = r#"{"type":"book_update","market_id":"b1","bids":[["0.49","3000"]],"asks":[["0.51","3000"]]}"#;
        match codec.decode(raw).unwrap() {
            DecodedFrame::OrderBook { venue_market_id, .. } => {
                assert_eq!(venue_market_id.as_str(), "b1");
            }
            _ => panic!("expected OrderBook"),
        }
    }
}
