//! Venue A wire protocol. No post-open authentication handshake.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;

use super::codec::{DecodedFrame, VenueCodec};
use crate::domain::{Price, PriceLevel, Volume, VenueMarketId};
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundMessage<'a> {
    Subscribe { market_id: &'a str },
    Unsubscribe { market_id: &'a str },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundMessage {
    BookUpdate { market_id: String, bids: Vec<[Decimal; 2]>, asks: Vec<[Decimal; 2]> },
}

#[derive(Debug, Default)]
pub struct VenueACodec;

impl VenueCodec for VenueACodec {
    fn requires_auth(&self) -> bool {
        false
    }

    fn encode_auth(&self, _api_key: &str) -> Message {
        unreachable!("venue A does not authenticate after open")
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
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_book_update() {
        let codec = VenueACodec;
        let raw = r#"{"type":"book_update","market_id":"m1","bids":[["0.44","1000"]],"asks":[["0.46","1000"]]}"#;
        match codec.decode(raw).unwrap() {
            DecodedFrame::OrderBook { venue_market_id, bids, asks } => {
                assert_eq!(venue_market_id.as_str(), "m1");
                assert_eq!(bids[0].price.value(), dec!(0.44));
                assert_eq!(asks[0].price.value(), dec!(0.46));
            }
            _ => panic!("expected OrderBook"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let codec = VenueACodec;
        assert!(codec.decode("not json").is_err());
    }

    #[test]
    fn rejects_out_of_range_price() {
        let codec = VenueACodec;
        let raw = r#"{"type":"book_update","market_id":"m1","bids":[["1.50","1000"]],"asks":[]}"#;
        assert!(codec.decode(raw).is_err());
    }
}
