//! Venue A REST adapter: unauthenticated-handshake venue, bearer-token orders.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use super::api::{OrderStatus, PlaceOrderRequest, PlaceOrderResponse, VenueApi};
use crate::domain::{Side, Venue, VenueMarket, VenueMarketId};
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct VenueAApi {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl VenueAApi {
    pub fn new(base_url: Url, api_key: String) -> Result<Self> {
        let client =
            Client::builder().connect_timeout(CONNECT_TIMEOUT).timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url, api_key })
    }

    fn orders_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("orders");
        }
        url
    }

    fn order_url(&self, order_id: &str) -> Url {
        let mut url = self.orders_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(order_id);
        }
        url
    }

    fn markets_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("markets");
        }
        url
    }
}

#[derive(Deserialize)]
struct MarketListing {
    market_id: String,
    title: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct PlaceOrderBody {
    market_id: String,
    side: &'static str,
    size: Decimal,
    price: Decimal,
}

#[derive(Deserialize)]
struct PlaceOrderReply {
    order_id: String,
}

#[derive(Deserialize)]
struct OrderStatusReply {
    status: String,
}

#[async_trait]
impl VenueApi for VenueAApi {
    async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse> {
        let body = PlaceOrderBody {
            market_id: request.venue_market_id.as_str().to_string(),
            side: side_str(request.side),
            size: request.size,
            price: request.price,
        };
        let reply: PlaceOrderReply = self
            .client
            .post(self.orders_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(PlaceOrderResponse { order_id: reply.order_id })
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.client
            .delete(self.order_url(order_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderStatus> {
        let reply: OrderStatusReply = self
            .client
            .get(self.order_url(order_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        status_from_str(&reply.status)
    }

    async fn list_markets(&self) -> Result<Vec<VenueMarket>> {
        let listings: Vec<MarketListing> = self
            .client
            .get(self.markets_url())
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(listings
            .into_iter()
            .map(|l| VenueMarket::new(Venue::A, VenueMarketId::from(l.market_id), l.title, l.description))
            .collect())
    }
}

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Yes => "yes",
        Side::No => "no",
    }
}

fn status_from_str(s: &str) -> Result<OrderStatus> {
    match s {
        "open" => Ok(OrderStatus::Open),
        "filled" => Ok(OrderStatus::Filled),
        "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
        "rejected" => Ok(OrderStatus::Rejected),
        other => Err(Error::Trading(format!("unknown order status {other}"))),
    }
}
