//! End-to-end exercise of `EngineHandle` against in-memory stores and a
//! stub `VenueApi`, wired the way `Engine::bootstrap` wires the real
//! adapters (spec §8 S1).

use std::sync::Arc;

use async_trait::async_trait;
use duoedge::app::EngineHandle;
use duoedge::config::Config;
use duoedge::domain::{CanonicalId, CanonicalMarket, VenueMarketId};
use duoedge::error::Result;
use duoedge::events::EventBus;
use duoedge::exchange::{OrderStatus, PlaceOrderRequest, PlaceOrderResponse, VenueApi, VenueMarket};
use duoedge::execution::ExecutionCoordinator;
use duoedge::identity::MarketIdentityResolver;
use duoedge::store::memory::{InMemoryMarketStore, InMemoryOpportunityStore, InMemoryTradeStore};
use duoedge::store::{MarketStore, OpportunityStore, TradeStore};

struct StubApi;

#[async_trait]
impl VenueApi for StubApi {
    async fn place_order(&self, _request: PlaceOrderRequest) -> Result<PlaceOrderResponse> {
        Ok(PlaceOrderResponse { order_id: "order-1".into() })
    }
    async fn cancel_order(&self, _order_id: &str) -> Result<()> {
        Ok(())
    }
    async fn order_status(&self, _order_id: &str) -> Result<OrderStatus> {
        Ok(OrderStatus::Filled)
    }
    async fn list_markets(&self) -> Result<Vec<VenueMarket>> {
        Ok(vec![
            VenueMarket::new(
                duoedge::domain::Venue::A,
                VenueMarketId::from("a1"),
                "Will BTC hit $100k by 12/31/2024?".to_string(),
                None,
            ),
        ])
    }
}

fn build_handle() -> EngineHandle {
    let config = Arc::new(Config::for_test());
    let market_store: Arc<dyn MarketStore> = Arc::new(InMemoryMarketStore::new());
    let opportunity_store: Arc<dyn OpportunityStore> = Arc::new(InMemoryOpportunityStore::new());
    let trade_store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());
    let event_bus = Arc::new(EventBus::new());
    let coordinator = Arc::new(ExecutionCoordinator::new(
        Arc::clone(&config),
        Arc::clone(&opportunity_store),
        Arc::clone(&trade_store),
        Arc::clone(&market_store),
        Arc::new(StubApi),
        Arc::new(StubApi),
        Arc::clone(&event_bus),
    ));
    let resolver = Arc::new(MarketIdentityResolver::new(config.similarity_threshold));

    EngineHandle::new(
        config,
        market_store,
        opportunity_store,
        trade_store,
        coordinator,
        resolver,
        Arc::new(StubApi),
        Arc::new(StubApi),
        event_bus,
    )
}

#[tokio::test]
async fn health_and_empty_listings_before_any_sync() {
    let handle = build_handle();
    assert_eq!(handle.health().await.status, "ok");
    assert!(handle.list_markets().await.unwrap().is_empty());
    assert!(handle.list_opportunities(10).await.unwrap().is_empty());
    assert!(handle.list_trades(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn sync_markets_persists_single_sided_cluster_from_stub_listings() {
    let handle = build_handle();
    let summary = handle.sync_markets().await.unwrap();
    assert!(summary.contains("clusters"));

    let markets = handle.list_markets().await.unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].venue_a_market_id(), Some(&VenueMarketId::from("a1")));
    assert_eq!(markets[0].venue_b_market_id(), None);
}

#[tokio::test]
async fn config_round_trip_through_handle() {
    let handle = build_handle();
    assert!(!handle.get_config().auto_execute);
    handle.set_auto_execute(true);
    assert!(handle.get_config().auto_execute);
}

#[tokio::test]
async fn cancel_execution_on_unknown_opportunity_is_a_no_op() {
    let handle = build_handle();
    let id = duoedge::domain::OpportunityId::new();
    handle.cancel_execution(id).await.unwrap();
}

#[tokio::test]
async fn canonical_market_with_only_venue_a_cannot_be_matched() {
    let market_store = InMemoryMarketStore::new();
    let market = CanonicalMarket::new(
        CanonicalId::from("c1".to_string()),
        "solo market",
        Some(VenueMarketId::from("a1")),
        None,
        0.0,
    )
    .unwrap();
    assert!(!market.is_complete());
    market_store.upsert(&market).await.unwrap();
    assert_eq!(market_store.all().await.unwrap().len(), 1);
}
