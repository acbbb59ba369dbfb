//! `EngineHandle`: the process's plain-Rust API surface.
//!
//! An external HTTP/WebSocket layer is out of core scope (spec §1); this
//! type exposes the operations such a layer would call 1:1 (spec §6),
//! without this crate binding a socket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::{ArbitrageOpportunity, CanonicalMarket, OpportunityId, Trade};
use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventBus};
use crate::exchange::VenueApi;
use crate::execution::{ExecutionCoordinator, ExecutionResult};
use crate::identity::MarketIdentityResolver;
use crate::store::{MarketStore, OpportunityStore, TradeStore};

/// `GET /api/health` response shape.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
}

/// `GET`/`POST /api/config` response shape. `auto_execute` is the only
/// field `POST /api/config` may change; every other field is read-only.
#[derive(Debug, Clone)]
pub struct ConfigView {
    pub arb_threshold: Decimal,
    pub min_liquidity: Decimal,
    pub max_position_size: Decimal,
    pub venue_a_fee_rate: Decimal,
    pub venue_b_fee_rate: Decimal,
    pub similarity_threshold: f64,
    pub auto_execute: bool,
}

#[allow(clippy::too_many_arguments)]
pub struct EngineHandle {
    config: Arc<Config>,
    market_store: Arc<dyn MarketStore>,
    opportunity_store: Arc<dyn OpportunityStore>,
    trade_store: Arc<dyn TradeStore>,
    coordinator: Arc<ExecutionCoordinator>,
    resolver: Arc<MarketIdentityResolver>,
    venue_a_api: Arc<dyn VenueApi>,
    venue_b_api: Arc<dyn VenueApi>,
    event_bus: Arc<EventBus>,
}

impl EngineHandle {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        market_store: Arc<dyn MarketStore>,
        opportunity_store: Arc<dyn OpportunityStore>,
        trade_store: Arc<dyn TradeStore>,
        coordinator: Arc<ExecutionCoordinator>,
        resolver: Arc<MarketIdentityResolver>,
        venue_a_api: Arc<dyn VenueApi>,
        venue_b_api: Arc<dyn VenueApi>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            market_store,
            opportunity_store,
            trade_store,
            coordinator,
            resolver,
            venue_a_api,
            venue_b_api,
            event_bus,
        }
    }

    /// Subscribe to the push channel (spec §6 "Server-to-client push channel").
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_bus.subscribe()
    }

    pub async fn health(&self) -> HealthStatus {
        HealthStatus { status: "ok", timestamp: Utc::now(), service: "duoedge" }
    }

    /// `GET /api/opportunities?limit=N`.
    pub async fn list_opportunities(&self, limit: usize) -> Result<Vec<ArbitrageOpportunity>> {
        self.opportunity_store.recent(limit).await
    }

    /// `GET /api/opportunities/active`.
    pub async fn active_opportunities(&self) -> Result<Vec<ArbitrageOpportunity>> {
        self.opportunity_store.active().await
    }

    /// `GET /api/markets`.
    pub async fn list_markets(&self) -> Result<Vec<CanonicalMarket>> {
        self.market_store.all().await
    }

    /// `POST /api/markets/sync`: fetch current listings from both venues and
    /// re-run the Resolver (spec §4.3, §7 MatchingError).
    pub async fn sync_markets(&self) -> Result<String> {
        let venue_a_markets = self.venue_a_api.list_markets().await?;
        let venue_b_markets = self.venue_b_api.list_markets().await?;
        let clusters =
            self.resolver.sync(&venue_a_markets, &venue_b_markets, self.market_store.as_ref()).await?;
        Ok(format!("market-sync complete: {} clusters", clusters.len()))
    }

    /// `GET /api/trades?limit=N`.
    pub async fn list_trades(&self, limit: usize) -> Result<Vec<Trade>> {
        self.trade_store.recent(limit).await
    }

    /// `POST /api/execute/:opportunity_id`. Refuses with
    /// `Error::AutoExecuteDisabled` when `auto_execute` is false (spec §6,
    /// §9 "execute-endpoint auto-execute gate" — the documented quirk is
    /// that a caller enables auto-execute globally, not per-request).
    pub async fn execute(&self, opportunity_id: OpportunityId) -> Result<ExecutionResult> {
        if !self.config.auto_execute() {
            return Err(Error::AutoExecuteDisabled);
        }
        self.coordinator.execute(opportunity_id).await
    }

    /// `POST /api/execute/:opportunity_id/cancel`.
    pub async fn cancel_execution(&self, opportunity_id: OpportunityId) -> Result<()> {
        self.coordinator.cancel_execution(opportunity_id).await
    }

    /// `GET /api/config`.
    #[must_use]
    pub fn get_config(&self) -> ConfigView {
        ConfigView {
            arb_threshold: self.config.arb_threshold,
            min_liquidity: self.config.min_liquidity,
            max_position_size: self.config.max_position_size,
            venue_a_fee_rate: self.config.venue_a_fee_rate,
            venue_b_fee_rate: self.config.venue_b_fee_rate,
            similarity_threshold: self.config.similarity_threshold,
            auto_execute: self.config.auto_execute(),
        }
    }

    /// `POST /api/config` with `{auto_execute: bool}` (every other field is
    /// rejected with HTTP 400 by the external layer, not modeled here).
    pub fn set_auto_execute(&self, enabled: bool) {
        self.config.set_auto_execute(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalId, CanonicalMarket, ChosenLeg, OpportunityStatus, VenueMarketId};
    use crate::events::EventBus;
    use crate::exchange::{OrderStatus, PlaceOrderRequest, PlaceOrderResponse, VenueMarket};
    use crate::store::memory::{InMemoryMarketStore, InMemoryOpportunityStore, InMemoryTradeStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

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
            Ok(vec![])
        }
    }

    fn handle() -> EngineHandle {
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
    async fn health_reports_ok() {
        assert_eq!(handle().health().await.status, "ok");
    }

    #[tokio::test]
    async fn execute_is_refused_when_auto_execute_disabled() {
        let h = handle();
        let market = CanonicalMarket::new(
            CanonicalId::from("c1".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            Some(VenueMarketId::from("b1")),
            0.9,
        )
        .unwrap();
        h.market_store.upsert(&market).await.unwrap();
        let opportunity = ArbitrageOpportunity {
            id: OpportunityId::new(),
            canonical_id: CanonicalId::from("c1".to_string()),
            chosen_leg: ChosenLeg::AYesBNo,
            combined_cost: dec!(0.95),
            venue_a_price: dec!(0.45),
            venue_b_price: dec!(0.50),
            venue_a_depth: dec!(2000),
            venue_b_depth: dec!(3000),
            recommended_size: dec!(2000),
            estimated_fees: dec!(80),
            net_profit: dec!(20),
            detected_at: Utc::now(),
            status: OpportunityStatus::Detected,
            expires_at: None,
        };
        let id = opportunity.id;
        h.opportunity_store.insert(&opportunity).await.unwrap();

        let result = h.execute(id).await;
        assert!(matches!(result, Err(Error::AutoExecuteDisabled)));
    }

    #[tokio::test]
    async fn execute_proceeds_once_auto_execute_enabled() {
        let h = handle();
        let market = CanonicalMarket::new(
            CanonicalId::from("c1".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            Some(VenueMarketId::from("b1")),
            0.9,
        )
        .unwrap();
        h.market_store.upsert(&market).await.unwrap();
        let opportunity = ArbitrageOpportunity {
            id: OpportunityId::new(),
            canonical_id: CanonicalId::from("c1".to_string()),
            chosen_leg: ChosenLeg::AYesBNo,
            combined_cost: dec!(0.95),
            venue_a_price: dec!(0.45),
            venue_b_price: dec!(0.50),
            venue_a_depth: dec!(2000),
            venue_b_depth: dec!(3000),
            recommended_size: dec!(2000),
            estimated_fees: dec!(80),
            net_profit: dec!(20),
            detected_at: Utc::now(),
            status: OpportunityStatus::Detected,
            expires_at: None,
        };
        let id = opportunity.id;
        h.opportunity_store.insert(&opportunity).await.unwrap();

        h.set_auto_execute(true);
        let result = h.execute(id).await.unwrap();
        assert!(matches!(result.outcome, crate::execution::ExecutionOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn get_config_reflects_auto_execute_flag() {
        let h = handle();
        assert!(!h.get_config().auto_execute);
        h.set_auto_execute(true);
        assert!(h.get_config().auto_execute);
    }
}
