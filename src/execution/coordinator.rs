//! The Execution Coordinator: places both legs of an arbitrage opportunity
//! concurrently and compensates on partial failure (spec §4.5).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{
    ArbitrageOpportunity, OpportunityId, OpportunityStatus, Trade, TradeId, TradeStatus, Venue,
};
use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventBus};
use crate::exchange::{OrderStatus, PlaceOrderRequest, VenueApi};
use crate::store::{MarketStore, OpportunityStore, TradeStore};

/// Outcome of one `execute()` call, published on the event bus and returned
/// to the HTTP caller.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub opportunity_id: OpportunityId,
    pub outcome: ExecutionOutcome,
}

#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Success { trades: Vec<TradeId> },
    PartialFailure { filled_venue: Venue, cancelled: bool, error: String },
    BothFailed { venue_a_error: String, venue_b_error: String },
}

pub struct ExecutionCoordinator {
    config: Arc<Config>,
    opportunity_store: Arc<dyn OpportunityStore>,
    trade_store: Arc<dyn TradeStore>,
    market_store: Arc<dyn MarketStore>,
    venue_a_api: Arc<dyn VenueApi>,
    venue_b_api: Arc<dyn VenueApi>,
    event_bus: Arc<EventBus>,
    in_flight: Mutex<HashSet<OpportunityId>>,
}

impl ExecutionCoordinator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        opportunity_store: Arc<dyn OpportunityStore>,
        trade_store: Arc<dyn TradeStore>,
        market_store: Arc<dyn MarketStore>,
        venue_a_api: Arc<dyn VenueApi>,
        venue_b_api: Arc<dyn VenueApi>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            opportunity_store,
            trade_store,
            market_store,
            venue_a_api,
            venue_b_api,
            event_bus,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run the two-leg execution protocol for one opportunity.
    ///
    /// # Errors
    /// `Error::NotFound` if the opportunity does not exist; `Error::InvalidTransition`
    /// if it is not `detected`; `Error::DuplicateExecution` if already in flight;
    /// `Error::SizeLimitExceeded` if its recommended size exceeds the configured
    /// cap; `Error::Trading` if both legs fail.
    pub async fn execute(&self, opportunity_id: OpportunityId) -> Result<ExecutionResult> {
        let mut opportunity = self
            .opportunity_store
            .get(opportunity_id)
            .await?
            .ok_or_else(|| Error::NotFound(opportunity_id.to_string()))?;

        if opportunity.recommended_size > self.config.max_position_size {
            return Err(Error::SizeLimitExceeded {
                recommended: opportunity.recommended_size.to_string(),
                max: self.config.max_position_size.to_string(),
            });
        }

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains(&opportunity_id) {
                return Err(Error::DuplicateExecution(opportunity_id.to_string()));
            }
            in_flight.insert(opportunity_id);
        }

        let result = self.run_protocol(&mut opportunity).await;

        self.in_flight.lock().remove(&opportunity_id);
        result
    }

    async fn run_protocol(
        &self,
        opportunity: &mut ArbitrageOpportunity,
    ) -> Result<ExecutionResult> {
        opportunity.begin_executing()?;
        self.opportunity_store
            .update_status(opportunity.id, OpportunityStatus::Executing)
            .await?;

        let market = self
            .market_store
            .get(&opportunity.canonical_id)
            .await?
            .ok_or_else(|| Error::Matching(format!("no mapping for {}", opportunity.canonical_id)))?;
        let venue_a_market_id = market
            .market_id_for(Venue::A)
            .ok_or_else(|| Error::Matching("no venue A market id".into()))?
            .clone();
        let venue_b_market_id = market
            .market_id_for(Venue::B)
            .ok_or_else(|| Error::Matching("no venue B market id".into()))?
            .clone();

        let venue_a_side = opportunity.chosen_leg.venue_a_side();
        let venue_b_side = opportunity.chosen_leg.venue_b_side();

        let request_a = PlaceOrderRequest {
            venue_market_id: venue_a_market_id.clone(),
            side: venue_a_side,
            size: opportunity.recommended_size,
            price: opportunity.venue_a_price,
        };
        let request_b = PlaceOrderRequest {
            venue_market_id: venue_b_market_id.clone(),
            side: venue_b_side,
            size: opportunity.recommended_size,
            price: opportunity.venue_b_price,
        };

        let (result_a, result_b) = tokio::join!(
            self.venue_a_api.place_order(request_a),
            self.venue_b_api.place_order(request_b)
        );

        let outcome = match (result_a, result_b) {
            (Ok(response_a), Ok(response_b)) => {
                let trade_a = Trade::pending(
                    opportunity.id,
                    Venue::A,
                    venue_a_market_id,
                    venue_a_side,
                    opportunity.recommended_size,
                    opportunity.venue_a_price,
                    response_a.order_id,
                );
                let trade_b = Trade::pending(
                    opportunity.id,
                    Venue::B,
                    venue_b_market_id,
                    venue_b_side,
                    opportunity.recommended_size,
                    opportunity.venue_b_price,
                    response_b.order_id,
                );
                self.trade_store.insert(&trade_a).await?;
                self.trade_store.insert(&trade_b).await?;
                opportunity.mark_executed();
                self.opportunity_store
                    .update_status(opportunity.id, OpportunityStatus::Executed)
                    .await?;
                info!(opportunity_id = %opportunity.id, "both legs executed");
                ExecutionOutcome::Success { trades: vec![trade_a.id, trade_b.id] }
            }
            (Ok(response_a), Err(err_b)) => {
                self.compensate(Venue::A, &response_a.order_id, &err_b, opportunity.id).await
            }
            (Err(err_a), Ok(response_b)) => {
                self.compensate(Venue::B, &response_b.order_id, &err_a, opportunity.id).await
            }
            (Err(err_a), Err(err_b)) => {
                opportunity.mark_expired();
                self.opportunity_store
                    .update_status(opportunity.id, OpportunityStatus::Expired)
                    .await?;
                warn!(opportunity_id = %opportunity.id, %err_a, %err_b, "both legs failed");
                ExecutionOutcome::BothFailed {
                    venue_a_error: err_a.to_string(),
                    venue_b_error: err_b.to_string(),
                }
            }
        };

        let result = ExecutionResult { opportunity_id: opportunity.id, outcome };
        match &result.outcome {
            ExecutionOutcome::Success { .. } => {
                self.event_bus.publish(EngineEvent::ExecutionSuccess(result.clone()));
                Ok(result)
            }
            _ => {
                self.event_bus.publish(EngineEvent::ExecutionFailed(result.clone()));
                Err(Error::Trading(format!(
                    "execution failed for opportunity {}",
                    result.opportunity_id
                )))
            }
        }
    }

    /// One leg succeeded, the other failed: best-effort cancel of the
    /// successful leg (spec §4.5 case 2).
    async fn compensate(
        &self,
        filled_venue: Venue,
        order_id: &str,
        failure: &Error,
        opportunity_id: OpportunityId,
    ) -> ExecutionOutcome {
        let api: &Arc<dyn VenueApi> = match filled_venue {
            Venue::A => &self.venue_a_api,
            Venue::B => &self.venue_b_api,
        };
        let cancelled = match api.cancel_order(order_id).await {
            Ok(()) => true,
            Err(cancel_err) => {
                error!(%opportunity_id, %cancel_err, "compensating cancel failed");
                false
            }
        };
        warn!(%opportunity_id, %filled_venue, %failure, cancelled, "partial execution failure");
        let _ = self
            .opportunity_store
            .update_status(opportunity_id, OpportunityStatus::Expired)
            .await;
        ExecutionOutcome::PartialFailure {
            filled_venue,
            cancelled,
            error: failure.to_string(),
        }
    }

    /// Reconcile every pending trade leg for `opportunity_id` against venue
    /// order status. Idempotent: already-terminal trades are left alone.
    pub async fn check_order_statuses(&self, opportunity_id: OpportunityId) -> Result<()> {
        let trades = self.trade_store.for_opportunity(opportunity_id).await?;
        for mut trade in trades {
            if !matches!(trade.status, TradeStatus::Pending) {
                continue;
            }
            let Some(order_id) = trade.order_id.clone() else { continue };
            let api = self.api_for(trade.venue);
            match api.order_status(&order_id).await {
                Ok(OrderStatus::Filled) => trade.mark_filled(Utc::now()),
                Ok(OrderStatus::Cancelled) => trade.mark_cancelled(),
                Ok(OrderStatus::Rejected) => trade.mark_failed("rejected by venue"),
                Ok(OrderStatus::Open) => continue,
                Err(err) => {
                    warn!(trade_id = %trade.id, %err, "order status query failed");
                    continue;
                }
            }
            self.trade_store.update(&trade).await?;
        }
        Ok(())
    }

    /// Cancel every still-pending leg and move the opportunity to `expired`.
    pub async fn cancel_execution(&self, opportunity_id: OpportunityId) -> Result<()> {
        let trades = self.trade_store.for_opportunity(opportunity_id).await?;
        for mut trade in trades {
            if !matches!(trade.status, TradeStatus::Pending) {
                continue;
            }
            let Some(order_id) = trade.order_id.clone() else { continue };
            let api = self.api_for(trade.venue);
            match api.cancel_order(&order_id).await {
                Ok(()) => trade.mark_cancelled(),
                Err(err) => trade.mark_failed(err.to_string()),
            }
            self.trade_store.update(&trade).await?;
        }
        self.opportunity_store
            .update_status(opportunity_id, OpportunityStatus::Expired)
            .await?;
        Ok(())
    }

    fn api_for(&self, venue: Venue) -> &Arc<dyn VenueApi> {
        match venue {
            Venue::A => &self.venue_a_api,
            Venue::B => &self.venue_b_api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalId, CanonicalMarket, ChosenLeg, OpportunityStatus, VenueMarketId};
    use crate::exchange::PlaceOrderResponse;
    use crate::store::memory::{InMemoryMarketStore, InMemoryOpportunityStore, InMemoryTradeStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

    struct MockApi {
        should_fail: AtomicBool,
    }

    impl MockApi {
        fn ok() -> Self {
            Self { should_fail: AtomicBool::new(false) }
        }

        fn failing() -> Self {
            Self { should_fail: AtomicBool::new(true) }
        }
    }

    #[async_trait]
    impl VenueApi for MockApi {
        async fn place_order(&self, _request: PlaceOrderRequest) -> Result<PlaceOrderResponse> {
            if self.should_fail.load(AtomicOrdering::Relaxed) {
                Err(Error::Trading("rejected".into()))
            } else {
                Ok(PlaceOrderResponse { order_id: "order-1".to_string() })
            }
        }

        async fn cancel_order(&self, _order_id: &str) -> Result<()> {
            Ok(())
        }

        async fn order_status(&self, _order_id: &str) -> Result<OrderStatus> {
            Ok(OrderStatus::Filled)
        }

        async fn list_markets(&self) -> Result<Vec<crate::domain::VenueMarket>> {
            Ok(vec![])
        }
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config::for_test())
    }

    async fn seed(
        market_store: &InMemoryMarketStore,
        opportunity_store: &InMemoryOpportunityStore,
    ) -> OpportunityId {
        let market = CanonicalMarket::new(
            CanonicalId::from("c1".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            Some(VenueMarketId::from("b1")),
            0.9,
        )
        .unwrap();
        market_store.upsert(&market).await.unwrap();

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
        opportunity_store.insert(&opportunity).await.unwrap();
        opportunity.id
    }

    #[tokio::test]
    async fn both_legs_succeed_marks_executed() {
        let market_store_concrete = InMemoryMarketStore::new();
        let opportunity_store_concrete = InMemoryOpportunityStore::new();
        let id = seed(&market_store_concrete, &opportunity_store_concrete).await;
        let opportunity_store: Arc<dyn OpportunityStore> = Arc::new(opportunity_store_concrete);
        let market_store: Arc<dyn MarketStore> = Arc::new(market_store_concrete);
        let trade_store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());

        let coordinator = ExecutionCoordinator::new(
            test_config(),
            Arc::clone(&opportunity_store),
            Arc::clone(&trade_store),
            Arc::clone(&market_store),
            Arc::new(MockApi::ok()),
            Arc::new(MockApi::ok()),
            Arc::new(EventBus::new()),
        );

        let result = coordinator.execute(id).await.unwrap();
        assert!(matches!(result.outcome, ExecutionOutcome::Success { .. }));
        let opp = opportunity_store.get(id).await.unwrap().unwrap();
        assert!(matches!(opp.status, OpportunityStatus::Executed));
        let trades = trade_store.for_opportunity(id).await.unwrap();
        assert_eq!(trades.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_compensates_and_expires() {
        let market_store_concrete = InMemoryMarketStore::new();
        let opportunity_store_concrete = InMemoryOpportunityStore::new();
        let id = seed(&market_store_concrete, &opportunity_store_concrete).await;
        let opportunity_store: Arc<dyn OpportunityStore> = Arc::new(opportunity_store_concrete);
        let market_store: Arc<dyn MarketStore> = Arc::new(market_store_concrete);
        let trade_store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());

        let coordinator = ExecutionCoordinator::new(
            test_config(),
            Arc::clone(&opportunity_store),
            Arc::clone(&trade_store),
            Arc::clone(&market_store),
            Arc::new(MockApi::ok()),
            Arc::new(MockApi::failing()),
            Arc::new(EventBus::new()),
        );

        let result = coordinator.execute(id).await;
        assert!(result.is_err());
        let opp = opportunity_store.get(id).await.unwrap().unwrap();
        assert!(matches!(opp.status, OpportunityStatus::Expired));
    }

    #[tokio::test]
    async fn duplicate_execution_is_rejected() {
        let market_store_concrete = InMemoryMarketStore::new();
        let opportunity_store_concrete = InMemoryOpportunityStore::new();
        let id = seed(&market_store_concrete, &opportunity_store_concrete).await;
        let opportunity_store: Arc<dyn OpportunityStore> = Arc::new(opportunity_store_concrete);
        let market_store: Arc<dyn MarketStore> = Arc::new(market_store_concrete);
        let trade_store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());

        let coordinator = Arc::new(ExecutionCoordinator::new(
            test_config(),
            Arc::clone(&opportunity_store),
            Arc::clone(&trade_store),
            Arc::clone(&market_store),
            Arc::new(MockApi::ok()),
            Arc::new(MockApi::ok()),
            Arc::new(EventBus::new()),
        ));
        coordinator.in_flight.lock().insert(id);
        let result = coordinator.execute(id).await;
        assert!(matches!(result, Err(Error::DuplicateExecution(_))));
    }
}
