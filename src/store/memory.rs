//! In-memory store implementations used by tests and the `testkit` feature.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MarketStore, OpportunityStore, TradeStore};
use crate::domain::{
    ArbitrageOpportunity, CanonicalId, CanonicalMarket, OpportunityId, OpportunityStatus, Trade,
    TradeId,
};
use crate::error::Result;

/// `MarketStore` backed by a plain `HashMap`, guarded by a single mutex.
#[derive(Default)]
pub struct InMemoryMarketStore {
    markets: Mutex<HashMap<String, CanonicalMarket>>,
}

impl InMemoryMarketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn upsert(&self, market: &CanonicalMarket) -> Result<()> {
        let key = market.canonical_id().as_str().to_string();
        let mut markets = self.markets.lock();
        let merged = match markets.get(&key) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.apply_update(
                    market.title().to_string(),
                    market.venue_a_market_id().cloned(),
                    market.venue_b_market_id().cloned(),
                    market.similarity_score(),
                );
                merged
            }
            None => market.clone(),
        };
        markets.insert(key, merged);
        Ok(())
    }

    async fn get(&self, id: &CanonicalId) -> Result<Option<CanonicalMarket>> {
        Ok(self.markets.lock().get(id.as_str()).cloned())
    }

    async fn all(&self) -> Result<Vec<CanonicalMarket>> {
        Ok(self.markets.lock().values().cloned().collect())
    }
}

/// `OpportunityStore` backed by a plain `HashMap`, guarded by a single mutex.
#[derive(Default)]
pub struct InMemoryOpportunityStore {
    opportunities: Mutex<HashMap<OpportunityId, ArbitrageOpportunity>>,
}

impl InMemoryOpportunityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        self.opportunities.lock().insert(opportunity.id, opportunity.clone());
        Ok(())
    }

    async fn update_status(&self, id: OpportunityId, status: OpportunityStatus) -> Result<()> {
        if let Some(o) = self.opportunities.lock().get_mut(&id) {
            o.status = status;
        }
        Ok(())
    }

    async fn get(&self, id: OpportunityId) -> Result<Option<ArbitrageOpportunity>> {
        Ok(self.opportunities.lock().get(&id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ArbitrageOpportunity>> {
        let guard = self.opportunities.lock();
        let mut all: Vec<_> = guard.values().cloned().collect();
        all.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        all.truncate(limit);
        Ok(all)
    }

    async fn active(&self) -> Result<Vec<ArbitrageOpportunity>> {
        Ok(self.opportunities.lock().values().filter(|o| o.is_active()).cloned().collect())
    }
}

/// `TradeStore` backed by a plain `HashMap`, guarded by a single mutex.
#[derive(Default)]
pub struct InMemoryTradeStore {
    trades: Mutex<HashMap<TradeId, Trade>>,
}

impl InMemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn insert(&self, trade: &Trade) -> Result<()> {
        self.trades.lock().insert(trade.id, trade.clone());
        Ok(())
    }

    async fn update(&self, trade: &Trade) -> Result<()> {
        self.trades.lock().insert(trade.id, trade.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Trade>> {
        let guard = self.trades.lock();
        let mut all: Vec<_> = guard.values().cloned().collect();
        all.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        all.truncate(limit);
        Ok(all)
    }

    async fn for_opportunity(&self, opportunity_id: OpportunityId) -> Result<Vec<Trade>> {
        Ok(self
            .trades
            .lock()
            .values()
            .filter(|t| t.opportunity_id == Some(opportunity_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChosenLeg, Side, TradeStatus, Venue, VenueMarketId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn opp(status: OpportunityStatus) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
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
            status,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn market_store_roundtrips() {
        let store = InMemoryMarketStore::new();
        let market = CanonicalMarket::new(
            CanonicalId::from("c1".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            None,
            0.9,
        )
        .unwrap();
        store.upsert(&market).await.unwrap();
        let fetched = store.get(&CanonicalId::from("c1".to_string())).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn opportunity_store_update_status_and_active() {
        let store = InMemoryOpportunityStore::new();
        let o = opp(OpportunityStatus::Detected);
        let id = o.id;
        store.insert(&o).await.unwrap();
        assert_eq!(store.active().await.unwrap().len(), 1);

        store.update_status(id, OpportunityStatus::Executed).await.unwrap();
        let fetched = store.get(id).await.unwrap().unwrap();
        assert!(matches!(fetched.status, OpportunityStatus::Executed));
        assert!(store.active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trade_store_filters_by_opportunity() {
        let store = InMemoryTradeStore::new();
        let opportunity_id = OpportunityId::new();
        let trade = Trade::pending(
            opportunity_id,
            Venue::A,
            VenueMarketId::from("a1"),
            Side::Yes,
            dec!(100),
            dec!(0.5),
            "order-1".into(),
        );
        store.insert(&trade).await.unwrap();
        assert_eq!(store.for_opportunity(opportunity_id).await.unwrap().len(), 1);
        assert_eq!(store.for_opportunity(OpportunityId::new()).await.unwrap().len(), 0);

        let mut updated = trade.clone();
        updated.mark_filled(Utc::now());
        store.update(&updated).await.unwrap();
        let fetched = &store.for_opportunity(opportunity_id).await.unwrap()[0];
        assert!(matches!(fetched.status, TradeStatus::Filled));
    }
}
