//! Persistence ports: durable storage for canonical mappings,
//! opportunities, and trades (spec §3, §6).

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::{
    ArbitrageOpportunity, CanonicalId, CanonicalMarket, OpportunityId, OpportunityStatus, Trade,
};
use crate::error::Result;

/// Canonical mapping persistence. On save, an existing `canonical_id` is
/// updated in place; a new one is inserted (spec §4.3 persistence contract).
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn upsert(&self, market: &CanonicalMarket) -> Result<()>;
    async fn get(&self, id: &CanonicalId) -> Result<Option<CanonicalMarket>>;
    async fn all(&self) -> Result<Vec<CanonicalMarket>>;
}

/// Opportunity persistence. Single-writer-per-field: the Detector inserts,
/// the Coordinator updates `status` (spec §9 Ownership).
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()>;
    async fn update_status(&self, id: OpportunityId, status: OpportunityStatus) -> Result<()>;
    async fn get(&self, id: OpportunityId) -> Result<Option<ArbitrageOpportunity>>;
    /// Newest first, bounded to `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<ArbitrageOpportunity>>;
    /// `detected` or `executing`, not expired.
    async fn active(&self) -> Result<Vec<ArbitrageOpportunity>>;
}

/// Trade persistence: one row per execution leg.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn insert(&self, trade: &Trade) -> Result<()>;
    async fn update(&self, trade: &Trade) -> Result<()>;
    /// Newest first, bounded to `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Trade>>;
    async fn for_opportunity(&self, opportunity_id: OpportunityId) -> Result<Vec<Trade>>;
}
