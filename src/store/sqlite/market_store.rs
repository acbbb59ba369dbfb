//! SQLite-backed canonical market store.

use async_trait::async_trait;
use diesel::prelude::*;

use super::connection::DbPool;
use super::model::CanonicalMappingRow;
use super::schema::canonical_mappings;
use crate::domain::{CanonicalId, CanonicalMarket, VenueMarketId};
use crate::error::Result;
use crate::store::MarketStore;

/// SQLite-backed implementation of [`MarketStore`].
pub struct SqliteMarketStore {
    pool: DbPool,
}

impl SqliteMarketStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(market: &CanonicalMarket) -> CanonicalMappingRow {
        CanonicalMappingRow {
            canonical_id: market.canonical_id().as_str().to_string(),
            title: market.title().to_string(),
            venue_a_market_id: market.venue_a_market_id().map(|id| id.as_str().to_string()),
            venue_b_market_id: market.venue_b_market_id().map(|id| id.as_str().to_string()),
            similarity_score: market.similarity_score(),
            confidence: format!("{:?}", market.confidence()),
        }
    }

    fn from_row(row: CanonicalMappingRow) -> Result<CanonicalMarket> {
        CanonicalMarket::new(
            CanonicalId::from(row.canonical_id),
            row.title,
            row.venue_a_market_id.map(VenueMarketId::from),
            row.venue_b_market_id.map(VenueMarketId::from),
            row.similarity_score,
        )
    }
}

#[async_trait]
impl MarketStore for SqliteMarketStore {
    async fn upsert(&self, market: &CanonicalMarket) -> Result<()> {
        let mut conn = self.pool.get()?;
        let existing: Option<CanonicalMappingRow> = canonical_mappings::table
            .find(market.canonical_id().as_str())
            .first(&mut conn)
            .optional()?;

        let merged = match existing {
            Some(row) => {
                let mut existing_market = Self::from_row(row)?;
                existing_market.apply_update(
                    market.title().to_string(),
                    market.venue_a_market_id().cloned(),
                    market.venue_b_market_id().cloned(),
                    market.similarity_score(),
                );
                existing_market
            }
            None => market.clone(),
        };

        let row = Self::to_row(&merged);
        diesel::replace_into(canonical_mappings::table).values(&row).execute(&mut conn)?;
        Ok(())
    }

    async fn get(&self, id: &CanonicalId) -> Result<Option<CanonicalMarket>> {
        let mut conn = self.pool.get()?;
        let row: Option<CanonicalMappingRow> =
            canonical_mappings::table.find(id.as_str()).first(&mut conn).optional()?;
        row.map(Self::from_row).transpose()
    }

    async fn all(&self) -> Result<Vec<CanonicalMarket>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<CanonicalMappingRow> = canonical_mappings::table.load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}
