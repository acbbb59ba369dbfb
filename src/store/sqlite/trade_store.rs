//! SQLite-backed trade store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::connection::DbPool;
use super::model::TradeRow;
use super::schema::trades;
use crate::domain::{OpportunityId, Side, Trade, TradeId, TradeStatus, Venue, VenueMarketId};
use crate::error::{Error, Result};
use crate::store::TradeStore;

/// SQLite-backed implementation of [`TradeStore`].
pub struct SqliteTradeStore {
    pool: DbPool,
}

impl SqliteTradeStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(t: &Trade) -> TradeRow {
        TradeRow {
            id: t.id.to_string(),
            opportunity_id: t.opportunity_id.map(|id| id.to_string()),
            venue: venue_to_str(t.venue).to_string(),
            venue_market_id: t.venue_market_id.as_str().to_string(),
            side: side_to_str(t.side).to_string(),
            amount: t.amount.to_string(),
            price: t.price.to_string(),
            order_id: t.order_id.clone(),
            status: status_to_str(t.status).to_string(),
            executed_at: t.executed_at.map(|at| at.to_rfc3339()),
            error_message: t.error_message.clone(),
        }
    }

    fn from_row(row: TradeRow) -> Result<Trade> {
        Ok(Trade {
            id: TradeId::from_uuid(
                uuid::Uuid::parse_str(&row.id).map_err(|e| Error::DataStore(e.to_string()))?,
            ),
            opportunity_id: row
                .opportunity_id
                .map(|s| {
                    uuid::Uuid::parse_str(&s)
                        .map(OpportunityId::from_uuid)
                        .map_err(|e| Error::DataStore(e.to_string()))
                })
                .transpose()?,
            venue: venue_from_str(&row.venue)?,
            venue_market_id: VenueMarketId::from(row.venue_market_id),
            side: side_from_str(&row.side)?,
            amount: parse_decimal(&row.amount)?,
            price: parse_decimal(&row.price)?,
            order_id: row.order_id,
            status: status_from_str(&row.status)?,
            executed_at: row.executed_at.as_deref().map(parse_rfc3339).transpose()?,
            error_message: row.error_message,
        })
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn insert(&self, trade: &Trade) -> Result<()> {
        let row = Self::to_row(trade);
        let mut conn = self.pool.get()?;
        diesel::insert_into(trades::table).values(&row).execute(&mut conn)?;
        Ok(())
    }

    async fn update(&self, trade: &Trade) -> Result<()> {
        let row = Self::to_row(trade);
        let mut conn = self.pool.get()?;
        diesel::replace_into(trades::table).values(&row).execute(&mut conn)?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Trade>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<TradeRow> = trades::table
            .order(trades::executed_at.desc())
            .limit(limit as i64)
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn for_opportunity(&self, opportunity_id: OpportunityId) -> Result<Vec<Trade>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<TradeRow> = trades::table
            .filter(trades::opportunity_id.eq(opportunity_id.to_string()))
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

fn venue_to_str(venue: Venue) -> &'static str {
    venue.as_str()
}

fn venue_from_str(s: &str) -> Result<Venue> {
    match s {
        "A" => Ok(Venue::A),
        "B" => Ok(Venue::B),
        other => Err(Error::DataStore(format!("unknown venue {other}"))),
    }
}

fn side_to_str(side: Side) -> &'static str {
    match side {
        Side::Yes => "yes",
        Side::No => "no",
    }
}

fn side_from_str(s: &str) -> Result<Side> {
    match s {
        "yes" => Ok(Side::Yes),
        "no" => Ok(Side::No),
        other => Err(Error::DataStore(format!("unknown side {other}"))),
    }
}

fn status_to_str(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::Pending => "pending",
        TradeStatus::Filled => "filled",
        TradeStatus::Cancelled => "cancelled",
        TradeStatus::Failed => "failed",
    }
}

fn status_from_str(s: &str) -> Result<TradeStatus> {
    match s {
        "pending" => Ok(TradeStatus::Pending),
        "filled" => Ok(TradeStatus::Filled),
        "cancelled" => Ok(TradeStatus::Cancelled),
        "failed" => Ok(TradeStatus::Failed),
        other => Err(Error::DataStore(format!("unknown trade status {other}"))),
    }
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::DataStore(e.to_string()))
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::DataStore(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::connection::{create_pool, run_migrations};
    use rust_decimal_macros::dec;

    fn setup() -> DbPool {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[tokio::test]
    async fn insert_and_filter_by_opportunity() {
        let store = SqliteTradeStore::new(setup());
        let opportunity_id = OpportunityId::new();
        let trade = Trade::pending(
            opportunity_id,
            Venue::A,
            VenueMarketId::from("a1"),
            Side::Yes,
            dec!(100),
            dec!(0.45),
            "order-1".into(),
        );
        store.insert(&trade).await.unwrap();

        let matches = store.for_opportunity(opportunity_id).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].order_id.as_deref(), Some("order-1"));

        let none = store.for_opportunity(OpportunityId::new()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_marks_filled() {
        let store = SqliteTradeStore::new(setup());
        let mut trade = Trade::pending(
            OpportunityId::new(),
            Venue::B,
            VenueMarketId::from("b1"),
            Side::No,
            dec!(50),
            dec!(0.3),
            "order-2".into(),
        );
        store.insert(&trade).await.unwrap();

        trade.mark_filled(Utc::now());
        store.update(&trade).await.unwrap();

        let fetched = &store.for_opportunity(trade.opportunity_id.unwrap()).await.unwrap()[0];
        assert!(matches!(fetched.status, TradeStatus::Filled));
        assert!(fetched.executed_at.is_some());
    }
}
