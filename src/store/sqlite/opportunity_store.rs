//! SQLite-backed opportunity store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::connection::DbPool;
use super::model::OpportunityRow;
use super::schema::opportunities;
use crate::domain::{ArbitrageOpportunity, CanonicalId, ChosenLeg, OpportunityId, OpportunityStatus};
use crate::error::{Error, Result};
use crate::store::OpportunityStore;

/// SQLite-backed implementation of [`OpportunityStore`].
pub struct SqliteOpportunityStore {
    pool: DbPool,
}

impl SqliteOpportunityStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(o: &ArbitrageOpportunity) -> OpportunityRow {
        OpportunityRow {
            id: o.id.to_string(),
            canonical_id: o.canonical_id.as_str().to_string(),
            chosen_leg: chosen_leg_to_str(o.chosen_leg).to_string(),
            combined_cost: o.combined_cost.to_string(),
            venue_a_price: o.venue_a_price.to_string(),
            venue_b_price: o.venue_b_price.to_string(),
            venue_a_depth: o.venue_a_depth.to_string(),
            venue_b_depth: o.venue_b_depth.to_string(),
            recommended_size: o.recommended_size.to_string(),
            estimated_fees: o.estimated_fees.to_string(),
            net_profit: o.net_profit.to_string(),
            detected_at: o.detected_at.to_rfc3339(),
            status: status_to_str(o.status).to_string(),
            expires_at: o.expires_at.map(|t| t.to_rfc3339()),
        }
    }

    fn from_row(row: OpportunityRow) -> Result<ArbitrageOpportunity> {
        Ok(ArbitrageOpportunity {
            id: OpportunityId::from_uuid(
                uuid::Uuid::parse_str(&row.id).map_err(|e| Error::DataStore(e.to_string()))?,
            ),
            canonical_id: CanonicalId::from(row.canonical_id),
            chosen_leg: chosen_leg_from_str(&row.chosen_leg)?,
            combined_cost: parse_decimal(&row.combined_cost)?,
            venue_a_price: parse_decimal(&row.venue_a_price)?,
            venue_b_price: parse_decimal(&row.venue_b_price)?,
            venue_a_depth: parse_decimal(&row.venue_a_depth)?,
            venue_b_depth: parse_decimal(&row.venue_b_depth)?,
            recommended_size: parse_decimal(&row.recommended_size)?,
            estimated_fees: parse_decimal(&row.estimated_fees)?,
            net_profit: parse_decimal(&row.net_profit)?,
            detected_at: parse_rfc3339(&row.detected_at)?,
            status: status_from_str(&row.status)?,
            expires_at: row.expires_at.as_deref().map(parse_rfc3339).transpose()?,
        })
    }
}

#[async_trait]
impl OpportunityStore for SqliteOpportunityStore {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        let row = Self::to_row(opportunity);
        let mut conn = self.pool.get()?;
        diesel::insert_into(opportunities::table).values(&row).execute(&mut conn)?;
        Ok(())
    }

    async fn update_status(&self, id: OpportunityId, status: OpportunityStatus) -> Result<()> {
        let mut conn = self.pool.get()?;
        diesel::update(opportunities::table.find(id.to_string()))
            .set(opportunities::status.eq(status_to_str(status)))
            .execute(&mut conn)?;
        Ok(())
    }

    async fn get(&self, id: OpportunityId) -> Result<Option<ArbitrageOpportunity>> {
        let mut conn = self.pool.get()?;
        let row: Option<OpportunityRow> =
            opportunities::table.find(id.to_string()).first(&mut conn).optional()?;
        row.map(Self::from_row).transpose()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ArbitrageOpportunity>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<OpportunityRow> = opportunities::table
            .order(opportunities::detected_at.desc())
            .limit(limit as i64)
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn active(&self) -> Result<Vec<ArbitrageOpportunity>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<OpportunityRow> = opportunities::table
            .filter(
                opportunities::status
                    .eq(status_to_str(OpportunityStatus::Detected))
                    .or(opportunities::status.eq(status_to_str(OpportunityStatus::Executing))),
            )
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

fn chosen_leg_to_str(leg: ChosenLeg) -> &'static str {
    match leg {
        ChosenLeg::AYesBNo => "ay_bn",
        ChosenLeg::ANoBYes => "an_by",
    }
}

fn chosen_leg_from_str(s: &str) -> Result<ChosenLeg> {
    match s {
        "ay_bn" => Ok(ChosenLeg::AYesBNo),
        "an_by" => Ok(ChosenLeg::ANoBYes),
        other => Err(Error::DataStore(format!("unknown chosen_leg {other}"))),
    }
}

fn status_to_str(status: OpportunityStatus) -> &'static str {
    match status {
        OpportunityStatus::Detected => "detected",
        OpportunityStatus::Executing => "executing",
        OpportunityStatus::Executed => "executed",
        OpportunityStatus::Expired => "expired",
    }
}

fn status_from_str(s: &str) -> Result<OpportunityStatus> {
    match s {
        "detected" => Ok(OpportunityStatus::Detected),
        "executing" => Ok(OpportunityStatus::Executing),
        "executed" => Ok(OpportunityStatus::Executed),
        "expired" => Ok(OpportunityStatus::Expired),
        other => Err(Error::DataStore(format!("unknown opportunity status {other}"))),
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
