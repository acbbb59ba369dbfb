//! Database row types for Diesel ORM.
//!
//! Decimal and enum fields are stored as `TEXT`: SQLite has no native
//! decimal type, and round-tripping through `Decimal::to_string`/`FromStr`
//! avoids the precision loss a `REAL` column would introduce.

use diesel::prelude::*;

use super::schema::{canonical_mappings, opportunities, trades};

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = canonical_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CanonicalMappingRow {
    pub canonical_id: String,
    pub title: String,
    pub venue_a_market_id: Option<String>,
    pub venue_b_market_id: Option<String>,
    pub similarity_score: f64,
    pub confidence: String,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpportunityRow {
    pub id: String,
    pub canonical_id: String,
    pub chosen_leg: String,
    pub combined_cost: String,
    pub venue_a_price: String,
    pub venue_b_price: String,
    pub venue_a_depth: String,
    pub venue_b_depth: String,
    pub recommended_size: String,
    pub estimated_fees: String,
    pub net_profit: String,
    pub detected_at: String,
    pub status: String,
    pub expires_at: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub id: String,
    pub opportunity_id: Option<String>,
    pub venue: String,
    pub venue_market_id: String,
    pub side: String,
    pub amount: String,
    pub price: String,
    pub order_id: Option<String>,
    pub status: String,
    pub executed_at: Option<String>,
    pub error_message: Option<String>,
}
