//! SQLite-backed persistence using Diesel ORM.

pub mod connection;
pub mod market_store;
pub mod model;
pub mod opportunity_store;
pub mod schema;
pub mod trade_store;

pub use connection::{create_pool, run_migrations, DbPool};
pub use market_store::SqliteMarketStore;
pub use opportunity_store::SqliteOpportunityStore;
pub use trade_store::SqliteTradeStore;
