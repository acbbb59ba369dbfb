//! Trade types: one leg of a two-leg execution.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{OpportunityId, TradeId, Venue, VenueMarketId};

/// A binary-market outcome side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Filled,
    Cancelled,
    Failed,
}

/// One leg of an execution: a single venue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub opportunity_id: Option<OpportunityId>,
    pub venue: Venue,
    pub venue_market_id: VenueMarketId,
    pub side: Side,
    pub amount: Decimal,
    pub price: Decimal,
    pub order_id: Option<String>,
    pub status: TradeStatus,
    pub executed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Trade {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        opportunity_id: OpportunityId,
        venue: Venue,
        venue_market_id: VenueMarketId,
        side: Side,
        amount: Decimal,
        price: Decimal,
        order_id: String,
    ) -> Self {
        Self {
            id: TradeId::new(),
            opportunity_id: Some(opportunity_id),
            venue,
            venue_market_id,
            side,
            amount,
            price,
            order_id: Some(order_id),
            status: TradeStatus::Pending,
            executed_at: None,
            error_message: None,
        }
    }

    pub fn mark_filled(&mut self, at: DateTime<Utc>) {
        self.status = TradeStatus::Filled;
        self.executed_at = Some(at);
    }

    pub fn mark_cancelled(&mut self) {
        self.status = TradeStatus::Cancelled;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = TradeStatus::Failed;
        self.error_message = Some(error.into());
    }
}
