//! Arbitrage opportunity types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{CanonicalId, OpportunityId};
use super::trade::Side;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityStatus {
    Detected,
    Executing,
    Executed,
    Expired,
}

/// Which complementary pair of legs the detector chose.
///
/// `AYesBNo` buys YES on venue A and NO on venue B; `ANoBYes` is the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChosenLeg {
    AYesBNo,
    ANoBYes,
}

impl ChosenLeg {
    /// The side purchased on venue A for this leg choice.
    #[must_use]
    pub const fn venue_a_side(self) -> Side {
        match self {
            Self::AYesBNo => Side::Yes,
            Self::ANoBYes => Side::No,
        }
    }

    /// The side purchased on venue B for this leg choice.
    #[must_use]
    pub const fn venue_b_side(self) -> Side {
        match self {
            Self::AYesBNo => Side::No,
            Self::ANoBYes => Side::Yes,
        }
    }
}

/// A detected pricing inefficiency for one canonical market at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub id: OpportunityId,
    pub canonical_id: CanonicalId,
    pub chosen_leg: ChosenLeg,
    pub combined_cost: Decimal,
    pub venue_a_price: Decimal,
    pub venue_b_price: Decimal,
    pub venue_a_depth: Decimal,
    pub venue_b_depth: Decimal,
    pub recommended_size: Decimal,
    pub estimated_fees: Decimal,
    pub net_profit: Decimal,
    pub detected_at: DateTime<Utc>,
    pub status: OpportunityStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ArbitrageOpportunity {
    /// `profit_potential = 1 - combined_cost`, per spec §3.
    #[must_use]
    pub fn profit_potential(&self) -> Decimal {
        Decimal::ONE - self.combined_cost
    }

    /// Transition `detected -> executing`. Rejected if the opportunity is
    /// not currently `detected`, guarding the single-writer invariant
    /// between the Detector (creates) and Coordinator (updates status).
    pub fn begin_executing(&mut self) -> Result<()> {
        if !matches!(self.status, OpportunityStatus::Detected) {
            return Err(Error::InvalidTransition(format!(
                "cannot start executing opportunity {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = OpportunityStatus::Executing;
        Ok(())
    }

    pub fn mark_executed(&mut self) {
        self.status = OpportunityStatus::Executed;
    }

    pub fn mark_expired(&mut self) {
        self.status = OpportunityStatus::Expired;
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, OpportunityStatus::Detected | OpportunityStatus::Executing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn profit_potential_is_one_minus_combined_cost() {
        let o = opp(OpportunityStatus::Detected);
        assert_eq!(o.profit_potential(), dec!(0.05));
    }

    #[test]
    fn begin_executing_succeeds_from_detected() {
        let mut o = opp(OpportunityStatus::Detected);
        assert!(o.begin_executing().is_ok());
        assert!(matches!(o.status, OpportunityStatus::Executing));
    }

    #[test]
    fn begin_executing_rejects_when_already_executing() {
        let mut o = opp(OpportunityStatus::Executing);
        assert!(o.begin_executing().is_err());
    }

    #[test]
    fn chosen_leg_sides_are_complementary() {
        assert_eq!(ChosenLeg::AYesBNo.venue_a_side(), Side::Yes);
        assert_eq!(ChosenLeg::AYesBNo.venue_b_side(), Side::No);
        assert_eq!(ChosenLeg::ANoBYes.venue_a_side(), Side::No);
        assert_eq!(ChosenLeg::ANoBYes.venue_b_side(), Side::Yes);
    }
}
