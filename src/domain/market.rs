//! Market identity types: one venue's listing, and the cross-venue cluster
//! the resolver fuses it into.

use serde::{Deserialize, Serialize};

use super::ids::{CanonicalId, Venue, VenueMarketId};
use crate::error::{Error, Result};

/// One binary outcome market as listed on one venue. Not mutated after
/// discovery; a venue market that disappears from its venue's listing is
/// treated as stale by the resolver, never deleted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueMarket {
    pub venue: Venue,
    pub venue_market_id: VenueMarketId,
    pub title: String,
    pub description: Option<String>,
}

impl VenueMarket {
    #[must_use]
    pub const fn new(
        venue: Venue,
        venue_market_id: VenueMarketId,
        title: String,
        description: Option<String>,
    ) -> Self {
        Self { venue, venue_market_id, title, description }
    }

    /// Title plus description, the text the resolver normalizes.
    #[must_use]
    pub fn full_text(&self) -> String {
        match &self.description {
            Some(d) if !d.is_empty() => format!("{} {}", self.title, d),
            _ => self.title.clone(),
        }
    }
}

/// Confidence band derived from a pair's similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            Self::High
        } else if score >= 0.85 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// An identity cluster linking up to one `VenueMarket` per venue.
///
/// Invariants: at least one venue market is present; at most one venue
/// market per venue (enforced by having exactly two optional fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMarket {
    canonical_id: CanonicalId,
    title: String,
    venue_a_market_id: Option<VenueMarketId>,
    venue_b_market_id: Option<VenueMarketId>,
    similarity_score: f64,
    confidence: Confidence,
}

impl CanonicalMarket {
    /// Construct a canonical market, rejecting a cluster with no venue markets.
    pub fn new(
        canonical_id: CanonicalId,
        title: impl Into<String>,
        venue_a_market_id: Option<VenueMarketId>,
        venue_b_market_id: Option<VenueMarketId>,
        similarity_score: f64,
    ) -> Result<Self> {
        if venue_a_market_id.is_none() && venue_b_market_id.is_none() {
            return Err(Error::Matching(
                "canonical market must reference at least one venue market".into(),
            ));
        }
        Ok(Self {
            canonical_id,
            title: title.into(),
            venue_a_market_id,
            venue_b_market_id,
            similarity_score,
            confidence: Confidence::from_score(similarity_score),
        })
    }

    #[must_use]
    pub const fn canonical_id(&self) -> &CanonicalId {
        &self.canonical_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn venue_a_market_id(&self) -> Option<&VenueMarketId> {
        self.venue_a_market_id.as_ref()
    }

    #[must_use]
    pub const fn venue_b_market_id(&self) -> Option<&VenueMarketId> {
        self.venue_b_market_id.as_ref()
    }

    #[must_use]
    pub const fn market_id_for(&self, venue: Venue) -> Option<&VenueMarketId> {
        match venue {
            Venue::A => self.venue_a_market_id(),
            Venue::B => self.venue_b_market_id(),
        }
    }

    #[must_use]
    pub const fn similarity_score(&self) -> f64 {
        self.similarity_score
    }

    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.venue_a_market_id.is_some() && self.venue_b_market_id.is_some()
    }

    /// Merge an update into this cluster per the resolver's persistence
    /// contract: venue id fields and similarity are replaced; the title is
    /// kept unless the persisted title is empty.
    pub fn apply_update(
        &mut self,
        title: impl Into<String>,
        venue_a_market_id: Option<VenueMarketId>,
        venue_b_market_id: Option<VenueMarketId>,
        similarity_score: f64,
    ) {
        if self.title.is_empty() {
            self.title = title.into();
        }
        self.venue_a_market_id = venue_a_market_id;
        self.venue_b_market_id = venue_b_market_id;
        self.similarity_score = similarity_score;
        self.confidence = Confidence::from_score(similarity_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_bands() {
        assert!(matches!(Confidence::from_score(0.95), Confidence::High));
        assert!(matches!(Confidence::from_score(0.99), Confidence::High));
        assert!(matches!(Confidence::from_score(0.85), Confidence::Medium));
        assert!(matches!(Confidence::from_score(0.94), Confidence::Medium));
        assert!(matches!(Confidence::from_score(0.84), Confidence::Low));
    }

    #[test]
    fn canonical_market_requires_a_venue_market() {
        let result = CanonicalMarket::new(CanonicalId::from("x".to_string()), "t", None, None, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn canonical_market_with_one_side_is_incomplete() {
        let m = CanonicalMarket::new(
            CanonicalId::from("x".to_string()),
            "t",
            Some(VenueMarketId::from("a1")),
            None,
            0.0,
        )
        .unwrap();
        assert!(!m.is_complete());
    }

    #[test]
    fn apply_update_keeps_title_when_persisted_is_empty() {
        let mut m = CanonicalMarket::new(
            CanonicalId::from("x".to_string()),
            "",
            Some(VenueMarketId::from("a1")),
            None,
            0.0,
        )
        .unwrap();
        m.apply_update("new-title", Some(VenueMarketId::from("a1")), Some(VenueMarketId::from("b1")), 0.9);
        assert_eq!(m.title(), "new-title");
        assert!(m.is_complete());
    }

    #[test]
    fn apply_update_does_not_overwrite_nonempty_title() {
        let mut m = CanonicalMarket::new(
            CanonicalId::from("x".to_string()),
            "original",
            Some(VenueMarketId::from("a1")),
            None,
            0.0,
        )
        .unwrap();
        m.apply_update("ignored", Some(VenueMarketId::from("a1")), None, 0.5);
        assert_eq!(m.title(), "original");
    }
}
