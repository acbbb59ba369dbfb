//! The Arbitrage Detector: fuses cross-venue order books by canonical id
//! and emits opportunities (spec §4.4).

mod fused;

pub use fused::FusedBookState;

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    ArbitrageOpportunity, CanonicalId, ChosenLeg, OpportunityStatus, OrderBook, Venue,
    VenueMarketId,
};
use crate::error::Result;
use crate::events::{EngineEvent, EventBus};
use crate::exchange::{VenueClient, VenueEvent};
use crate::store::{MarketStore, OpportunityStore};

/// Per-venue YES price and liquidity depth derived from one order book.
struct VenueQuote {
    yes_price: Decimal,
    no_price: Decimal,
    depth: Decimal,
}

fn quote_from_book(book: &OrderBook) -> Option<VenueQuote> {
    if book.is_empty() {
        return None;
    }
    let yes_price = book.mid_price()?.value();
    Some(VenueQuote { yes_price, no_price: Decimal::ONE - yes_price, depth: book.depth().value() })
}

/// Hot-path component that correlates fused books by canonical id and
/// derives arbitrage opportunities (spec §4.4).
pub struct ArbitrageDetector {
    config: Arc<Config>,
    fused: FusedBookState,
    opportunity_store: Arc<dyn OpportunityStore>,
    market_store: Arc<dyn MarketStore>,
    event_bus: Arc<EventBus>,
}

impl ArbitrageDetector {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        opportunity_store: Arc<dyn OpportunityStore>,
        market_store: Arc<dyn MarketStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            fused: FusedBookState::new(),
            opportunity_store,
            market_store,
            event_bus,
        }
    }

    /// Ask the Resolver (via the Market Store) for every known canonical
    /// mapping and instruct both Venue Clients to subscribe to the venue
    /// markets each references (spec §4.4 "Subscription bootstrap").
    pub async fn bootstrap_subscriptions(
        &self,
        venue_a: &dyn VenueClient,
        venue_b: &dyn VenueClient,
    ) -> Result<()> {
        let mappings = self.market_store.all().await?;
        for mapping in mappings {
            self.fused.register_mapping(&mapping);
            if let Some(id) = mapping.venue_a_market_id() {
                venue_a.subscribe(id.clone()).await?;
            }
            if let Some(id) = mapping.venue_b_market_id() {
                venue_b.subscribe(id.clone()).await?;
            }
        }
        info!("detector subscription bootstrap complete");
        Ok(())
    }

    /// Consume one `VenueEvent` from a venue client. Non-order-book events
    /// are logged; order-book events are routed through `on_order_book`.
    pub async fn handle_event(&self, venue: Venue, event: VenueEvent) -> Result<()> {
        match event {
            VenueEvent::OrderBook { venue_market_id, bids, asks, timestamp } => {
                let book = OrderBook::new(bids, asks, timestamp);
                self.on_order_book(venue, &venue_market_id, book).await
            }
            VenueEvent::Connected => {
                debug!(%venue, "venue client connected");
                Ok(())
            }
            VenueEvent::Disconnected { reason } => {
                warn!(%venue, reason, "venue client disconnected");
                Ok(())
            }
            VenueEvent::Error { kind } => {
                self.event_bus.publish(EngineEvent::Error(format!("{venue}: {kind}")));
                Ok(())
            }
        }
    }

    /// One order-book update for `(venue, venue_market_id)` (spec §4.4 steps 1-3).
    async fn on_order_book(
        &self,
        venue: Venue,
        venue_market_id: &VenueMarketId,
        book: OrderBook,
    ) -> Result<()> {
        let Some(canonical_id) = self.fused.canonical_id_for(venue, venue_market_id) else {
            return Ok(());
        };
        self.fused.update(&canonical_id, venue, book);
        if let Some(pair) = self.fused.get_pair(&canonical_id) {
            self.evaluate(&canonical_id, &pair.0, &pair.1).await?;
        }
        Ok(())
    }

    /// Derive prices, depth, and fees for one canonical market and, if an
    /// arbitrage opportunity exists and passes dedup, persist and publish it
    /// (spec §4.4 `evaluate`).
    async fn evaluate(
        &self,
        canonical_id: &CanonicalId,
        book_a: &OrderBook,
        book_b: &OrderBook,
    ) -> Result<()> {
        let Some(a) = quote_from_book(book_a) else { return Ok(()) };
        let Some(b) = quote_from_book(book_b) else { return Ok(()) };

        let cost_a_yes_b_no = a.yes_price + b.no_price;
        let cost_a_no_b_yes = a.no_price + b.yes_price;

        let (chosen_leg, combined_cost, venue_a_price, venue_b_price) =
            if cost_a_yes_b_no <= cost_a_no_b_yes {
                (ChosenLeg::AYesBNo, cost_a_yes_b_no, a.yes_price, b.no_price)
            } else {
                (ChosenLeg::ANoBYes, cost_a_no_b_yes, a.no_price, b.yes_price)
            };

        if combined_cost >= self.config.arb_threshold {
            return Ok(());
        }

        let recommended_size = a.depth.min(b.depth).min(self.config.max_position_size);
        if recommended_size < self.config.min_liquidity {
            return Ok(());
        }

        let estimated_fees =
            recommended_size * (self.config.venue_a_fee_rate + self.config.venue_b_fee_rate);
        let gross_profit = recommended_size * (Decimal::ONE - combined_cost);
        let net_profit = gross_profit - estimated_fees;
        if net_profit <= Decimal::ZERO {
            return Ok(());
        }

        if !self.fused.should_emit(canonical_id, combined_cost) {
            return Ok(());
        }

        let opportunity = ArbitrageOpportunity {
            id: crate::domain::OpportunityId::new(),
            canonical_id: canonical_id.clone(),
            chosen_leg,
            combined_cost,
            venue_a_price,
            venue_b_price,
            venue_a_depth: a.depth,
            venue_b_depth: b.depth,
            recommended_size,
            estimated_fees,
            net_profit,
            detected_at: chrono::Utc::now(),
            status: OpportunityStatus::Detected,
            expires_at: None,
        };

        match self.opportunity_store.insert(&opportunity).await {
            Ok(()) => {
                info!(%canonical_id, combined_cost = %opportunity.combined_cost, net_profit = %opportunity.net_profit, "arbitrage opportunity detected");
                self.event_bus.publish(EngineEvent::ArbitrageOpportunity(opportunity));
            }
            Err(err) => {
                // Spec §7 DataStoreError: log and continue, the opportunity is
                // lost but correctness is not violated.
                warn!(%canonical_id, %err, "failed to persist detected opportunity");
            }
        }
        Ok(())
    }
}
