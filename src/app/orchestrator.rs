//! Engine bootstrap: wires every adapter into a running system and hands
//! back an [`EngineHandle`] plus a shutdown switch.
//!
//! Every long-lived task (the two Venue Clients' internal drivers, and the
//! event pumps below) shares the single `tokio::sync::watch<bool>`
//! cancellation signal (spec §5).

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::app::handle::EngineHandle;
use crate::book::OrderBookStore;
use crate::config::Config;
use crate::detector::ArbitrageDetector;
use crate::domain::Venue;
use crate::error::Result;
use crate::events::EventBus;
use crate::exchange::{
    VenueAApi, VenueAClient, VenueACodec, VenueBApi, VenueBClient, VenueBCodec, VenueClient,
    VenueEvent,
};
use crate::execution::ExecutionCoordinator;
use crate::identity::MarketIdentityResolver;
use crate::store::sqlite::{create_pool, run_migrations, SqliteMarketStore, SqliteOpportunityStore, SqliteTradeStore};
use crate::store::{MarketStore, OpportunityStore, TradeStore};

/// A fully wired, running engine. Dropping this does not stop background
/// tasks by itself; call [`Engine::shutdown`] first.
pub struct Engine {
    handle: Arc<EngineHandle>,
    venue_a_client: Arc<VenueAClient>,
    venue_b_client: Arc<VenueBClient>,
    shutdown_tx: watch::Sender<bool>,
}

impl Engine {
    /// Build every store, adapter, and hot-path component from `config`,
    /// connect both Venue Clients, and start the event pumps that feed the
    /// Detector.
    ///
    /// # Errors
    /// Propagates `Error::Database`/`Error::Pool` if the SQLite pool or
    /// migrations fail, or `Error::Connection` if either Venue Client
    /// cannot complete its initial connect.
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let pool = create_pool(&config.database_url)?;
        run_migrations(&pool)?;

        let market_store: Arc<dyn MarketStore> = Arc::new(SqliteMarketStore::new(pool.clone()));
        let opportunity_store: Arc<dyn OpportunityStore> =
            Arc::new(SqliteOpportunityStore::new(pool.clone()));
        let trade_store: Arc<dyn TradeStore> = Arc::new(SqliteTradeStore::new(pool));

        let event_bus = Arc::new(EventBus::new());
        let book_store = Arc::new(OrderBookStore::new());

        let venue_a_api: Arc<dyn crate::exchange::VenueApi> = Arc::new(VenueAApi::new(
            config.venue_a.api_url.clone(),
            config.venue_a.api_key.clone(),
        )?);
        let venue_b_api: Arc<dyn crate::exchange::VenueApi> = Arc::new(VenueBApi::new(
            config.venue_b.api_url.clone(),
            config.venue_b.api_key.clone(),
            config.venue_b.private_key.clone(),
        )?);

        let (tx_a, rx_a) = mpsc::channel(1024);
        let (tx_b, rx_b) = mpsc::channel(1024);

        let venue_a_client = Arc::new(VenueAClient::new(
            Venue::A,
            config.venue_a.ws_url.clone(),
            config.venue_a.api_key.clone(),
            VenueACodec,
            Arc::clone(&book_store),
            tx_a,
        ));
        let venue_b_client = Arc::new(VenueBClient::new(
            Venue::B,
            config.venue_b.ws_url.clone(),
            config.venue_b.api_key.clone(),
            VenueBCodec,
            Arc::clone(&book_store),
            tx_b,
        ));

        let resolver = Arc::new(MarketIdentityResolver::new(config.similarity_threshold));

        let detector = Arc::new(ArbitrageDetector::new(
            Arc::clone(&config),
            Arc::clone(&opportunity_store),
            Arc::clone(&market_store),
            Arc::clone(&event_bus),
        ));

        let coordinator = Arc::new(ExecutionCoordinator::new(
            Arc::clone(&config),
            Arc::clone(&opportunity_store),
            Arc::clone(&trade_store),
            Arc::clone(&market_store),
            Arc::clone(&venue_a_api),
            Arc::clone(&venue_b_api),
            Arc::clone(&event_bus),
        ));

        detector
            .bootstrap_subscriptions(venue_a_client.as_ref(), venue_b_client.as_ref())
            .await?;

        venue_a_client.connect().await?;
        venue_b_client.connect().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        spawn_event_pump(Venue::A, rx_a, Arc::clone(&detector), shutdown_rx.clone());
        spawn_event_pump(Venue::B, rx_b, Arc::clone(&detector), shutdown_rx);

        let handle = Arc::new(EngineHandle::new(
            config,
            market_store,
            opportunity_store,
            trade_store,
            coordinator,
            resolver,
            venue_a_api,
            venue_b_api,
            event_bus,
        ));

        info!("engine bootstrap complete");
        Ok(Self { handle, venue_a_client, venue_b_client, shutdown_tx })
    }

    #[must_use]
    pub fn handle(&self) -> Arc<EngineHandle> {
        Arc::clone(&self.handle)
    }

    /// Signal every long-lived task to stop and disconnect both Venue
    /// Clients.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.venue_a_client.disconnect().await;
        self.venue_b_client.disconnect().await;
        info!("engine shutdown complete");
    }
}

/// Feed one venue's `VenueEvent`s into the Detector until `shutdown_rx`
/// fires. Each venue gets its own pump so a slow Detector call on one
/// venue's event never blocks the other's channel from draining.
fn spawn_event_pump(
    venue: Venue,
    mut events: mpsc::Receiver<VenueEvent>,
    detector: Arc<ArbitrageDetector>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!(%venue, "event pump shutting down");
                        return;
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!(%venue, "venue event channel closed");
                        return;
                    };
                    if let Err(err) = detector.handle_event(venue, event).await {
                        warn!(%venue, %err, "detector failed to handle venue event");
                    }
                }
            }
        }
    });
}
