//! Generic `VenueClient` driving a single `tokio-tungstenite` connection.
//!
//! One instance owns the connect/auth/resubscribe handshake, a read loop, a
//! 30s heartbeat, and the reconnect-with-backoff loop (spec §4.1). The
//! venue-specific wire format is supplied by a [`VenueCodec`]; everything
//! else — the state machine, the desired-subscription set, the heartbeat
//! cadence — is shared.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashSet;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::warn;
use url::Url;

use super::codec::{DecodedFrame, VenueCodec};
use super::reconnect::ReconnectPolicy;
use super::traits::{ConnectionState, VenueClient, VenueEvent};
use crate::book::OrderBookStore;
use crate::domain::{OrderBook, Venue, VenueMarketId};
use crate::error::{Error, Result};

const AUTH_TIMEOUT: Duration = Duration::from_secs(5);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const MISSED_PONG_LIMIT: u32 = 2;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

struct Inner<C: VenueCodec> {
    venue: Venue,
    ws_url: Url,
    api_key: String,
    codec: C,
    book_store: Arc<OrderBookStore>,
    events_tx: mpsc::Sender<VenueEvent>,
    desired_subscriptions: DashSet<VenueMarketId>,
    state: Mutex<ConnectionState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    reconnect_policy: ReconnectPolicy,
    /// Bumped by `disconnect()` to invalidate any background driver task
    /// still running from a prior `connect()`.
    generation: Mutex<u64>,
}

/// A concrete `VenueClient` for one venue's WebSocket feed, parameterized
/// over that venue's wire protocol.
pub struct WebSocketVenueClient<C: VenueCodec + 'static> {
    inner: Arc<Inner<C>>,
}

impl<C: VenueCodec + 'static> Clone for WebSocketVenueClient<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: VenueCodec + 'static> WebSocketVenueClient<C> {
    #[must_use]
    pub fn new(
        venue: Venue,
        ws_url: Url,
        api_key: String,
        codec: C,
        book_store: Arc<OrderBookStore>,
        events_tx: mpsc::Sender<VenueEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                venue,
                ws_url,
                api_key,
                codec,
                book_store,
                events_tx,
                desired_subscriptions: DashSet::new(),
                state: Mutex::new(ConnectionState::Idle),
                outbound: Mutex::new(None),
                reconnect_policy: ReconnectPolicy::default(),
                generation: Mutex::new(0),
            }),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.inner.state.lock() = state;
    }

    async fn open_once(&self) -> Result<(WsWrite, WsRead)> {
        self.set_state(ConnectionState::Connecting);
        let (stream, _response) = connect_async(self.inner.ws_url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        if self.inner.codec.requires_auth() {
            self.set_state(ConnectionState::AuthPending);
            write.send(self.inner.codec.encode_auth(&self.inner.api_key)).await?;
            let authed =
                tokio::time::timeout(AUTH_TIMEOUT, Self::await_auth(&mut read, &self.inner.codec))
                    .await
                    .map_err(|_| Error::Auth("auth handshake timed out".into()))??;
            if !authed {
                return Err(Error::Auth("venue rejected credentials".into()));
            }
        }

        self.set_state(ConnectionState::Open);
        let _ = self.inner.events_tx.send(VenueEvent::Connected).await;

        for entry in self.inner.desired_subscriptions.iter() {
            let _ = write.send(self.inner.codec.encode_subscribe(&entry)).await;
        }

        Ok((write, read))
    }

    async fn await_auth(read: &mut WsRead, codec: &C) -> Result<bool> {
        while let Some(msg) = read.next().await {
            if let Message::Text(text) = msg? {
                if let Ok(DecodedFrame::AuthResult { success }) = codec.decode(&text) {
                    return Ok(success);
                }
            }
        }
        Err(Error::Auth("stream closed before auth completed".into()))
    }

    async fn handle_text_frame(&self, text: &str) {
        match self.inner.codec.decode(text) {
            Ok(DecodedFrame::OrderBook { venue_market_id, bids, asks }) => {
                let book = OrderBook::new(bids, asks, Utc::now());
                self.inner.book_store.update(self.inner.venue, venue_market_id.clone(), book.clone());
                let _ = self
                    .inner
                    .events_tx
                    .send(VenueEvent::OrderBook {
                        venue_market_id,
                        bids: book.bids,
                        asks: book.asks,
                        timestamp: book.timestamp,
                    })
                    .await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(venue = ?self.inner.venue, error = %e, "dropping malformed venue message");
            }
        }
    }

    /// Runs the heartbeat/read/reconnect loop for as long as `generation`
    /// remains current. Each iteration of the outer loop is one connected
    /// session; when a session ends the function falls through into the
    /// backoff loop and, on a successful reconnect, starts the next session
    /// without recursing.
    async fn drive(
        &self,
        write: WsWrite,
        read: WsRead,
        outbound_rx: mpsc::UnboundedReceiver<Message>,
        generation: u64,
    ) {
        let mut write = write;
        let mut read = read;
        let mut outbound_rx = outbound_rx;

        loop {
            if *self.inner.generation.lock() != generation {
                return;
            }

            let disconnect_reason = self.run_session(&mut write, &mut read, &mut outbound_rx).await;

            *self.inner.outbound.lock() = None;
            let _ = self.inner.events_tx.send(VenueEvent::Disconnected { reason: disconnect_reason }).await;

            if *self.inner.generation.lock() != generation {
                return;
            }
            self.set_state(ConnectionState::Reconnecting { attempt: 0 });

            let mut attempt = 0u32;
            loop {
                if *self.inner.generation.lock() != generation {
                    return;
                }
                let Some(delay) = self.inner.reconnect_policy.delay_for(attempt) else {
                    let _ = self.inner.events_tx.send(VenueEvent::Error { kind: "max_retries".into() }).await;
                    self.set_state(ConnectionState::Idle);
                    return;
                };
                self.set_state(ConnectionState::Reconnecting { attempt });
                tokio::time::sleep(delay).await;
                if *self.inner.generation.lock() != generation {
                    return;
                }
                match self.open_once().await {
                    Ok((w, r)) => {
                        let (tx, rx) = mpsc::unbounded_channel();
                        *self.inner.outbound.lock() = Some(tx);
                        write = w;
                        read = r;
                        outbound_rx = rx;
                        break;
                    }
                    Err(e) => {
                        let _ = self.inner.events_tx.send(VenueEvent::Error { kind: e.to_string() }).await;
                        attempt += 1;
                    }
                }
            }
        }
    }

    /// Drives one connected session until the stream closes, errors, or the
    /// heartbeat goes unanswered. Returns the human-readable reason.
    async fn run_session(
        &self,
        write: &mut WsWrite,
        read: &mut WsRead,
        outbound_rx: &mut mpsc::UnboundedReceiver<Message>,
    ) -> String {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await; // first tick fires immediately; consume it
        let mut missed_pongs = 0u32;

        loop {
            tokio::select! {
                biased;
                outgoing = outbound_rx.recv() => {
                    match outgoing {
                        Some(msg) => { let _ = write.send(msg).await; }
                        None => return "client disconnected".to_string(),
                    }
                }
                _ = heartbeat.tick() => {
                    missed_pongs += 1;
                    if missed_pongs > MISSED_PONG_LIMIT {
                        return "heartbeat timeout".to_string();
                    }
                    if write.send(self.inner.codec.encode_ping()).await.is_err() {
                        return "heartbeat send failed".to_string();
                    }
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Pong(_))) => missed_pongs = 0,
                        Some(Ok(Message::Text(text))) => {
                            missed_pongs = 0;
                            self.handle_text_frame(&text).await;
                        }
                        Some(Ok(Message::Close(close_frame))) => {
                            return close_frame.map(|f| f.reason.to_string()).unwrap_or_default();
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return e.to_string(),
                        None => return "stream ended".to_string(),
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<C: VenueCodec + 'static> VenueClient for WebSocketVenueClient<C> {
    fn venue(&self) -> Venue {
        self.inner.venue
    }

    fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    async fn connect(&self) -> Result<()> {
        if matches!(
            self.state(),
            ConnectionState::Open | ConnectionState::Connecting | ConnectionState::AuthPending
        ) {
            return Ok(());
        }

        let (write, read) = self.open_once().await?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        *self.inner.outbound.lock() = Some(outbound_tx);

        let generation = {
            let mut g = self.inner.generation.lock();
            *g += 1;
            *g
        };

        let client = self.clone();
        tokio::spawn(async move {
            client.drive(write, read, outbound_rx, generation).await;
        });

        Ok(())
    }

    async fn subscribe(&self, venue_market_id: VenueMarketId) -> Result<()> {
        self.inner.desired_subscriptions.insert(venue_market_id.clone());
        let outbound = self.inner.outbound.lock();
        if let Some(tx) = outbound.as_ref() {
            let _ = tx.send(self.inner.codec.encode_subscribe(&venue_market_id));
        }
        Ok(())
    }

    async fn unsubscribe(&self, venue_market_id: VenueMarketId) -> Result<()> {
        self.inner.desired_subscriptions.remove(&venue_market_id);
        let outbound = self.inner.outbound.lock();
        if let Some(tx) = outbound.as_ref() {
            let _ = tx.send(self.inner.codec.encode_unsubscribe(&venue_market_id));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        *self.inner.generation.lock() += 1;
        *self.inner.outbound.lock() = None;
        self.inner.desired_subscriptions.clear();
        self.set_state(ConnectionState::Idle);
    }
}
