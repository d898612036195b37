// ============================================================================
// Fanout - one code path for mutation and broadcast
// ============================================================================
//
// The transport publishes validated content and does NOT apply it locally.
// Every process, the originator included, learns of the event only when it
// comes back from the bus, and then:
//
//   1. drops it if it is a redelivery (origin, seq)
//   2. hands it to the lane of its whiteboard
//   3. the lane applies it to the local EventStore
//   4. the lane forwards it to this process's clients in the same whiteboard
//
// One lane (task + channel) per whiteboard keeps bus order within a board,
// while a board stuck in a cold load does not hold up the others.
//
// There is no acknowledgment and no global ordering, only per-publisher FIFO.
//
// ============================================================================

pub mod bus;
pub mod dedup;
pub mod redis;
pub mod rooms;

use dashmap::DashMap;
use futures_util::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::{BusError, WhiteboardError};
use crate::event_store::EventStore;
use crate::models::WhiteboardId;
use crate::utils::{Backoff, BackoffConfig};

pub use self::bus::{BusMessage, FanoutBus, LocalBus};
pub use self::dedup::Deduplicator;
pub use self::redis::RedisBus;
pub use self::rooms::Rooms;

pub struct Fanout {
    bus: Arc<dyn FanoutBus>,
    store: EventStore,
    rooms: Arc<Rooms>,
    origin: Uuid,
    seq: AtomicU64,
    dedup: Deduplicator,
    backoff: BackoffConfig,
    /// Per-whiteboard delivery lanes
    lanes: DashMap<WhiteboardId, mpsc::UnboundedSender<BusMessage>>,
}

impl Fanout {
    pub fn new(bus: Arc<dyn FanoutBus>, store: EventStore, rooms: Arc<Rooms>) -> Self {
        Self {
            bus,
            store,
            rooms,
            origin: Uuid::now_v7(),
            seq: AtomicU64::new(0),
            dedup: Deduplicator::new(),
            backoff: BackoffConfig::default(),
            lanes: DashMap::new(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Identifies this process as a publisher
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn rooms(&self) -> &Arc<Rooms> {
        &self.rooms
    }

    /// Send validated content `{t, wid, ...}` to every process.
    pub async fn publish(&self, content: Value) -> Result<(), BusError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = BusMessage::new(self.origin, seq, content).encode()?;

        self.bus.publish(payload).await?;
        self.store.metrics().bus_published.inc();
        Ok(())
    }

    /// Process one raw bus payload to completion. Never fails; bad input is
    /// logged and dropped.
    pub async fn handle_payload(&self, payload: &str) {
        if let Some(message) = self.accept(payload) {
            self.deliver(message).await;
        }
    }

    /// Number of whiteboards with a delivery lane
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Decode and deduplicate. Runs on the subscriber task, in bus order.
    fn accept(&self, payload: &str) -> Option<BusMessage> {
        let metrics = self.store.metrics();
        metrics.bus_received.inc();

        let message = match BusMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                metrics.record_dropped("malformed");
                tracing::error!(error = %e, "[Bus SUB] Message handling error, dropping");
                return None;
            }
        };

        if !self.dedup.accept(message.origin, message.seq) {
            metrics.record_dropped("duplicate");
            tracing::warn!(
                origin = ?message.origin,
                seq = ?message.seq,
                "Dropping duplicate bus message"
            );
            return None;
        }

        Some(message)
    }

    /// Apply to the store, then forward to local clients.
    async fn deliver(&self, message: BusMessage) {
        let wid = message.wid().map(str::to_string);
        match self.store.deliver(message.content.clone()).await {
            Ok(()) => {
                if let Some(wid) = wid {
                    let clients = self.rooms.emit(&wid, &message.content);
                    tracing::trace!(whiteboard = %wid, clients, "Forwarded to local clients");
                }
            }
            Err(WhiteboardError::InvalidIdentifier(wid)) => {
                self.store.metrics().record_dropped("invalid_wid");
                tracing::error!(wid = %wid, "Dropping bus message with unsafe whiteboard id");
            }
        }
    }

    /// Route an accepted message to its whiteboard's lane. Content that
    /// names no valid whiteboard cannot cold-load and is handled inline.
    async fn dispatch(self: &Arc<Self>, message: BusMessage) {
        let Some(id) = message.wid().and_then(|wid| WhiteboardId::parse(wid).ok()) else {
            self.deliver(message).await;
            return;
        };

        let lane = self
            .lanes
            .entry(id.clone())
            .or_insert_with(|| self.spawn_lane(&id))
            .clone();

        if let Err(mpsc::error::SendError(message)) = lane.send(message) {
            // Lane task is gone; replace it on the next message
            self.lanes.remove(&id);
            tracing::warn!(whiteboard = %id, "Delivery lane stopped, delivering inline");
            self.deliver(message).await;
        }
    }

    fn spawn_lane(self: &Arc<Self>, id: &WhiteboardId) -> mpsc::UnboundedSender<BusMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<BusMessage>();
        let fanout: Weak<Self> = Arc::downgrade(self);

        tracing::debug!(whiteboard = %id, "Opening delivery lane");
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let Some(this) = fanout.upgrade() else {
                    return;
                };
                this.deliver(message).await;
            }
        });

        tx
    }

    /// Subscribe and keep consuming in the background.
    ///
    /// The first subscription is attempted before returning, so content
    /// published after `start` resolves is seen whenever the bus is up.
    /// Lost subscriptions are re-established with exponential backoff.
    pub async fn start(self: Arc<Self>) -> JoinHandle<()> {
        let first = match self.bus.subscribe().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::error!(error = %e, "Initial bus subscription failed, retrying in background");
                None
            }
        };

        tokio::spawn(async move { self.run(first).await })
    }

    async fn run(self: Arc<Self>, mut next: Option<BoxStream<'static, String>>) {
        let mut backoff = Backoff::new(self.backoff.clone());

        loop {
            let mut messages = match next.take() {
                Some(stream) => stream,
                None => {
                    backoff.wait().await;
                    match self.bus.subscribe().await {
                        Ok(stream) => stream,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                attempt = backoff.attempt(),
                                "Bus resubscription failed"
                            );
                            continue;
                        }
                    }
                }
            };

            backoff.reset();
            while let Some(payload) = messages.next().await {
                if let Some(message) = self.accept(&payload) {
                    self.dispatch(message).await;
                }
            }

            tracing::warn!("Bus subscription ended, resubscribing");
        }
    }
}
