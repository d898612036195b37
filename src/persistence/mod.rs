// ============================================================================
// Persistence Cascade
// ============================================================================
//
// Read priority (the in-memory tier lives in the EventStore):
//
//   durable store  ->  file  ->  empty
//
// Failure policy: no tier failure ever reaches the caller. Reads degrade to
// the next tier, writes and deletes are logged and counted.
//
// ============================================================================

pub mod connection;
pub mod durable;
pub mod file;
pub mod queue;
pub mod scylla;

use std::sync::Arc;
use std::time::Duration;

use crate::metrics::Metrics;
use crate::models::{Event, WhiteboardId};

pub use self::connection::{ConnectionManager, ConnectionStatus};
pub use self::durable::{DurableStore, MemoryStore};
pub use self::file::FileStore;
pub use self::queue::PersistenceQueue;
pub use self::scylla::ScyllaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Durable,
    File,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Durable => "durable",
            Tier::File => "file",
        }
    }
}

pub struct Cascade {
    durable: Option<Arc<dyn DurableStore>>,
    file: Option<FileStore>,
    save_delay: Duration,
    metrics: Arc<Metrics>,
}

impl Cascade {
    /// A cascade with no durable tiers; add them with the builder methods.
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            durable: None,
            file: None,
            save_delay: Duration::from_secs(10),
            metrics,
        }
    }

    pub fn with_durable(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn with_file(mut self, store: FileStore, save_delay: Duration) -> Self {
        self.file = Some(store);
        self.save_delay = save_delay;
        self
    }

    pub fn has_tier(&self, tier: Tier) -> bool {
        match tier {
            Tier::Durable => self.durable.is_some(),
            Tier::File => self.file.is_some(),
        }
    }

    /// Debounce window for file writes
    pub fn save_delay(&self) -> Duration {
        self.save_delay
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Cold-load a board. Never fails; a board nobody has written is empty.
    pub async fn read(&self, id: &WhiteboardId) -> Vec<Event> {
        if let Some(store) = &self.durable {
            match store.load(id).await {
                Ok(Some(events)) => {
                    self.metrics.record_cold_load(Tier::Durable.as_str());
                    return events;
                }
                Ok(None) => {
                    tracing::debug!(whiteboard = %id, store = store.name(), "No durable record");
                }
                Err(e) => {
                    self.metrics.record_persistence_failure(Tier::Durable.as_str(), "load");
                    tracing::error!(
                        whiteboard = %id,
                        store = store.name(),
                        error = %e,
                        "Failed to load board from durable store"
                    );
                }
            }
        }

        if let Some(file) = &self.file {
            match file.load(id).await {
                Ok(Some(events)) => {
                    self.metrics.record_cold_load(Tier::File.as_str());
                    return events;
                }
                Ok(None) => {}
                Err(e) => {
                    self.metrics.record_persistence_failure(Tier::File.as_str(), "load");
                    tracing::error!(whiteboard = %id, error = %e, "Failed to load board from file");
                }
            }
        }

        self.metrics.record_cold_load("empty");
        Vec::new()
    }

    pub async fn save(&self, tier: Tier, id: &WhiteboardId, events: &[Event]) {
        let result = match tier {
            Tier::Durable => match &self.durable {
                Some(store) => store.save(id, events).await,
                None => return,
            },
            Tier::File => match &self.file {
                Some(file) => file.save(id, events).await,
                None => return,
            },
        };

        match result {
            Ok(()) => {
                tracing::debug!(whiteboard = %id, tier = tier.as_str(), events = events.len(), "Board saved");
            }
            Err(e) => {
                self.metrics.record_persistence_failure(tier.as_str(), "save");
                tracing::error!(
                    whiteboard = %id,
                    tier = tier.as_str(),
                    error = %e,
                    "Failed to save board"
                );
            }
        }
    }

    pub async fn delete(&self, tier: Tier, id: &WhiteboardId) {
        let result = match tier {
            Tier::Durable => match &self.durable {
                Some(store) => store.delete(id).await,
                None => return,
            },
            Tier::File => match &self.file {
                Some(file) => file.delete(id).await,
                None => return,
            },
        };

        if let Err(e) = result {
            self.metrics.record_persistence_failure(tier.as_str(), "delete");
            tracing::error!(
                whiteboard = %id,
                tier = tier.as_str(),
                error = %e,
                "Failed to delete board"
            );
        }
    }
}
