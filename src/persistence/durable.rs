use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::errors::PersistenceError;
use crate::models::{Event, WhiteboardId};

// ============================================================================
// Durable Store - network-backed snapshot storage
// ============================================================================
//
// One record per whiteboard id holding the full event log. Saves replace
// the whole record; nothing is ever merged.
//
// `load` distinguishes "no record" (None) from "record exists but is empty"
// (Some(vec![])). Only the former falls through to the file tier.
//
// ============================================================================

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    async fn load(&self, id: &WhiteboardId) -> Result<Option<Vec<Event>>, PersistenceError>;

    async fn save(&self, id: &WhiteboardId, events: &[Event]) -> Result<(), PersistenceError>;

    async fn delete(&self, id: &WhiteboardId) -> Result<(), PersistenceError>;
}

/// In-process durable store.
///
/// Used for single-node setups and as a test double; `set_available(false)`
/// makes every call fail like an unreachable server.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<WhiteboardId, Vec<Event>>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Current record for `id`, bypassing availability.
    pub fn record(&self, id: &WhiteboardId) -> Option<Vec<Event>> {
        self.lock().get(id).cloned()
    }

    pub fn insert(&self, id: &WhiteboardId, events: Vec<Event>) {
        self.lock().insert(id.clone(), events);
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WhiteboardId, Vec<Event>>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, id: &WhiteboardId) -> Result<Option<Vec<Event>>, PersistenceError> {
        self.check()?;
        Ok(self.lock().get(id).cloned())
    }

    async fn save(&self, id: &WhiteboardId, events: &[Event]) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().insert(id.clone(), events.to_vec());
        Ok(())
    }

    async fn delete(&self, id: &WhiteboardId) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().remove(id);
        Ok(())
    }
}
