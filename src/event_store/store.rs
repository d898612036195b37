use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

use super::board::Board;
use crate::errors::WhiteboardError;
use crate::metrics::Metrics;
use crate::models::{Event, EventKind, WhiteboardId};
use crate::persistence::{Cascade, PersistenceQueue, Tier};

// ============================================================================
// Event Store - in-memory whiteboard state for this process
// ============================================================================
//
// Responsibilities:
// 1. Own one Board (EventLog + UndoStack) per whiteboard id
// 2. Cold-load boards through the persistence cascade on first access
// 3. Apply events and hand snapshots to the persistence queue
// 4. Debounce file writes: one pending timer per id
//
// A board that has been loaded (even empty) stays authoritative until the
// process exits. `clear` empties it in place instead of evicting it, so a
// clear is never undone by a cold load racing the tier deletes.
//
// ============================================================================

struct Entry {
    board: Board,
    /// Flips to true once the cold load for this entry has been settled
    ready: watch::Receiver<bool>,
}

impl Entry {
    fn loaded(board: Board) -> Self {
        let (_, ready) = watch::channel(true);
        Self { board, ready }
    }
}

struct Inner {
    boards: Mutex<HashMap<WhiteboardId, Entry>>,
    /// Pending debounced file writes: id -> timer token
    flush_pending: Mutex<HashMap<WhiteboardId, u64>>,
    next_token: Mutex<u64>,
    cascade: Arc<Cascade>,
    queue: PersistenceQueue,
    metrics: Arc<Metrics>,
}

/// Handle to the process-wide whiteboard state. Cheap to clone.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<Inner>,
}

impl EventStore {
    /// Build the store and start its persistence workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(cascade: Cascade) -> Self {
        let cascade = Arc::new(cascade);
        let metrics = cascade.metrics().clone();
        let queue = PersistenceQueue::spawn(cascade.clone());

        Self {
            inner: Arc::new(Inner {
                boards: Mutex::new(HashMap::new()),
                flush_pending: Mutex::new(HashMap::new()),
                next_token: Mutex::new(0),
                cascade,
                queue,
                metrics,
            }),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }

    /// The committed event log for `id`, cold-loading it on first access.
    pub async fn get(&self, id: &WhiteboardId) -> Vec<Event> {
        self.ensure_loaded(id).await;
        self.inner
            .boards()
            .get(id)
            .map(|entry| entry.board.events.clone())
            .unwrap_or_default()
    }

    /// Number of undone events available for redo. Does not cold-load.
    pub fn undo_depth(&self, id: &WhiteboardId) -> usize {
        self.inner
            .boards()
            .get(id)
            .map(|entry| entry.board.undo_depth())
            .unwrap_or(0)
    }

    /// Apply one event; events without a known `t` are ignored.
    pub async fn apply(&self, id: &WhiteboardId, event: Event) {
        let Some(kind) = event.kind() else {
            self.inner.metrics.events_ignored.inc();
            tracing::debug!(whiteboard = %id, tag = ?event.tag(), "Ignoring event with unknown type");
            return;
        };

        if kind == EventKind::Clear {
            self.clear(id);
            self.inner.metrics.record_applied(kind.as_str());
            return;
        }

        self.ensure_loaded(id).await;

        let snapshot = {
            let mut boards = self.inner.boards();
            let Some(entry) = boards.get_mut(id) else {
                return;
            };
            if !entry.board.apply(kind, event) {
                tracing::debug!(whiteboard = %id, event_type = kind.as_str(), "Event left board unchanged");
                return;
            }
            entry.board.events.clone()
        };

        self.inner.metrics.record_applied(kind.as_str());
        self.persist(id, snapshot);
    }

    /// Copy `source`'s log into `target`, only if `source` has events and
    /// `target` has none.
    pub async fn copy(&self, source: &WhiteboardId, target: &WhiteboardId) {
        let events = self.get(source).await;
        self.ensure_loaded(target).await;

        if self.adopt(target, events) {
            tracing::info!(source = %source, target = %target, "Copied whiteboard");
        }
    }

    /// Bulk-set the log of an empty board.
    pub async fn replace_all(&self, id: &WhiteboardId, events: Vec<Event>) {
        self.ensure_loaded(id).await;

        if self.adopt(id, events) {
            tracing::info!(whiteboard = %id, "Replaced whiteboard contents");
        }
    }

    // ------------------------------------------------------------------------
    // Transport-facing API (raw ids and content)
    // ------------------------------------------------------------------------

    /// Apply transport content `{t, wid, ...}`.
    ///
    /// Content without a `wid` is ignored; an unsafe `wid` is an error.
    pub async fn deliver(&self, content: Value) -> Result<(), WhiteboardError> {
        match Event::from_content(content)? {
            Some((id, event)) => self.apply(&id, event).await,
            None => {
                self.inner.metrics.events_ignored.inc();
                tracing::debug!("Ignoring content without whiteboard id");
            }
        }
        Ok(())
    }

    pub async fn load_board(&self, wid: &str) -> Result<Vec<Event>, WhiteboardError> {
        let id = WhiteboardId::parse(wid)?;
        Ok(self.get(&id).await)
    }

    pub async fn copy_board(&self, source: &str, target: &str) -> Result<(), WhiteboardError> {
        let source = WhiteboardId::parse(source)?;
        let target = WhiteboardId::parse(target)?;
        self.copy(&source, &target).await;
        Ok(())
    }

    pub async fn replace_board(&self, wid: &str, events: Vec<Event>) -> Result<(), WhiteboardError> {
        let id = WhiteboardId::parse(wid)?;
        self.replace_all(&id, events).await;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence control
    // ------------------------------------------------------------------------

    /// Write every board with a pending debounced write right now.
    pub fn flush_pending(&self) {
        let pending: Vec<WhiteboardId> = self.inner.pending().drain().map(|(id, _)| id).collect();

        for id in pending {
            self.inner.flush_file(&id);
        }
    }

    /// Wait for every persistence job queued so far.
    pub async fn settle(&self) {
        self.inner.queue.settle().await;
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Cold-load `id` once. The load runs in its own task, so a caller that
    /// gives up waiting never leaves a half-loaded placeholder behind.
    async fn ensure_loaded(&self, id: &WhiteboardId) {
        let mut ready = {
            let mut boards = self.inner.boards();
            match boards.get(id) {
                Some(entry) => entry.ready.clone(),
                None => {
                    let (tx, rx) = watch::channel(false);
                    boards.insert(
                        id.clone(),
                        Entry {
                            board: Board::default(),
                            ready: rx.clone(),
                        },
                    );
                    self.spawn_load(id.clone(), tx);
                    rx
                }
            }
        };

        // Err only if the load task died; the placeholder stays usable
        let _ = ready.wait_for(|ready| *ready).await;
    }

    fn spawn_load(&self, id: WhiteboardId, ready: watch::Sender<bool>) {
        let store = self.clone();

        tokio::spawn(async move {
            let events = store.inner.cascade.read(&id).await;
            store.install(&id, events);
            let _ = ready.send(true);
        });
    }

    /// Install a cold-load result unless the placeholder was touched meanwhile.
    fn install(&self, id: &WhiteboardId, events: Vec<Event>) {
        let mut boards = self.inner.boards();
        match boards.get_mut(id) {
            Some(entry) if entry.board.revision == 0 => {
                tracing::debug!(whiteboard = %id, events = events.len(), "Board loaded");
                entry.board.events = events;
            }
            Some(_) => {
                tracing::warn!(
                    whiteboard = %id,
                    discarded = events.len(),
                    "Board changed while loading, discarding late cold load"
                );
            }
            None => {}
        }
    }

    fn clear(&self, id: &WhiteboardId) {
        {
            let mut boards = self.inner.boards();
            match boards.get_mut(id) {
                Some(entry) => entry.board.reset(),
                None => {
                    let mut board = Board::default();
                    board.reset();
                    boards.insert(id.clone(), Entry::loaded(board));
                }
            }
        }
        // A pending file write must not recreate the document
        self.inner.pending().remove(id);

        tracing::info!(whiteboard = %id, "🧹 Whiteboard cleared");
        self.inner.queue.delete(id);
    }

    fn adopt(&self, id: &WhiteboardId, events: Vec<Event>) -> bool {
        let snapshot = {
            let mut boards = self.inner.boards();
            let Some(entry) = boards.get_mut(id) else {
                return false;
            };
            if !entry.board.adopt(events) {
                return false;
            }
            entry.board.events.clone()
        };

        self.persist(id, snapshot);
        true
    }

    fn persist(&self, id: &WhiteboardId, snapshot: Vec<Event>) {
        self.inner.queue.save(Tier::Durable, id, snapshot);
        self.schedule_flush(id);
    }

    /// Arm the debounce timer for `id` unless one is already pending.
    fn schedule_flush(&self, id: &WhiteboardId) {
        if !self.inner.cascade.has_tier(Tier::File) {
            return;
        }

        let token = {
            let mut pending = self.inner.pending();
            if pending.contains_key(id) {
                return;
            }
            let token = self.inner.next_token();
            pending.insert(id.clone(), token);
            token
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.cascade.save_delay();
        let id = id.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = inner.upgrade() else {
                return;
            };
            let still_pending = {
                let mut pending = inner.pending();
                if pending.get(&id) == Some(&token) {
                    pending.remove(&id);
                    true
                } else {
                    false
                }
            };
            if still_pending {
                inner.flush_file(&id);
            }
        });
    }
}

impl Inner {
    fn boards(&self) -> MutexGuard<'_, HashMap<WhiteboardId, Entry>> {
        self.boards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<WhiteboardId, u64>> {
        self.flush_pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_token(&self) -> u64 {
        let mut next = self.next_token.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        *next
    }

    /// Queue a file write of the board as it is now.
    fn flush_file(&self, id: &WhiteboardId) {
        let snapshot = self.boards().get(id).map(|entry| entry.board.events.clone());

        if let Some(events) = snapshot {
            tracing::debug!(whiteboard = %id, events = events.len(), "Flushing board to file");
            self.queue.save(Tier::File, id, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PersistenceError;
    use crate::persistence::{DurableStore, FileStore, MemoryStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn id(raw: &str) -> WhiteboardId {
        WhiteboardId::parse(raw).unwrap()
    }

    fn event(value: Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    fn pen(user: &str, draw_id: &str) -> Event {
        event(json!({"t": "pen", "username": user, "drawId": draw_id, "d": [0, 0, 10, 10], "c": "#000"}))
    }

    fn metrics() -> Arc<Metrics> {
        Arc::new(Metrics::new().unwrap())
    }

    fn memory_only() -> EventStore {
        EventStore::new(Cascade::new(metrics()))
    }

    fn with_durable(store: Arc<MemoryStore>) -> EventStore {
        EventStore::new(Cascade::new(metrics()).with_durable(store))
    }

    async fn with_files(tmp: &tempfile::TempDir, delay: Duration) -> EventStore {
        let files = FileStore::open(tmp.path()).await.unwrap();
        EventStore::new(Cascade::new(metrics()).with_file(files, delay))
    }

    /// Durable store whose loads block until released.
    struct GatedStore {
        inner: MemoryStore,
        gate: Notify,
    }

    #[async_trait]
    impl DurableStore for GatedStore {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn load(&self, id: &WhiteboardId) -> Result<Option<Vec<Event>>, PersistenceError> {
            self.gate.notified().await;
            self.inner.load(id).await
        }

        async fn save(&self, id: &WhiteboardId, events: &[Event]) -> Result<(), PersistenceError> {
            self.inner.save(id, events).await
        }

        async fn delete(&self, id: &WhiteboardId) -> Result<(), PersistenceError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_drawing_events_are_returned_in_order_without_wid() {
        let store = memory_only();

        let contents: Vec<Value> = (0..5)
            .map(|n| json!({"t": "line", "wid": "w1", "username": "alice", "drawId": n, "d": [n, n, n, n]}))
            .collect();
        for content in contents.clone() {
            store.deliver(content).await.unwrap();
        }

        let events = store.get(&id("w1")).await;
        assert_eq!(events.len(), 5);
        for (n, e) in events.iter().enumerate() {
            assert!(!e.fields().contains_key("wid"));
            assert_eq!(e.draw_id(), Some(&json!(n)));
        }
    }

    #[tokio::test]
    async fn test_pen_undo_redo_scenario() {
        let store = memory_only();
        let w1 = id("w1");

        store
            .deliver(json!({"t": "pen", "wid": "w1", "username": "alice", "drawId": "d1", "d": [1, 2, 3, 4]}))
            .await
            .unwrap();
        let original = store.get(&w1).await;

        store.deliver(json!({"t": "undo", "wid": "w1", "username": "alice"})).await.unwrap();
        assert!(store.get(&w1).await.is_empty());
        assert_eq!(store.undo_depth(&w1), 1);

        store.deliver(json!({"t": "redo", "wid": "w1", "username": "alice"})).await.unwrap();
        let restored = store.get(&w1).await;
        assert_eq!(restored.len(), 1);
        assert_eq!(restored, original);
    }

    #[tokio::test]
    async fn test_unknown_or_missing_type_is_ignored() {
        let store = memory_only();

        store.deliver(json!({"t": "cursor", "wid": "w1"})).await.unwrap();
        store.deliver(json!({"wid": "w1", "d": [1]})).await.unwrap();
        store.deliver(json!({"t": "pen"})).await.unwrap();

        assert!(store.get(&id("w1")).await.is_empty());
        assert_eq!(store.metrics().events_ignored.get(), 3);
    }

    #[tokio::test]
    async fn test_unsafe_wid_is_rejected() {
        let store = memory_only();

        let result = store.deliver(json!({"t": "pen", "wid": "../secrets"})).await;
        assert!(matches!(result, Err(WhiteboardError::InvalidIdentifier(_))));
        assert!(store.load_board("a/b").await.is_err());
        assert!(store.copy_board("ok", "..").await.is_err());
        assert!(store.replace_board("", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_textbox_edits_keep_only_latest() {
        let store = memory_only();
        for body in ["aGk=", "aGVsbG8="] {
            store
                .deliver(json!({"t": "setTextboxText", "wid": "w1", "username": "bob", "drawId": "t", "d": ["tb1", body]}))
                .await
                .unwrap();
        }

        let events = store.get(&id("w1")).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fields()["d"][1], json!("aGVsbG8="));
    }

    #[tokio::test]
    async fn test_clear_empties_board_and_durable_record() {
        let durable = Arc::new(MemoryStore::new());
        let store = with_durable(durable.clone());
        let w1 = id("w1");

        store.apply(&w1, pen("alice", "d1")).await;
        store.apply(&w1, pen("alice", "d2")).await;
        store.apply(&w1, event(json!({"t": "undo", "username": "alice"}))).await;
        store.settle().await;
        assert!(durable.record(&w1).is_some());

        store.apply(&w1, event(json!({"t": "clear"}))).await;
        store.settle().await;

        assert!(store.get(&w1).await.is_empty());
        assert_eq!(store.undo_depth(&w1), 0);
        assert_eq!(durable.record(&w1), None);
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_cancels_pending_write() {
        let tmp = tempfile::tempdir().unwrap();
        let store = with_files(&tmp, Duration::from_millis(50)).await;
        let w1 = id("w1");

        store.apply(&w1, pen("alice", "d1")).await;
        store.flush_pending();
        store.settle().await;
        assert!(tmp.path().join("w1.json").exists());

        store.apply(&w1, pen("alice", "d2")).await;
        store.apply(&w1, event(json!({"t": "clear"}))).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        store.settle().await;

        assert!(!tmp.path().join("w1.json").exists());
    }

    #[tokio::test]
    async fn test_durable_write_follows_every_mutation() {
        let durable = Arc::new(MemoryStore::new());
        let store = with_durable(durable.clone());
        let w1 = id("w1");

        store.apply(&w1, pen("alice", "d1")).await;
        store.apply(&w1, pen("bob", "d2")).await;
        store.settle().await;

        assert_eq!(durable.record(&w1), Some(vec![pen("alice", "d1"), pen("bob", "d2")]));
    }

    #[tokio::test]
    async fn test_noop_mutations_do_not_persist() {
        let durable = Arc::new(MemoryStore::new());
        let store = with_durable(durable.clone());
        let w1 = id("w1");

        store.apply(&w1, event(json!({"t": "undo", "username": "alice"}))).await;
        store.apply(&w1, event(json!({"t": "redo", "username": "alice"}))).await;
        store.replace_all(&w1, vec![]).await;
        store.settle().await;

        assert_eq!(durable.record(&w1), None);
    }

    #[tokio::test]
    async fn test_file_writes_are_debounced() {
        let tmp = tempfile::tempdir().unwrap();
        let store = with_files(&tmp, Duration::from_millis(100)).await;
        let w1 = id("w1");
        let path = tmp.path().join("w1.json");

        store.apply(&w1, pen("alice", "d1")).await;
        store.apply(&w1, pen("alice", "d2")).await;
        store.settle().await;
        assert!(!path.exists(), "write must wait for the debounce window");

        // lands inside the same window, captured because the flush reads at fire time
        store.apply(&w1, pen("alice", "d3")).await;

        tokio::time::sleep(Duration::from_millis(250)).await;
        store.settle().await;

        let written: Vec<Event> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 3);
    }

    #[tokio::test]
    async fn test_flush_pending_writes_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let store = with_files(&tmp, Duration::from_secs(3600)).await;

        store.apply(&id("w1"), pen("alice", "d1")).await;
        store.apply(&id("w2"), pen("bob", "d1")).await;
        store.flush_pending();
        store.settle().await;

        assert!(tmp.path().join("w1.json").exists());
        assert!(tmp.path().join("w2.json").exists());
    }

    #[tokio::test]
    async fn test_cold_load_from_file_after_restart() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = with_files(&tmp, Duration::from_secs(3600)).await;
            store.apply(&id("w1"), pen("alice", "d1")).await;
            store.flush_pending();
            store.settle().await;
        }

        let restarted = with_files(&tmp, Duration::from_secs(3600)).await;
        assert_eq!(restarted.get(&id("w1")).await, vec![pen("alice", "d1")]);
    }

    #[tokio::test]
    async fn test_loaded_board_is_never_reloaded() {
        let durable = Arc::new(MemoryStore::new());
        let store = with_durable(durable.clone());
        let w1 = id("w1");

        assert!(store.get(&w1).await.is_empty());
        durable.insert(&w1, vec![pen("ghost", "d9")]);

        assert!(store.get(&w1).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_durable_store_without_file_tier() {
        let durable = Arc::new(MemoryStore::new());
        durable.set_available(false);
        let store = with_durable(durable);
        let w1 = id("w1");

        assert!(store.get(&w1).await.is_empty());

        store.apply(&w1, pen("alice", "d1")).await;
        store.settle().await;
        assert_eq!(store.get(&w1).await, vec![pen("alice", "d1")]);
    }

    #[tokio::test]
    async fn test_copy_makes_independent_copy() {
        let store = memory_only();
        let (a, b) = (id("a"), id("b"));
        store.apply(&a, pen("alice", "d1")).await;

        store.copy(&a, &b).await;
        store.apply(&a, pen("alice", "d2")).await;

        assert_eq!(store.get(&b).await, vec![pen("alice", "d1")]);
        assert_eq!(store.get(&a).await.len(), 2);
    }

    #[tokio::test]
    async fn test_copy_is_noop_for_empty_source_or_filled_target() {
        let store = memory_only();
        let (a, b, c) = (id("a"), id("b"), id("c"));
        store.apply(&b, pen("bob", "d1")).await;

        store.copy(&a, &c).await;
        assert!(store.get(&c).await.is_empty());

        store.apply(&a, pen("alice", "d1")).await;
        store.copy(&a, &b).await;
        assert_eq!(store.get(&b).await, vec![pen("bob", "d1")]);
    }

    #[tokio::test]
    async fn test_replace_board_only_fills_empty_board() {
        let store = memory_only();

        store.replace_board("w1", vec![pen("alice", "d1")]).await.unwrap();
        store.replace_board("w1", vec![pen("bob", "d2")]).await.unwrap();

        assert_eq!(store.load_board("w1").await.unwrap(), vec![pen("alice", "d1")]);
    }

    #[tokio::test]
    async fn test_concurrent_apply_waits_for_cold_load() {
        let durable = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            gate: Notify::new(),
        });
        durable.inner.insert(&id("w1"), vec![pen("alice", "d0")]);
        let store = EventStore::new(Cascade::new(metrics()).with_durable(durable.clone()));

        let loading = tokio::spawn({
            let store = store.clone();
            async move { store.get(&id("w1")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let applying = tokio::spawn({
            let store = store.clone();
            async move { store.apply(&id("w1"), pen("bob", "d1")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        durable.gate.notify_one();
        loading.await.unwrap();
        applying.await.unwrap();

        assert_eq!(store.get(&id("w1")).await, vec![pen("alice", "d0"), pen("bob", "d1")]);
    }

    #[tokio::test]
    async fn test_abandoned_cold_load_still_completes() {
        let durable = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            gate: Notify::new(),
        });
        durable.inner.insert(&id("w1"), vec![pen("alice", "d0")]);
        let store = EventStore::new(Cascade::new(metrics()).with_durable(durable.clone()));

        let loading = tokio::spawn({
            let store = store.clone();
            async move { store.get(&id("w1")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        loading.abort();

        let applying = tokio::spawn({
            let store = store.clone();
            async move { store.apply(&id("w1"), pen("bob", "d1")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        durable.gate.notify_one();
        applying.await.unwrap();
        store.settle().await;

        let expected = vec![pen("alice", "d0"), pen("bob", "d1")];
        assert_eq!(store.get(&id("w1")).await, expected);
        assert_eq!(durable.inner.record(&id("w1")), Some(expected));
    }

    #[tokio::test]
    async fn test_late_cold_load_is_discarded_after_clear() {
        let durable = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            gate: Notify::new(),
        });
        durable.inner.insert(&id("w1"), vec![pen("alice", "d0")]);
        let store = EventStore::new(Cascade::new(metrics()).with_durable(durable.clone()));

        let loading = tokio::spawn({
            let store = store.clone();
            async move { store.get(&id("w1")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.apply(&id("w1"), event(json!({"t": "clear"}))).await;
        durable.gate.notify_one();

        assert!(loading.await.unwrap().is_empty());
        assert!(store.get(&id("w1")).await.is_empty());
    }
}
