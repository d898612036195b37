// ============================================================================
// Whiteboard Sync
// ============================================================================
//
// Event store and multi-instance synchronization for collaborative
// whiteboards:
//
// - event_store/ - per-whiteboard event logs with undo/redo
// - persistence/ - memory -> durable store -> file cascade, debounced writes
// - fanout/      - cross-process publish/subscribe and local forwarding
//
// The transport layer (HTTP/WebSocket, auth, sanitizing) lives outside this
// crate and talks to `EventStore` and `Fanout`.
//
// ============================================================================

pub mod config;
pub mod errors;
pub mod event_store;
pub mod fanout;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod utils;

pub use config::Config;
pub use errors::{BusError, PersistenceError, WhiteboardError};
pub use event_store::EventStore;
pub use fanout::{Fanout, FanoutBus, LocalBus, RedisBus, Rooms};
pub use models::{Event, EventKind, WhiteboardId};
pub use persistence::{Cascade, DurableStore, FileStore, MemoryStore, ScyllaStore};
