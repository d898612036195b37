// ============================================================================
// Event Store - per-whiteboard event logs and undo stacks
// ============================================================================

pub mod board;
mod store;

pub use board::{Board, UNDO_LIMIT};
pub use store::EventStore;
