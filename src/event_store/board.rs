use serde_json::Value;

use crate::models::{Event, EventKind};

// ============================================================================
// Board - EventLog + UndoStack state machine for one whiteboard
// ============================================================================
//
// Pure, synchronous state. The EventStore owns one Board per id and calls
// `apply` while holding its lock, so a mutation is never interleaved with
// another one for the same process.
//
// ============================================================================

/// Oldest undo entries are dropped beyond this many.
pub const UNDO_LIMIT: usize = 1000;

#[derive(Debug, Default, Clone)]
pub struct Board {
    pub(crate) events: Vec<Event>,
    pub(crate) undo: Vec<Event>,
    /// Number of mutations applied since the board entered the cache
    pub(crate) revision: u64,
}

impl Board {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Apply a non-clear event. Returns whether the board changed.
    ///
    /// `Clear` is handled by the store since it also removes the board itself.
    pub fn apply(&mut self, kind: EventKind, event: Event) -> bool {
        let changed = match kind {
            EventKind::Clear => false,
            EventKind::Undo => self.undo(event.username().cloned()),
            EventKind::Redo => self.redo(event.username().cloned()),
            EventKind::SetTextboxText => {
                let key = event.textbox_key().cloned();
                self.events.retain(|existing| {
                    !(existing.kind() == Some(EventKind::SetTextboxText)
                        && existing.textbox_key() == key.as_ref())
                });
                self.events.push(event);
                true
            }
            EventKind::Drawing(_) => {
                self.events.push(event);
                true
            }
        };

        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Drop the log and the undo stack.
    pub fn reset(&mut self) {
        self.events.clear();
        self.undo.clear();
        self.revision += 1;
    }

    /// Take over `events` wholesale, only if this board is still empty.
    pub fn adopt(&mut self, events: Vec<Event>) -> bool {
        if !self.events.is_empty() || events.is_empty() {
            return false;
        }
        self.events = events;
        self.revision += 1;
        true
    }

    /// Move the user's latest group from the log onto the undo stack.
    fn undo(&mut self, username: Option<Value>) -> bool {
        if self.events.is_empty() {
            return false;
        }

        let moved = move_latest_group(&mut self.events, &mut self.undo, username.as_ref());

        if self.undo.len() > UNDO_LIMIT {
            let excess = self.undo.len() - UNDO_LIMIT;
            self.undo.drain(..excess);
        }

        moved > 0
    }

    /// Move the user's latest undone group back onto the log.
    fn redo(&mut self, username: Option<Value>) -> bool {
        if self.undo.is_empty() {
            return false;
        }

        move_latest_group(&mut self.undo, &mut self.events, username.as_ref()) > 0
    }
}

/// Find the newest entry in `from` authored by `username`, then move every
/// entry of its (drawId, username) group to the tail of `to`.
///
/// Collection walks indices downwards and removes in place, so entries land
/// in `to` newest-first. Doing the same on the way back restores the order.
fn move_latest_group(from: &mut Vec<Event>, to: &mut Vec<Event>, username: Option<&Value>) -> usize {
    let Some(latest) = from.iter().rposition(|e| e.same_author(username)) else {
        return 0;
    };
    let draw_id = from[latest].draw_id().cloned();

    let mut moved = 0;
    for index in (0..from.len()).rev() {
        if from[index].same_group(draw_id.as_ref(), username) {
            to.push(from.remove(index));
            moved += 1;
        }
    }
    moved
}
