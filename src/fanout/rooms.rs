use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

/// Per-process forwarding of bus content to locally connected clients.
///
/// The transport layer `join`s a room for each client socket and relays what
/// it receives; only this process's clients are reached through here.
pub struct Rooms {
    rooms: DashMap<String, broadcast::Sender<Value>>,
    capacity: usize,
}

impl Rooms {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    pub fn join(&self, wid: &str) -> broadcast::Receiver<Value> {
        self.rooms
            .entry(wid.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send `content` to every client in `wid`. Returns how many received it.
    pub fn emit(&self, wid: &str, content: &Value) -> usize {
        let Some(room) = self.rooms.get(wid) else {
            return 0;
        };

        match room.send(content.clone()) {
            Ok(receivers) => receivers,
            Err(_) => {
                // Everyone left; forget the room
                drop(room);
                self.rooms.remove_if(wid, |_, sender| sender.receiver_count() == 0);
                0
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for Rooms {
    fn default() -> Self {
        Self::new(256)
    }
}
