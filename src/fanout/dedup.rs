use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Drops redelivered bus messages.
///
/// The bus keeps each publisher's messages in order, so remembering the
/// highest sequence number seen per origin is enough.
#[derive(Default)]
pub struct Deduplicator {
    high_water: Mutex<HashMap<Uuid, u64>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the message is new and should be applied.
    pub fn accept(&self, origin: Option<Uuid>, seq: Option<u64>) -> bool {
        let (Some(origin), Some(seq)) = (origin, seq) else {
            return true;
        };

        let mut high_water = self.high_water.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match high_water.get(&origin) {
            Some(&seen) if seq <= seen => false,
            _ => {
                high_water.insert(origin, seq);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_sequence_is_rejected() {
        let dedup = Deduplicator::new();
        let origin = Uuid::new_v4();

        assert!(dedup.accept(Some(origin), Some(1)));
        assert!(dedup.accept(Some(origin), Some(2)));
        assert!(!dedup.accept(Some(origin), Some(2)));
        assert!(!dedup.accept(Some(origin), Some(1)));
        assert!(dedup.accept(Some(origin), Some(5)));
    }

    #[test]
    fn test_origins_are_tracked_separately() {
        let dedup = Deduplicator::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(dedup.accept(Some(a), Some(3)));
        assert!(dedup.accept(Some(b), Some(1)));
    }

    #[test]
    fn test_untagged_messages_always_pass() {
        let dedup = Deduplicator::new();
        assert!(dedup.accept(None, None));
        assert!(dedup.accept(None, None));
        assert!(dedup.accept(Some(Uuid::new_v4()), None));
    }
}
