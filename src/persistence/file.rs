use std::io::ErrorKind;
use std::path::PathBuf;

use crate::errors::PersistenceError;
use crate::models::{Event, WhiteboardId};

// ============================================================================
// File Store - one JSON document per whiteboard
// ============================================================================
//
// Layout: <dir>/<id>.json containing the event log array verbatim.
// WhiteboardId has already rejected separators and dot names, so the joined
// path can never leave `dir`.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, making sure the directory exists.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, id: &WhiteboardId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    /// `Ok(None)` when no document exists for `id`.
    pub async fn load(&self, id: &WhiteboardId) -> Result<Option<Vec<Event>>, PersistenceError> {
        let data = match tokio::fs::read(self.path_for(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&data)?))
    }

    pub async fn save(&self, id: &WhiteboardId, events: &[Event]) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec(events)?;
        tokio::fs::write(self.path_for(id), data).await?;
        Ok(())
    }

    /// Removing a document that does not exist is not an error.
    pub async fn delete(&self, id: &WhiteboardId) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
