use async_trait::async_trait;
use chrono::Utc;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;

use super::connection::{ConnectionManager, ConnectionStatus};
use super::durable::DurableStore;
use crate::config::ScyllaConfig;
use crate::errors::PersistenceError;
use crate::metrics::Metrics;
use crate::models::{Event, WhiteboardId};

// ============================================================================
// ScyllaDB Durable Store
// ============================================================================
//
// Schema (created on first connect):
//
//   CREATE TABLE <keyspace>.whiteboards (
//       id text PRIMARY KEY,
//       events text,          -- JSON array, the full event log
//       updated_at timestamp
//   )
//
// INSERT on an existing primary key overwrites the row, which gives the
// replace-whole-document upsert semantics for free.
//
// ============================================================================

const TABLE: &str = "whiteboards";

pub struct ScyllaStore {
    connection: ConnectionManager<Session>,
}

impl ScyllaStore {
    /// Does not touch the network; the session is opened on first use.
    pub fn new(config: ScyllaConfig, metrics: Arc<Metrics>) -> Self {
        let timeout = config.connect_timeout;
        let connection = ConnectionManager::new("scylla", timeout, move || {
            let config = config.clone();
            async move { open_session(&config).await }
        })
        .with_metrics(metrics);

        Self { connection }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }
}

async fn open_session(config: &ScyllaConfig) -> Result<Session, PersistenceError> {
    let session: Session = SessionBuilder::new()
        .known_nodes(&config.nodes)
        .connection_timeout(config.connect_timeout)
        .build()
        .await
        .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                config.keyspace
            ),
            &[],
        )
        .await
        .map_err(query_error)?;

    session
        .use_keyspace(&config.keyspace, false)
        .await
        .map_err(query_error)?;

    session
        .query_unpaged(
            format!(
                "CREATE TABLE IF NOT EXISTS {} (id text PRIMARY KEY, events text, updated_at timestamp)",
                TABLE
            ),
            &[],
        )
        .await
        .map_err(query_error)?;

    tracing::info!(
        nodes = ?config.nodes,
        keyspace = %config.keyspace,
        "ScyllaDB session ready"
    );

    Ok(session)
}

fn query_error(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Query(e.to_string())
}

#[async_trait]
impl DurableStore for ScyllaStore {
    fn name(&self) -> &'static str {
        "scylla"
    }

    async fn load(&self, id: &WhiteboardId) -> Result<Option<Vec<Event>>, PersistenceError> {
        let session = self.connection.get().await?;

        let result = session
            .query_unpaged(
                format!("SELECT events FROM {} WHERE id = ?", TABLE),
                (id.as_str(),),
            )
            .await
            .map_err(query_error)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None), // No rows
        };

        match rows_result.maybe_first_row::<(Option<String>,)>() {
            Ok(Some((Some(events_json),))) => {
                let events: Vec<Event> = serde_json::from_str(&events_json)?;
                tracing::debug!(whiteboard = %id, events = events.len(), "Loaded board from ScyllaDB");
                Ok(Some(events))
            }
            Ok(Some((None,))) => Ok(Some(Vec::new())),
            Ok(None) => Ok(None),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn save(&self, id: &WhiteboardId, events: &[Event]) -> Result<(), PersistenceError> {
        let session = self.connection.get().await?;
        let events_json = serde_json::to_string(events)?;

        session
            .query_unpaged(
                format!("INSERT INTO {} (id, events, updated_at) VALUES (?, ?, ?)", TABLE),
                (id.as_str(), events_json, Utc::now()),
            )
            .await
            .map_err(query_error)?;

        tracing::debug!(whiteboard = %id, events = events.len(), "Saved board to ScyllaDB");
        Ok(())
    }

    async fn delete(&self, id: &WhiteboardId) -> Result<(), PersistenceError> {
        let session = self.connection.get().await?;

        session
            .query_unpaged(format!("DELETE FROM {} WHERE id = ?", TABLE), (id.as_str(),))
            .await
            .map_err(query_error)?;

        tracing::debug!(whiteboard = %id, "Deleted board from ScyllaDB");
        Ok(())
    }
}
