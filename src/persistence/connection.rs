use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::PersistenceError;
use crate::metrics::{ConnectionGauge, Metrics};

// ============================================================================
// Connection Manager - lazily established, shared connection
// ============================================================================
//
// States:
// - Disconnected: nothing attempted yet
// - Connecting:   one attempt in flight, every caller awaits the same future
// - Connected:    handle cached for the process lifetime
// - Failed:       last attempt failed, the next call starts a fresh attempt
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

type Connector<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, PersistenceError>> + Send + Sync>;
type Attempt<T> = Shared<BoxFuture<'static, Result<Arc<T>, String>>>;

enum Slot<T> {
    Disconnected,
    Connecting(Attempt<T>),
    Connected(Arc<T>),
    Failed(String),
}

pub struct ConnectionManager<T> {
    name: &'static str,
    slot: Mutex<Slot<T>>,
    connector: Connector<T>,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl<T: Send + Sync + 'static> ConnectionManager<T> {
    pub fn new<F, Fut>(name: &'static str, timeout: Duration, connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, PersistenceError>> + Send + 'static,
    {
        Self {
            name,
            slot: Mutex::new(Slot::Disconnected),
            connector: Arc::new(move || connect().boxed()),
            timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_connection_state(ConnectionGauge::Disconnected);
        self.metrics = Some(metrics);
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        match &*self.lock() {
            Slot::Disconnected => ConnectionStatus::Disconnected,
            Slot::Connecting(_) => ConnectionStatus::Connecting,
            Slot::Connected(_) => ConnectionStatus::Connected,
            Slot::Failed(_) => ConnectionStatus::Failed,
        }
    }

    /// Get the connection, connecting first if needed.
    pub async fn get(&self) -> Result<Arc<T>, PersistenceError> {
        let attempt = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Connected(handle) => return Ok(handle.clone()),
                Slot::Connecting(attempt) => attempt.clone(),
                Slot::Disconnected | Slot::Failed(_) => {
                    tracing::info!(store = self.name, "Connecting to durable store");
                    let attempt = self.start_attempt();
                    *slot = Slot::Connecting(attempt.clone());
                    self.report(ConnectionGauge::Connecting);
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        // Whoever gets here first records the outcome of this attempt
        let mut slot = self.lock();
        if let Slot::Connecting(current) = &*slot {
            if current.ptr_eq(&attempt) {
                match &outcome {
                    Ok(handle) => {
                        tracing::info!(store = self.name, "✅ Durable store connected");
                        *slot = Slot::Connected(handle.clone());
                        self.report(ConnectionGauge::Connected);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            store = self.name,
                            error = %reason,
                            "Durable store connection failed, persistence degraded"
                        );
                        *slot = Slot::Failed(reason.clone());
                        self.report(ConnectionGauge::Failed);
                    }
                }
            }
        }

        outcome.map_err(PersistenceError::Unavailable)
    }

    fn start_attempt(&self) -> Attempt<T> {
        let connector = self.connector.clone();
        let timeout = self.timeout;

        async move {
            match tokio::time::timeout(timeout, connector()).await {
                Ok(Ok(handle)) => Ok(Arc::new(handle)),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("connection attempt timed out after {:?}", timeout)),
            }
        }
        .boxed()
        .shared()
    }

    fn report(&self, state: ConnectionGauge) {
        if let Some(metrics) = &self.metrics {
            metrics.set_connection_state(state);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A poisoned slot still holds a consistent state value
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
