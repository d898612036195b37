use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::bus::FanoutBus;
use crate::config::RedisConfig;
use crate::errors::BusError;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

// ============================================================================
// Redis Fanout Bus
// ============================================================================
//
// - PUBLISH goes over one lazily opened multiplexed connection, protected by
//   a circuit breaker so a dead broker fails publishes fast
// - SUBSCRIBE uses a dedicated pub/sub connection per subscription
//
// ============================================================================

pub struct RedisBus {
    client: redis::Client,
    channel: String,
    publisher: Mutex<Option<MultiplexedConnection>>,
    circuit_breaker: CircuitBreaker,
}

impl RedisBus {
    pub fn new(config: &RedisConfig, metrics: Arc<Metrics>) -> Result<Self, BusError> {
        let client = redis::Client::open(config.url())?;

        let cb_config = CircuitBreakerConfig {
            failure_threshold: 5,                           // Open after 5 failures
            cool_down: std::time::Duration::from_secs(10), // Probe again after 10s
            success_threshold: 1,                           // One good publish closes it
        };

        Ok(Self {
            client,
            channel: config.channel.clone(),
            publisher: Mutex::new(None),
            circuit_breaker: CircuitBreaker::new("redis-publish", cb_config)
                .with_gauge(metrics.circuit_breaker_state.clone()),
        })
    }

    async fn publisher(&self) -> Result<MultiplexedConnection, BusError> {
        let mut publisher = self.publisher.lock().await;
        if let Some(connection) = publisher.as_ref() {
            return Ok(connection.clone());
        }

        let connection = self.client.get_multiplexed_async_connection().await?;
        tracing::info!(channel = %self.channel, "Redis publisher connected");
        *publisher = Some(connection.clone());
        Ok(connection)
    }

    async fn forget_publisher(&self) {
        *self.publisher.lock().await = None;
    }
}

#[async_trait]
impl FanoutBus for RedisBus {
    async fn publish(&self, payload: String) -> Result<(), BusError> {
        let result = self
            .circuit_breaker
            .call(async {
                let mut connection = self.publisher().await?;
                let _receivers: i64 = connection.publish(&self.channel, &payload).await?;
                Ok::<(), BusError>(())
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(channel = %self.channel, "Circuit breaker open - Redis unavailable");
                Err(BusError::CircuitOpen)
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, channel = %self.channel, "[Redis PUB] Error");
                // Reconnect on the next publish
                self.forget_publisher().await;
                Err(e)
            }
        }
    }

    async fn subscribe(&self) -> Result<BoxStream<'static, String>, BusError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        tracing::info!(channel = %self.channel, "📡 Subscribed to Redis channel");

        let messages = pubsub.into_on_message().filter_map(|message| async move {
            match message.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::error!(error = %e, "[Redis SUB] Unreadable payload");
                    None
                }
            }
        });

        Ok(messages.boxed())
    }
}
