// ============================================================================
// Error Types
// ============================================================================
//
// Only WhiteboardError::InvalidIdentifier is meant to reach the transport
// layer. Persistence and bus errors are logged where they happen and the
// feature degrades instead.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WhiteboardError {
    #[error("Invalid whiteboard id: {0:?}")]
    InvalidIdentifier(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Durable store unavailable: {0}")]
    Unavailable(String),

    #[error("Durable store query failed: {0}")]
    Query(String),

    #[error("File I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Bus connection failed: {0}")]
    Connection(String),

    #[error("Bus publish rejected: circuit breaker is open")]
    CircuitOpen,

    #[error("Malformed bus message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<redis::RedisError> for BusError {
    fn from(err: redis::RedisError) -> Self {
        BusError::Connection(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
