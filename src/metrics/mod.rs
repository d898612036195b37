// Private module declaration
mod server;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Event application (applied / ignored, by type)
// - Cold loads (which tier answered)
// - Persistence failures (by tier and operation)
// - Fanout bus traffic (published / received / dropped)
// - Durable store connection state and bus circuit breaker state
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Durable store connection state, as exported on the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionGauge {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Failed = 3,
}

pub struct Metrics {
    registry: Registry,

    // Event Store Metrics
    pub events_applied: IntCounterVec,
    pub events_ignored: IntCounter,
    pub cold_loads: IntCounterVec,

    // Persistence Metrics
    pub persistence_failures: IntCounterVec,
    pub durable_connection_state: IntGauge,

    // Fanout Metrics
    pub bus_published: IntCounter,
    pub bus_received: IntCounter,
    pub bus_dropped: IntCounterVec,
    pub circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let events_applied = IntCounterVec::new(
            Opts::new("whiteboard_events_applied_total", "Events that changed a whiteboard"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_applied.clone()))?;

        let events_ignored = IntCounter::new(
            "whiteboard_events_ignored_total",
            "Events ignored because their type is missing or unknown",
        )?;
        registry.register(Box::new(events_ignored.clone()))?;

        let cold_loads = IntCounterVec::new(
            Opts::new("whiteboard_cold_loads_total", "Cold loads by the tier that answered"),
            &["tier"],
        )?;
        registry.register(Box::new(cold_loads.clone()))?;

        let persistence_failures = IntCounterVec::new(
            Opts::new("whiteboard_persistence_failures_total", "Failed persistence operations"),
            &["tier", "operation"],
        )?;
        registry.register(Box::new(persistence_failures.clone()))?;

        let durable_connection_state = IntGauge::new(
            "whiteboard_durable_connection_state",
            "Durable store connection (0=Disconnected, 1=Connecting, 2=Connected, 3=Failed)",
        )?;
        registry.register(Box::new(durable_connection_state.clone()))?;

        let bus_published = IntCounter::new(
            "whiteboard_bus_published_total",
            "Messages published on the fanout bus",
        )?;
        registry.register(Box::new(bus_published.clone()))?;

        let bus_received = IntCounter::new(
            "whiteboard_bus_received_total",
            "Messages received from the fanout bus",
        )?;
        registry.register(Box::new(bus_received.clone()))?;

        let bus_dropped = IntCounterVec::new(
            Opts::new("whiteboard_bus_dropped_total", "Bus messages dropped by the subscriber"),
            &["reason"],
        )?;
        registry.register(Box::new(bus_dropped.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "whiteboard_bus_circuit_breaker_state",
            "Publish circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            events_applied,
            events_ignored,
            cold_loads,
            persistence_failures,
            durable_connection_state,
            bus_published,
            bus_received,
            bus_dropped,
            circuit_breaker_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_applied(&self, event_type: &str) {
        self.events_applied.with_label_values(&[event_type]).inc();
    }

    pub fn record_cold_load(&self, tier: &str) {
        self.cold_loads.with_label_values(&[tier]).inc();
    }

    pub fn record_persistence_failure(&self, tier: &str, operation: &str) {
        self.persistence_failures.with_label_values(&[tier, operation]).inc();
    }

    pub fn record_dropped(&self, reason: &str) {
        self.bus_dropped.with_label_values(&[reason]).inc();
    }

    pub fn set_connection_state(&self, state: ConnectionGauge) {
        self.durable_connection_state.set(state as i64);
    }

    pub fn connection_state(&self) -> ConnectionGauge {
        match self.durable_connection_state.get() {
            1 => ConnectionGauge::Connecting,
            2 => ConnectionGauge::Connected,
            3 => ConnectionGauge::Failed,
            _ => ConnectionGauge::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_applied("pen");
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_applied_by_type() {
        let metrics = Metrics::new().unwrap();
        metrics.record_applied("pen");
        metrics.record_applied("pen");
        metrics.record_applied("undo");

        assert_eq!(metrics.events_applied.with_label_values(&["pen"]).get(), 2);
        assert_eq!(metrics.events_applied.with_label_values(&["undo"]).get(), 1);
    }

    #[test]
    fn test_connection_state_round_trips_through_gauge() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.connection_state(), ConnectionGauge::Disconnected);

        metrics.set_connection_state(ConnectionGauge::Failed);
        assert_eq!(metrics.connection_state(), ConnectionGauge::Failed);
        assert_eq!(metrics.durable_connection_state.get(), 3);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_dropped("malformed");

        assert_eq!(a.bus_dropped.with_label_values(&["malformed"]).get(), 1);
        assert_eq!(b.bus_dropped.with_label_values(&["malformed"]).get(), 0);
    }
}
