use prometheus::IntGauge;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards the bus publisher. While the broker is down, publishes fail fast
// instead of each waiting on its own connection attempt.
//
// States:
// - Closed: Normal operation, calls pass through
// - Open: Too many consecutive failures, calls rejected immediately
// - HalfOpen: Cool-down elapsed, calls let through to probe recovery
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn gauge_value(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Time to stay open before probing
    pub cool_down: Duration,
    /// Successful probes needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "Circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}

struct Tracker {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    tracker: Mutex<Tracker>,
    gauge: Option<IntGauge>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            tracker: Mutex::new(Tracker {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
            gauge: None,
        }
    }

    /// Mirror state changes onto a Prometheus gauge.
    pub fn with_gauge(mut self, gauge: IntGauge) -> Self {
        gauge.set(CircuitState::Closed.gauge_value());
        self.gauge = Some(gauge);
        self
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Run `operation` unless the circuit is open.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        if !self.admit() {
            return Err(CircuitBreakerError::CircuitOpen);
        }

        match operation.await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    fn admit(&self) -> bool {
        let mut tracker = self.lock();
        if tracker.state != CircuitState::Open {
            return true;
        }

        let cooled = tracker
            .opened_at
            .map(|at| at.elapsed() >= self.config.cool_down)
            .unwrap_or(true);
        if cooled {
            tracing::info!(breaker = self.name, "Circuit breaker half-open, probing");
            tracker.successes = 0;
            self.transition(&mut tracker, CircuitState::HalfOpen);
        }
        cooled
    }

    fn on_success(&self) {
        let mut tracker = self.lock();
        tracker.failures = 0;

        if tracker.state == CircuitState::HalfOpen {
            tracker.successes += 1;
            if tracker.successes >= self.config.success_threshold {
                tracing::info!(breaker = self.name, "Circuit breaker closed");
                tracker.opened_at = None;
                self.transition(&mut tracker, CircuitState::Closed);
            }
        }
    }

    fn on_failure(&self) {
        let mut tracker = self.lock();
        tracker.failures += 1;

        let trip = match tracker.state {
            CircuitState::Closed => tracker.failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if trip {
            tracing::warn!(
                breaker = self.name,
                failures = tracker.failures,
                "Circuit breaker opened"
            );
            tracker.opened_at = Some(Instant::now());
            self.transition(&mut tracker, CircuitState::Open);
        }
    }

    fn transition(&self, tracker: &mut Tracker, to: CircuitState) {
        tracker.state = to;
        if let Some(gauge) = &self.gauge {
            gauge.set(to.gauge_value());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
