use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff
// ============================================================================
//
// Used by long-running loops (the bus subscriber) that must keep trying to
// reconnect forever. Delays grow by `multiplier` up to `max_delay` and reset
// once a connection has been established.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound between retries
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    next_delay: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            next_delay: config.initial_delay,
            config,
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The delay to wait now, advancing the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next_delay;
        self.attempt += 1;
        self.next_delay = Duration::from_millis(
            ((delay.as_millis() as f64) * self.config.multiplier) as u64
        )
        .min(self.config.max_delay);
        delay
    }

    /// Sleep for the next delay.
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        tracing::debug!(
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            "Backing off before retry"
        );
        sleep(delay).await;
    }

    pub fn reset(&mut self) {
        self.next_delay = self.config.initial_delay;
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_grow_and_cap() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        });

        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_millis() as u64).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
        assert_eq!(backoff.attempt(), 5);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        backoff.next_delay();
        backoff.next_delay();

        backoff.reset();

        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), BackoffConfig::default().initial_delay);
    }

    #[tokio::test]
    async fn test_wait_sleeps_for_current_delay() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        });

        let started = std::time::Instant::now();
        backoff.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
