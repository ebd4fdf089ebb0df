//! Exponential backoff with jitter for retry delays.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    factor: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration, factor: f64) -> Self {
        Self {
            base,
            max,
            factor,
            jitter: 0.1,
        }
    }

    /// Multiplicative jitter fraction, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before the retry with the given 0-indexed attempt number:
    /// `base * factor^retry_count`, jittered, rounded to the millisecond.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let raw = self.base.as_millis() as f64 * self.factor.powi(retry_count.min(32) as i32);
        let clamped = raw.min(self.max.as_millis() as f64);

        let jittered = if self.jitter > 0.0 {
            let spread = clamped * self.jitter;
            clamped + (rand::random::<f64>() * 2.0 - 1.0) * spread
        } else {
            clamped
        };

        Duration::from_millis(jittered.round().max(0.0) as u64)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_retry() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(1000), Duration::from_secs(60), 2.0)
                .with_jitter(0.0);

        assert_eq!(backoff.delay_for(0), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(2000));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(4000));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(1000), Duration::from_millis(5000), 2.0)
                .with_jitter(0.0);

        assert_eq!(backoff.delay_for(10), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let backoff = ExponentialBackoff::default();

        for retry_count in 0..4 {
            let expected = 1000.0 * 2f64.powi(retry_count);
            let delay = backoff.delay_for(retry_count as u32).as_millis() as f64;
            let lower = expected * 0.9 - 1.0;
            let upper = expected * 1.1 + 1.0;
            assert!(
                delay >= lower && delay <= upper,
                "delay {delay} outside [{lower}, {upper}] for retry {retry_count}"
            );
        }
    }

    #[test]
    fn test_delays_nondecreasing_without_jitter() {
        let backoff = ExponentialBackoff::default().with_jitter(0.0);
        let mut previous = Duration::ZERO;
        for retry_count in 0..8 {
            let delay = backoff.delay_for(retry_count);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
