//! Circuit breaker for client-side fault isolation.
//!
//! Once consecutive failures cluster, the breaker fails fast locally instead
//! of piling up doomed calls, then probes recovery with a single canary
//! request. State only transitions when the breaker is consulted; there is
//! no background timer.

use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a canary.
    pub recovery_timeout: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Point-in-time view of breaker state, for diagnostics.
#[derive(Clone, Debug)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Remaining open time, if currently open.
    pub open_remaining: Option<Duration>,
}

pub struct CircuitBreaker {
    config: CircuitConfig,
    state: RwLock<CircuitState>,
    failure_count: AtomicU32,
    last_failure_ms: AtomicU64,
    probe_in_flight: AtomicBool,
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            last_failure_ms: AtomicU64::new(0),
            probe_in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> CircuitState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Whether a request may go out right now.
    ///
    /// Closed: always. Open: flips to half-open here once the recovery
    /// window has elapsed, admitting exactly one canary request per window.
    /// Half-open: only while no canary is in flight.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.elapsed_since_last_failure() < self.config.recovery_timeout {
                    return false;
                }
                self.transition(CircuitState::HalfOpen);
                self.claim_probe()
            }
            CircuitState::HalfOpen => self.claim_probe(),
        }
    }

    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                self.transition(CircuitState::Closed);
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        self.last_failure_ms.store(now_ms(), Ordering::Release);
        match self.state() {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    self.transition(CircuitState::Open);
                }
            }
            // Canary failed: reopen immediately, a full threshold is not
            // re-accumulated.
            CircuitState::HalfOpen => {
                self.transition(CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.state();
        let open_remaining = match state {
            CircuitState::Open => self
                .config
                .recovery_timeout
                .checked_sub(self.elapsed_since_last_failure()),
            _ => None,
        };
        CircuitSnapshot {
            state,
            failure_count: self.failure_count(),
            open_remaining,
        }
    }

    fn claim_probe(&self) -> bool {
        !self.probe_in_flight.swap(true, Ordering::AcqRel)
    }

    fn elapsed_since_last_failure(&self) -> Duration {
        let last = self.last_failure_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms().saturating_sub(last))
    }

    fn transition(&self, to: CircuitState) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let from = *state;
        if from == to {
            return;
        }
        *state = to;
        // Probe and counter resets happen under the state lock so a second
        // caller cannot observe the new state before they apply.
        match to {
            CircuitState::Closed => {
                self.probe_in_flight.store(false, Ordering::Release);
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                self.probe_in_flight.store(false, Ordering::Release);
            }
            CircuitState::Open => {}
        }
        drop(state);

        tracing::info!(
            previous_state = %from,
            new_state = %to,
            failure_count = self.failure_count(),
            "circuit breaker state change"
        );
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn breaker(threshold: u32, recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitConfig {
            failure_threshold: threshold,
            recovery_timeout: recovery,
        })
    }

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::new(CircuitConfig::default());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_opens_at_threshold() {
        let cb = breaker(3, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(5, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.failure_count(), 2);

        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_half_open_admits_single_canary() {
        let cb = breaker(2, Duration::from_millis(20));

        cb.record_failure();
        cb.record_failure();
        assert!(!cb.allow_request());

        thread::sleep(Duration::from_millis(30));

        // One canary per recovery window.
        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(!cb.allow_request());
    }

    #[test]
    fn test_canary_success_closes() {
        let cb = breaker(2, Duration::from_millis(20));

        cb.record_failure();
        cb.record_failure();
        thread::sleep(Duration::from_millis(30));
        assert!(cb.allow_request());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_canary_failure_reopens_immediately() {
        let cb = breaker(2, Duration::from_millis(20));

        cb.record_failure();
        cb.record_failure();
        thread::sleep(Duration::from_millis(30));
        assert!(cb.allow_request());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());

        // The reopened window starts from the canary's failure.
        thread::sleep(Duration::from_millis(30));
        assert!(cb.allow_request());
    }

    #[test]
    fn test_snapshot_reports_open_remaining() {
        let cb = breaker(1, Duration::from_secs(30));
        cb.record_failure();

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.failure_count, 1);
        assert!(snapshot.open_remaining.is_some());

        let closed = breaker(5, Duration::from_secs(30)).snapshot();
        assert!(closed.open_remaining.is_none());
    }

    #[test]
    fn test_concurrent_failures_do_not_lose_counts() {
        use std::sync::Arc;

        let cb = Arc::new(breaker(1000, Duration::from_secs(30)));
        let mut handles = vec![];
        for _ in 0..8 {
            let cb = Arc::clone(&cb);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    cb.record_failure();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cb.failure_count(), 400);
    }
}
