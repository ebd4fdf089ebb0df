//! Resilience layer: retry policy and circuit breaker.

mod backoff;
mod circuit;
mod retry;

pub use backoff::ExponentialBackoff;
pub use circuit::{CircuitBreaker, CircuitConfig, CircuitSnapshot, CircuitState};
pub use retry::{DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy};
