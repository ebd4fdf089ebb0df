//! Per-failure retry decisions.

use std::time::Duration;

use crate::Error;

use super::ExponentialBackoff;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// What the dispatcher should do with a failed attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up and surface the error to the caller.
    Stop,
    /// Wait this long, then re-dispatch the same logical request.
    RetryAfter(Duration),
}

/// Retry rules, evaluated per classified failure.
///
/// - Auth failures (401/403): never retried.
/// - Rate limits (429): retried while attempts remain, waiting the server's
///   `Retry-After` verbatim rather than the backoff formula.
/// - Timeouts: never retried.
/// - Network errors and HTTP 502/503/504: retried with exponential backoff.
/// - Any other status: never retried.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
    /// Optional cap on how long a rate-limit wait may be. `None` honors the
    /// server's value in full, however large.
    pub max_rate_limit_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: ExponentialBackoff::default(),
            max_rate_limit_wait: None,
        }
    }
}

impl RetryPolicy {
    pub fn decide(&self, error: &Error, retry_count: u32) -> RetryDecision {
        match error {
            Error::Auth { .. } => RetryDecision::Stop,
            Error::RateLimited { retry_after, .. } => {
                if retry_count >= self.max_retries {
                    return RetryDecision::Stop;
                }
                let wait = match self.max_rate_limit_wait {
                    Some(cap) => (*retry_after).min(cap),
                    None => *retry_after,
                };
                RetryDecision::RetryAfter(wait)
            }
            Error::Timeout { .. } => RetryDecision::Stop,
            Error::Network { .. }
            | Error::Api {
                status: 502 | 503 | 504,
                ..
            } => self.backoff_or_stop(retry_count),
            _ => RetryDecision::Stop,
        }
    }

    fn backoff_or_stop(&self, retry_count: u32) -> RetryDecision {
        if retry_count >= self.max_retries {
            RetryDecision::Stop
        } else {
            RetryDecision::RetryAfter(self.backoff.delay_for(retry_count))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, TransportError};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            backoff: ExponentialBackoff::default().with_jitter(0.0),
            ..Default::default()
        }
    }

    fn api(status: u16) -> Error {
        Error::Api {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            status,
            body: String::new(),
        }
    }

    fn network() -> Error {
        Error::Network {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            source: TransportError::new("connection refused"),
        }
    }

    #[test]
    fn test_auth_never_retried() {
        let err = Error::Auth {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            status: 403,
        };
        assert_eq!(policy().decide(&err, 0), RetryDecision::Stop);
    }

    #[test]
    fn test_timeout_never_retried() {
        let err = Error::Timeout {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(policy().decide(&err, 0), RetryDecision::Stop);
    }

    #[test]
    fn test_rate_limit_honors_server_delay() {
        let err = Error::RateLimited {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            retry_after: Duration::from_secs(5),
        };
        // Server instruction, not the backoff formula.
        assert_eq!(
            policy().decide(&err, 0),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(
            policy().decide(&err, 2),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(policy().decide(&err, 3), RetryDecision::Stop);
    }

    #[test]
    fn test_rate_limit_wait_cap() {
        let capped = RetryPolicy {
            max_rate_limit_wait: Some(Duration::from_secs(30)),
            ..policy()
        };
        let err = Error::RateLimited {
            method: Method::GET,
            endpoint: "/api/projects".into(),
            retry_after: Duration::from_secs(300),
        };
        assert_eq!(
            capped.decide(&err, 0),
            RetryDecision::RetryAfter(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_server_errors_back_off_exponentially() {
        let policy = policy();
        for status in [502, 503, 504] {
            assert_eq!(
                policy.decide(&api(status), 0),
                RetryDecision::RetryAfter(Duration::from_millis(1000))
            );
        }
        assert_eq!(
            policy.decide(&api(503), 1),
            RetryDecision::RetryAfter(Duration::from_millis(2000))
        );
        assert_eq!(
            policy.decide(&api(503), 2),
            RetryDecision::RetryAfter(Duration::from_millis(4000))
        );
    }

    #[test]
    fn test_network_errors_back_off() {
        assert_eq!(
            policy().decide(&network(), 0),
            RetryDecision::RetryAfter(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_retry_bound() {
        let policy = policy();
        assert_eq!(policy.decide(&network(), 2), RetryDecision::RetryAfter(Duration::from_millis(4000)));
        assert_eq!(policy.decide(&network(), 3), RetryDecision::Stop);
        assert_eq!(policy.decide(&api(503), 3), RetryDecision::Stop);
    }

    #[test]
    fn test_other_client_errors_never_retried() {
        let policy = policy();
        for status in [400, 404, 409, 422, 500] {
            assert_eq!(policy.decide(&api(status), 0), RetryDecision::Stop);
        }
    }
}
