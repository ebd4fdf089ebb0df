//! Failure classification for transport results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;

use crate::transport::{TransportError, TransportResponse};
use crate::Error;

/// Wait applied to a 429 whose `Retry-After` header is absent or unparsable.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Map a non-success response to its error variant. Returns `None` for
/// 2xx/3xx.
pub(crate) fn classify_response(
    method: &Method,
    endpoint: &str,
    response: &TransportResponse,
) -> Option<Error> {
    if response.is_success() {
        return None;
    }
    let error = match response.status {
        401 | 403 => Error::Auth {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            status: response.status,
        },
        429 => Error::RateLimited {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            retry_after: response
                .header("retry-after")
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER),
        },
        status => Error::Api {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            status,
            body: response.body.clone(),
        },
    };
    Some(error)
}

/// Map a transport-level failure. A timed-out send is a timeout even when
/// the underlying client noticed before our own deadline did.
pub(crate) fn classify_transport_error(
    method: &Method,
    endpoint: &str,
    timeout: Duration,
    source: TransportError,
) -> Error {
    if source.is_timeout() {
        Error::Timeout {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    } else {
        Error::Network {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

/// Parse a `Retry-After` header: integer delta-seconds or an HTTP-date.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let when = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.signed_duration_since(Utc::now());
    if delta > chrono::TimeDelta::zero() {
        delta.to_std().ok()
    } else {
        Some(Duration::ZERO)
    }
}
