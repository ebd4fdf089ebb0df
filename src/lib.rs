//! # palisade
//!
//! Resilient HTTP API client. Every outbound request gets a correlation id,
//! a bounded timeout, structured logging with secret masking, retry with
//! exponential backoff, and circuit-breaker fault isolation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use palisade::{Client, RequestOptions};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), palisade::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")
//!         .build()?;
//!
//!     let projects: Value = client
//!         .get(
//!             "/api/projects",
//!             RequestOptions::new().user_action("Loading projects"),
//!         )
//!         .await?;
//!     println!("{projects}");
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! A call flows through four cooperating pieces: the dispatcher builds the
//! request and owns its lifecycle, the logger records every attempt with
//! sensitive fields masked, the retry controller decides per failure whether
//! to go again and how long to wait, and the circuit breaker rejects calls
//! outright once consecutive failures cluster. The pipeline wraps a minimal
//! [`transport::Transport`] interface, so any HTTP client can sit underneath;
//! the default is a `reqwest`-backed [`transport::HttpTransport`].

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod observability;
pub mod report;
pub mod resilience;
pub mod transport;

pub use client::{
    Client, ClientBuilder, ClientConfig, DEFAULT_TIMEOUT, InFlightTracker, MAX_REQUEST_TIMEOUT,
    RequestMetadata, RequestOptions,
};
pub use observability::{MaskingConfig, RequestLogger};
pub use report::{BreadcrumbSink, ErrorReporter, NoopSink, ReportContext};
pub use resilience::{
    CircuitBreaker, CircuitConfig, CircuitSnapshot, CircuitState, DEFAULT_MAX_RETRIES,
    ExponentialBackoff, RetryDecision, RetryPolicy,
};
pub use transport::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};

use std::time::Duration;

pub use reqwest::Method;

/// Error type for pipeline operations.
///
/// Each failure mode is a distinct variant because each implies a different
/// caller response: re-authenticate, back off, surface to the user, or fail
/// fast. Variants carry the endpoint and method so callers can branch
/// without re-inspecting the transport layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No response was received from the server.
    #[error("network error on {method} {endpoint}: {source}")]
    Network {
        method: Method,
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// The attempt exceeded its timeout window.
    #[error("{method} {endpoint} timed out after {:.1}s", timeout.as_secs_f64())]
    Timeout {
        method: Method,
        endpoint: String,
        timeout: Duration,
    },

    /// The server asked us to back off (HTTP 429).
    #[error("rate limited on {method} {endpoint}, retry after {}s", retry_after.as_secs())]
    RateLimited {
        method: Method,
        endpoint: String,
        retry_after: Duration,
    },

    /// Authentication or authorization failed (HTTP 401 or 403).
    #[error("authentication failed (HTTP {status}) on {method} {endpoint}")]
    Auth {
        method: Method,
        endpoint: String,
        status: u16,
    },

    /// The circuit breaker rejected the request without a network call.
    #[error("circuit breaker open, {endpoint} not attempted")]
    CircuitOpen { endpoint: String },

    /// Any other non-success HTTP response.
    #[error("API error (HTTP {status}) on {method} {endpoint}: {body}")]
    Api {
        method: Method,
        endpoint: String,
        status: u16,
        body: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Api { status, .. } => Some(*status),
            Error::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Endpoint the failing request was addressed to, if known.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Error::Network { endpoint, .. }
            | Error::Timeout { endpoint, .. }
            | Error::RateLimited { endpoint, .. }
            | Error::Auth { endpoint, .. }
            | Error::CircuitOpen { endpoint }
            | Error::Api { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    /// Whether the retry controller may re-dispatch after this error.
    ///
    /// Timeouts are deliberately not retryable: the request already consumed
    /// its time budget.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network { .. }
                | Error::RateLimited { .. }
                | Error::Api {
                    status: 502 | 503 | 504,
                    ..
                }
        )
    }

    /// Server-instructed wait before the next attempt, for rate limits.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
