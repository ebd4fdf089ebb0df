//! Minimal transport interface the pipeline wraps.
//!
//! The dispatcher builds a fully-formed [`TransportRequest`] and hands it to
//! whatever implements [`Transport`]. Retry, logging, circuit breaking, and
//! timeouts all live above this seam, so any HTTP client can sit underneath.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

/// A request already fully built by the dispatcher.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    /// Header name/value pairs, in application order.
    pub headers: Vec<(String, String)>,
    /// JSON-serialized body, absent for body-less requests.
    pub body: Option<String>,
}

/// The raw response a transport produced.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    /// Header name/value pairs with lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Transport-level success: any 2xx or 3xx status.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Failure to produce any response at all.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Whether the underlying client gave up waiting rather than failing to
    /// connect or send.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

/// Anything that can turn a request into a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest)
    -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_headers(headers: Vec<(String, String)>) -> TransportResponse {
        TransportResponse {
            status: 200,
            headers,
            body: String::new(),
        }
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response =
            response_with_headers(vec![("content-type".into(), "application/json".into())]);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("retry-after"), None);
    }

    #[test]
    fn test_success_range() {
        for status in [200, 204, 301, 399] {
            let mut response = response_with_headers(vec![]);
            response.status = status;
            assert!(response.is_success(), "{status} should be success");
        }
        for status in [199, 400, 401, 500, 503] {
            let mut response = response_with_headers(vec![]);
            response.status = status;
            assert!(!response.is_success(), "{status} should not be success");
        }
    }

    #[test]
    fn test_transport_error_timeout_flag() {
        assert!(TransportError::timed_out("deadline elapsed").is_timeout());
        assert!(!TransportError::new("connection refused").is_timeout());
    }
}
