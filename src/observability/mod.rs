//! Structured request/response logging with secret masking.
//!
//! Every attempt produces one request entry (debug) and one response or
//! error entry (info/warn); retries and slow calls get their own warn
//! entries. All output goes through [`MaskingConfig`] so secrets never
//! reach a log line, and logging can never fail the call it describes.

mod mask;

pub use mask::{DEFAULT_MAX_LOGGED_CHARS, DEFAULT_SENSITIVE_PATTERNS, MaskingConfig, mask_str};

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::Error;

/// Responses slower than this get a separate warning entry.
pub const SLOW_CALL_THRESHOLD: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug)]
pub struct RequestLogger {
    masking: MaskingConfig,
    slow_call_threshold: Duration,
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new(MaskingConfig::default())
    }
}

impl RequestLogger {
    pub fn new(masking: MaskingConfig) -> Self {
        Self {
            masking,
            slow_call_threshold: SLOW_CALL_THRESHOLD,
        }
    }

    pub fn masking(&self) -> &MaskingConfig {
        &self.masking
    }

    /// Outbound attempt. Debug level: visible in development, filtered out
    /// by production subscribers.
    pub fn log_request(
        &self,
        method: &Method,
        url: &str,
        request_id: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) {
        tracing::debug!(
            %method,
            url,
            request_id,
            headers = %self.masking.render(&headers_to_value(headers)),
            body = %body
                .map(|b| self.masking.render(b))
                .unwrap_or_else(|| "-".to_string()),
            "api request"
        );
    }

    /// Inbound response: info below 400, warn from 400 up, plus a separate
    /// slow-call warning past the threshold.
    pub fn log_response(
        &self,
        method: &Method,
        url: &str,
        status: u16,
        duration: Duration,
        request_id: &str,
        body: Option<&Value>,
    ) {
        let duration_ms = duration.as_millis() as u64;
        let body = body
            .map(|b| self.masking.render(b))
            .unwrap_or_else(|| "-".to_string());

        if status < 400 {
            tracing::info!(%method, url, status, duration_ms, request_id, body = %body, "api response");
        } else {
            tracing::warn!(%method, url, status, duration_ms, request_id, body = %body, "api response");
        }

        if duration > self.slow_call_threshold {
            tracing::warn!(%method, url, duration_ms, request_id, "slow api call");
        }
    }

    /// Attempt that produced no response at all (network failure, timeout).
    pub fn log_failure(
        &self,
        method: &Method,
        url: &str,
        duration: Duration,
        request_id: &str,
        error: &Error,
    ) {
        tracing::warn!(
            %method,
            url,
            duration_ms = duration.as_millis() as u64,
            request_id,
            error = %error,
            "api request failed"
        );
    }

    pub fn log_retry(
        &self,
        method: &Method,
        url: &str,
        attempt: u32,
        max_retries: u32,
        reason: &str,
        request_id: &str,
    ) {
        tracing::warn!(
            %method,
            url,
            attempt,
            max_retries,
            reason,
            request_id,
            "retrying request"
        );
    }
}

fn headers_to_value(headers: &[(String, String)]) -> Value {
    Value::Object(
        headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // The logger must never panic, whatever it is handed.
    #[test]
    fn test_logging_never_panics() {
        let logger = RequestLogger::default();
        let method = Method::POST;
        let headers = vec![
            ("authorization".to_string(), "Bearer tok_1234567890".to_string()),
            ("x-request-id".to_string(), "req-1".to_string()),
        ];

        logger.log_request(&method, "http://api/projects", "req-1", &headers, None);
        logger.log_request(
            &method,
            "http://api/projects",
            "req-1",
            &headers,
            Some(&json!({"password": "p@ssw0rd-long", "huge": "x".repeat(10_000)})),
        );
        logger.log_response(
            &method,
            "http://api/projects",
            500,
            Duration::from_millis(1500),
            "req-1",
            Some(&json!({"error": "boom"})),
        );
        logger.log_retry(&method, "http://api/projects", 1, 3, "HTTP 503", "req-1");
    }

    #[test]
    fn test_headers_to_value_shape() {
        let headers = vec![("content-type".to_string(), "application/json".to_string())];
        assert_eq!(
            headers_to_value(&headers),
            json!({"content-type": "application/json"})
        );
    }
}
