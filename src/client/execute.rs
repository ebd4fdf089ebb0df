//! Request lifecycle: dispatch, classification, retries, breaker updates.

use std::time::Instant;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use url::Url;

use crate::report::ReportContext;
use crate::resilience::RetryDecision;
use crate::transport::{TransportRequest, TransportResponse};
use crate::{Error, Result};

use super::classify::{classify_response, classify_transport_error};
use super::config::RequestOptions;
use super::tracking::RequestMetadata;
use super::Client;

/// Correlation header set on every outbound attempt.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

impl Client {
    pub(crate) async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Value> {
        let url = self
            .config
            .base_url
            .join(endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;

        let mut metadata = RequestMetadata::new();
        self.tracker.register(&metadata);
        self.breadcrumbs.record(
            &format!("{method} {endpoint}"),
            "http",
            Some(&json!({
                "request_id": metadata.request_id,
                "user_action": options.user_action,
                "component": options.component,
            })),
        );

        let result = self
            .run_attempts(&method, endpoint, &url, body, options, &mut metadata)
            .await;
        self.tracker.deregister(&metadata.request_id);

        if let Err(error) = &result {
            // Circuit-open rejections are a consequence of already-reported
            // failures; they are logged but not reported again.
            if !matches!(error, Error::CircuitOpen { .. }) {
                let context = ReportContext {
                    endpoint: endpoint.to_string(),
                    method: method.to_string(),
                    status: error.status(),
                    response_body: match error {
                        Error::Api { body, .. } => Some(body.clone()),
                        _ => None,
                    },
                    user_action: options.user_action.clone(),
                    component: options.component.clone(),
                };
                self.reporter.report(error, &context);
            }
        }

        result
    }

    /// Attempt loop for one logical request. Retries are strictly
    /// sequential; the breaker is consulted before every attempt and
    /// notified after it.
    async fn run_attempts(
        &self,
        method: &Method,
        endpoint: &str,
        url: &Url,
        body: Option<Value>,
        options: &RequestOptions,
        metadata: &mut RequestMetadata,
    ) -> Result<Value> {
        let body_text = match &body {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };
        let timeout = self.config.effective_timeout();

        loop {
            if let Some(circuit) = &self.circuit {
                if !circuit.allow_request() {
                    return Err(Error::CircuitOpen {
                        endpoint: endpoint.to_string(),
                    });
                }
            }

            let headers = self.build_headers(&metadata.request_id, options, body_text.is_some());
            self.logger.log_request(
                method,
                url.as_str(),
                &metadata.request_id,
                &headers,
                body.as_ref(),
            );

            let attempt_started = Instant::now();
            let request = TransportRequest {
                method: method.clone(),
                url: url.clone(),
                headers,
                body: body_text.clone(),
            };

            let error = match tokio::time::timeout(timeout, self.transport.send(request)).await {
                Err(_elapsed) => {
                    let error = Error::Timeout {
                        method: method.clone(),
                        endpoint: endpoint.to_string(),
                        timeout,
                    };
                    self.logger.log_failure(
                        method,
                        url.as_str(),
                        attempt_started.elapsed(),
                        &metadata.request_id,
                        &error,
                    );
                    error
                }
                Ok(Err(source)) => {
                    let error = classify_transport_error(method, endpoint, timeout, source);
                    self.logger.log_failure(
                        method,
                        url.as_str(),
                        attempt_started.elapsed(),
                        &metadata.request_id,
                        &error,
                    );
                    error
                }
                Ok(Ok(response)) => {
                    let duration = attempt_started.elapsed();
                    match classify_response(method, endpoint, &response) {
                        None => {
                            let parsed = parse_body(&response);
                            self.logger.log_response(
                                method,
                                url.as_str(),
                                response.status,
                                duration,
                                &metadata.request_id,
                                parsed.as_ref().ok(),
                            );
                            if let Some(circuit) = &self.circuit {
                                circuit.record_success();
                            }
                            return parsed;
                        }
                        Some(error) => {
                            self.logger.log_response(
                                method,
                                url.as_str(),
                                response.status,
                                duration,
                                &metadata.request_id,
                                raw_body(&response).as_ref(),
                            );
                            error
                        }
                    }
                }
            };

            if let Some(circuit) = &self.circuit {
                circuit.record_failure();
            }

            match self.config.retry.decide(&error, metadata.retry_count) {
                RetryDecision::Stop => return Err(error),
                RetryDecision::RetryAfter(delay) => {
                    metadata.retry_count += 1;
                    self.tracker.record_retry(&metadata.request_id);
                    self.logger.log_retry(
                        method,
                        url.as_str(),
                        metadata.retry_count,
                        self.config.retry.max_retries,
                        &error.to_string(),
                        &metadata.request_id,
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn build_headers(
        &self,
        request_id: &str,
        options: &RequestOptions,
        has_body: bool,
    ) -> Vec<(String, String)> {
        let mut headers = self.config.default_headers.clone();
        if let Some(token) = &self.config.bearer_token {
            headers.push((
                "authorization".to_string(),
                format!("Bearer {}", token.expose_secret()),
            ));
        }
        headers.extend(options.headers.iter().cloned());
        if has_body
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        headers.push((REQUEST_ID_HEADER.to_string(), request_id.to_string()));
        headers
    }
}

/// Turn a success response into the value handed to the caller: JSON bodies
/// are parsed, anything else is surfaced as text, and 204 yields null.
fn parse_body(response: &TransportResponse) -> Result<Value> {
    if response.status == 204 || response.body.is_empty() {
        return Ok(Value::Null);
    }
    let is_json = response
        .content_type()
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        Ok(serde_json::from_str(&response.body)?)
    } else {
        Ok(Value::String(response.body.clone()))
    }
}

/// Best-effort structured view of an error body, for the log line only.
fn raw_body(response: &TransportResponse) -> Option<Value> {
    if response.body.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone())),
    )
}
