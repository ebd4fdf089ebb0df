//! Resilient API client: request dispatcher and verb methods.

mod builder;
mod classify;
mod config;
mod execute;
mod tracking;

pub use builder::ClientBuilder;
pub use classify::DEFAULT_RETRY_AFTER;
pub use config::{ClientConfig, DEFAULT_TIMEOUT, MAX_REQUEST_TIMEOUT, RequestOptions};
pub use execute::REQUEST_ID_HEADER;
pub use tracking::{InFlightTracker, RequestMetadata};

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::observability::RequestLogger;
use crate::report::{BreadcrumbSink, ErrorReporter, NoopSink};
use crate::resilience::CircuitBreaker;
use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

/// Resilient API client.
///
/// Construct one per backend at application startup and pass it by
/// reference; the circuit breaker's state is shared across every call made
/// through the same instance, and independent clients do not interfere.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    circuit: Option<Arc<CircuitBreaker>>,
    logger: RequestLogger,
    tracker: Arc<InFlightTracker>,
    reporter: Arc<dyn ErrorReporter>,
    breadcrumbs: Arc<dyn BreadcrumbSink>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client over the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_parts(config, None, None, None)
    }

    pub(crate) fn with_parts(
        config: ClientConfig,
        transport: Option<Arc<dyn Transport>>,
        reporter: Option<Arc<dyn ErrorReporter>>,
        breadcrumbs: Option<Arc<dyn BreadcrumbSink>>,
    ) -> Result<Self> {
        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransport::new().map_err(|e| Error::Config(e.to_string()))?,
            ),
        };
        let circuit = config
            .circuit
            .as_ref()
            .map(|c| Arc::new(CircuitBreaker::new(c.clone())));
        let logger = RequestLogger::new(config.masking.clone());

        Ok(Self {
            config,
            transport,
            circuit,
            logger,
            tracker: Arc::new(InFlightTracker::new()),
            reporter: reporter.unwrap_or_else(|| Arc::new(NoopSink)),
            breadcrumbs: breadcrumbs.unwrap_or_else(|| Arc::new(NoopSink)),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::GET, endpoint, None::<&()>, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::POST, endpoint, body, options).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::PUT, endpoint, body, options).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::PATCH, endpoint, body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.send(Method::DELETE, endpoint, None::<&()>, options)
            .await
    }

    /// Dispatch with an explicit method, deserializing into the caller's
    /// expected shape. Non-JSON responses deserialize from their text; 204
    /// deserializes from null (use `()` or `Option<T>`).
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&impl Serialize>,
        options: RequestOptions,
    ) -> Result<T> {
        let value = self.request_value(method, endpoint, body, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Escape hatch: dispatch and return the raw JSON value.
    pub async fn request_value(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&impl Serialize>,
        options: RequestOptions,
    ) -> Result<Value> {
        let body = match body {
            Some(body) => Some(serde_json::to_value(body)?),
            None => None,
        };
        self.execute(method, endpoint, body, &options).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The breaker shared by all calls through this client, when enabled.
    pub fn circuit(&self) -> Option<&Arc<CircuitBreaker>> {
        self.circuit.as_ref()
    }

    /// Requests currently in flight through this client.
    pub fn in_flight(&self) -> &InFlightTracker {
        &self.tracker
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .field("max_retries", &self.config.retry.max_retries)
            .field("circuit_enabled", &self.circuit.is_some())
            .finish()
    }
}
