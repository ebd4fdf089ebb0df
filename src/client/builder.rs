//! Builder for [`Client`].

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::observability::MaskingConfig;
use crate::report::{BreadcrumbSink, ErrorReporter};
use crate::resilience::{CircuitConfig, ExponentialBackoff, RetryPolicy};
use crate::transport::Transport;
use crate::{Error, Result};

use super::config::ClientConfig;
use super::Client;

#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    backoff: Option<ExponentialBackoff>,
    max_rate_limit_wait: Option<Duration>,
    circuit: Option<CircuitConfig>,
    circuit_disabled: bool,
    default_headers: Vec<(String, String)>,
    bearer_token: Option<SecretString>,
    masking: Option<MaskingConfig>,
    transport: Option<Arc<dyn Transport>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    breadcrumbs: Option<Arc<dyn BreadcrumbSink>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL every endpoint path is resolved against. Required.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-attempt timeout. Clamped to [`super::MAX_REQUEST_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Cap rate-limit waits instead of honoring arbitrarily large
    /// `Retry-After` values.
    pub fn max_rate_limit_wait(mut self, cap: Duration) -> Self {
        self.max_rate_limit_wait = Some(cap);
        self
    }

    pub fn circuit(mut self, config: CircuitConfig) -> Self {
        self.circuit = Some(config);
        self
    }

    pub fn without_circuit(mut self) -> Self {
        self.circuit_disabled = true;
        self
    }

    /// Header applied to every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Bearer token sent as `Authorization` on every request. Held as a
    /// [`SecretString`] so accidental Debug output stays redacted.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn masking(mut self, masking: MaskingConfig) -> Self {
        self.masking = Some(masking);
        self
    }

    /// Swap the transport, e.g. for a custom-configured `reqwest` client.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn error_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn breadcrumbs(mut self, sink: impl BreadcrumbSink + 'static) -> Self {
        self.breadcrumbs = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let mut config = ClientConfig::new(&base_url)?;

        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        let mut retry = RetryPolicy::default();
        if let Some(max_retries) = self.max_retries {
            retry.max_retries = max_retries;
        }
        if let Some(backoff) = self.backoff {
            retry.backoff = backoff;
        }
        retry.max_rate_limit_wait = self.max_rate_limit_wait;
        config.retry = retry;

        config.circuit = if self.circuit_disabled {
            None
        } else {
            Some(self.circuit.unwrap_or_default())
        };
        config.default_headers = self.default_headers;
        config.bearer_token = self.bearer_token;
        if let Some(masking) = self.masking {
            config.masking = masking;
        }

        Client::with_parts(config, self.transport, self.reporter, self.breadcrumbs)
    }
}
