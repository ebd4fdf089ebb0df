//! Client configuration and per-call options.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::observability::MaskingConfig;
use crate::resilience::{CircuitConfig, RetryPolicy};
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard ceiling on any single attempt, kept safely under the hosting
/// platform's 5-minute request-duration limit.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(270);

/// Client configuration, constructed once per client instance.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: Url,
    /// Per-attempt timeout. Clamped to [`MAX_REQUEST_TIMEOUT`] at dispatch.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Circuit breaker configuration; `None` disables the breaker.
    pub circuit: Option<CircuitConfig>,
    /// Headers applied to every request before per-call headers.
    pub default_headers: Vec<(String, String)>,
    /// Bearer token applied as an `Authorization` header on every request.
    pub bearer_token: Option<SecretString>,
    pub masking: MaskingConfig,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {base_url:?}: {e}")))?;
        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            circuit: Some(CircuitConfig::default()),
            default_headers: Vec::new(),
            bearer_token: None,
            masking: MaskingConfig::default(),
        })
    }

    pub(crate) fn effective_timeout(&self) -> Duration {
        self.timeout.min(MAX_REQUEST_TIMEOUT)
    }
}

/// Per-call options: extra headers plus free-text labels used only for
/// logging and error reporting.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub user_action: Option<String>,
    pub component: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// What the user was doing, e.g. "Creating project".
    pub fn user_action(mut self, action: impl Into<String>) -> Self {
        self.user_action = Some(action.into());
        self
    }

    /// Calling UI area, e.g. "ProjectSettings".
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}
