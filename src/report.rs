//! Collaborator sinks: error reporting and breadcrumb tracing.
//!
//! The pipeline does not render anything user-facing; it hands structured
//! failure context to whatever reporter the application wires in, and drops
//! a breadcrumb on every outbound dispatch.

use serde_json::Value;

use crate::Error;

/// Context attached to a reported failure.
#[derive(Clone, Debug, Default)]
pub struct ReportContext {
    pub endpoint: String,
    pub method: String,
    pub status: Option<u16>,
    pub response_body: Option<String>,
    /// Human-readable description of what the user was doing, e.g.
    /// "Creating project".
    pub user_action: Option<String>,
    /// Calling UI area, for diagnostics.
    pub component: Option<String>,
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &Error, context: &ReportContext);
}

pub trait BreadcrumbSink: Send + Sync {
    fn record(&self, message: &str, category: &str, data: Option<&Value>);
}

/// Default sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ErrorReporter for NoopSink {
    fn report(&self, _error: &Error, _context: &ReportContext) {}
}

impl BreadcrumbSink for NoopSink {
    fn record(&self, _message: &str, _category: &str, _data: Option<&Value>) {}
}
