//! Sensitive-field masking and payload truncation for log output.

use regex::RegexSet;
use regex::RegexSetBuilder;
use serde_json::Value;

/// Field-name patterns treated as sensitive, matched case-insensitively
/// against every object key.
pub const DEFAULT_SENSITIVE_PATTERNS: &[&str] = &[
    r"api[_-]?key",
    r"auth(orization)?",
    r"bearer",
    r"token",
    r"password",
    r"secret",
    r"credential",
    r"x-api-key",
];

/// Logged payloads longer than this many characters are cut to a prefix.
pub const DEFAULT_MAX_LOGGED_CHARS: usize = 2000;

const SHORT_SECRET_PLACEHOLDER: &str = "***";

/// Masking rules handed to the logger at construction, so the matching
/// behavior is explicit and auditable rather than scattered pattern
/// literals.
#[derive(Clone, Debug)]
pub struct MaskingConfig {
    matcher: RegexSet,
    max_logged_chars: usize,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        // The default patterns are valid regexes, so this cannot fail.
        Self::new(DEFAULT_SENSITIVE_PATTERNS, DEFAULT_MAX_LOGGED_CHARS)
            .unwrap_or_else(|_| Self::match_nothing())
    }
}

impl MaskingConfig {
    pub fn new(patterns: &[&str], max_logged_chars: usize) -> Result<Self, regex::Error> {
        let matcher = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            matcher,
            max_logged_chars,
        })
    }

    fn match_nothing() -> Self {
        Self {
            matcher: RegexSet::empty(),
            max_logged_chars: DEFAULT_MAX_LOGGED_CHARS,
        }
    }

    pub fn is_sensitive(&self, field_name: &str) -> bool {
        self.matcher.is_match(field_name)
    }

    pub fn max_logged_chars(&self) -> usize {
        self.max_logged_chars
    }

    /// Recursively mask sensitive string fields in a JSON value.
    ///
    /// Sensitive keys with string values are replaced by [`mask_str`];
    /// everything else recurses or passes through unchanged.
    pub fn mask_value(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, val)| {
                        let masked = match val {
                            Value::String(s) if self.is_sensitive(key) => {
                                Value::String(mask_str(s))
                            }
                            other => self.mask_value(other),
                        };
                        (key.clone(), masked)
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.mask_value(item)).collect())
            }
            other => other.clone(),
        }
    }

    /// Mask, serialize, and truncate a value for a log line. Never panics:
    /// render failures degrade to a placeholder.
    pub fn render(&self, value: &Value) -> String {
        let masked = self.mask_value(value);
        let rendered =
            serde_json::to_string(&masked).unwrap_or_else(|_| "<unrenderable>".to_string());
        self.truncate(&rendered)
    }

    /// Cut an over-long payload to a prefix plus a marker carrying the
    /// original total length. The caller's value is never touched, only the
    /// log line.
    pub fn truncate(&self, rendered: &str) -> String {
        let total = rendered.chars().count();
        if total <= self.max_logged_chars {
            return rendered.to_string();
        }
        let prefix: String = rendered.chars().take(self.max_logged_chars).collect();
        format!("{prefix}… [truncated, {total} chars total]")
    }
}

/// Mask one secret string: short values collapse to a fixed placeholder,
/// longer ones keep their first and last four characters.
pub fn mask_str(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 8 {
        return SHORT_SECRET_PLACEHOLDER.to_string();
    }
    let head: String = secret.chars().take(4).collect();
    let tail_start = len - 4;
    let tail: String = secret.chars().skip(tail_start).collect();
    format!("{head}…{tail}")
}
