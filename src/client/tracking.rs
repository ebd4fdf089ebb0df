//! In-flight request tracking.

use std::time::Instant;

use dashmap::DashMap;
use uuid::Uuid;

/// Correlation state for one logical request. A retry reuses the same
/// metadata, so the request id stays stable across attempts.
#[derive(Clone, Debug)]
pub struct RequestMetadata {
    pub request_id: String,
    pub started_at: Instant,
    pub retry_count: u32,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            started_at: Instant::now(),
            retry_count: 0,
        }
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of requests currently in flight, keyed by request id.
///
/// Entries must be removed on every terminal outcome — success,
/// non-retryable failure, retries exhausted, or circuit-open rejection —
/// since the map is process-wide and otherwise unbounded.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    entries: DashMap<String, RequestMetadata>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, metadata: &RequestMetadata) {
        self.entries
            .insert(metadata.request_id.clone(), metadata.clone());
    }

    /// Bump the stored retry count for a logical request. Returns the new
    /// count, or 0 if the request is no longer tracked.
    pub fn record_retry(&self, request_id: &str) -> u32 {
        match self.entries.get_mut(request_id) {
            Some(mut entry) => {
                entry.retry_count += 1;
                entry.retry_count
            }
            None => 0,
        }
    }

    pub fn deregister(&self, request_id: &str) {
        self.entries.remove(request_id);
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.entries.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_ids_are_unique() {
        let a = RequestMetadata::new();
        let b = RequestMetadata::new();
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.retry_count, 0);
    }

    #[test]
    fn test_register_and_deregister() {
        let tracker = InFlightTracker::new();
        let metadata = RequestMetadata::new();

        tracker.register(&metadata);
        assert!(tracker.contains(&metadata.request_id));
        assert_eq!(tracker.len(), 1);

        tracker.deregister(&metadata.request_id);
        assert!(!tracker.contains(&metadata.request_id));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_record_retry_updates_stored_count() {
        let tracker = InFlightTracker::new();
        let metadata = RequestMetadata::new();
        tracker.register(&metadata);

        assert_eq!(tracker.record_retry(&metadata.request_id), 1);
        assert_eq!(tracker.record_retry(&metadata.request_id), 2);
        assert_eq!(tracker.record_retry("unknown"), 0);
    }
}
