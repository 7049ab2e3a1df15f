// Work Item Domain Model

use serde::{Deserialize, Serialize};

/// Work item ID (UUID v4 in production)
pub type WorkItemId = String;

/// Opaque work payload (a JSON object accepted at ingress)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkPayload(serde_json::Value);

impl WorkPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Look up a top-level field of an object payload
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }
}

/// One unit of deferred work
///
/// Created by the ingress use case, owned by the work queue until a worker
/// claims it, dropped once the handler returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub payload: WorkPayload,
    pub enqueued_at: i64, // epoch ms
    pub attempts: u32,
}

impl WorkItem {
    /// Create a new work item
    ///
    /// # Arguments
    ///
    /// * `id` - Unique item ID (injected, not generated)
    /// * `enqueued_at` - Enqueue timestamp in epoch ms (injected, not system time)
    /// * `payload` - Opaque payload
    pub fn new(id: impl Into<String>, enqueued_at: i64, payload: WorkPayload) -> Self {
        Self {
            id: id.into(),
            payload,
            enqueued_at,
            attempts: 0,
        }
    }

    /// Create a test item with a deterministic ID (test-1, test-2, ...)
    ///
    /// **Note**: only for tests. Production code injects ID and time via providers.
    pub fn new_test(payload: serde_json::Value) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("test-{}", counter),
            (counter * 1000) as i64,
            WorkPayload::new(payload),
        )
    }

    /// Mark the item as claimed by a worker
    pub fn claim(&mut self) {
        self.attempts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_item_has_no_attempts() {
        let item = WorkItem::new("a", 42, WorkPayload::new(json!({"id": 1})));
        assert_eq!(item.attempts, 0);
        assert_eq!(item.enqueued_at, 42);
        assert_eq!(item.payload.field("id"), Some(&json!(1)));
    }

    #[test]
    fn test_claim_counts_attempts() {
        let mut item = WorkItem::new_test(json!({}));
        item.claim();
        assert_eq!(item.attempts, 1);
    }

    #[test]
    fn test_payload_serializes_transparently() {
        let payload = WorkPayload::new(json!({"k": "v"}));
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"k": "v"}));
    }
}
