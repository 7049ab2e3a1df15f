// Accepted-event counter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide count of accepted ingress events
///
/// Cloning yields another handle to the same counter. There is no reset:
/// the value only grows, once per accepted event.
#[derive(Debug, Clone, Default)]
pub struct EventCounter {
    inner: Arc<AtomicU64>,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted event, returning the new total
    pub fn increment(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}
