// Work Queue Port (Interface)

use crate::domain::WorkItem;
use crate::error::Result;
use async_trait::async_trait;

/// Ordered channel of pending work items
///
/// Implementations guarantee FIFO order per producer and hand each item to
/// exactly one consumer.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append an item to the tail
    ///
    /// # Errors
    /// - `AppError::QueueClosed` once `close` has been called
    async fn enqueue(&self, item: WorkItem) -> Result<()>;

    /// Wait for the next item
    ///
    /// Returns `Ok(None)` when the queue is closed and drained.
    async fn dequeue(&self) -> Result<Option<WorkItem>>;

    /// Stop accepting new items; pending items stay available to consumers
    async fn close(&self);

    /// Number of pending items
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_closed(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Non-blocking queue: `dequeue` yields `None` as soon as it is empty
    #[derive(Default)]
    pub struct MockWorkQueue {
        items: Mutex<VecDeque<WorkItem>>,
        closed: AtomicBool,
    }

    impl MockWorkQueue {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
            Self {
                items: Mutex::new(items.into_iter().collect()),
                closed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl WorkQueue for MockWorkQueue {
        async fn enqueue(&self, item: WorkItem) -> Result<()> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(AppError::QueueClosed);
            }
            self.items.lock().unwrap().push_back(item);
            Ok(())
        }

        async fn dequeue(&self) -> Result<Option<WorkItem>> {
            Ok(self.items.lock().unwrap().pop_front())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        async fn len(&self) -> usize {
            self.items.lock().unwrap().len()
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }
}
