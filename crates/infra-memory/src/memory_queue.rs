// In-memory WorkQueue implementation
// reason: tokio Mutex + Notify so idle consumers park without polling

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use dispatch_core::domain::WorkItem;
use dispatch_core::error::{AppError, Result};
use dispatch_core::port::WorkQueue;

#[derive(Default)]
struct QueueState {
    items: VecDeque<WorkItem>,
    closed: bool,
}

/// Unbounded FIFO queue shared by the ingress and the worker pool
///
/// Each item is popped under the lock, so it reaches exactly one consumer.
/// After `close`, consumers drain what is left and then receive `None`.
#[derive(Default)]
pub struct InMemoryWorkQueue {
    state: Mutex<QueueState>,
    available: Notify,
    closed: AtomicBool,
}

impl InMemoryWorkQueue {
    /// Create an empty, open queue
    ///
    /// # Example
    /// ```text
    /// let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn enqueue(&self, item: WorkItem) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(AppError::QueueClosed);
        }

        debug!(item_id = %item.id, depth = state.items.len() + 1, "Enqueued work item");
        state.items.push_back(item);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<WorkItem>> {
        loop {
            // Register interest before checking state so a concurrent
            // enqueue between the check and the await is not lost
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(item) = state.items.pop_front() {
                    if !state.items.is_empty() {
                        // Pass the baton so another idle consumer picks up the rest
                        self.available.notify_one();
                    }
                    return Ok(Some(item));
                }
                if state.closed {
                    return Ok(None);
                }
            }

            notified.await;
        }
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;
        self.closed.store(true, Ordering::SeqCst);
        info!(pending = state.items.len(), "Work queue closed");
        drop(state);

        self.available.notify_waiters();
    }

    async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready};

    fn item(id: u64) -> WorkItem {
        WorkItem::new_test(json!({ "id": id }))
    }

    fn id_of(item: &WorkItem) -> u64 {
        item.payload.field("id").and_then(|v| v.as_u64()).unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = InMemoryWorkQueue::new();
        for i in 1..=3 {
            queue.enqueue(item(i)).await.unwrap();
        }

        assert_eq!(queue.len().await, 3);
        for expected in 1..=3 {
            let got = queue.dequeue().await.unwrap().unwrap();
            assert_eq!(id_of(&got), expected);
        }
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_enqueue() {
        let queue = InMemoryWorkQueue::new();
        queue.close().await;

        let err = queue.enqueue(item(1)).await.unwrap_err();

        assert!(matches!(err, AppError::QueueClosed));
        assert!(queue.is_closed());
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn test_close_drains_then_returns_none() {
        let queue = InMemoryWorkQueue::new();
        queue.enqueue(item(1)).await.unwrap();
        queue.enqueue(item(2)).await.unwrap();
        queue.close().await;

        assert_eq!(id_of(&queue.dequeue().await.unwrap().unwrap()), 1);
        assert_eq!(id_of(&queue.dequeue().await.unwrap().unwrap()), 2);
        assert!(queue.dequeue().await.unwrap().is_none());
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_item() {
        let queue = InMemoryWorkQueue::new();
        let mut pending = tokio_test::task::spawn(queue.dequeue());
        assert_pending!(pending.poll());

        queue.enqueue(item(7)).await.unwrap();

        assert!(pending.is_woken());
        let got = assert_ready!(pending.poll()).unwrap().unwrap();
        assert_eq!(id_of(&got), 7);
    }

    #[tokio::test]
    async fn test_close_wakes_idle_consumer() {
        let queue = InMemoryWorkQueue::new();
        let mut pending = tokio_test::task::spawn(queue.dequeue());
        assert_pending!(pending.poll());

        queue.close().await;

        assert!(pending.is_woken());
        assert!(assert_ready!(pending.poll()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enqueue_before_consumer_exists() {
        let queue = Arc::new(InMemoryWorkQueue::new());
        for i in 1..=3 {
            queue.enqueue(item(i)).await.unwrap();
        }

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut seen = vec![];
                while let Some(item) = queue.dequeue().await.unwrap() {
                    seen.push(id_of(&item));
                }
                seen
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close().await;

        assert_eq!(consumer.await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_item_reaches_exactly_one_consumer() {
        const ITEMS: u64 = 500;
        let queue = Arc::new(InMemoryWorkQueue::new());

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    let mut seen = vec![];
                    while let Some(item) = queue.dequeue().await.unwrap() {
                        seen.push(id_of(&item));
                    }
                    seen
                })
            })
            .collect();

        for i in 0..ITEMS {
            queue.enqueue(item(i)).await.unwrap();
        }
        queue.close().await;

        let mut all = vec![];
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }

        assert_eq!(all.len() as u64, ITEMS);
        let unique: HashSet<u64> = all.into_iter().collect();
        assert_eq!(unique.len() as u64, ITEMS);
    }
}
