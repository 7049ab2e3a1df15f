//! Ingress → Work Queue → Worker Pool
//!
//! Runs the real in-memory queue and worker pool end to end.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::application::{shutdown_channel, DrainOutcome, IngressService, WorkerPool};
use dispatch_core::domain::{EventCounter, WorkItem};
use dispatch_core::error::AppError;
use dispatch_core::port::id_provider::UuidProvider;
use dispatch_core::port::payload_handler::mocks::{MockBehavior, MockPayloadHandler};
use dispatch_core::port::time_provider::SystemTimeProvider;
use dispatch_core::port::{HandlerError, HandlerReport, PayloadHandler, WorkQueue};
use dispatch_infra_memory::InMemoryWorkQueue;
use dispatch_infra_system::LogPayloadHandler;
use serde_json::json;

fn ingress_over(queue: Arc<InMemoryWorkQueue>) -> IngressService {
    IngressService::new(
        queue,
        EventCounter::new(),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )
}

fn ids(items: &[WorkItem]) -> Vec<i64> {
    items
        .iter()
        .filter_map(|item| item.payload.field("id").and_then(|v| v.as_i64()))
        .collect()
}

/// Events accepted before any worker exists are processed in order once one starts
#[tokio::test]
async fn test_fifo_with_worker_started_later() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());

    for id in 1..=3 {
        let ack = ingress.accept(json!({ "id": id })).await.unwrap();
        assert_eq!(ack.status, "enqueued");
        assert_eq!(ack.data, json!({ "id": id }));
    }
    assert_eq!(ingress.counter().get(), 3);

    let handler = Arc::new(MockPayloadHandler::new_success());
    let (_tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(1, queue.clone(), handler.clone()).spawn(&token);

    queue.close().await;
    pool.join().await;

    assert_eq!(ids(&handler.seen()), vec![1, 2, 3]);
    assert!(handler.seen().iter().all(|item| item.attempts == 1));
}

/// N accepted events ⇒ counter = N, independent of worker speed
#[tokio::test]
async fn test_counter_matches_accepted_events() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = Arc::new(ingress_over(queue.clone()));
    let handler = Arc::new(MockPayloadHandler::new(MockBehavior::Slow(
        Duration::from_millis(5),
    )));
    let (_tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(2, queue.clone(), handler.clone()).spawn(&token);

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let ingress = Arc::clone(&ingress);
            tokio::spawn(async move {
                for i in 0..25 {
                    ingress.accept(json!({ "producer": p, "seq": i })).await.unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    // Workers are still busy; the counter is already final
    assert_eq!(ingress.counter().get(), 100);

    queue.close().await;
    pool.join().await;
    assert_eq!(handler.call_count(), 100);
    assert_eq!(pool.stats().succeeded(), 100);
}

/// Per-producer order survives concurrent producers
#[tokio::test]
async fn test_fifo_per_producer() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = Arc::new(ingress_over(queue.clone()));

    let producers: Vec<_> = (0..3)
        .map(|p| {
            let ingress = Arc::clone(&ingress);
            tokio::spawn(async move {
                for seq in 0..50 {
                    ingress.accept(json!({ "producer": p, "seq": seq })).await.unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }
    queue.close().await;

    let mut last_seen = [-1i64; 3];
    while let Some(item) = queue.dequeue().await.unwrap() {
        let p = item.payload.field("producer").and_then(|v| v.as_u64()).unwrap() as usize;
        let seq = item.payload.field("seq").and_then(|v| v.as_i64()).unwrap();
        assert!(seq > last_seen[p], "producer {} out of order", p);
        last_seen[p] = seq;
    }
    assert_eq!(last_seen, [49, 49, 49]);
}

/// Ingress while the queue is closed fails and the counter is unchanged
#[tokio::test]
async fn test_closed_queue_rejects_and_counter_unchanged() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    ingress.accept(json!({ "id": 1 })).await.unwrap();

    queue.close().await;
    let err = ingress.accept(json!({ "id": 2 })).await.unwrap_err();

    assert!(matches!(err, AppError::QueueClosed));
    assert_eq!(ingress.counter().get(), 1);
    assert_eq!(queue.len().await, 1);
}

/// Every item reaches exactly one worker
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_dispatch() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    let handler = Arc::new(MockPayloadHandler::new_success());
    let (_tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(4, queue.clone(), handler.clone()).spawn(&token);

    for id in 0..300 {
        ingress.accept(json!({ "id": id })).await.unwrap();
    }
    queue.close().await;
    pool.join().await;

    let seen = ids(&handler.seen());
    assert_eq!(seen.len(), 300);
    let unique: HashSet<i64> = seen.into_iter().collect();
    assert_eq!(unique.len(), 300);
}

/// A failing item does not keep the next one from being processed
#[tokio::test]
async fn test_handler_failure_does_not_block_next_item() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    ingress.accept(json!({ "name": "A", "fail": true })).await.unwrap();
    ingress.accept(json!({ "name": "B" })).await.unwrap();

    let handler = Arc::new(LogPayloadHandler::new(Arc::new(SystemTimeProvider)));
    let (_tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(1, queue.clone(), handler).spawn(&token);
    queue.close().await;
    pool.join().await;

    let stats = pool.stats();
    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.succeeded(), 1);
}

struct PanicOnFlag;

#[async_trait]
impl PayloadHandler for PanicOnFlag {
    async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError> {
        if item.payload.field("explode").is_some() {
            panic!("handler exploded on {}", item.id);
        }
        Ok(HandlerReport::default())
    }
}

/// A panicking handler neither kills its worker nor the pool
#[tokio::test]
async fn test_handler_panic_is_contained() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    ingress.accept(json!({ "explode": true })).await.unwrap();
    ingress.accept(json!({ "id": 2 })).await.unwrap();
    ingress.accept(json!({ "id": 3 })).await.unwrap();

    let (_tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(1, queue.clone(), Arc::new(PanicOnFlag)).spawn(&token);
    queue.close().await;
    pool.join().await;

    let stats = pool.stats().snapshot();
    assert_eq!(stats.panicked, 1);
    assert_eq!(stats.succeeded, 2);
}

/// Shutdown token stops idle workers even though the queue is still open
#[tokio::test]
async fn test_shutdown_stops_idle_workers() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let (tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(3, queue.clone(), Arc::new(MockPayloadHandler::new_success()))
        .spawn(&token);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.len(), 3);
    tx.shutdown();

    tokio::time::timeout(Duration::from_secs(2), pool.join())
        .await
        .expect("workers exit on shutdown");
    assert!(pool.is_empty());
    assert!(!queue.is_closed());
}

/// Closing ingress then draining lets in-flight and pending items finish
#[tokio::test]
async fn test_shutdown_drains_accepted_events() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    let handler = Arc::new(MockPayloadHandler::new(MockBehavior::Slow(Duration::from_millis(10))));
    let (tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(2, queue.clone(), handler.clone()).spawn(&token);

    for i in 0..6 {
        ingress.accept(json!({"id": i})).await.unwrap();
    }
    queue.close().await;
    assert!(ingress.accept(json!({"id": 99})).await.is_err());

    let outcome = pool
        .drain(Duration::from_secs(2), Duration::from_millis(200), &tx)
        .await;

    assert_eq!(outcome, DrainOutcome::Drained);
    assert_eq!(handler.call_count(), 6);
    assert_eq!(ingress.counter().get(), 6);
    assert_eq!(queue.len().await, 0);
}

/// Idle workers on an open queue leave once the deadline fires the shutdown token
#[tokio::test]
async fn test_shutdown_stops_workers_after_deadline() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let (tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(2, queue.clone(), Arc::new(MockPayloadHandler::new_success()))
        .spawn(&token);

    let outcome = pool
        .drain(Duration::from_millis(30), Duration::from_secs(2), &tx)
        .await;

    assert_eq!(outcome, DrainOutcome::Stopped);
    assert!(pool.is_empty());
}

/// A worker stuck in its handler is aborted once the grace period runs out
#[tokio::test]
async fn test_shutdown_aborts_stuck_worker() {
    let queue = Arc::new(InMemoryWorkQueue::new());
    let ingress = ingress_over(queue.clone());
    let handler = Arc::new(MockPayloadHandler::new(MockBehavior::Slow(Duration::from_secs(30))));
    let (tx, token) = shutdown_channel();
    let mut pool = WorkerPool::new(2, queue.clone(), handler.clone()).spawn(&token);

    ingress.accept(json!({"id": 1})).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.close().await;

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        pool.drain(Duration::from_millis(50), Duration::from_millis(50), &tx),
    )
    .await
    .expect("drain is bounded by deadline plus grace");

    assert_eq!(outcome, DrainOutcome::Aborted);
    assert!(pool.is_empty());
    assert_eq!(handler.call_count(), 1);
    assert_eq!(pool.stats().snapshot().processed, 0);
}
