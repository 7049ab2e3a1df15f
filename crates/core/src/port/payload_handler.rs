// Payload Handler Port
// Abstraction for executing one work item (in-process or subprocess)

use crate::domain::WorkItem;
use async_trait::async_trait;
use thiserror::Error;

/// Summary of a successful handler run
#[derive(Debug, Clone, Default)]
pub struct HandlerReport {
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub output: Option<String>,
}

/// Handler errors (HandlerFailure)
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Process timeout after {0}ms")]
    Timeout(i64),

    #[error("IO error: {0}")]
    Io(String),
}

/// Payload handler trait
///
/// Implementations:
/// - LogPayloadHandler: logs the payload, optionally simulating work
/// - SubprocessHandler: spawns the command described by the payload
/// - RoutingHandler: picks one of the above per item
#[async_trait]
pub trait PayloadHandler: Send + Sync {
    /// Process one work item
    ///
    /// # Errors
    /// Any `HandlerError` is contained by the worker: logged, counted, item discarded.
    async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock handler behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Fail only items whose payload has `"fail": true`
        FailFlagged,
        /// Sleep, then succeed
        Slow(Duration),
    }

    /// Mock payload handler recording every item it sees
    pub struct MockPayloadHandler {
        behavior: Arc<Mutex<MockBehavior>>,
        seen: Arc<Mutex<Vec<WorkItem>>>,
    }

    impl MockPayloadHandler {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn call_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
        /// Items in the order they were handled
        pub fn seen(&self) -> Vec<WorkItem> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PayloadHandler for MockPayloadHandler {
        async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError> {
            self.seen.lock().unwrap().push(item.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(HandlerReport::default()),
                MockBehavior::Fail(msg) => Err(HandlerError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::FailFlagged => {
                    if item.payload.field("fail") == Some(&serde_json::Value::Bool(true)) {
                        Err(HandlerError::Failed(format!("item {} flagged", item.id)))
                    } else {
                        Ok(HandlerReport::default())
                    }
                }
                MockBehavior::Slow(d) => {
                    tokio::time::sleep(d).await;
                    Ok(HandlerReport::default())
                }
            }
        }
    }
}
