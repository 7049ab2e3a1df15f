// Recurring Job Action Port

use async_trait::async_trait;
use thiserror::Error;

/// Recurring job errors (JobFailure)
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Job panicked: {0}")]
    Panicked(String),

    #[error("Job was cancelled")]
    Cancelled,
}

/// Zero-argument operation run by the scheduler
#[async_trait]
pub trait JobAction: Send + Sync {
    async fn run(&self) -> Result<(), JobError>;
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Counts runs; optionally fails or sleeps
    #[derive(Clone, Default)]
    pub struct CountingAction {
        runs: Arc<AtomicUsize>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl CountingAction {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }
        pub fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobAction for CountingAction {
        async fn run(&self) -> Result<(), JobError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail {
                return Err(JobError::ExecutionFailed("mock failure".to_string()));
            }
            Ok(())
        }
    }

    /// Panics on every run
    pub struct PanickingAction;

    #[async_trait]
    impl JobAction for PanickingAction {
        async fn run(&self) -> Result<(), JobError> {
            panic!("mock job panic");
        }
    }
}
