// Panic isolation for worker and scheduler safety
use std::any::Any;
use std::future::Future;
use tokio::task::JoinError;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed
    Success(T),
    /// Execution panicked
    Panicked(String),
    /// Task was aborted before completion
    Cancelled,
}

/// Run a future on its own task so a panic cannot unwind into the caller
///
/// # Example
/// ```text
/// let result = execute_guarded(async { panic!("boom") }).await;
/// assert!(matches!(result, PanicGuardResult::Panicked(_)));
/// ```
pub async fn execute_guarded<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    from_join_result(tokio::task::spawn(future).await)
}

/// Classify the result of awaiting a spawned task
pub fn from_join_result<T>(result: Result<T, JoinError>) -> PanicGuardResult<T> {
    match result {
        Ok(value) => PanicGuardResult::Success(value),
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = panic_message(join_err.into_panic());
            error!(panic_msg = %panic_msg, "Guarded task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
        Err(_) => PanicGuardResult::Cancelled,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
