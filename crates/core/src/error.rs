// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Enqueue or dequeue attempted after the queue was closed
    #[error("Work queue is closed")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Handler failure: {0}")]
    Handler(#[from] crate::port::HandlerError),

    #[error("Job failure: {0}")]
    Job(#[from] crate::port::JobError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire error codes used by the HTTP and JSON-RPC surfaces
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const QUEUE_UNAVAILABLE: i32 = 5003;
}

impl AppError {
    /// True when the caller should treat the service as unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AppError::QueueClosed)
    }

    /// Wire code reported to API clients
    pub fn code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Domain(_) | AppError::Serialization(_) => {
                code::VALIDATION_ERROR
            }
            AppError::QueueClosed => code::QUEUE_UNAVAILABLE,
            AppError::Io(_)
            | AppError::Config(_)
            | AppError::Handler(_)
            | AppError::Job(_)
            | AppError::Internal(_) => code::INTERNAL_ERROR,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
