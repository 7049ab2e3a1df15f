// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Recurring job already registered: {0}")]
    DuplicateJob(String),

    #[error("Invalid interval for job {name}: {reason}")]
    InvalidInterval { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
