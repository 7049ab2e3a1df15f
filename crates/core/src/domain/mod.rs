// Domain Layer - Pure entities and value types

pub mod counter;
pub mod error;
pub mod outcome;
pub mod work_item;

// Re-exports
pub use counter::EventCounter;
pub use error::DomainError;
pub use outcome::RunOutcome;
pub use work_item::{WorkItem, WorkItemId, WorkPayload};
