// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_action;
pub mod payload_handler;
pub mod system_probe;
pub mod time_provider;
pub mod work_queue;

// Re-exports
pub use id_provider::IdProvider;
pub use job_action::{JobAction, JobError};
pub use payload_handler::{HandlerError, HandlerReport, PayloadHandler};
pub use system_probe::{SystemMetrics, SystemProbe};
pub use time_provider::TimeProvider;
pub use work_queue::WorkQueue;
