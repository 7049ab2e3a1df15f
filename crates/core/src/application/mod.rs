// Application Layer - Use Cases and Background Services

pub mod ingress;
pub mod scheduler;
pub mod worker;

// Re-exports
pub use ingress::{Acknowledgment, IngressService};
pub use scheduler::{JobRegistry, RecurringJob, Scheduler};
pub use worker::{
    shutdown_channel, DrainOutcome, PoolHandle, ServiceHandle, ShutdownSender, ShutdownToken, Worker,
    WorkerPool, WorkerStats,
};
