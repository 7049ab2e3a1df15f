// Dispatch Infrastructure - System Adapters
// Implements: PayloadHandler, SystemProbe, JobAction

pub mod handler_kind;
pub mod jobs;
pub mod log_handler;
pub mod routing_handler;
pub mod subprocess_handler;
pub mod system_probe_impl;

pub use handler_kind::{build_handler, HandlerKind};
pub use jobs::{DelayedCheck, JobKind, QueueDepthReport, SystemHealthCheck};
pub use log_handler::LogPayloadHandler;
pub use routing_handler::RoutingHandler;
pub use subprocess_handler::SubprocessHandler;
pub use system_probe_impl::SysinfoProbe;
