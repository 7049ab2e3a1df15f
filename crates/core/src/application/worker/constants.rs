// Worker & scheduler constants (no magic values)
use std::time::Duration;

/// Sleep duration after a queue error before trying again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Default number of workers in the pool
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// How long shutdown waits for workers to drain the closed queue (5 seconds)
pub const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Workers get this long to stop after the shutdown token fires, then they are aborted
pub const WORKER_ABORT_GRACE: Duration = Duration::from_secs(1);

/// Scheduler tick interval (one time unit = 1 second)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum nesting depth accepted for ingress payloads
pub const MAX_PAYLOAD_DEPTH: usize = 32;
