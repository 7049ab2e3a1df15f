// System resource monitoring port
use async_trait::async_trait;

/// System resource metrics
#[derive(Debug, Clone)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub disk_used_gb: u64,
    pub disk_total_gb: u64,
}

/// System probe port, sampled by the system-health recurring job
#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Get current system metrics
    ///
    /// # Example
    /// ```text
    /// let metrics = probe.get_metrics().await;
    /// if metrics.cpu_usage_percent > 90.0 {
    ///     warn!("CPU saturated");
    /// }
    /// ```
    async fn get_metrics(&self) -> SystemMetrics;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock SystemProbe for testing
    pub struct MockSystemProbe {
        metrics: Arc<Mutex<SystemMetrics>>,
    }
    impl MockSystemProbe {
        pub fn new(cpu_usage_percent: f32) -> Self {
            Self {
                metrics: Arc::new(Mutex::new(SystemMetrics {
                    cpu_usage_percent,
                    memory_used_mb: 1024,
                    memory_total_mb: 2048,
                    disk_used_gb: 100,
                    disk_total_gb: 500,
                })),
            }
        }
        pub fn set_memory_total(&self, memory_total_mb: u64) {
            self.metrics.lock().unwrap().memory_total_mb = memory_total_mb;
        }
    }
    #[async_trait]
    impl SystemProbe for MockSystemProbe {
        async fn get_metrics(&self) -> SystemMetrics {
            self.metrics.lock().unwrap().clone()
        }
    }
}
