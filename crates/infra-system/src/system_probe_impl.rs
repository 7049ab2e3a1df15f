// System probe implementation
// reason: sysinfo for cross-platform system monitoring
use async_trait::async_trait;
use std::sync::Mutex;
use sysinfo::{Disks, System};
use tracing::debug;

use dispatch_core::port::system_probe::{SystemMetrics, SystemProbe};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// System probe backed by sysinfo
///
/// CPU usage is a delta between refreshes, so the first sample after startup
/// may read 0%.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    /// Create a new system probe
    ///
    /// # Example
    /// ```text
    /// let probe: Arc<dyn SystemProbe> = Arc::new(SysinfoProbe::new());
    /// ```
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemProbe for SysinfoProbe {
    async fn get_metrics(&self) -> SystemMetrics {
        let (cpu_usage_percent, memory_used_mb, memory_total_mb) = {
            // A poisoned lock only means a previous refresh panicked; the data is still usable
            let mut sys = self.system.lock().unwrap_or_else(|e| e.into_inner());
            sys.refresh_cpu();
            sys.refresh_memory();
            (
                sys.global_cpu_info().cpu_usage(),
                sys.used_memory() / MIB,
                sys.total_memory() / MIB,
            )
        };

        // Disk (first disk)
        let disks = Disks::new_with_refreshed_list();
        let (disk_used_gb, disk_total_gb) = disks
            .first()
            .map(|disk| {
                let total = disk.total_space() / GIB;
                let available = disk.available_space() / GIB;
                (total.saturating_sub(available), total)
            })
            .unwrap_or((0, 0));

        debug!(
            cpu = %cpu_usage_percent,
            mem_used_mb = %memory_used_mb,
            mem_total_mb = %memory_total_mb,
            disk_used_gb = %disk_used_gb,
            "System metrics collected"
        );

        SystemMetrics {
            cpu_usage_percent,
            memory_used_mb,
            memory_total_mb,
            disk_used_gb,
            disk_total_gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_metrics() {
        let probe = SysinfoProbe::new();
        let metrics = probe.get_metrics().await;

        // Basic sanity checks
        assert!(metrics.cpu_usage_percent >= 0.0);
        assert!(metrics.memory_total_mb > 0);
        assert!(metrics.memory_used_mb <= metrics.memory_total_mb);
        assert!(metrics.disk_used_gb <= metrics.disk_total_gb);
    }
}
