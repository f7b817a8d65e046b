// Host CPU, memory and disk usage via sysinfo

use crate::models::ResourceUsage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{Disks, System};
use tracing::instrument;

pub struct SysinfoRepo {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    last_cpu_refresh: Arc<std::sync::Mutex<Option<(Instant, f64)>>>,
    disk_mount: PathBuf,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        Self::with_disk_mount("/")
    }

    /// Disk usage is reported for `mount`, falling back to the first listed disk.
    pub fn with_disk_mount(mount: impl Into<PathBuf>) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let disks = Disks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            last_cpu_refresh: Arc::new(std::sync::Mutex::new(None)),
            disk_mount: mount.into(),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu_usage"))]
    pub async fn get_cpu_usage(&self) -> anyhow::Result<ResourceUsage> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            let mut guard = last_cpu_refresh
                .lock()
                .map_err(|e| anyhow::anyhow!("cpu refresh lock poisoned: {}", e))?;

            let now = Instant::now();
            let usage = match *guard {
                // Refreshing faster than sysinfo's minimum interval yields noise; reuse the last value.
                Some((prev_ts, prev_usage))
                    if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                {
                    prev_usage
                }
                _ => {
                    sys.refresh_cpu_all();
                    let usage = sys.global_cpu_usage() as f64;
                    *guard = Some((now, usage));
                    usage
                }
            };

            Ok(ResourceUsage::ratio(usage.clamp(0.0, 100.0)))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_memory_usage"))]
    pub async fn get_memory_usage(&self) -> anyhow::Result<ResourceUsage> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            Ok(ResourceUsage::from_bytes(used, total))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disk_usage"))]
    pub async fn get_disk_usage(&self) -> anyhow::Result<ResourceUsage> {
        let disks = self.disks.clone();
        let mount = self.disk_mount.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(false);
            let disk = disks_guard
                .list()
                .iter()
                .find(|d| d.mount_point() == Path::new(&mount))
                .or_else(|| disks_guard.list().first())
                .ok_or_else(|| anyhow::anyhow!("no disks reported"))?;

            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            Ok(ResourceUsage::from_bytes(used, total))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}
