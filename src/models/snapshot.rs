// Point-in-time metric snapshot models

use serde::{Deserialize, Serialize};

use super::ResourceId;
use crate::error::MalformedSnapshotError;

/// Upper bound of every usage value (percent).
pub const USAGE_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub usage_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ResourceUsage {
    /// Usage without absolute values (CPU).
    pub fn ratio(usage_percent: f64) -> Self {
        Self {
            usage_percent,
            used: None,
            total: None,
        }
    }

    /// Usage derived from used/total bytes; 0 when total is 0.
    pub fn from_bytes(used: u64, total: u64) -> Self {
        Self {
            usage_percent: percent_of(used, total),
            used: Some(used),
            total: Some(total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerUsage {
    pub id: String,
    pub name: String,
    /// Share of the host's online CPUs, 0–100.
    pub cpu_percent: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

impl ContainerUsage {
    pub fn memory_percent(&self) -> f64 {
        percent_of(self.memory_usage_bytes, self.memory_limit_bytes)
    }
}

/// One reading of every tracked resource. Shared as `Arc<MetricSnapshot>` once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub cpu: ResourceUsage,
    pub memory: ResourceUsage,
    pub disk: ResourceUsage,
    #[serde(default)]
    pub containers: Vec<ContainerUsage>,
}

impl MetricSnapshot {
    /// Every series in this snapshot with its usage; host resources first.
    pub fn readings(&self) -> Vec<(ResourceId, f64)> {
        let mut out = Vec::with_capacity(3 + self.containers.len() * 2);
        out.push((ResourceId::Cpu, self.cpu.usage_percent));
        out.push((ResourceId::Memory, self.memory.usage_percent));
        out.push((ResourceId::Disk, self.disk.usage_percent));
        for c in &self.containers {
            out.push((ResourceId::ContainerCpu(c.name.clone()), c.cpu_percent));
            out.push((ResourceId::ContainerMemory(c.name.clone()), c.memory_percent()));
        }
        out
    }

    /// Shape/range checks applied before a snapshot may touch history or alert state.
    pub fn validate(&self) -> Result<(), MalformedSnapshotError> {
        for (resource, usage) in [
            ("cpu", &self.cpu),
            ("memory", &self.memory),
            ("disk", &self.disk),
        ] {
            if let (Some(used), Some(total)) = (usage.used, usage.total)
                && used > total
            {
                return Err(MalformedSnapshotError::UsedExceedsTotal {
                    resource: resource.to_string(),
                    used,
                    total,
                });
            }
        }
        for (resource, value) in self.readings() {
            check_usage(&resource, value)?;
        }
        Ok(())
    }
}

fn check_usage(resource: &ResourceId, value: f64) -> Result<(), MalformedSnapshotError> {
    if !value.is_finite() {
        return Err(MalformedSnapshotError::NonFinite {
            resource: resource.to_string(),
        });
    }
    if !(0.0..=USAGE_MAX).contains(&value) {
        return Err(MalformedSnapshotError::OutOfRange {
            resource: resource.to_string(),
            value,
        });
    }
    Ok(())
}

fn percent_of(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
