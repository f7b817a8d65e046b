// Turn raw Docker stats API responses into ContainerUsage.

use crate::models::ContainerUsage;
use bollard::models::ContainerStatsResponse;

/// CPU is the container's share of all online CPUs (0–100), memory is usage vs. limit.
/// Returns None while Docker has not yet reported both current and previous CPU stats.
pub(crate) fn process_statistics(
    s: &ContainerStatsResponse,
    id: &str,
    name: &str,
) -> Option<ContainerUsage> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let cpu_percent = if system_delta > 0 && cpu_delta > 0 {
        (cpu_delta as f64 / system_delta as f64) * 100.0
    } else {
        0.0
    };

    let memory_usage_bytes = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let memory_limit_bytes = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);
    // Usage briefly overshoots the limit under reclaim; keep the ratio within 100%.
    let memory_usage_bytes = if memory_limit_bytes > 0 {
        memory_usage_bytes.min(memory_limit_bytes)
    } else {
        memory_usage_bytes
    };

    Some(ContainerUsage {
        id: id.to_string(),
        name: name.to_string(),
        cpu_percent: cpu_percent.clamp(0.0, 100.0),
        memory_usage_bytes,
        memory_limit_bytes,
    })
}
