// Severity levels and alert events

use serde::{Deserialize, Serialize};

use super::ResourceId;

/// Ordered severity; `Normal < Warning < Danger`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Normal,
    Warning,
    Danger,
}

/// Raised when a resource moves into a strictly higher severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub resource: ResourceId,
    pub level: SeverityLevel,
    pub usage: f64,
    /// Timestamp of the snapshot that crossed the threshold (ms since epoch).
    pub timestamp: u64,
}
