// Metric series identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Names one metric series: a host resource or a per-container resource.
///
/// String form: `cpu`, `memory`, `disk`, `container/<name>/cpu`, `container/<name>/memory`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ResourceId {
    Cpu,
    Memory,
    Disk,
    ContainerCpu(String),
    ContainerMemory(String),
}

impl ResourceId {
    pub fn is_container(&self) -> bool {
        matches!(self, Self::ContainerCpu(_) | Self::ContainerMemory(_))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Memory => f.write_str("memory"),
            Self::Disk => f.write_str("disk"),
            Self::ContainerCpu(name) => write!(f, "container/{}/cpu", name),
            Self::ContainerMemory(name) => write!(f, "container/{}/memory", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource '{0}'")]
pub struct ParseResourceError(pub String);

impl FromStr for ResourceId {
    type Err = ParseResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => return Ok(Self::Cpu),
            "memory" => return Ok(Self::Memory),
            "disk" => return Ok(Self::Disk),
            _ => {}
        }
        // Container names may not contain '/', so split from both ends.
        let rest = s
            .strip_prefix("container/")
            .ok_or_else(|| ParseResourceError(s.to_string()))?;
        let (name, kind) = rest
            .rsplit_once('/')
            .filter(|(name, _)| !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| ParseResourceError(s.to_string()))?;
        match kind {
            "cpu" => Ok(Self::ContainerCpu(name.to_string())),
            "memory" => Ok(Self::ContainerMemory(name.to_string())),
            _ => Err(ParseResourceError(s.to_string())),
        }
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ParseResourceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
