// Threshold evaluation: severity classification with edge-triggered alerts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::ConfigError;
use crate::models::{Alert, ResourceId, SeverityLevel, USAGE_MAX};

/// Two cut points with `0 <= warning_at <= danger_at <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold")]
pub struct ThresholdConfig {
    warning_at: f64,
    danger_at: f64,
}

#[derive(Deserialize)]
struct RawThreshold {
    warning_at: f64,
    danger_at: f64,
}

impl TryFrom<RawThreshold> for ThresholdConfig {
    type Error = ConfigError;

    fn try_from(raw: RawThreshold) -> Result<Self, Self::Error> {
        Self::new(raw.warning_at, raw.danger_at)
    }
}

impl ThresholdConfig {
    pub fn new(warning_at: f64, danger_at: f64) -> Result<Self, ConfigError> {
        for value in [warning_at, danger_at] {
            if !(0.0..=USAGE_MAX).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { value });
            }
        }
        if warning_at > danger_at {
            return Err(ConfigError::InvalidThreshold {
                warning_at,
                danger_at,
            });
        }
        Ok(Self {
            warning_at,
            danger_at,
        })
    }

    pub fn warning_at(&self) -> f64 {
        self.warning_at
    }

    pub fn danger_at(&self) -> f64 {
        self.danger_at
    }

    /// Highest tier whose cut point is reached; a value equal to a cut point is in that tier.
    pub fn classify(&self, usage: f64) -> SeverityLevel {
        if usage >= self.danger_at {
            SeverityLevel::Danger
        } else if usage >= self.warning_at {
            SeverityLevel::Warning
        } else {
            SeverityLevel::Normal
        }
    }
}

fn default_threshold() -> ThresholdConfig {
    ThresholdConfig {
        warning_at: 70.0,
        danger_at: 90.0,
    }
}

/// Thresholds for every monitored resource kind. Container thresholds are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    #[serde(default = "default_threshold")]
    pub cpu: ThresholdConfig,
    #[serde(default = "default_threshold")]
    pub memory: ThresholdConfig,
    #[serde(default = "default_threshold")]
    pub disk: ThresholdConfig,
    #[serde(default)]
    pub container_cpu: Option<ThresholdConfig>,
    #[serde(default)]
    pub container_memory: Option<ThresholdConfig>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            cpu: default_threshold(),
            memory: default_threshold(),
            disk: default_threshold(),
            container_cpu: None,
            container_memory: None,
        }
    }
}

impl ThresholdSet {
    pub fn for_resource(&self, resource: &ResourceId) -> Option<&ThresholdConfig> {
        match resource {
            ResourceId::Cpu => Some(&self.cpu),
            ResourceId::Memory => Some(&self.memory),
            ResourceId::Disk => Some(&self.disk),
            ResourceId::ContainerCpu(_) => self.container_cpu.as_ref(),
            ResourceId::ContainerMemory(_) => self.container_memory.as_ref(),
        }
    }
}

/// Per-resource alert state. Alerts only on a strict increase in severity;
/// decreases are stored silently.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    thresholds: ThresholdSet,
    levels: HashMap<ResourceId, SeverityLevel>,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: ThresholdSet) -> Self {
        Self {
            thresholds,
            levels: HashMap::new(),
        }
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    /// Classify `usage`, store the level, and return an alert on an upward transition.
    /// Resources without a threshold are not tracked and always report `Normal`.
    pub fn evaluate(
        &mut self,
        resource: &ResourceId,
        usage: f64,
        timestamp: u64,
    ) -> (SeverityLevel, Option<Alert>) {
        let Some(threshold) = self.thresholds.for_resource(resource) else {
            return (SeverityLevel::Normal, None);
        };
        let level = threshold.classify(usage);
        let previous = self
            .levels
            .insert(resource.clone(), level)
            .unwrap_or_default();

        let alert = (level > previous).then(|| Alert {
            resource: resource.clone(),
            level,
            usage,
            timestamp,
        });
        (level, alert)
    }

    /// Last stored level; `Normal` for resources never evaluated.
    pub fn level(&self, resource: &ResourceId) -> SeverityLevel {
        self.levels.get(resource).copied().unwrap_or_default()
    }

    pub fn levels(&self) -> BTreeMap<ResourceId, SeverityLevel> {
        self.levels
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
