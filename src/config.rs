use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::evaluator::ThresholdSet;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::monitor::MonitorSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub thresholds: ThresholdSet,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Upper bound for a single fetch from a metric source.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Updates buffered per WebSocket subscriber (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// How often to log app stats (monitors, ws clients) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_sample_interval_ms() -> u64 {
    2000
}

fn default_fetch_timeout_ms() -> u64 {
    1500
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_broadcast_capacity() -> usize {
    16
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            history_capacity: default_history_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl MonitoringConfig {
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            sample_interval: Duration::from_millis(self.sample_interval_ms),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            history_capacity: self.history_capacity,
            broadcast_capacity: self.broadcast_capacity,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// This host, via sysinfo (and Docker when enabled).
    Local,
    /// Another instance's GET /api/metrics.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub source: SourceKind,
    /// Required when source = "http".
    #[serde(default)]
    pub url: Option<String>,
    /// Local only: include per-container usage.
    #[serde(default = "default_docker")]
    pub docker: bool,
    /// Local only: mount point whose usage is reported as `disk`.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
}

fn default_docker() -> bool {
    true
}

fn default_disk_mount() -> String {
    "/".into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.fetch_timeout_ms > 0,
            "monitoring.fetch_timeout_ms must be > 0, got {}",
            self.monitoring.fetch_timeout_ms
        );
        anyhow::ensure!(
            self.monitoring.history_capacity > 0,
            "monitoring.history_capacity must be > 0, got {}",
            self.monitoring.history_capacity
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.targets.is_empty(),
            "targets must contain at least one target"
        );

        let mut names = HashSet::new();
        for target in &self.targets {
            anyhow::ensure!(
                !target.name.is_empty(),
                "targets.name must be non-empty"
            );
            anyhow::ensure!(
                names.insert(target.name.as_str()),
                "targets.name '{}' is used more than once",
                target.name
            );
            if target.source == SourceKind::Http {
                anyhow::ensure!(
                    target.url.as_deref().is_some_and(|u| !u.is_empty()),
                    "targets.url is required for http target '{}'",
                    target.name
                );
            }
        }
        Ok(())
    }
}
