// Per-monitor mutable state: history, alert levels, last snapshot and failure tracking.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SampleError;
use crate::evaluator::{ThresholdEvaluator, ThresholdSet};
use crate::history::HistorySet;
use crate::models::{Alert, MetricSnapshot, ResourceId, SeverityLevel};

/// Lifecycle of a monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    Idle,
    Running,
    Stopped,
}

/// Published after every tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorUpdate {
    /// Latest good snapshot; on failure this is the last-known one.
    pub snapshot: Option<Arc<MetricSnapshot>>,
    pub alerts: Vec<Alert>,
    pub stale: bool,
    pub error: Option<SampleError>,
    pub consecutive_failures: u32,
}

/// On-demand view of a monitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub name: String,
    pub phase: MonitorPhase,
    pub snapshot: Option<Arc<MetricSnapshot>>,
    pub stale: bool,
    pub error: Option<SampleError>,
    pub consecutive_failures: u32,
    pub levels: BTreeMap<ResourceId, SeverityLevel>,
}

pub(crate) struct MonitorState {
    pub(crate) history: HistorySet,
    pub(crate) evaluator: ThresholdEvaluator,
    pub(crate) last_snapshot: Option<Arc<MetricSnapshot>>,
    pub(crate) stale: bool,
    pub(crate) last_error: Option<SampleError>,
    pub(crate) consecutive_failures: u32,
    /// Bumped by every stop; a tick applies its result only if its generation is current.
    pub(crate) generation: u64,
}

impl MonitorState {
    pub(crate) fn new(history: HistorySet, thresholds: ThresholdSet) -> Self {
        Self {
            history,
            evaluator: ThresholdEvaluator::new(thresholds),
            last_snapshot: None,
            stale: false,
            last_error: None,
            consecutive_failures: 0,
            generation: 0,
        }
    }

    /// Ingest a validated snapshot.
    pub(crate) fn apply_sample(&mut self, snapshot: MetricSnapshot) -> MonitorUpdate {
        let mut alerts = Vec::new();
        for (resource, usage) in snapshot.readings() {
            self.history.push(&resource, usage, snapshot.timestamp);
            let (_, alert) = self
                .evaluator
                .evaluate(&resource, usage, snapshot.timestamp);
            alerts.extend(alert);
        }

        let snapshot = Arc::new(snapshot);
        self.last_snapshot = Some(snapshot.clone());
        self.stale = false;
        self.last_error = None;
        self.consecutive_failures = 0;

        MonitorUpdate {
            snapshot: Some(snapshot),
            alerts,
            stale: false,
            error: None,
            consecutive_failures: 0,
        }
    }

    /// Record a tick whose retries are exhausted. History and alert levels are untouched.
    pub(crate) fn apply_failure(&mut self, error: SampleError) -> MonitorUpdate {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.stale = true;
        self.last_error = Some(error.clone());

        MonitorUpdate {
            snapshot: self.last_snapshot.clone(),
            alerts: Vec::new(),
            stale: true,
            error: Some(error),
            consecutive_failures: self.consecutive_failures,
        }
    }

    pub(crate) fn status(&self, name: &str, phase: MonitorPhase) -> MonitorStatus {
        MonitorStatus {
            name: name.to_string(),
            phase,
            snapshot: self.last_snapshot.clone(),
            stale: self.stale,
            error: self.last_error.clone(),
            consecutive_failures: self.consecutive_failures,
            levels: self.evaluator.levels(),
        }
    }
}
