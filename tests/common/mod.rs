// Shared test helpers
#![allow(dead_code)]

use homeserver_monitor::error::FetchError;
use homeserver_monitor::models::*;
use homeserver_monitor::monitor::MonitorSettings;
use homeserver_monitor::sampler::Sampler;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn snapshot(timestamp: u64, cpu: f64, memory: f64, disk: f64) -> MetricSnapshot {
    MetricSnapshot {
        timestamp,
        cpu: ResourceUsage::ratio(cpu),
        memory: ResourceUsage::ratio(memory),
        disk: ResourceUsage::ratio(disk),
        containers: vec![],
    }
}

pub fn cpu_snapshot(timestamp: u64, cpu: f64) -> MetricSnapshot {
    snapshot(timestamp, cpu, 10.0, 10.0)
}

/// 1 s period, one retry 100 ms later, 5-point history.
pub fn test_settings() -> MonitorSettings {
    MonitorSettings {
        sample_interval: Duration::from_secs(1),
        max_retries: 1,
        retry_delay: Duration::from_millis(100),
        history_capacity: 5,
        broadcast_capacity: 64,
    }
}

pub fn transport_error() -> FetchError {
    FetchError::Transport("connection refused".into())
}

pub enum Step {
    Ok(MetricSnapshot),
    Err(FetchError),
    /// Resolves with the snapshot after the delay.
    Slow(Duration, MetricSnapshot),
}

/// Deterministic sampler that replays a script, then fails with "script exhausted".
/// Tracks how many fetches ran and the peak number running at once.
#[derive(Default)]
pub struct ScriptedSampler {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSampler {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Sampler for ScriptedSampler {
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let step = self.steps.lock().unwrap().pop_front();
        let result = match step {
            Some(Step::Ok(s)) => Ok(s),
            Some(Step::Err(e)) => Err(e),
            Some(Step::Slow(delay, s)) => {
                tokio::time::sleep(delay).await;
                Ok(s)
            }
            None => Err(FetchError::Transport("script exhausted".into())),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
