// Monitor coordinator: owns the sampling loop for one target.
// Each tick fetches, validates, feeds history and the threshold evaluator, then publishes.
// At most one fetch is in flight; stop() bumps a generation so late results are discarded.

mod registry;
mod sink;
mod state;

pub use registry::MonitorRegistry;
pub use sink::{AlertSink, ChannelSink, FnSink, NullSink, TracingSink};
pub use state::{MonitorPhase, MonitorStatus, MonitorUpdate};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::time::{Duration, MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, SampleError};
use crate::evaluator::ThresholdSet;
use crate::history::{DEFAULT_HISTORY_CAPACITY, HistoryPoint, HistorySet};
use crate::models::{ResourceId, SeverityLevel};
use crate::sampler::Sampler;
use state::MonitorState;

/// Loop timing, retry budget and buffer sizes. Fixed for the monitor's lifetime.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub sample_interval: Duration,
    /// Extra attempts per tick after a failed fetch.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub history_capacity: usize,
    /// Updates buffered per subscriber before it lags.
    pub broadcast_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(2),
            max_retries: 1,
            retry_delay: Duration::from_millis(250),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            broadcast_capacity: 16,
        }
    }
}

struct Shared<S> {
    name: String,
    sampler: S,
    settings: MonitorSettings,
    state: Mutex<MonitorState>,
    in_flight: AtomicBool,
    updates: broadcast::Sender<MonitorUpdate>,
    sink: Arc<dyn AlertSink>,
}

struct Control {
    phase: MonitorPhase,
    cancel: Option<CancellationToken>,
}

pub struct Monitor<S> {
    shared: Arc<Shared<S>>,
    control: Mutex<Control>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: Sampler + 'static> Monitor<S> {
    pub fn new(
        name: impl Into<String>,
        sampler: S,
        settings: MonitorSettings,
        thresholds: ThresholdSet,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self, ConfigError> {
        if settings.sample_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        let history = HistorySet::new(settings.history_capacity)?;
        let (updates, _) = broadcast::channel(settings.broadcast_capacity.max(1));

        Ok(Self {
            shared: Arc::new(Shared {
                name: name.into(),
                sampler,
                settings,
                state: Mutex::new(MonitorState::new(history, thresholds)),
                in_flight: AtomicBool::new(false),
                updates,
                sink,
            }),
            control: Mutex::new(Control {
                phase: MonitorPhase::Idle,
                cancel: None,
            }),
        })
    }

    /// Starts the periodic loop on the current tokio runtime. No-op while running.
    /// A restarted monitor keeps its history and alert levels.
    pub fn start(&self) {
        let mut control = lock(&self.control);
        if control.phase == MonitorPhase::Running {
            return;
        }
        let generation = lock(&self.shared.state).generation;
        let cancel = CancellationToken::new();
        control.cancel = Some(cancel.clone());
        control.phase = MonitorPhase::Running;

        tracing::info!(
            monitor = %self.shared.name,
            sample_interval_ms = self.shared.settings.sample_interval.as_millis() as u64,
            generation,
            "monitor started"
        );
        tokio::spawn(run_loop(self.shared.clone(), generation, cancel));
    }

    /// Stops the loop. Once this returns, no tick mutates state, including a fetch
    /// that was already in flight. Stopping a monitor that is not running is a no-op.
    pub fn stop(&self) {
        let mut control = lock(&self.control);
        if control.phase != MonitorPhase::Running {
            return;
        }
        lock(&self.shared.state).generation += 1;
        if let Some(cancel) = control.cancel.take() {
            cancel.cancel();
        }
        control.phase = MonitorPhase::Stopped;
        tracing::info!(monitor = %self.shared.name, "monitor stopped");
    }
}

impl<S> Monitor<S> {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.shared.settings
    }

    pub fn phase(&self) -> MonitorPhase {
        lock(&self.control).phase
    }

    pub fn status(&self) -> MonitorStatus {
        let phase = self.phase();
        lock(&self.shared.state).status(&self.shared.name, phase)
    }

    /// Receives every update published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorUpdate> {
        self.shared.updates.subscribe()
    }

    /// Full history of one series, oldest first (newest last).
    pub fn history(&self, resource: &ResourceId) -> Option<Vec<HistoryPoint>> {
        lock(&self.shared.state)
            .history
            .get(resource)
            .map(|buffer| buffer.to_vec())
    }

    /// The last `n` points of one series, oldest first.
    pub fn history_tail(&self, resource: &ResourceId, n: usize) -> Option<Vec<HistoryPoint>> {
        lock(&self.shared.state)
            .history
            .get(resource)
            .map(|buffer| buffer.tail(n))
    }

    /// Series with at least one recorded point.
    pub fn series(&self) -> Vec<ResourceId> {
        lock(&self.shared.state).history.series().cloned().collect()
    }

    pub fn levels(&self) -> BTreeMap<ResourceId, SeverityLevel> {
        lock(&self.shared.state).evaluator.levels()
    }
}

impl<S> Drop for Monitor<S> {
    fn drop(&mut self) {
        if let Some(cancel) = lock(&self.control).cancel.take() {
            cancel.cancel();
        }
    }
}

/// Clears the in-flight flag when the tick finishes or is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn run_loop<S: Sampler>(shared: Arc<Shared<S>>, generation: u64, cancel: CancellationToken) {
    let mut tick = interval(shared.settings.sample_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                run_tick(&shared, generation, &cancel).await;
            }
        }
    }
    tracing::debug!(monitor = %shared.name, generation, "monitor loop exited");
}

async fn run_tick<S: Sampler>(shared: &Shared<S>, generation: u64, cancel: &CancellationToken) {
    let Some(_in_flight) = InFlight::acquire(&shared.in_flight) else {
        tracing::debug!(monitor = %shared.name, "previous fetch still in flight; tick skipped");
        return;
    };

    let attempts = shared.settings.max_retries.saturating_add(1);
    let mut last_error = None;
    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = sleep(shared.settings.retry_delay) => {}
            }
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = shared.sampler.fetch() => result,
        };

        match result.map_err(SampleError::from).and_then(|snapshot| {
            snapshot.validate()?;
            Ok(snapshot)
        }) {
            Ok(snapshot) => {
                shared.publish(generation, |state| state.apply_sample(snapshot));
                return;
            }
            Err(e) => {
                tracing::warn!(
                    monitor = %shared.name,
                    attempt = attempt + 1,
                    attempts,
                    error = %e,
                    operation = "fetch_snapshot",
                    "sample failed"
                );
                last_error = Some(e);
            }
        }
    }

    if let Some(error) = last_error {
        shared.publish(generation, |state| state.apply_failure(error));
    }
}

impl<S> Shared<S> {
    /// Applies a tick's result if `generation` is still current, then notifies sink and
    /// subscribers outside the state lock.
    fn publish(&self, generation: u64, apply: impl FnOnce(&mut MonitorState) -> MonitorUpdate) {
        let update = {
            let mut state = lock(&self.state);
            if state.generation != generation {
                tracing::debug!(monitor = %self.name, generation, "result after stop discarded");
                return;
            }
            apply(&mut state)
        };

        for alert in &update.alerts {
            self.sink.emit(alert);
        }
        if update.stale {
            tracing::debug!(
                monitor = %self.name,
                consecutive_failures = update.consecutive_failures,
                "published stale snapshot"
            );
        }
        // No subscribers is normal; status() still serves the latest state.
        let _ = self.updates.send(update);
    }
}
