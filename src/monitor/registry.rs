// Named set of independent monitors, one per configured target.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Monitor, MonitorPhase};
use crate::sampler::{Sampler, TargetSampler};

pub struct MonitorRegistry<S = TargetSampler> {
    monitors: BTreeMap<String, Arc<Monitor<S>>>,
}

impl<S> Default for MonitorRegistry<S> {
    fn default() -> Self {
        Self {
            monitors: BTreeMap::new(),
        }
    }
}

impl<S: Sampler + 'static> MonitorRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, monitor: Monitor<S>) -> anyhow::Result<Arc<Monitor<S>>> {
        let name = monitor.name().to_string();
        anyhow::ensure!(
            !self.monitors.contains_key(&name),
            "duplicate monitor name '{}'",
            name
        );
        let monitor = Arc::new(monitor);
        self.monitors.insert(name, monitor.clone());
        Ok(monitor)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Monitor<S>>> {
        self.monitors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Monitor<S>>> {
        self.monitors.values()
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn start_all(&self) {
        for monitor in self.monitors.values() {
            monitor.start();
        }
    }

    pub fn stop_all(&self) {
        for monitor in self.monitors.values() {
            monitor.stop();
        }
    }

    /// (running, stale) counts for the app-stats log line.
    pub fn counts(&self) -> (usize, usize) {
        self.monitors.values().fold((0, 0), |(running, stale), m| {
            let status = m.status();
            (
                running + usize::from(status.phase == MonitorPhase::Running),
                stale + usize::from(status.stale),
            )
        })
    }
}
