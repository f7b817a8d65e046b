// Fixed-capacity rolling history per metric series, for charting.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;

use crate::error::ConfigError;
use crate::models::ResourceId;

/// Default window: 20 samples, ~40 s at a 2 s period.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timestamp: u64,
    pub value: f64,
}

/// Up to `capacity` most recent points, oldest first. Oldest is evicted on overflow.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: NonZeroUsize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64, timestamp: u64) {
        if self.points.len() == self.capacity.get() {
            self.points.pop_front();
        }
        self.points.push_back(HistoryPoint { timestamp, value });
    }

    /// Oldest-first view; does not copy or mutate.
    pub fn snapshot(&self) -> impl DoubleEndedIterator<Item = &HistoryPoint> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().copied().collect()
    }

    /// The last `n` points, still oldest first.
    pub fn tail(&self, n: usize) -> Vec<HistoryPoint> {
        let skip = self.points.len().saturating_sub(n);
        self.points.iter().skip(skip).copied().collect()
    }

    pub fn current(&self) -> Option<f64> {
        self.points.back().map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

/// One buffer per series, created on first push.
#[derive(Debug, Clone)]
pub struct HistorySet {
    buffers: BTreeMap<ResourceId, HistoryBuffer>,
    capacity: NonZeroUsize,
}

impl HistorySet {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)?;
        Ok(Self {
            buffers: BTreeMap::new(),
            capacity,
        })
    }

    pub fn push(&mut self, resource: &ResourceId, value: f64, timestamp: u64) {
        if let Some(buffer) = self.buffers.get_mut(resource) {
            buffer.push(value, timestamp);
            return;
        }
        let mut buffer = HistoryBuffer::with_capacity(self.capacity);
        buffer.push(value, timestamp);
        self.buffers.insert(resource.clone(), buffer);
    }

    pub fn get(&self, resource: &ResourceId) -> Option<&HistoryBuffer> {
        self.buffers.get(resource)
    }

    pub fn series(&self) -> impl Iterator<Item = &ResourceId> {
        self.buffers.keys()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
