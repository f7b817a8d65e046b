// Alert sinks: where newly raised alerts are handed off.

use tokio::sync::mpsc;

use crate::models::{Alert, SeverityLevel};

/// Receives each alert once, in the order it was raised. Must not block.
pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: &Alert);
}

/// Logs every alert as a WARN line.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    monitor: String,
}

impl TracingSink {
    pub fn new(monitor: impl Into<String>) -> Self {
        Self {
            monitor: monitor.into(),
        }
    }
}

impl AlertSink for TracingSink {
    fn emit(&self, alert: &Alert) {
        let severity = match alert.level {
            SeverityLevel::Normal => "normal",
            SeverityLevel::Warning => "warning",
            SeverityLevel::Danger => "danger",
        };
        tracing::warn!(
            monitor = %self.monitor,
            resource = %alert.resource,
            severity,
            usage = alert.usage,
            timestamp = alert.timestamp,
            "resource usage alert"
        );
    }
}

/// Forwards alerts into an unbounded channel; dropped receivers are ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink(mpsc::UnboundedSender<Alert>);

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Alert>) -> Self {
        Self(tx)
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl AlertSink for ChannelSink {
    fn emit(&self, alert: &Alert) {
        if self.0.send(alert.clone()).is_err() {
            tracing::debug!("alert channel closed");
        }
    }
}

/// Calls a closure for every alert.
pub struct FnSink<F>(pub F);

impl<F> AlertSink for FnSink<F>
where
    F: Fn(&Alert) + Send + Sync,
{
    fn emit(&self, alert: &Alert) {
        (self.0)(alert)
    }
}

/// Discards alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AlertSink for NullSink {
    fn emit(&self, _alert: &Alert) {}
}
