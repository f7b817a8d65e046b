// Periodic INFO line summarizing monitors and connected WebSocket clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::monitor::MonitorRegistry;
use crate::sampler::Sampler;

pub fn spawn<S: Sampler + 'static>(
    registry: Arc<MonitorRegistry<S>>,
    ws_connections: Arc<AtomicUsize>,
    interval_secs: u64,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing to report yet.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let (running, stale) = registry.counts();
                    tracing::info!(
                        monitors = registry.len(),
                        monitors_running = running,
                        monitors_stale = stale,
                        ws_clients = ws_connections.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
        tracing::debug!("App stats logger shutting down");
    })
}
