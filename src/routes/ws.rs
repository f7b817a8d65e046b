// WebSocket push of monitor updates

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::monitor::{MonitorStatus, MonitorUpdate};
use crate::sampler::Sampler;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the ws connection count on drop (connect = +1, drop = -1).
struct WsConnectionGuard(Arc<AtomicUsize>);

impl Drop for WsConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// WS /ws/monitors/{name} — sends the current status, then every update as it is published.
pub(super) async fn ws_monitor<S: Sampler + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Response {
    let Some(monitor) = state.registry.get(&name).cloned() else {
        return (StatusCode::NOT_FOUND, format!("unknown monitor '{}'", name)).into_response();
    };
    let conn_count = state.ws_connections.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading status so no update falls between the two.
        let mut rx = monitor.subscribe();
        let status = monitor.status();
        if let Err(e) = stream_updates(socket, &mut rx, status, conn_count).await {
            tracing::info!(monitor = %name, "monitor stream error: {}", e);
        }
    })
    .into_response()
}

async fn send_json(socket: &mut WebSocket, value: &impl serde::Serialize) -> anyhow::Result<bool> {
    let json = serde_json::to_string(value)?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}

async fn stream_updates(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<MonitorUpdate>,
    status: MonitorStatus,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsConnectionGuard(conn_count);
    tracing::info!(monitor = %status.name, "Client connected to monitor stream");

    let welcome = serde_json::json!({ "type": "status", "status": status });
    if !send_json(&mut socket, &welcome).await? {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(update) => {
                        let message = serde_json::json!({ "type": "update", "update": update });
                        if !send_json(&mut socket, &message).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket monitor client lagged, skipped {} updates", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    Ok(())
}
