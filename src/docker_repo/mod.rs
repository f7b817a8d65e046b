// Per-container CPU/memory via bollard stats streams

mod stats;

use crate::models::ContainerUsage;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Keeps one stats stream per running container and serves the latest reading of each.
pub struct DockerRepo {
    docker: Docker,
    live_usage: Arc<RwLock<HashMap<String, ContainerUsage>>>,
    active_streams: Arc<RwLock<HashMap<String, tokio::task::JoinHandle<()>>>>,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self {
            docker,
            live_usage: Arc::new(RwLock::new(HashMap::new())),
            active_streams: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Syncs stats streams with the set of running containers and returns the cached usage,
    /// sorted by container name. On a Docker API failure the last cached usage is returned.
    pub async fn list_running_usage(&self) -> Vec<ContainerUsage> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = match self.docker.list_containers(Some(filter)).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, operation = "list_containers", "Docker list_containers failed");
                return self.cached_usage().await;
            }
        };

        let running: HashMap<String, String> = containers
            .iter()
            .filter_map(|c| {
                let id = c.id.clone()?;
                let name = c
                    .names
                    .as_ref()
                    .and_then(|n| n.first())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_else(|| id.clone());
                Some((id, name))
            })
            .collect();
        let running_ids: HashSet<&String> = running.keys().collect();

        let current: Vec<String> = self.active_streams.read().await.keys().cloned().collect();
        let to_remove: Vec<String> = current
            .iter()
            .filter(|id| !running_ids.contains(id))
            .cloned()
            .collect();

        {
            let mut streams = self.active_streams.write().await;
            for (id, name) in &running {
                if !streams.contains_key(id) {
                    let handle = self.start_streaming(id.clone(), name.clone());
                    streams.insert(id.clone(), handle);
                }
            }
            for id in &to_remove {
                if let Some(handle) = streams.remove(id) {
                    handle.abort();
                }
            }
        }
        if !to_remove.is_empty() {
            let mut live = self.live_usage.write().await;
            for id in &to_remove {
                live.remove(id);
            }
        }

        self.cached_usage().await
    }

    fn start_streaming(&self, id: String, name: String) -> tokio::task::JoinHandle<()> {
        let docker = self.docker.clone();
        let live_usage = self.live_usage.clone();
        let active_streams = self.active_streams.clone();

        tokio::spawn(async move {
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let mut stream = docker.stats(&id, Some(options));

            while let Some(result) = stream.next().await {
                match result {
                    Ok(s) => {
                        if let Some(usage) = stats::process_statistics(&s, &id, &name) {
                            live_usage.write().await.insert(id.clone(), usage);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, container = %name, "stats stream error");
                        break;
                    }
                }
            }
            tracing::debug!(container = %name, "stats stream ended");
            active_streams.write().await.remove(&id);
            live_usage.write().await.remove(&id);
        })
    }

    async fn cached_usage(&self) -> Vec<ContainerUsage> {
        let live = self.live_usage.read().await;
        let mut out: Vec<ContainerUsage> = live.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
