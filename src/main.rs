use anyhow::Result;
use homeserver_monitor::config::{AppConfig, SourceKind, TargetConfig};
use homeserver_monitor::docker_repo::DockerRepo;
use homeserver_monitor::monitor::{Monitor, MonitorRegistry, TracingSink};
use homeserver_monitor::sampler::{HttpSampler, LocalSampler, TargetSampler};
use homeserver_monitor::sysinfo_repo::SysinfoRepo;
use homeserver_monitor::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Host repos shared by every local target and by GET /api/metrics.
struct LocalRepos {
    sysinfo_repo: Arc<SysinfoRepo>,
    docker_repo: Option<Arc<DockerRepo>>,
}

impl LocalRepos {
    fn connect() -> Self {
        let docker_repo = match DockerRepo::connect() {
            Ok(repo) => Some(Arc::new(repo)),
            Err(e) => {
                tracing::warn!(error = %e, "Docker unavailable; container usage disabled");
                None
            }
        };
        Self {
            sysinfo_repo: Arc::new(SysinfoRepo::new()),
            docker_repo,
        }
    }

    fn sampler(&self, target: Option<&TargetConfig>, config: &AppConfig) -> LocalSampler {
        let sysinfo_repo = match target {
            Some(t) if t.disk_mount != "/" => Arc::new(SysinfoRepo::with_disk_mount(&t.disk_mount)),
            _ => self.sysinfo_repo.clone(),
        };
        let docker_repo = if target.is_none_or(|t| t.docker) {
            self.docker_repo.clone()
        } else {
            None
        };
        LocalSampler::new(sysinfo_repo, docker_repo, config.monitoring.fetch_timeout())
    }
}

fn build_registry(config: &AppConfig, local: &LocalRepos) -> Result<MonitorRegistry> {
    let mut registry = MonitorRegistry::new();
    for target in &config.targets {
        let sampler = match target.source {
            SourceKind::Local => TargetSampler::Local(local.sampler(Some(target), config)),
            SourceKind::Http => {
                let url = target.url.clone().unwrap_or_default();
                TargetSampler::Http(HttpSampler::new(url, config.monitoring.fetch_timeout())?)
            }
        };
        let monitor = Monitor::new(
            target.name.clone(),
            sampler,
            config.monitoring.settings(),
            config.thresholds.clone(),
            Arc::new(TracingSink::new(target.name.clone())),
        )
        .map_err(|e| anyhow::anyhow!("monitor '{}': {}", target.name, e))?;
        registry.insert(monitor)?;
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    let local = LocalRepos::connect();
    let registry = Arc::new(build_registry(&app_config, &local)?);
    let metrics_source = Arc::new(TargetSampler::Local(local.sampler(None, &app_config)));
    registry.start_all();

    let ws_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = CancellationToken::new();
    let stats_handle = app_stats::spawn(
        registry.clone(),
        ws_connections.clone(),
        app_config.monitoring.stats_log_interval_secs,
        shutdown.clone(),
    );

    let app = routes::app(registry.clone(), Some(metrics_source), ws_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(monitors = registry.len(), "Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    let _ = tokio::signal::ctrl_c().await;
                }
            } => {
                tracing::info!("Received shutdown signal");
            }
        }
    }

    registry.stop_all();
    shutdown.cancel();
    let _ = stats_handle.await;
    Ok(())
}
