// Sampler backed by this host's sysinfo and Docker repos.

use std::sync::Arc;
use std::time::Duration;

use super::{Sampler, now_millis};
use crate::docker_repo::DockerRepo;
use crate::error::FetchError;
use crate::models::MetricSnapshot;
use crate::sysinfo_repo::SysinfoRepo;

pub struct LocalSampler {
    sysinfo_repo: Arc<SysinfoRepo>,
    docker_repo: Option<Arc<DockerRepo>>,
    timeout: Duration,
}

impl LocalSampler {
    /// Without a Docker repo the snapshot carries no containers.
    pub fn new(
        sysinfo_repo: Arc<SysinfoRepo>,
        docker_repo: Option<Arc<DockerRepo>>,
        timeout: Duration,
    ) -> Self {
        Self {
            sysinfo_repo,
            docker_repo,
            timeout,
        }
    }

    async fn collect(&self) -> Result<MetricSnapshot, FetchError> {
        let timestamp = now_millis();
        let (cpu, memory, disk) = tokio::try_join!(
            self.sysinfo_repo.get_cpu_usage(),
            self.sysinfo_repo.get_memory_usage(),
            self.sysinfo_repo.get_disk_usage(),
        )
        .map_err(|e| FetchError::Transport(e.to_string()))?;
        let containers = match &self.docker_repo {
            Some(repo) => repo.list_running_usage().await,
            None => Vec::new(),
        };

        Ok(MetricSnapshot {
            timestamp,
            cpu,
            memory,
            disk,
            containers,
        })
    }
}

impl Sampler for LocalSampler {
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        tokio::time::timeout(self.timeout, self.collect())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
