// Metric sources: one fetch per call, bounded by a timeout, no retries.

mod http;
mod local;

pub use http::HttpSampler;
pub use local::LocalSampler;

use std::future::Future;

use crate::error::FetchError;
use crate::models::MetricSnapshot;

/// A replaceable I/O strategy producing one snapshot per call.
///
/// Implementations apply their own timeout and report every failure as `FetchError`;
/// retrying is up to the caller.
pub trait Sampler: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<MetricSnapshot, FetchError>> + Send;
}

/// Sampler selected per target from configuration.
pub enum TargetSampler {
    Local(LocalSampler),
    Http(HttpSampler),
}

impl Sampler for TargetSampler {
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        match self {
            TargetSampler::Local(sampler) => sampler.fetch().await,
            TargetSampler::Http(sampler) => sampler.fetch().await,
        }
    }
}

impl<S: Sampler> Sampler for std::sync::Arc<S> {
    fn fetch(&self) -> impl Future<Output = Result<MetricSnapshot, FetchError>> + Send {
        self.as_ref().fetch()
    }
}

/// Wall-clock milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
