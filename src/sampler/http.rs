// Sampler that reads a snapshot from another instance's GET /api/metrics.

use reqwest::Client;
use std::time::Duration;

use super::Sampler;
use crate::error::FetchError;
use crate::models::MetricSnapshot;

#[derive(Debug, Clone)]
pub struct HttpSampler {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpSampler {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl Sampler for HttpSampler {
    async fn fetch(&self) -> Result<MetricSnapshot, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<MetricSnapshot>()
            .await
            .map_err(|e| self.map_error(e))
    }
}
