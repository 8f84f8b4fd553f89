//! Status document sources: the remote status API and pre-generated files

use crate::config::Config;
use crate::errors::{Result, StatusPageError};
use crate::snapshot::StatusSnapshot;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Anything that can produce a status document for a day range.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, days: u32) -> Result<StatusSnapshot>;

    /// Where documents come from, for logs.
    fn describe(&self) -> String;
}

/// Status API queried as `{api_base}?days=N`
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(api_base: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("status-page/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StatusPageError::Http)?;

        Ok(Self {
            client,
            api_base,
            timeout: http_timeout,
        })
    }

    pub fn url(&self, days: u32) -> String {
        let separator = if self.api_base.contains('?') { '&' } else { '?' };
        format!("{}{}days={}", self.api_base, separator, days)
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch(&self, days: u32) -> Result<StatusSnapshot> {
        let url = self.url(days);
        debug!("Fetching status document from {}", url);

        let response = timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| StatusPageError::Fetch("Request timeout".to_string()))?
            .map_err(StatusPageError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatusPageError::Fetch(format!("HTTP {}", status.as_u16())));
        }

        let body = response.bytes().await.map_err(StatusPageError::Http)?;
        let snapshot = StatusSnapshot::from_json(&body)?;

        debug!("Fetched {} services from {}", snapshot.services.len(), url);
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.api_base.clone()
    }
}

/// Directory of pre-generated `status_N.json` files
#[derive(Debug, Clone)]
pub struct FileSource {
    data_dir: PathBuf,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self, days: u32) -> PathBuf {
        self.data_dir.join(format!("status_{}.json", days))
    }
}

#[async_trait]
impl StatusSource for FileSource {
    async fn fetch(&self, days: u32) -> Result<StatusSnapshot> {
        let path = self.path(days);
        debug!("Reading status document {}", path.display());

        let body = tokio::fs::read(&path).await.map_err(|e| {
            StatusPageError::Fetch(format!("Cannot read {}: {}", path.display(), e))
        })?;

        StatusSnapshot::from_json(&body)
    }

    fn describe(&self) -> String {
        self.data_dir.display().to_string()
    }
}

/// Pick the source the configuration asks for. A data directory wins over
/// the API.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn StatusSource>> {
    let source: Arc<dyn StatusSource> = match &config.data_dir {
        Some(dir) => Arc::new(FileSource::new(dir.clone())),
        None => Arc::new(HttpSource::new(config.api_base.clone(), config.http_timeout)?),
    };

    info!("Using status source: {}", source.describe());
    Ok(source)
}
