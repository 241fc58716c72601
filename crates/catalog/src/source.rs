//! Sources that supply the raw text of monthly index files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use catalog_common::{FetchError, MonthKey};

use crate::config::CatalogConfig;

/// Trait for anything that can fetch one month's `log.txt`.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Fetch the raw index text for `month`.
    async fn fetch_index(&self, month: MonthKey) -> Result<String, FetchError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Relative path of a month's index file under the data root.
pub fn index_path(month: MonthKey) -> String {
    format!("data/{}/log.txt", month)
}

/// Build the source described by the configuration.
///
/// A configured mirror directory takes precedence over the base URL.
pub fn create_source(config: &CatalogConfig) -> Result<Arc<dyn IndexSource>, FetchError> {
    match &config.mirror_dir {
        Some(dir) => Ok(Arc::new(MirrorIndexSource::new(dir.clone()))),
        None => Ok(Arc::new(HttpIndexSource::new(
            &config.base_url,
            config.request_timeout(),
            config.connect_timeout(),
        )?)),
    }
}

/// Fetches index files from the image host over HTTP.
pub struct HttpIndexSource {
    client: Client,
    base_url: String,
}

impl HttpIndexSource {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: base_url.to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `{base_url}/data/{YYYYMM}/log.txt`
    pub fn index_url(&self, month: MonthKey) -> String {
        format!("{}/{}", self.base_url, index_path(month))
    }
}

#[async_trait]
impl IndexSource for HttpIndexSource {
    #[instrument(skip_all, fields(month = %month))]
    async fn fetch_index(&self, month: MonthKey) -> Result<String, FetchError> {
        let url = self.index_url(month);
        debug!(url = %url, "Requesting index file");

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            message: e.to_string(),
        };

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Index request failed");
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        info!(url = %url, bytes = body.len(), "Fetched index file");
        Ok(body)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Reads index files from a local mirror laid out as `{root}/data/{YYYYMM}/log.txt`.
pub struct MirrorIndexSource {
    root: PathBuf,
}

impl MirrorIndexSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn index_file(&self, month: MonthKey) -> PathBuf {
        self.root.join(index_path(month))
    }
}

#[async_trait]
impl IndexSource for MirrorIndexSource {
    #[instrument(skip_all, fields(month = %month))]
    async fn fetch_index(&self, month: MonthKey) -> Result<String, FetchError> {
        let path = self.index_file(month);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!(path = %path.display(), bytes = text.len(), "Read mirrored index");
                Ok(text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::Missing(month)),
            Err(source) => Err(FetchError::Io {
                path: path.display().to_string(),
                source: Arc::new(source),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("mirror:{}", self.root.display())
    }
}

/// In-memory source, for tests and offline fixtures.
///
/// Counts every fetch and can simulate latency and transient failures.
#[derive(Default)]
pub struct MemoryIndexSource {
    files: Mutex<HashMap<MonthKey, String>>,
    failures: Mutex<HashMap<MonthKey, u32>>,
    latency: Option<Duration>,
    fetches: AtomicU64,
}

impl MemoryIndexSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `text` for `month`.
    pub fn insert(&self, month: MonthKey, text: impl Into<String>) {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(month, text.into());
    }

    /// Fail the next `count` fetches of `month` with a 503.
    pub fn fail_next(&self, month: MonthKey, count: u32) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(month, count);
    }

    /// Total number of fetches issued so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexSource for MemoryIndexSource {
    async fn fetch_index(&self, month: MonthKey) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        {
            let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(remaining) = failures.get_mut(&month) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Status {
                        url: format!("memory://{}", index_path(month)),
                        status: 503,
                    });
                }
            }
        }

        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&month)
            .cloned()
            .ok_or(FetchError::Missing(month))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
