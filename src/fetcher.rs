// Metrics source: read-only access to /api/latest and /api/range

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::{DashboardError, Result};
use crate::models::{HealthResponse, LatestResponse, MetricSnapshot, RangeResponse, RangeWindow};
use crate::version;

/// Upper bound the API accepts for `limit` on /api/range.
pub const MAX_RANGE_LIMIT: u32 = 20_000;

/// Default `limit` for range requests.
pub const DEFAULT_RANGE_LIMIT: u32 = 2_000;

/// Where snapshots come from. One call is one request; nothing is retried.
pub trait MetricsSource: Send + Sync + 'static {
    /// Newest snapshot, or `None` if the source has none yet.
    fn fetch_latest(&self) -> impl Future<Output = Result<Option<MetricSnapshot>>> + Send;

    /// Snapshots within the last `window`, at most `limit`, in no particular order.
    fn fetch_range(
        &self,
        window: RangeWindow,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<MetricSnapshot>>> + Send;
}

/// JSON-over-HTTP metrics source.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    seq: AtomicU64,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(version::user_agent())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            seq: AtomicU64::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request token so no intermediate cache can answer for the source.
    fn cache_buster(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{millis}-{seq}")
    }

    /// GET `path` and decode the body. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push(("t", self.cache_buster()));

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(url = %url, "metrics source returned 404; treating as no data");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            return Err(DashboardError::Transport {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str(&text)?;
        Ok(Some(parsed))
    }

    #[instrument(skip(self), fields(source = "http", operation = "fetch_latest"))]
    pub async fn latest(&self) -> Result<Option<MetricSnapshot>> {
        let body: Option<LatestResponse> = self.get_json("/api/latest", &[]).await?;
        Ok(body.and_then(|b| b.latest))
    }

    #[instrument(
        skip(self),
        fields(source = "http", operation = "fetch_range", minutes = window.minutes())
    )]
    pub async fn range(&self, window: RangeWindow, limit: u32) -> Result<Vec<MetricSnapshot>> {
        let limit = limit.clamp(1, MAX_RANGE_LIMIT);
        let query = [
            ("minutes", window.minutes().to_string()),
            ("limit", limit.to_string()),
        ];
        let body: Option<RangeResponse> = self.get_json("/api/range", &query).await?;
        let points = body.map(|b| b.points).unwrap_or_default();
        tracing::debug!(points = points.len(), "range fetched");
        Ok(points)
    }

    /// GET /api/health. A 404 here is an error: the endpoint always exists on a healthy source.
    #[instrument(skip(self), fields(source = "http", operation = "fetch_health"))]
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/api/health", &[])
            .await?
            .ok_or_else(|| DashboardError::Transport {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: format!("{}/api/health", self.base_url),
                body: None,
            })
    }
}

impl MetricsSource for HttpSource {
    fn fetch_latest(&self) -> impl Future<Output = Result<Option<MetricSnapshot>>> + Send {
        self.latest()
    }

    fn fetch_range(
        &self,
        window: RangeWindow,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<MetricSnapshot>>> + Send {
        self.range(window, limit)
    }
}
