use serde::Deserialize;
use tokio::time::Duration;

use crate::dashboard::DashboardSettings;
use crate::fetcher::{DEFAULT_RANGE_LIMIT, MAX_RANGE_LIMIT};
use crate::live_buffer::DEFAULT_CAPACITY;
use crate::models::{ModeKind, RangeWindow};
use crate::view_mode::ViewState;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the metrics API, e.g. "http://localhost:8000".
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Auto-refresh period in the live view.
    pub interval_ms: u64,
    /// `limit` passed to /api/range.
    #[serde(default = "default_range_limit")]
    pub range_limit: u32,
}

fn default_range_limit() -> u32 {
    DEFAULT_RANGE_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Snapshots kept for the live charts.
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewConfig {
    /// Mode selected at startup.
    #[serde(default)]
    pub mode: ModeKind,
    /// Range window selected at startup; validated against the allowed set when parsed.
    #[serde(default)]
    pub window_minutes: RangeWindow,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let url = self.source.base_url.trim();
        anyhow::ensure!(!url.is_empty(), "source.base_url must be non-empty");
        anyhow::ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            "source.base_url must start with http:// or https://, got {}",
            url
        );
        anyhow::ensure!(
            self.refresh.interval_ms > 0,
            "refresh.interval_ms must be > 0, got {}",
            self.refresh.interval_ms
        );
        anyhow::ensure!(
            (1..=MAX_RANGE_LIMIT).contains(&self.refresh.range_limit),
            "refresh.range_limit must be between 1 and {}, got {}",
            MAX_RANGE_LIMIT,
            self.refresh.range_limit
        );
        anyhow::ensure!(
            self.buffer.capacity > 0,
            "buffer.capacity must be > 0, got {}",
            self.buffer.capacity
        );
        Ok(())
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            refresh_interval: Duration::from_millis(self.refresh.interval_ms),
            range_limit: self.refresh.range_limit,
            buffer_capacity: self.buffer.capacity,
        }
    }

    pub fn initial_view(&self) -> ViewState {
        ViewState::new(self.view.mode, self.view.window_minutes)
    }
}
