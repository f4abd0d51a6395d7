// Library for tests to access modules

pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod live_buffer;
pub mod models;
pub mod scheduler;
pub mod sink;
pub mod summarizer;
pub mod version;
pub mod view_mode;

pub use dashboard::{Dashboard, DashboardSettings, RefreshOutcome, SkipReason};
pub use error::{DashboardError, EmptyResult};
pub use fetcher::{HttpSource, MetricsSource};
pub use sink::{MemorySink, RenderSink};
