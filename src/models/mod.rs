// Domain models: metric snapshots and view selection

mod snapshot;
mod view;

pub use snapshot::{HealthResponse, LatestResponse, MetricSnapshot, RangeResponse};
pub use view::{ModeKind, RangeWindow, ViewMode};
