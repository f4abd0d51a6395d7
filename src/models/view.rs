// View mode and range window selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Historical window lengths offered by the range selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RangeWindow {
    FiveMinutes,
    #[default]
    FifteenMinutes,
    OneHour,
    SixHours,
    OneDay,
}

impl RangeWindow {
    pub const ALL: [RangeWindow; 5] = [
        RangeWindow::FiveMinutes,
        RangeWindow::FifteenMinutes,
        RangeWindow::OneHour,
        RangeWindow::SixHours,
        RangeWindow::OneDay,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            RangeWindow::FiveMinutes => 5,
            RangeWindow::FifteenMinutes => 15,
            RangeWindow::OneHour => 60,
            RangeWindow::SixHours => 360,
            RangeWindow::OneDay => 1440,
        }
    }
}

impl TryFrom<u32> for RangeWindow {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|w| w.minutes() == minutes)
            .ok_or_else(|| {
                format!("unsupported range window {minutes} minutes (expected one of 5, 15, 60, 360, 1440)")
            })
    }
}

impl From<RangeWindow> for u32 {
    fn from(window: RangeWindow) -> Self {
        window.minutes()
    }
}

impl fmt::Display for RangeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

/// Which data source the dashboard shows; mirrors the mode dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Latest,
    Range,
}

impl FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(ModeKind::Latest),
            "range" => Ok(ModeKind::Range),
            other => Err(format!("unknown view mode {other:?} (expected \"latest\" or \"range\")")),
        }
    }
}

/// Resolved view for one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Tail the newest sample, auto-refreshing.
    Latest,
    /// Aggregate a historical window, refreshed on demand.
    Range { window: RangeWindow },
}

impl ViewMode {
    pub fn kind(self) -> ModeKind {
        match self {
            ViewMode::Latest => ModeKind::Latest,
            ViewMode::Range { .. } => ModeKind::Range,
        }
    }

    pub fn is_latest(self) -> bool {
        matches!(self, ViewMode::Latest)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Latest => write!(f, "latest"),
            ViewMode::Range { window } => write!(f, "range({window})"),
        }
    }
}
