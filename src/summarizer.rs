// Avg/min/max reduction over one metric field. Unit-agnostic: percentages,
// byte counts and load averages all go through the same path.

use std::fmt;
use std::str::FromStr;

use crate::models::MetricSnapshot;

/// Average, minimum and maximum of the valid values of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Numeric fields of a snapshot that can be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    CpuPercent,
    CpuUserPercent,
    CpuSystemPercent,
    Load1,
    Load5,
    Load15,
    MemPercent,
    MemTotalBytes,
    MemUsedBytes,
    MemFreeBytes,
    MemAvailableBytes,
    DiskPercent,
    DiskTotalBytes,
    DiskUsedBytes,
    DiskFreeBytes,
}

impl MetricField {
    pub const ALL: [MetricField; 15] = [
        MetricField::CpuPercent,
        MetricField::CpuUserPercent,
        MetricField::CpuSystemPercent,
        MetricField::Load1,
        MetricField::Load5,
        MetricField::Load15,
        MetricField::MemPercent,
        MetricField::MemTotalBytes,
        MetricField::MemUsedBytes,
        MetricField::MemFreeBytes,
        MetricField::MemAvailableBytes,
        MetricField::DiskPercent,
        MetricField::DiskTotalBytes,
        MetricField::DiskUsedBytes,
        MetricField::DiskFreeBytes,
    ];

    /// Wire name of the field (as in the API payload).
    pub fn name(self) -> &'static str {
        match self {
            MetricField::CpuPercent => "cpu_percent",
            MetricField::CpuUserPercent => "cpu_user_percent",
            MetricField::CpuSystemPercent => "cpu_system_percent",
            MetricField::Load1 => "load_1",
            MetricField::Load5 => "load_5",
            MetricField::Load15 => "load_15",
            MetricField::MemPercent => "mem_percent",
            MetricField::MemTotalBytes => "mem_total_bytes",
            MetricField::MemUsedBytes => "mem_used_bytes",
            MetricField::MemFreeBytes => "mem_free_bytes",
            MetricField::MemAvailableBytes => "mem_available_bytes",
            MetricField::DiskPercent => "disk_percent",
            MetricField::DiskTotalBytes => "disk_total_bytes",
            MetricField::DiskUsedBytes => "disk_used_bytes",
            MetricField::DiskFreeBytes => "disk_free_bytes",
        }
    }

    pub fn get(self, s: &MetricSnapshot) -> Option<f64> {
        match self {
            MetricField::CpuPercent => s.cpu_percent,
            MetricField::CpuUserPercent => s.cpu_user_percent,
            MetricField::CpuSystemPercent => s.cpu_system_percent,
            MetricField::Load1 => s.load_1,
            MetricField::Load5 => s.load_5,
            MetricField::Load15 => s.load_15,
            MetricField::MemPercent => s.mem_percent,
            MetricField::MemTotalBytes => s.mem_total_bytes,
            MetricField::MemUsedBytes => s.mem_used_bytes,
            MetricField::MemFreeBytes => s.mem_free_bytes,
            MetricField::MemAvailableBytes => s.mem_available_bytes,
            MetricField::DiskPercent => s.disk_percent,
            MetricField::DiskTotalBytes => s.disk_total_bytes,
            MetricField::DiskUsedBytes => s.disk_used_bytes,
            MetricField::DiskFreeBytes => s.disk_free_bytes,
        }
    }
}

impl FromStr for MetricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown metric field {s:?}"))
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summarizes `field` across `snapshots`. `None` when no snapshot carries a finite value.
pub fn summarize<'a, I>(field: MetricField, snapshots: I) -> Option<Summary>
where
    I: IntoIterator<Item = &'a MetricSnapshot>,
{
    summarize_values(snapshots.into_iter().map(|s| field.get(s)))
}

/// Single pass over raw values; missing and non-finite entries are skipped.
pub fn summarize_values<I>(values: I) -> Option<Summary>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for v in values.into_iter().flatten().filter(|v| v.is_finite()) {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }

    if count == 0 {
        return None;
    }
    // Rounding in the sum can push the mean a hair outside [min, max].
    let avg = (sum / count as f64).clamp(min, max);
    Some(Summary { avg, min, max })
}
