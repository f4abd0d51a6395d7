// Presentation formatting: snapshots and summaries to table rows and chart series.
// Every function here is total; missing or non-finite input renders as PLACEHOLDER.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::models::MetricSnapshot;
use crate::summarizer::{MetricField, Summary, summarize};

/// Shown wherever a value is unavailable.
pub const PLACEHOLDER: &str = "-";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Label format for chart x-axis and time stamps (12-hour clock).
const TIME_OF_DAY: &str = "%I:%M:%S %p";

/// Dashboard panel; each owns one table and one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cpu,
    Memory,
    Disk,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cpu, Category::Memory, Category::Disk];

    pub fn title(self) -> &'static str {
        match self {
            Category::Cpu => "CPU",
            Category::Memory => "Memory",
            Category::Disk => "Disk",
        }
    }

    /// Dataset label of the category's usage chart.
    pub fn chart_label(self) -> &'static str {
        match self {
            Category::Cpu => "CPU %",
            Category::Memory => "Memory %",
            Category::Disk => "Disk %",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub metric: String,
    pub value: String,
}

impl TableRow {
    fn new(metric: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// Rows for the three dashboard tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTables {
    pub cpu: Vec<TableRow>,
    pub memory: Vec<TableRow>,
    pub disk: Vec<TableRow>,
}

impl CategoryTables {
    pub fn get(&self, category: Category) -> &[TableRow] {
        match category {
            Category::Cpu => &self.cpu,
            Category::Memory => &self.memory,
            Category::Disk => &self.disk,
        }
    }
}

/// One line chart: x labels and y values at matching positions. `None` values are gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Usage-percentage series for the three charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Charts {
    pub cpu: ChartSeries,
    pub memory: ChartSeries,
    pub disk: ChartSeries,
}

impl Charts {
    pub fn get(&self, category: Category) -> &ChartSeries {
        match category {
            Category::Cpu => &self.cpu,
            Category::Memory => &self.memory,
            Category::Disk => &self.disk,
        }
    }
}

/// Everything one refresh cycle puts on screen, built from a single payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub last_updated: String,
    pub tables: CategoryTables,
    pub charts: Charts,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn format_fixed(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format!("{v:.digits$}"),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{v:.2} %"),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn bytes_to_gb(bytes: Option<f64>) -> Option<f64> {
    finite(bytes).map(|b| b / BYTES_PER_GB)
}

pub fn format_gb(bytes: Option<f64>) -> String {
    match bytes_to_gb(bytes) {
        Some(gb) => format!("{gb:.2} GB"),
        None => PLACEHOLDER.to_string(),
    }
}

/// "1.00, 0.50, 0.25"; a missing component keeps its slot as PLACEHOLDER.
pub fn format_loads(load_1: Option<f64>, load_5: Option<f64>, load_15: Option<f64>) -> String {
    [load_1, load_5, load_15]
        .into_iter()
        .map(|v| format_fixed(v, 2))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_percent_summary(summary: Option<Summary>) -> String {
    match summary {
        Some(s) => format!("avg {:.1}%, min {:.1}%, max {:.1}%", s.avg, s.min, s.max),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_load_summary(summary: Option<Summary>) -> String {
    match summary {
        Some(s) => format!("avg {:.2}, min {:.2}, max {:.2}", s.avg, s.min, s.max),
        None => PLACEHOLDER.to_string(),
    }
}

/// Byte summaries show the average only, in GB like the primary value.
pub fn format_gb_summary(summary: Option<Summary>) -> String {
    format!("avg {}", format_gb(summary.map(|s| s.avg)))
}

/// Parses RFC 3339 (with or without `T`) or a naive ISO timestamp, taken as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Time-of-day in `tz`, or `fallback` when `ts` is missing or unparseable.
fn time_of_day_or<Tz>(ts: Option<&str>, tz: &Tz, fallback: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match ts.and_then(parse_timestamp) {
        Some(dt) => dt.with_timezone(tz).format(TIME_OF_DAY).to_string(),
        None => fallback.to_string(),
    }
}

/// Chart x label. Unparseable timestamps give an empty label so the point keeps its slot.
pub fn chart_label_in<Tz>(ts: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time_of_day_or(ts, tz, "")
}

/// "Last updated" text for a sample timestamp.
pub fn time_of_day_in<Tz>(ts: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time_of_day_or(ts, tz, PLACEHOLDER)
}

/// Wall-clock time for the "last poll" sink.
pub fn now_time_of_day() -> String {
    chrono::Local::now().format(TIME_OF_DAY).to_string()
}

/// Chronological order for range points; the source does not guarantee one.
/// Points with unparseable timestamps sort first, ties keep arrival order.
pub fn order_by_timestamp(mut points: Vec<MetricSnapshot>) -> Vec<MetricSnapshot> {
    points.sort_by_cached_key(|p| p.ts.as_deref().and_then(parse_timestamp));
    points
}

pub fn charts_from<'a, I, Tz>(points: I, tz: &Tz) -> Charts
where
    I: IntoIterator<Item = &'a MetricSnapshot>,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut charts = Charts::default();
    for p in points {
        let label = chart_label_in(p.ts.as_deref(), tz);
        charts.cpu.labels.push(label.clone());
        charts.cpu.values.push(finite(p.cpu_percent));
        charts.memory.labels.push(label.clone());
        charts.memory.values.push(finite(p.mem_percent));
        charts.disk.labels.push(label);
        charts.disk.values.push(finite(p.disk_percent));
    }
    charts
}

fn mount_label(m: &MetricSnapshot) -> String {
    m.disk_mount
        .clone()
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Tables for the live view: one snapshot, no aggregates.
pub fn latest_tables(m: &MetricSnapshot) -> CategoryTables {
    let mut cpu = vec![
        TableRow::new("Total Usage Percentage", format_percent(m.cpu_percent)),
        TableRow::new("User Percentage", format_percent(m.cpu_user_percent)),
        TableRow::new("System Percentage", format_percent(m.cpu_system_percent)),
        TableRow::new("Load Averages", format_loads(m.load_1, m.load_5, m.load_15)),
    ];
    if let Some(cores) = m.cpu_per_core_percent.as_deref().filter(|c| !c.is_empty()) {
        let per_core = cores
            .iter()
            .map(|c| format_percent(*c))
            .collect::<Vec<_>>()
            .join(", ");
        cpu.push(TableRow::new("Per-core Usage", per_core));
    }

    let used_memory = match (bytes_to_gb(m.mem_used_bytes), bytes_to_gb(m.mem_total_bytes)) {
        (Some(_), Some(_)) => format!(
            "{} / {}",
            format_gb(m.mem_used_bytes),
            format_gb(m.mem_total_bytes)
        ),
        _ => PLACEHOLDER.to_string(),
    };
    let memory = vec![
        TableRow::new("Used Memory", used_memory),
        TableRow::new("Used Percentage", format_percent(m.mem_percent)),
        TableRow::new("Free Memory", format_gb(m.mem_free_bytes)),
        TableRow::new("Available Memory", format_gb(m.mem_available_bytes)),
    ];

    let used_disk = match (bytes_to_gb(m.disk_used_bytes), bytes_to_gb(m.disk_total_bytes)) {
        (Some(_), Some(_)) => format!(
            "{} ({} / {})",
            format_percent(m.disk_percent),
            format_gb(m.disk_used_bytes),
            format_gb(m.disk_total_bytes)
        ),
        _ => format_percent(m.disk_percent),
    };
    let disk = vec![
        TableRow::new("Used Disk Space", used_disk),
        TableRow::new("Free Disk Space", format_gb(m.disk_free_bytes)),
        TableRow::new("Mount", mount_label(m)),
    ];

    CategoryTables { cpu, memory, disk }
}

fn percent_row(
    metric: &str,
    last: &MetricSnapshot,
    points: &[MetricSnapshot],
    field: MetricField,
) -> TableRow {
    TableRow::new(
        metric,
        format!(
            "{} ({})",
            format_percent(field.get(last)),
            format_percent_summary(summarize(field, points))
        ),
    )
}

fn load_row(
    metric: &str,
    last: &MetricSnapshot,
    points: &[MetricSnapshot],
    field: MetricField,
) -> TableRow {
    TableRow::new(
        metric,
        format!(
            "{} ({})",
            format_fixed(field.get(last), 2),
            format_load_summary(summarize(field, points))
        ),
    )
}

fn bytes_row(
    metric: &str,
    last: &MetricSnapshot,
    points: &[MetricSnapshot],
    field: MetricField,
) -> TableRow {
    TableRow::new(
        metric,
        format!(
            "{} ({})",
            format_gb(field.get(last)),
            format_gb_summary(summarize(field, points))
        ),
    )
}

/// Tables for the range view: the newest point's value plus a window summary in parentheses.
pub fn range_tables(last: &MetricSnapshot, points: &[MetricSnapshot]) -> CategoryTables {
    use MetricField::*;

    let cpu = vec![
        percent_row("Total Percentage", last, points, CpuPercent),
        percent_row("User Percentage", last, points, CpuUserPercent),
        percent_row("System Percentage", last, points, CpuSystemPercent),
        load_row("Load 1", last, points, Load1),
        load_row("Load 5", last, points, Load5),
        load_row("Load 15", last, points, Load15),
    ];
    let memory = vec![
        percent_row("Used Percentage", last, points, MemPercent),
        bytes_row("Used Memory", last, points, MemUsedBytes),
        bytes_row("Free Memory", last, points, MemFreeBytes),
        bytes_row("Available Memory", last, points, MemAvailableBytes),
        bytes_row("Total Memory", last, points, MemTotalBytes),
    ];
    let disk = vec![
        percent_row("Used Percentage", last, points, DiskPercent),
        bytes_row("Used Space", last, points, DiskUsedBytes),
        bytes_row("Free Space", last, points, DiskFreeBytes),
        bytes_row("Total Space", last, points, DiskTotalBytes),
        TableRow::new("Mount", mount_label(last)),
    ];

    CategoryTables { cpu, memory, disk }
}

/// Live view frame: tables from the newest sample, charts from the whole buffer.
pub fn latest_frame<'a, I, Tz>(latest: &MetricSnapshot, history: I, tz: &Tz) -> Frame
where
    I: IntoIterator<Item = &'a MetricSnapshot>,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    Frame {
        last_updated: time_of_day_in(latest.ts.as_deref(), tz),
        tables: latest_tables(latest),
        charts: charts_from(history, tz),
    }
}

/// Range view frame over chronologically ordered points. `None` for an empty window.
pub fn range_frame<Tz>(ordered: &[MetricSnapshot], tz: &Tz) -> Option<Frame>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let last = ordered.last()?;
    Some(Frame {
        last_updated: time_of_day_in(last.ts.as_deref(), tz),
        tables: range_tables(last, ordered),
        charts: charts_from(ordered, tz),
    })
}
