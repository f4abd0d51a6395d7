// Render targets for the dashboard (status line, banners, tables, charts)

use std::collections::HashMap;

use crate::format::{Category, ChartSeries, TableRow};

/// Status text values set by the refresh cycle.
pub const STATUS_READY: &str = "Ready";
pub const STATUS_LOADING: &str = "Loading...";
pub const STATUS_ERROR: &str = "Error";
/// A result was discarded because the view changed while it was loading.
pub const STATUS_STALE: &str = "Refresh needed";

/// Output surface of the dashboard. Every element is replaced independently;
/// replacing one table or chart never touches the others.
pub trait RenderSink: Send + 'static {
    fn set_status(&mut self, text: &str);
    fn show_error(&mut self, message: &str);
    fn clear_error(&mut self);
    fn set_last_updated(&mut self, text: &str);
    fn set_last_poll(&mut self, text: &str);
    /// "Auto-refreshing every N s" indicator, shown only in the live view.
    fn set_auto_refresh_visible(&mut self, visible: bool);
    /// Range window selector, shown only in the range view.
    fn set_range_controls_visible(&mut self, visible: bool);
    fn render_table(&mut self, category: Category, rows: &[TableRow]);
    fn render_chart(&mut self, category: Category, series: &ChartSeries);
}

/// Keeps the most recent value of every element. Used by tests and by embedders
/// that draw on their own schedule.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub status: String,
    pub error: Option<String>,
    pub last_updated: String,
    pub last_poll: String,
    pub auto_refresh_visible: bool,
    pub range_controls_visible: bool,
    pub tables: HashMap<Category, Vec<TableRow>>,
    pub charts: HashMap<Category, ChartSeries>,
    /// Number of times any table or chart was replaced.
    pub renders: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, category: Category) -> Option<&[TableRow]> {
        self.tables.get(&category).map(Vec::as_slice)
    }

    pub fn chart(&self, category: Category) -> Option<&ChartSeries> {
        self.charts.get(&category)
    }

    /// Value of the row named `metric` in `category`'s table.
    pub fn cell(&self, category: Category, metric: &str) -> Option<&str> {
        self.table(category)?
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.value.as_str())
    }
}

impl RenderSink for MemorySink {
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn set_last_updated(&mut self, text: &str) {
        self.last_updated = text.to_string();
    }

    fn set_last_poll(&mut self, text: &str) {
        self.last_poll = text.to_string();
    }

    fn set_auto_refresh_visible(&mut self, visible: bool) {
        self.auto_refresh_visible = visible;
    }

    fn set_range_controls_visible(&mut self, visible: bool) {
        self.range_controls_visible = visible;
    }

    fn render_table(&mut self, category: Category, rows: &[TableRow]) {
        self.tables.insert(category, rows.to_vec());
        self.renders += 1;
    }

    fn render_chart(&mut self, category: Category, series: &ChartSeries) {
        self.charts.insert(category, series.clone());
        self.renders += 1;
    }
}

/// Writes every update to stdout as plain text.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl RenderSink for TerminalSink {
    fn set_status(&mut self, text: &str) {
        println!("[status] {text}");
    }

    fn show_error(&mut self, message: &str) {
        println!("[error] {message}");
    }

    fn clear_error(&mut self) {}

    fn set_last_updated(&mut self, text: &str) {
        println!("[last updated] {text}");
    }

    fn set_last_poll(&mut self, text: &str) {
        println!("[last poll] {text}");
    }

    fn set_auto_refresh_visible(&mut self, visible: bool) {
        if visible {
            println!("[auto-refresh on]");
        } else {
            println!("[auto-refresh off]");
        }
    }

    fn set_range_controls_visible(&mut self, _visible: bool) {}

    fn render_table(&mut self, category: Category, rows: &[TableRow]) {
        println!("== {category} ==");
        let width = rows.iter().map(|r| r.metric.len()).max().unwrap_or(0);
        for row in rows {
            println!("  {:<width$}  {}", row.metric, row.value);
        }
    }

    fn render_chart(&mut self, category: Category, series: &ChartSeries) {
        let last = series
            .labels
            .iter()
            .zip(&series.values)
            .rev()
            .find_map(|(label, v)| v.map(|v| (label, v)));
        match last {
            Some((label, v)) => println!(
                "  {}: {} points, last {v:.2} at {label}",
                category.chart_label(),
                series.len()
            ),
            None => println!("  {}: {} points", category.chart_label(), series.len()),
        }
    }
}
