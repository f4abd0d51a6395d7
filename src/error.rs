// Refresh-cycle error taxonomy

use std::fmt;
use thiserror::Error;

/// Why a refresh cycle had nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResult {
    /// The source has not recorded any sample yet.
    NoLatest,
    /// The selected window contains no points.
    EmptyRange,
}

impl fmt::Display for EmptyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmptyResult::NoLatest => "No metrics found yet.",
            EmptyResult::EmptyRange => "No metrics found in selected range.",
        })
    }
}

/// Errors surfaced by a refresh cycle. Caught at the cycle boundary and shown in the error banner.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Non-2xx response from the metrics source.
    #[error("HTTP {status} from {url}{}", body_suffix(.body))]
    Transport {
        status: u16,
        url: String,
        body: Option<String>,
    },

    /// Response body was not the expected JSON shape.
    #[error("Failed to decode metrics response: {0}")]
    Decode(String),

    /// No HTTP response at all (connect refused, DNS, reset).
    #[error("Request to metrics source failed: {0}")]
    Request(String),

    #[error("{0}")]
    EmptyResult(EmptyResult),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!("\n{b}")).unwrap_or_default()
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Decode(err.to_string())
        } else {
            DashboardError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
