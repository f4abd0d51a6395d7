// Metric snapshot as served by the metrics API (/api/latest, /api/range)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One timestamped reading from the metrics source.
///
/// Every field is optional and parsed leniently: numbers and numeric strings are
/// accepted, anything else (null, missing, garbage, NaN) becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient_text")]
    pub ts: Option<String>,

    // CPU
    #[serde(deserialize_with = "lenient_f64")]
    pub cpu_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64_list")]
    pub cpu_per_core_percent: Option<Vec<Option<f64>>>,
    #[serde(deserialize_with = "lenient_f64")]
    pub cpu_user_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub cpu_system_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub load_1: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub load_5: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub load_15: Option<f64>,

    // Memory
    #[serde(deserialize_with = "lenient_f64")]
    pub mem_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub mem_total_bytes: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub mem_used_bytes: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub mem_free_bytes: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub mem_available_bytes: Option<f64>,

    // Disk
    #[serde(deserialize_with = "lenient_text")]
    pub disk_mount: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub disk_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub disk_total_bytes: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub disk_used_bytes: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub disk_free_bytes: Option<f64>,
}

/// Body of GET /api/latest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub latest: Option<MetricSnapshot>,
}

/// Body of GET /api/range. Points come back in no guaranteed order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub points: Vec<MetricSnapshot>,
}

/// Body of GET /api/health.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Finite number from a JSON number or numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(numeric))
}

fn lenient_f64_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Option<f64>>>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => Ok(Some(items.iter().map(numeric).collect())),
        _ => Ok(None),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<MetricSnapshot>, D::Error> {
    Ok(Option::<Vec<MetricSnapshot>>::deserialize(d)?.unwrap_or_default())
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}
