use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Title stored when the client does not send one.
pub const DEFAULT_TITLE: &str = "No Title Provided";

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub asin: String,
    pub upc: Option<String>,
    pub sku: Option<String>,
    pub title: String,
    #[serde(serialize_with = "serialize_cost")]
    pub cost: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Returns the cost as an integer when it has no fractional part and fits
/// exactly, so `5` is written back as `5` rather than `5.0`.
pub fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        Some(value as i64)
    } else {
        None
    }
}

/// `2024-05-01T12:30:00.123Z`: UTC, millisecond precision.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_cost<S: Serializer>(cost: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match whole_number(*cost) {
        Some(whole) => serializer.serialize_i64(whole),
        None => serializer.serialize_f64(*cost),
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}
