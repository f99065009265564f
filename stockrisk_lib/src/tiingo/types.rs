//! Response types for Tiingo API.

use serde::Deserialize;

/// A single daily price record from the Tiingo end-of-day API.
///
/// The response is a JSON array of these records. Only `date` and
/// `adjClose` feed the analysis; the rest are kept for completeness.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiingoDailyPrice {
    pub date: String,
    pub close: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub volume: i64,
    pub adj_close: f64,
    #[serde(default)]
    pub div_cash: f64,
    #[serde(default = "default_split_factor")]
    pub split_factor: f64,
}

fn default_split_factor() -> f64 {
    1.0
}

impl TiingoDailyPrice {
    /// Calendar date of the record. Tiingo timestamps look like
    /// `2024-06-15T00:00:00+00:00` or `2024-06-15T00:00:00.000Z`.
    pub fn trading_date(&self) -> Option<chrono::NaiveDate> {
        let day = self.date.get(..10)?;
        chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}
