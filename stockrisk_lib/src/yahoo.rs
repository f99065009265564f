//! Yahoo Finance price source.
//!
//! Fetches daily quote history through `yahoo_finance_api` and keeps the
//! split/dividend-adjusted close for each session.

use async_trait::async_trait;
use chrono::NaiveDate;
use time::OffsetDateTime;

use crate::series::{DateRange, PricePoint, PriceSeries};
use crate::source::{FetchError, PriceSource};

/// Convert chrono::NaiveDate to time::OffsetDateTime at UTC midnight.
pub fn date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, FetchError> {
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| FetchError::InvalidDate(date.to_string()))?;

    let timestamp = datetime.and_utc().timestamp();

    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|_| FetchError::InvalidDate(date.to_string()))
}

/// Convert a unix timestamp to the UTC calendar date.
pub fn timestamp_to_date(timestamp: i64) -> Result<NaiveDate, FetchError> {
    timestamp_to_exchange_date(timestamp, 0)
}

/// Convert a bar timestamp to the exchange's local calendar date.
/// `gmtoffset` is the exchange offset from UTC in seconds, as reported in the
/// chart metadata. Sessions that open before 00:00 UTC (ASX, NZX) need it.
pub fn timestamp_to_exchange_date(timestamp: i64, gmtoffset: i32) -> Result<NaiveDate, FetchError> {
    timestamp
        .checked_add(i64::from(gmtoffset))
        .and_then(|local| chrono::DateTime::from_timestamp(local, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| FetchError::InvalidDate(format!("timestamp {}", timestamp)))
}

/// Map an upstream error message onto our error taxonomy.
pub fn classify_upstream(symbol: &str, message: &str) -> FetchError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("too many requests") {
        FetchError::RateLimited("Yahoo Finance".to_string())
    } else if lower.contains("404") || lower.contains("not found") {
        FetchError::NotFound(symbol.to_string())
    } else if lower.contains("no quotes")
        || lower.contains("noquotes")
        || lower.contains("empty")
        || lower.contains("no result")
    {
        FetchError::NoData(symbol.to_string())
    } else {
        FetchError::Upstream(message.to_string())
    }
}

/// Yahoo Finance client.
pub struct YahooClient {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooClient {
    /// Create a new YahooClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| FetchError::Upstream(e.to_string()))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        let start = date_to_offset_datetime(range.start)?;
        let end = date_to_offset_datetime(range.end)?;

        tracing::debug!("yahoo: fetching {} {}..{}", symbol, range.start, range.end);

        let response = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| classify_upstream(symbol, &e.to_string()))?;
        let quotes = response
            .quotes()
            .map_err(|e| classify_upstream(symbol, &e.to_string()))?;
        let gmtoffset = response.metadata().map(|m| m.gmtoffset).unwrap_or_else(|e| {
            tracing::debug!("yahoo: no metadata for {} ({}), dating bars in UTC", symbol, e);
            0
        });

        let mut points = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let date = timestamp_to_exchange_date(quote.timestamp as i64, gmtoffset)?;
            if range.contains(date) {
                points.push(PricePoint::new(date, quote.adjclose));
            }
        }

        if points.is_empty() {
            return Err(FetchError::NoData(symbol.to_string()));
        }

        Ok(PriceSeries::from_unsorted(symbol, points))
    }
}
