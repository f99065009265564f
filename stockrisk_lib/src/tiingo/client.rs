//! Tiingo API client for fetching historical end-of-day prices.

use async_trait::async_trait;
use chrono::Duration as DateDuration;
use std::time::Duration;

use super::error::TiingoError;
use super::types::TiingoDailyPrice;
use crate::series::{DateRange, PricePoint, PriceSeries};
use crate::source::{FetchError, PriceSource};

/// Request timeout for Tiingo API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tiingo REST API client for end-of-day historical prices.
pub struct TiingoClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TiingoClient {
    /// Create a new TiingoClient with default base URL.
    pub fn new(api_key: String) -> Result<Self, TiingoError> {
        Self::with_base_url("https://api.tiingo.com", api_key)
    }

    /// Create a new TiingoClient with custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, TiingoError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get daily prices for `ticker` over `range`.
    ///
    /// Tiingo's `endDate` is inclusive, so the request asks for one day less
    /// than `range.end`. Returns `Ok(vec![])` when the window has no sessions.
    ///
    /// Tiingo quirk: rate limits return HTTP 200 with Content-Type text/plain
    /// instead of a proper 429 status code.
    pub async fn get_daily_prices(
        &self,
        ticker: &str,
        range: DateRange,
    ) -> Result<Vec<TiingoDailyPrice>, TiingoError> {
        let start_str = range.start.format("%Y-%m-%d").to_string();
        let end_str = (range.end - DateDuration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let url = format!(
            "{}/tiingo/daily/{}/prices",
            self.base_url,
            ticker.to_lowercase()
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .query(&[("startDate", &start_str), ("endDate", &end_str)])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TiingoError::NotFound(ticker.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TiingoError::InvalidApiKey);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TiingoError::RateLimited);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(TiingoError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let body = response.text().await.map_err(|e| {
            TiingoError::ParseFailed(format!("Failed to read response body: {}", e))
        })?;

        if content_type.contains("text/plain") || content_type.contains("text/html") {
            let lower = body.to_lowercase();
            if lower.contains("rate limit") || lower.contains("too many requests") || lower.contains("error") {
                return Err(TiingoError::RateLimited);
            }
        }

        serde_json::from_str(&body).map_err(|e| {
            TiingoError::ParseFailed(format!(
                "Failed to deserialize response: {} | body: {}",
                e,
                truncate(&body, 500)
            ))
        })
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl PriceSource for TiingoClient {
    fn name(&self) -> &str {
        "tiingo"
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        tracing::debug!("tiingo: fetching {} {}..{}", symbol, range.start, range.end);

        let prices = self.get_daily_prices(symbol, range).await?;

        let mut points = Vec::with_capacity(prices.len());
        for price in &prices {
            let date = price.trading_date().ok_or_else(|| {
                FetchError::Parse(format!("unparseable Tiingo date '{}'", price.date))
            })?;
            points.push(PricePoint::new(date, price.adj_close));
        }

        if points.is_empty() {
            return Err(FetchError::NoData(symbol.to_string()));
        }

        Ok(PriceSeries::from_unsorted(symbol, points))
    }
}
