use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::StatsError;
use crate::series::DateRange;

pub const MAX_TICKER_LENGTH: usize = 20;

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\^?[A-Z0-9][A-Z0-9.\-=&]*$").unwrap_or_else(|e| panic!("ticker regex: {e}"))
    })
}

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, StatsError> {
    if input.len() > max_len {
        return Err(StatsError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(StatsError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a ticker symbol and normalize it to uppercase.
///
/// Accepts exchange suffixes (`RELIANCE.NS`), index carets (`^NSEI`),
/// share classes (`BRK-B`) and futures/FX markers (`EURUSD=X`).
pub fn validate_ticker(input: &str) -> Result<String, StatsError> {
    let upper = sanitize_text(input, MAX_TICKER_LENGTH)?.to_uppercase();
    if ticker_pattern().is_match(&upper) {
        Ok(upper)
    } else {
        Err(StatsError::InvalidInput(format!(
            "invalid ticker symbol '{}'",
            input.trim()
        )))
    }
}

/// Split a comma-separated ticker list, dropping empty entries.
pub fn parse_ticker_list(input: &str) -> Result<Vec<String>, StatsError> {
    let tickers = input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(validate_ticker)
        .collect::<Result<Vec<_>, _>>()?;
    if tickers.is_empty() {
        return Err(StatsError::InvalidInput(
            "enter at least one ticker symbol (e.g. AAPL, GOOGL)".to_string(),
        ));
    }
    Ok(tickers)
}

/// Quantities must be positive whole shares.
pub fn validate_quantity(quantity: u32) -> Result<u32, StatsError> {
    if quantity == 0 {
        return Err(StatsError::InvalidInput(
            "quantity must be a positive integer".to_string(),
        ));
    }
    Ok(quantity)
}

/// Parse a quantity typed by the user.
pub fn parse_quantity(input: &str) -> Result<u32, StatsError> {
    let trimmed = input.trim();
    let quantity = trimmed.parse::<u32>().map_err(|_| {
        StatsError::InvalidInput(format!(
            "'{}' is not a positive integer quantity",
            trimmed
        ))
    })?;
    validate_quantity(quantity)
}

/// Parse a `SYMBOL=QTY` holding spec.
pub fn parse_holding_spec(input: &str) -> Result<(String, u32), StatsError> {
    let (symbol, quantity) = input.split_once('=').ok_or_else(|| {
        StatsError::InvalidInput(format!(
            "expected SYMBOL=QUANTITY, got '{}'",
            input.trim()
        ))
    })?;
    Ok((validate_ticker(symbol)?, parse_quantity(quantity)?))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, StatsError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        StatsError::InvalidInput(format!(
            "invalid date '{}'. Use YYYY-MM-DD",
            input.trim()
        ))
    })
}

/// Validate an analysis window (start strictly before end).
pub fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<DateRange, StatsError> {
    DateRange::new(start, end)
}

/// A hypothetical index level must be a finite positive number.
pub fn validate_index_level(level: f64) -> Result<f64, StatsError> {
    if !level.is_finite() || level <= 0.0 {
        return Err(StatsError::InvalidInput(format!(
            "hypothetical index level must be a positive number, got {}",
            level
        )));
    }
    Ok(level)
}
