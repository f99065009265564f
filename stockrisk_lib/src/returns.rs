//! Simple daily return derivation.

use crate::error::StatsError;
use crate::series::{PriceSeries, ReturnPoint, ReturnSeries};

/// Derive simple fractional returns `p[i] / p[i-1] - 1`, each aligned to `date[i]`.
///
/// A return is NaN when the prior price is zero or either price is not finite.
/// Downstream statistics skip NaN entries.
pub fn derive_returns(prices: &PriceSeries) -> Result<ReturnSeries, StatsError> {
    if prices.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: prices.len(),
        });
    }

    let points = prices
        .points()
        .windows(2)
        .map(|w| {
            let (prev, cur) = (w[0].adj_close, w[1].adj_close);
            let value = if prev == 0.0 || !prev.is_finite() || !cur.is_finite() {
                f64::NAN
            } else {
                cur / prev - 1.0
            };
            ReturnPoint {
                date: w[1].date,
                value,
            }
        })
        .collect();

    Ok(ReturnSeries::from_points(prices.symbol().to_string(), points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::new(base + Duration::days(i as i64), *c))
            .collect();
        PriceSeries::new("TEST", points).unwrap()
    }

    #[test]
    fn test_known_returns() {
        let returns = derive_returns(&series(&[100.0, 102.0, 101.0, 105.0])).unwrap();
        let values = returns.values();
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.02).abs() < 1e-12);
        assert!((values[1] - (-0.009803921568627416)).abs() < 1e-12);
        assert!((values[2] - 0.039603960396039604).abs() < 1e-12);
    }

    #[test]
    fn test_returns_align_to_later_date() {
        let prices = series(&[100.0, 102.0, 101.0]);
        let returns = derive_returns(&prices).unwrap();
        assert_eq!(returns.points()[0].date, prices.points()[1].date);
        assert_eq!(returns.points()[1].date, prices.points()[2].date);
    }

    #[test]
    fn test_returns_reconstruct_prices() {
        let closes = [50.0, 51.3, 49.9, 49.9, 55.1, 53.2];
        let prices = series(&closes);
        let returns = derive_returns(&prices).unwrap();
        assert_eq!(returns.len(), closes.len() - 1);
        for (i, r) in returns.values().iter().enumerate() {
            let rebuilt = closes[i] * (1.0 + r);
            assert!((rebuilt - closes[i + 1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_prior_price_is_undefined() {
        let returns = derive_returns(&series(&[0.0, 10.0, 11.0])).unwrap();
        assert!(returns.values()[0].is_nan());
        assert!(!returns.points()[0].is_defined());
        assert_eq!(returns.defined_values().len(), 1);
    }

    #[test]
    fn test_missing_price_is_undefined() {
        let returns = derive_returns(&series(&[10.0, f64::NAN, 11.0])).unwrap();
        assert!(returns.values()[0].is_nan());
        assert!(returns.values()[1].is_nan());
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let err = derive_returns(&series(&[100.0])).unwrap_err();
        assert_eq!(
            err,
            StatsError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_empty_is_insufficient() {
        assert!(derive_returns(&series(&[])).is_err());
    }
}
