//! Holdings and the insertion-ordered portfolio map.

use serde::Serialize;

use crate::error::StatsError;
use crate::validation;

/// A single position: ticker plus share count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u32,
}

impl Holding {
    /// Validate and build a holding. The symbol is normalized to uppercase.
    pub fn new(symbol: &str, quantity: u32) -> Result<Self, StatsError> {
        Ok(Self {
            symbol: validation::validate_ticker(symbol)?,
            quantity: validation::validate_quantity(quantity)?,
        })
    }
}

/// Holdings keyed by symbol, in the order symbols were first entered.
///
/// Re-inserting an existing symbol overwrites its quantity but keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(symbol, quantity)` pairs, validating each one.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut portfolio = Self::new();
        for (symbol, quantity) in entries {
            portfolio.insert(Holding::new(symbol, quantity)?);
        }
        Ok(portfolio)
    }

    /// Insert a holding. Returns the quantity it replaced, if any.
    pub fn insert(&mut self, holding: Holding) -> Option<u32> {
        match self.holdings.iter_mut().find(|h| h.symbol == holding.symbol) {
            Some(existing) => {
                let previous = existing.quantity;
                existing.quantity = holding.quantity;
                Some(previous)
            }
            None => {
                self.holdings.push(holding);
                None
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let portfolio =
            Portfolio::from_entries([("AAPL", 10), ("GOOGL", 5), ("MSFT", 1)]).unwrap();
        assert_eq!(portfolio.symbols(), vec!["AAPL", "GOOGL", "MSFT"]);
        assert_eq!(portfolio.len(), 3);
    }

    #[test]
    fn test_duplicate_symbol_last_quantity_wins() {
        let portfolio =
            Portfolio::from_entries([("AAPL", 10), ("GOOGL", 5), ("aapl", 3)]).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.symbols(), vec!["AAPL", "GOOGL"]);
        assert_eq!(portfolio.get("AAPL").unwrap().quantity, 3);
    }

    #[test]
    fn test_insert_returns_replaced_quantity() {
        let mut portfolio = Portfolio::new();
        assert_eq!(portfolio.insert(Holding::new("TCS.NS", 4).unwrap()), None);
        assert_eq!(portfolio.insert(Holding::new("TCS.NS", 9).unwrap()), Some(4));
    }

    #[test]
    fn test_symbol_normalized_to_uppercase() {
        let holding = Holding::new(" reliance.ns ", 2).unwrap();
        assert_eq!(holding.symbol, "RELIANCE.NS");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(matches!(
            Holding::new("AAPL", 0),
            Err(StatsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_symbol_rejected() {
        assert!(Portfolio::from_entries([("", 1)]).is_err());
    }

    #[test]
    fn test_serializes_as_array() {
        let portfolio = Portfolio::from_entries([("AAPL", 10)]).unwrap();
        let json = serde_json::to_value(&portfolio).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["symbol"], "AAPL");
        assert_eq!(json[0]["quantity"], 10);
    }
}
