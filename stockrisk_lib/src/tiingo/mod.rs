//! Tiingo end-of-day price source.
//!
//! Used as a fallback when Yahoo Finance returns nothing for a ticker,
//! typically delisted or renamed listings that Tiingo still retains.

pub mod client;
pub mod error;
pub mod types;

pub use client::TiingoClient;
pub use error::TiingoError;
