//! Metrics sources for the scoring engine.
//!
//! Each source resolves a symbol to a validated `CompanySnapshot`, or a
//! `DataError` whose `is_no_data()` tells "unknown symbol" apart from a
//! transport failure. Sources compose: `FallbackSource` chains them and
//! `CachedSource` adds a TTL cache in front of any of them.

pub mod alpha_vantage;
pub mod cache;
pub mod csv_source;
pub mod fallback;
pub mod fixtures;
mod http;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use cache::CachedSource;
pub use csv_source::{CsvMetricsSource, CsvStats, SymbolMatch};
pub use fallback::FallbackSource;
pub use fixtures::FixtureSource;
pub use yahoo::YahooFinanceClient;
