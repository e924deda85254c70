//! Index-level evaluation: fetch every constituent, score, rank.

pub mod cache;
pub mod indices;
pub mod ranking;
pub mod screener;
pub mod search;

use thiserror::Error;

pub use cache::ScoreCache;
pub use indices::MarketIndex;
pub use ranking::{rank, sort_view, RankedCompany, ScoredCompany, SortDirection, SortKey};
pub use screener::{IndexReport, IndexScreener, SymbolFailure};
pub use search::search;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Unknown sort key: {0} (expected symbol, name, price, pe, pb, roe or score)")]
    UnknownSortKey(String),
}
