use std::cmp::Ordering;
use std::str::FromStr;

use scoring_core::{CompanyMetrics, CompanySnapshot, ScoreResult};
use serde::Serialize;

use crate::ScreenerError;

/// A fetched company together with its score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCompany {
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub currency: Option<String>,
    pub metrics: CompanyMetrics,
    pub score: ScoreResult,
}

impl ScoredCompany {
    pub fn new(snapshot: CompanySnapshot, score: ScoreResult) -> Self {
        Self {
            symbol: snapshot.symbol,
            name: snapshot.name,
            current_price: snapshot.current_price,
            currency: snapshot.currency,
            metrics: snapshot.metrics,
            score,
        }
    }

    pub fn total(&self) -> u32 {
        self.score.total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCompany {
    /// Position by score, starting at 1. Fixed once assigned.
    pub rank: usize,
    #[serde(flatten)]
    pub company: ScoredCompany,
}

/// Order by total descending, ties by symbol ascending, and number from 1.
pub fn rank(mut companies: Vec<ScoredCompany>) -> Vec<RankedCompany> {
    companies.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.symbol.cmp(&b.symbol)));

    companies
        .into_iter()
        .enumerate()
        .map(|(i, company)| RankedCompany { rank: i + 1, company })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Symbol,
    Name,
    Price,
    Pe,
    Pb,
    Roe,
    Score,
}

impl FromStr for SortKey {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "symbol" => Ok(SortKey::Symbol),
            "name" => Ok(SortKey::Name),
            "price" => Ok(SortKey::Price),
            "pe" => Ok(SortKey::Pe),
            "pb" => Ok(SortKey::Pb),
            "roe" => Ok(SortKey::Roe),
            "score" => Ok(SortKey::Score),
            other => Err(ScreenerError::UnknownSortKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

fn numeric_key(company: &ScoredCompany, key: SortKey) -> Option<f64> {
    match key {
        SortKey::Price => company.current_price,
        SortKey::Pe => company.metrics.pe,
        SortKey::Pb => company.metrics.pb,
        SortKey::Roe => company.metrics.roe,
        SortKey::Score => Some(company.total() as f64),
        SortKey::Symbol | SortKey::Name => None,
    }
}

fn compare(a: &ScoredCompany, b: &ScoredCompany, key: SortKey, direction: SortDirection) -> Ordering {
    let directed = |ord: Ordering| match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };

    match key {
        SortKey::Symbol => directed(a.symbol.cmp(&b.symbol)),
        SortKey::Name => directed(a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        _ => match (numeric_key(a, key), numeric_key(b, key)) {
            (Some(x), Some(y)) => directed(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
            // Absent values go last whichever way the column is sorted
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Reorder a ranked list for display. Each row keeps its score rank and
/// equal rows keep their ranked order.
pub fn sort_view(ranked: &[RankedCompany], key: SortKey, direction: SortDirection) -> Vec<RankedCompany> {
    let mut view = ranked.to_vec();
    view.sort_by(|a, b| compare(&a.company, &b.company, key, direction));
    view
}
