//! Offline source backed by a CSV export.
//!
//! Expected header (column order is free, unknown columns are ignored):
//! `symbol,name,sector,industry,country,currency,currentPrice,marketCap,pe,pb,peg,
//! profitMargin,roe,roa,debtToEquity,currentRatio,dividendYield,payoutRatio,
//! revenueGrowth,earningsGrowth`

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use scoring_core::{CompanyMetrics, CompanySnapshot, DataError, DataResult, MetricsSource};
use serde::Serialize;
use tracing::{debug, info};

pub const SOURCE_NAME: &str = "csv";

const MAX_SEARCH_RESULTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvStats {
    pub total_companies: usize,
    pub sectors: Vec<String>,
    pub countries: Vec<String>,
}

pub struct CsvMetricsSource {
    records: BTreeMap<String, CompanySnapshot>,
}

impl CsvMetricsSource {
    pub fn from_path(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let source = Self::from_reader(file)?;
        info!("{} companies loaded from {}", source.len(), path.display());
        Ok(source)
    }

    pub fn from_reader<R: Read>(reader: R) -> DataResult<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect();

        if !headers.contains_key("symbol") {
            return Err(DataError::InvalidData("CSV has no 'symbol' column".to_string()));
        }

        let mut records = BTreeMap::new();
        for (line, row) in reader.records().enumerate() {
            let row = row?;
            // Short rows are skipped rather than padded
            if row.len() < headers.len() {
                debug!("Skipping short CSV row {}", line + 2);
                continue;
            }
            if let Some(snapshot) = parse_row(&headers, &row)? {
                records.insert(snapshot.symbol.clone(), snapshot);
            }
        }

        Ok(Self { records })
    }

    /// Fill forward P/E, quick ratio and interest coverage from other
    /// columns where the export lacks them. These are rough estimates, not
    /// reported figures.
    pub fn with_derived_estimates(mut self) -> Self {
        for snapshot in self.records.values_mut() {
            derive_estimates(&mut snapshot.metrics);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Case-insensitive substring match on symbol or name.
    pub fn search(&self, query: &str) -> Vec<SymbolMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.records
            .values()
            .filter(|s| {
                s.symbol.to_lowercase().contains(&query) || s.name.to_lowercase().contains(&query)
            })
            .take(MAX_SEARCH_RESULTS)
            .map(|s| SymbolMatch {
                symbol: s.symbol.clone(),
                name: s.name.clone(),
                sector: s.metrics.sector.clone(),
            })
            .collect()
    }

    pub fn stats(&self) -> CsvStats {
        let sectors: BTreeSet<String> = self
            .records
            .values()
            .filter_map(|s| s.metrics.sector.clone())
            .collect();
        let countries: BTreeSet<String> = self
            .records
            .values()
            .filter_map(|s| s.country.clone())
            .collect();

        CsvStats {
            total_companies: self.records.len(),
            sectors: sectors.into_iter().collect(),
            countries: countries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MetricsSource for CsvMetricsSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        self.records
            .get(&symbol.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| DataError::NotFound(symbol.to_string()))
    }

    async fn list(&self) -> DataResult<Vec<CompanySnapshot>> {
        Ok(self.records.values().cloned().collect())
    }
}

fn cell<'a>(headers: &HashMap<String, usize>, row: &'a StringRecord, column: &str) -> Option<&'a str> {
    headers
        .get(column)
        .and_then(|i| row.get(*i))
        .filter(|s| !s.is_empty())
}

fn numeric(headers: &HashMap<String, usize>, row: &StringRecord, column: &str) -> Option<f64> {
    cell(headers, row, column)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn parse_row(headers: &HashMap<String, usize>, row: &StringRecord) -> DataResult<Option<CompanySnapshot>> {
    let Some(symbol) = cell(headers, row, "symbol") else {
        return Ok(None);
    };
    let symbol = symbol.to_uppercase();
    let num = |column: &str| numeric(headers, row, column);

    let metrics = CompanyMetrics {
        pe: num("pe"),
        forward_pe: num("forwardPE"),
        pb: num("pb"),
        peg: num("peg"),
        profit_margin: num("profitMargin"),
        roe: num("roe"),
        roa: num("roa"),
        debt_to_equity: num("debtToEquity"),
        current_ratio: num("currentRatio"),
        quick_ratio: num("quickRatio"),
        interest_coverage: num("interestCoverage"),
        dividend_yield: num("dividendYield"),
        payout_ratio: num("payoutRatio"),
        revenue_growth: num("revenueGrowth"),
        earnings_growth: num("earningsGrowth"),
        sector: cell(headers, row, "sector").map(str::to_string),
        market_cap: num("marketCap"),
    };
    metrics.validate()?;

    let name = cell(headers, row, "name")
        .map(str::to_string)
        .unwrap_or_else(|| symbol.clone());
    let country = cell(headers, row, "country").map(str::to_string);
    // Older exports have no currency column; German listings trade in EUR
    let currency = match cell(headers, row, "currency") {
        Some(c) => c.to_string(),
        None if country.as_deref() == Some("Germany") => "EUR".to_string(),
        None => "USD".to_string(),
    };

    let mut snapshot = CompanySnapshot::new(symbol, name, SOURCE_NAME).with_metrics(metrics);
    snapshot.country = country;
    snapshot.currency = Some(currency);
    snapshot.industry = cell(headers, row, "industry").map(str::to_string);
    snapshot.current_price = num("currentPrice");

    Ok(Some(snapshot))
}

fn derive_estimates(m: &mut CompanyMetrics) {
    if m.forward_pe.is_none() {
        m.forward_pe = m.pe.map(|pe| pe * 0.95);
    }
    if m.quick_ratio.is_none() {
        m.quick_ratio = m.current_ratio.map(|cr| cr * 0.85);
    }
    if m.interest_coverage.is_none() {
        if let (Some(roe), Some(dte)) = (m.roe, m.debt_to_equity) {
            m.interest_coverage = Some((10.0 * roe / dte.max(0.1)).max(2.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
symbol,name,sector,country,currentPrice,pe,pb,peg,profitMargin,roe,roa,debtToEquity,currentRatio,dividendYield,payoutRatio,revenueGrowth,earningsGrowth
sap.de,SAP SE,Technology,Germany,98.5,15.8,3.2,1.1,0.22,0.20,0.12,0.35,1.22,0.015,0.3,0.08,0.12
BRK-B,\"Berkshire Hathaway, Inc.\",Financial Services,United States,410,9.1,1.5,,0.18,0.11,0.05,0.25,,0,0,0.05,n/a
SHORT,Too Short,Energy
,Missing Symbol,Energy,Germany,1,1,1,1,1,1,1,1,1,1,1,1,1
";

    fn source() -> CsvMetricsSource {
        CsvMetricsSource::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_load_and_fetch() {
        let source = source();
        assert_eq!(source.len(), 2);

        let sap = source.fetch("SAP.DE").await.unwrap();
        assert_eq!(sap.symbol, "SAP.DE");
        assert_eq!(sap.currency.as_deref(), Some("EUR"));
        assert_relative_eq!(sap.metrics.pe.unwrap(), 15.8);
        assert_eq!(sap.metrics.interest_coverage, None);

        // lookups are case-insensitive
        assert!(source.fetch("sap.de").await.is_ok());
    }

    #[tokio::test]
    async fn test_quoted_names_and_missing_cells() {
        let brk = source().fetch("brk-b").await.unwrap();
        assert_eq!(brk.name, "Berkshire Hathaway, Inc.");
        assert_eq!(brk.currency.as_deref(), Some("USD"));
        assert_eq!(brk.metrics.peg, None);
        assert_eq!(brk.metrics.current_ratio, None);
        assert_eq!(brk.metrics.earnings_growth, None);
        // zero stays zero
        assert_eq!(brk.metrics.dividend_yield, Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let err = source().fetch("NOPE").await.unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_search_and_stats() {
        let source = source();
        let hits = source.search("berk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "BRK-B");
        assert!(source.search("  ").is_empty());

        let stats = source.stats();
        assert_eq!(stats.total_companies, 2);
        assert_eq!(stats.sectors, vec!["Financial Services", "Technology"]);
        assert_eq!(stats.countries, vec!["Germany", "United States"]);
    }

    #[test]
    fn test_search_is_capped() {
        let mut csv = String::from("symbol,name\n");
        for i in 0..30 {
            csv.push_str(&format!("T{},Test Corp {}\n", i, i));
        }
        let source = CsvMetricsSource::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(source.len(), 30);
        assert_eq!(source.search("test").len(), 20);
    }

    #[tokio::test]
    async fn test_derived_estimates_are_opt_in() {
        let plain = source().fetch("SAP.DE").await.unwrap();
        assert_eq!(plain.metrics.forward_pe, None);

        let derived = source().with_derived_estimates();
        let sap = derived.fetch("SAP.DE").await.unwrap();
        assert_relative_eq!(sap.metrics.forward_pe.unwrap(), 15.8 * 0.95);
        assert_relative_eq!(sap.metrics.quick_ratio.unwrap(), 1.22 * 0.85);
        // 10 * 0.20 / 0.35 = 5.71
        assert_relative_eq!(sap.metrics.interest_coverage.unwrap(), 2.0 / 0.35);
    }

    #[test]
    fn test_missing_symbol_column() {
        assert!(CsvMetricsSource::from_reader("name,pe\nFoo,1\n".as_bytes()).is_err());
    }

    #[tokio::test]
    async fn test_from_path() {
        let path = std::env::temp_dir().join(format!("stocks-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();

        let source = CsvMetricsSource::from_path(&path).unwrap();
        assert_eq!(source.list().await.unwrap().len(), 2);

        std::fs::remove_file(&path).ok();
    }
}
