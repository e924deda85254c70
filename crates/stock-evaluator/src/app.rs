use std::sync::Arc;

use anyhow::{bail, Context, Result};
use index_screener::{
    sort_view, IndexReport, IndexScreener, MarketIndex, RankedCompany, ScoredCompany, SortDirection, SortKey,
};
use market_data::{AlphaVantageClient, CachedSource, CsvMetricsSource, FallbackSource, FixtureSource, YahooFinanceClient};
use scoring_core::{MetricsSource, ScoreCategory, SectorTable, WatchlistEntry, WatchlistStore};
use scoring_engine::ScoringEngine;
use watchlist::{JsonFileStore, SqliteWatchlistStore, Watchlist};

use crate::cli::{Command, WatchlistAction, USAGE};
use crate::config::{EvaluatorConfig, WatchlistBackend};

pub struct App {
    config: EvaluatorConfig,
    source: Arc<dyn MetricsSource>,
    csv: Option<Arc<CsvMetricsSource>>,
    screener: IndexScreener,
}

impl App {
    pub fn from_config(config: EvaluatorConfig) -> Result<Self> {
        let mut chain = FallbackSource::default();

        let csv = match &config.stock_data_csv {
            Some(path) => {
                let csv = CsvMetricsSource::from_path(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
                    .with_derived_estimates();
                tracing::info!("Loaded {} companies from {}", csv.len(), path.display());
                let csv = Arc::new(csv);
                chain = chain.with_source(csv.clone());
                Some(csv)
            }
            None => None,
        };
        if config.use_yahoo_finance {
            chain = chain.with_source(Arc::new(YahooFinanceClient::new()?));
        }
        if config.alpha_vantage_enabled() {
            chain = chain.with_source(Arc::new(AlphaVantageClient::new(config.alpha_vantage_key.clone())?));
        }
        if config.use_fixtures {
            chain = chain.with_source(Arc::new(FixtureSource::new()));
        }
        if chain.is_empty() {
            bail!("No data source configured (set STOCK_DATA_CSV, USE_YAHOO_FINANCE or USE_FIXTURES)");
        }
        tracing::info!("Data sources: {}", chain.source_names().join(" -> "));

        let ttl = config.cache_ttl()?;
        let source: Arc<dyn MetricsSource> = Arc::new(CachedSource::with_ttl(chain, ttl));

        let mut engine = ScoringEngine::new().with_policy(config.scoring_policy()?);
        if let Some(path) = &config.sector_table_path {
            let sectors = SectorTable::from_file(path)
                .with_context(|| format!("Failed to load sector table {}", path.display()))?;
            tracing::info!("Loaded {} sectors from {}", sectors.sector_names().len(), path.display());
            engine = engine.with_sectors(Arc::new(sectors));
        }

        let screener = IndexScreener::new(Arc::clone(&source), Arc::new(engine))
            .with_batch_size(config.batch_size)
            .with_batch_delay(config.batch_delay());

        Ok(Self {
            config,
            source,
            csv,
            screener,
        })
    }

    pub fn screener(&self) -> &IndexScreener {
        &self.screener
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Score(symbols) => self.score(&symbols).await,
            Command::Index {
                key,
                sort,
                direction,
                limit,
            } => {
                let (report, rows) = self.index_view(&key, sort, direction, limit).await?;
                print_index(&report, &rows);
                Ok(())
            }
            Command::Search(query) => self.search(&query).await,
            Command::Watchlist(action) => match self.config.watchlist_backend {
                WatchlistBackend::Json => {
                    let store = JsonFileStore::new(&self.config.watchlist_path);
                    let mut list = Watchlist::load(store).await?;
                    self.watchlist(&mut list, action).await
                }
                WatchlistBackend::Sqlite => {
                    let store = SqliteWatchlistStore::connect(&self.config.database_url)
                        .await
                        .with_context(|| format!("Failed to open {}", self.config.database_url))?;
                    let mut list = Watchlist::load(store).await?;
                    self.watchlist(&mut list, action).await
                }
            },
            Command::Help => {
                println!("{}", USAGE);
                Ok(())
            }
        }
    }

    async fn score(&self, symbols: &[String]) -> Result<()> {
        let mut failed = 0;
        for symbol in symbols {
            match self.screener.score_symbol(symbol).await {
                Ok(company) => print_company(&company),
                Err(e) => {
                    failed += 1;
                    eprintln!("{}: {}", symbol, e);
                }
            }
        }
        if failed == symbols.len() {
            bail!("No symbol could be scored");
        }
        Ok(())
    }

    /// Evaluate an index and return its report with the rows to display.
    pub async fn index_view(
        &self,
        key: &str,
        sort: Option<SortKey>,
        direction: SortDirection,
        limit: Option<usize>,
    ) -> Result<(IndexReport, Vec<RankedCompany>)> {
        let report = self.screener.evaluate_index(key).await.with_context(|| {
            format!("Available indices: {}", MarketIndex::keys().join(", "))
        })?;

        let mut rows = match sort {
            Some(key) => sort_view(&report.ranked, key, direction),
            None => report.ranked.clone(),
        };
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok((report, rows))
    }

    /// Resolve a free-text query to one scored company.
    ///
    /// Companies the sources can enumerate are matched by symbol or name
    /// first. Failing that, the query is fetched as a ticker.
    pub async fn find(&self, query: &str) -> Result<Option<ScoredCompany>> {
        let listed = self.source.list().await?;
        let engine = self.screener.engine();
        let companies: Vec<ScoredCompany> = listed
            .into_iter()
            .filter(|s| s.metrics.validate().is_ok())
            .map(|s| {
                let score = engine.score(&s.metrics);
                ScoredCompany::new(s, score)
            })
            .collect();

        if let Some(found) = index_screener::search(query, &companies) {
            return Ok(Some(found.clone()));
        }

        match self.screener.score_symbol(query.trim()).await {
            Ok(company) => Ok(Some(company)),
            Err(e) if e.is_no_data() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn search(&self, query: &str) -> Result<()> {
        if let Some(csv) = &self.csv {
            let matches = csv.search(query);
            if !matches.is_empty() {
                println!("{} matches in the CSV data:", matches.len());
                for m in &matches {
                    println!("  {:<10} {:<40} {}", m.symbol, m.name, m.sector.as_deref().unwrap_or("-"));
                }
                println!();
            }
        }

        match self.find(query).await? {
            Some(company) => print_company(&company),
            None => println!("No company found for \"{}\"", query),
        }
        Ok(())
    }

    pub async fn watchlist<S: WatchlistStore>(&self, list: &mut Watchlist<S>, action: WatchlistAction) -> Result<()> {
        match action {
            WatchlistAction::List => print_watchlist(list.entries()),
            WatchlistAction::Add(symbol) => {
                let entry = self.watchlist_entry(&symbol).await?;
                let (added, score) = (entry.symbol.to_uppercase(), entry.score);
                list.add(entry).await?;
                println!("Added {} ({}/100)", added, score);
            }
            WatchlistAction::Remove(symbol) => {
                if list.remove(&symbol).await? {
                    println!("Removed {}", symbol.to_uppercase());
                } else {
                    println!("{} is not on the watchlist", symbol.to_uppercase());
                }
            }
            WatchlistAction::Toggle(symbol) => {
                let entry = match list.get(&symbol) {
                    Some(existing) => existing.clone(),
                    None => self.watchlist_entry(&symbol).await?,
                };
                let on_list = list.toggle(entry).await?;
                println!(
                    "{} {}",
                    symbol.to_uppercase(),
                    if on_list { "added" } else { "removed" }
                );
            }
            WatchlistAction::Clear => {
                list.clear().await?;
                println!("Watchlist cleared");
            }
        }
        Ok(())
    }

    async fn watchlist_entry(&self, symbol: &str) -> Result<WatchlistEntry> {
        let company = self
            .screener
            .score_symbol(symbol)
            .await
            .with_context(|| format!("Cannot score {}", symbol))?;
        Ok(WatchlistEntry::new(company.symbol, company.name, company.score.total))
    }
}

fn print_company(company: &ScoredCompany) {
    let score = &company.score;
    let price = match (company.current_price, &company.currency) {
        (Some(p), Some(c)) => format!("{:.2} {}", p, c),
        (Some(p), None) => format!("{:.2}", p),
        _ => "-".to_string(),
    };

    println!("{} - {} ({})", company.symbol, company.name, price);
    println!("  Total: {}/100 ({})", score.total, score.tier.label());
    for category in ScoreCategory::ALL {
        println!(
            "  {:<14} {:>2}/{}",
            category.label(),
            score.category(category),
            category.cap()
        );
    }
    for penalty in &score.penalties {
        println!(
            "  Capped at {}: {}",
            penalty.cap,
            penalty.filter.description()
        );
    }
    if !score.breakdown.is_empty() {
        println!("  Breakdown:");
        for item in &score.breakdown {
            println!(
                "    {:<22} {:>10.2} {:>2}/{}",
                item.metric.label(),
                item.value,
                item.points,
                item.max
            );
        }
    }
    println!();
}

fn print_index(report: &IndexReport, rows: &[RankedCompany]) {
    println!(
        "{}: {} of {} companies scored",
        report.index_name,
        report.ranked.len(),
        report.requested()
    );
    println!(
        "{:>4}  {:<10} {:<32} {:>10} {:>8} {:>8} {:>8} {:>6}",
        "#", "Symbol", "Name", "Price", "P/E", "P/B", "ROE", "Score"
    );

    let cell = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
    for row in rows {
        let c = &row.company;
        let mut name = c.name.clone();
        if name.chars().count() > 32 {
            name = name.chars().take(31).collect::<String>() + "…";
        }
        println!(
            "{:>4}  {:<10} {:<32} {:>10} {:>8} {:>8} {:>8} {:>6}",
            row.rank,
            c.symbol,
            name,
            cell(c.current_price),
            cell(c.metrics.pe),
            cell(c.metrics.pb),
            cell(c.metrics.roe.map(|r| r * 100.0)),
            c.score.total
        );
    }

    let unknown = report.failures.iter().filter(|f| f.no_data).count();
    if unknown > 0 {
        println!("{} symbols had no data", unknown);
    }
    for failure in report.failures.iter().filter(|f| !f.no_data) {
        println!("  {} failed: {}", failure.symbol, failure.error);
    }
}

fn print_watchlist(entries: &[WatchlistEntry]) {
    if entries.is_empty() {
        println!("Watchlist is empty");
        return;
    }

    // Show in score order without touching the stored order
    let mut sorted: Vec<&WatchlistEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.symbol.cmp(&b.symbol)));
    for entry in sorted {
        println!(
            "  {:<10} {:<32} {:>3}/100  added {}",
            entry.symbol,
            entry.name,
            entry.score,
            entry.added_at.format("%Y-%m-%d")
        );
    }
}
