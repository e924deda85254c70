use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use scoring_core::{CompanyMetrics, CompanySnapshot, DataError, DataResult, MetricsSource};
use serde_json::Value;

use crate::http;

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const MODULES: &str = "summaryDetail,financialData,defaultKeyStatistics,price,summaryProfile";

pub const SOURCE_NAME: &str = "yahoo";

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
    retry_backoff: Duration,
}

impl YahooFinanceClient {
    pub fn new() -> DataResult<Self> {
        Ok(Self {
            client: http::build_client()?,
            base_url: QUOTE_SUMMARY_URL.to_string(),
            retry_backoff: Duration::from_secs(2),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

#[async_trait]
impl MetricsSource for YahooFinanceClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        let url = format!("{}/{}?modules={}", self.base_url, symbol, MODULES);

        let response =
            http::get_with_retry(&self.client, &url, "Yahoo Finance", self.retry_backoff).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DataError::NotFound(symbol.to_string()));
        }
        if !response.status().is_success() {
            return Err(DataError::Api(format!(
                "Yahoo Finance returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let json: Value = response.json().await?;
        parse_quote_summary(symbol, &json)
    }
}

/// Read a value that is either wrapped as `{"raw": x, "fmt": ".."}` or bare.
/// Empty wrappers (`{}`) are absent.
fn raw(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    let number = match value.get("raw") {
        Some(inner) => inner.as_f64(),
        None => value.as_f64(),
    };
    number.filter(|n| n.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a quoteSummary response into a snapshot.
pub fn parse_quote_summary(symbol: &str, json: &Value) -> DataResult<CompanySnapshot> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| DataError::InvalidData("missing quoteSummary".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        tracing::debug!("Yahoo Finance error for {}: {}", symbol, description);
        return Err(DataError::NotFound(symbol.to_string()));
    }

    let result = summary
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| DataError::NotFound(symbol.to_string()))?;

    let empty = Value::Null;
    let detail = result.get("summaryDetail").unwrap_or(&empty);
    let financial = result.get("financialData").unwrap_or(&empty);
    let key_stats = result.get("defaultKeyStatistics").unwrap_or(&empty);
    let price = result.get("price").unwrap_or(&empty);
    let profile = result.get("summaryProfile").unwrap_or(&empty);

    let metrics = CompanyMetrics {
        pe: raw(detail.get("trailingPE")).or_else(|| raw(key_stats.get("trailingPE"))),
        forward_pe: raw(detail.get("forwardPE")),
        pb: raw(key_stats.get("priceToBook")),
        peg: raw(key_stats.get("pegRatio")),
        profit_margin: raw(financial.get("profitMargins")),
        roe: raw(financial.get("returnOnEquity")),
        roa: raw(financial.get("returnOnAssets")),
        // Yahoo reports debt/equity in percent
        debt_to_equity: raw(financial.get("debtToEquity")).map(|d| d / 100.0),
        current_ratio: raw(financial.get("currentRatio")),
        quick_ratio: raw(financial.get("quickRatio")),
        interest_coverage: None,
        dividend_yield: raw(detail.get("dividendYield"))
            .or_else(|| raw(detail.get("trailingAnnualDividendYield"))),
        payout_ratio: raw(detail.get("payoutRatio")),
        revenue_growth: raw(financial.get("revenueGrowth")),
        earnings_growth: raw(financial.get("earningsGrowth")),
        sector: text(profile.get("sector")),
        market_cap: raw(detail.get("marketCap")).or_else(|| raw(price.get("marketCap"))),
    };
    metrics.validate()?;

    if metrics.present_count() == 0 {
        return Err(DataError::NotFound(symbol.to_string()));
    }

    let name = text(price.get("shortName"))
        .or_else(|| text(price.get("longName")))
        .unwrap_or_else(|| symbol.to_string());

    let mut snapshot = CompanySnapshot::new(symbol.to_uppercase(), name, SOURCE_NAME).with_metrics(metrics);
    snapshot.currency = text(price.get("currency"));
    snapshot.country = text(profile.get("country"));
    snapshot.industry = text(profile.get("industry"));
    snapshot.current_price = raw(price.get("regularMarketPrice"));

    Ok(snapshot)
}
