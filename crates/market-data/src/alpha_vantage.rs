use std::time::Duration;

use async_trait::async_trait;
use scoring_core::{CompanyMetrics, CompanySnapshot, DataError, DataResult, MetricsSource};
use serde_json::Value;

use crate::http;

const BASE_URL: &str = "https://www.alphavantage.co/query";

pub const SOURCE_NAME: &str = "alpha_vantage";

/// The public demo key only answers for a handful of symbols.
pub const DEMO_KEY: &str = "demo";

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> DataResult<Self> {
        Ok(Self {
            api_key,
            client: http::build_client()?,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_demo(&self) -> bool {
        self.api_key == DEMO_KEY
    }
}

#[async_trait]
impl MetricsSource for AlphaVantageClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        let url = format!(
            "{}?function=OVERVIEW&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );

        let response =
            http::get_with_retry(&self.client, &url, "Alpha Vantage", Duration::from_secs(15)).await?;

        if !response.status().is_success() {
            return Err(DataError::Api(format!(
                "Alpha Vantage returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let json: Value = response.json().await?;
        parse_overview(symbol, &json)
    }
}

/// Alpha Vantage sends every number as a string; "None", "-" and "" mean absent.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "None" || s == "-" {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(str::to_string)
}

/// Parse an `OVERVIEW` response into a snapshot.
pub fn parse_overview(symbol: &str, json: &Value) -> DataResult<CompanySnapshot> {
    // Check for error messages
    if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
        return Err(DataError::RateLimited(format!("Alpha Vantage: {}", note)));
    }

    if json.get("Error Message").is_some() {
        return Err(DataError::NotFound(symbol.to_string()));
    }

    let is_empty = json.as_object().map(|o| o.is_empty()).unwrap_or(true);
    if is_empty {
        return Err(DataError::NotFound(symbol.to_string()));
    }

    let metrics = CompanyMetrics {
        pe: number(json.get("TrailingPE")),
        forward_pe: number(json.get("ForwardPE")),
        pb: number(json.get("PriceToBookRatio")),
        peg: number(json.get("PEGRatio")),
        profit_margin: number(json.get("ProfitMargin")),
        roe: number(json.get("ReturnOnEquityTTM")),
        roa: number(json.get("ReturnOnAssetsTTM")),
        debt_to_equity: number(json.get("DebtToEquity")).map(|d| d / 100.0),
        current_ratio: number(json.get("CurrentRatio")),
        quick_ratio: number(json.get("QuickRatio")),
        interest_coverage: None,
        dividend_yield: number(json.get("DividendYield")),
        payout_ratio: number(json.get("PayoutRatio")),
        revenue_growth: number(json.get("QuarterlyRevenueGrowthYOY")),
        earnings_growth: number(json.get("QuarterlyEarningsGrowthYOY")),
        sector: text(json.get("Sector")),
        market_cap: number(json.get("MarketCapitalization")),
    };
    metrics.validate()?;

    let symbol = text(json.get("Symbol")).unwrap_or_else(|| symbol.to_uppercase());
    let name = text(json.get("Name")).unwrap_or_else(|| symbol.clone());

    let mut snapshot = CompanySnapshot::new(symbol, name, SOURCE_NAME).with_metrics(metrics);
    snapshot.currency = text(json.get("Currency"));
    snapshot.country = text(json.get("Country"));
    snapshot.industry = text(json.get("Industry"));

    Ok(snapshot)
}
