//! stock-evaluator: score companies on fundamental metrics.
//!
//! Usage:
//!   cargo run -p stock-evaluator -- score AAPL SAP.DE
//!   cargo run -p stock-evaluator -- index dax --sort pe --asc --limit 10
//!   cargo run -p stock-evaluator -- search apple
//!   cargo run -p stock-evaluator -- watchlist add MSFT

use anyhow::Result;

mod app;
mod cli;
mod config;

use app::App;
use config::EvaluatorConfig;

const DEFAULT_LOG_FILTER: &str = "stock_evaluator=info,market_data=info,index_screener=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n", e);
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    let config = EvaluatorConfig::from_env()?;
    tracing::debug!(
        "Configuration loaded: batch size {}, delay {}ms, watchlist {:?}",
        config.batch_size,
        config.batch_delay_ms,
        config.watchlist_backend
    );

    let app = App::from_config(config)?;
    app.run(command).await
}
