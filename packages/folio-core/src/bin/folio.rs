//! Folio CLI - portfolio bookkeeping and benchmark-relative analytics.
//!
//! Every command prints a single `ApiResponse` JSON document on stdout.
//! Diagnostics go to stderr and are controlled with `RUST_LOG`.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use folio_core::{
    config::PriceSource,
    portfolio::{analyze, asset_returns, last_prices, portfolio_returns, PortfolioTracker},
    prices::{CachedPriceProvider, FilePriceProvider, YahooPriceProvider},
    symbol::normalize, ApiResponse, FolioConfig, PortfolioPerformance, PriceProvider,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - portfolio returns and risk metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Portfolio management commands
    Portfolio {
        #[command(subcommand)]
        action: PortfolioAction,
    },
    /// Daily returns of the portfolio or of a single ticker
    Returns {
        /// Ticker to compute returns for instead of the portfolio
        #[arg(short, long)]
        ticker: Option<String>,
        #[command(flatten)]
        range: DateRange,
    },
    /// Risk metrics of the portfolio against a benchmark
    Metrics {
        /// Benchmark ticker (defaults to the configured one)
        #[arg(short, long)]
        benchmark: Option<String>,
        /// Annual risk-free rate, e.g. 0.02 for 2%
        #[arg(short, long)]
        risk_free: Option<f64>,
        #[command(flatten)]
        range: DateRange,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum PortfolioAction {
    /// Positions marked at their last price
    Status,
    /// List all positions
    Positions,
    /// Record a purchase
    Buy {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long)]
        quantity: f64,
        /// Price per share
        #[arg(short, long)]
        price: f64,
    },
    /// Record a sale
    Sell {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long)]
        quantity: f64,
        /// Price per share
        #[arg(short, long)]
        price: f64,
    },
    /// Remove a position
    Remove {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
    },
}

#[derive(clap::Args)]
struct DateRange {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Day after the last day of the window (defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl DateRange {
    fn bounds(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        (self.start, end)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = FolioConfig::load().context("failed to load configuration")?;

    let (output, ok) = match cli.command {
        Commands::Portfolio { action } => render(handle_portfolio(action, &config).await),
        Commands::Returns { ticker, range } => {
            render(handle_returns(ticker, &range, &config).await)
        }
        Commands::Metrics {
            benchmark,
            risk_free,
            range,
        } => render(handle_metrics(benchmark, risk_free, &range, &config).await),
        Commands::Config => render(Ok(config)),
    };

    println!("{}", output);
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Wrap a command result in an `ApiResponse` and serialize it.
fn render<T: Serialize>(result: anyhow::Result<T>) -> (String, bool) {
    let (response, ok) = match result {
        Ok(data) => (serde_json::to_value(ApiResponse::ok(data)), true),
        Err(e) => {
            tracing::debug!("Command failed: {:#}", e);
            (
                serde_json::to_value(ApiResponse::<()>::err(format!("{:#}", e))),
                false,
            )
        }
    };

    let text = response
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() }).to_string());
    (text, ok)
}

fn build_provider(config: &FolioConfig) -> anyhow::Result<Box<dyn PriceProvider>> {
    let ttl = config.provider.history_cache_ttl();
    let provider: Box<dyn PriceProvider> = match config.provider.source {
        PriceSource::Yahoo => {
            let yahoo = YahooPriceProvider::from_config(&config.provider)?;
            Box::new(CachedPriceProvider::new(yahoo, ttl))
        }
        PriceSource::Files => {
            let files = FilePriceProvider::new(config.price_dir());
            Box::new(CachedPriceProvider::new(files, ttl))
        }
    };
    Ok(provider)
}

async fn handle_portfolio(
    action: PortfolioAction,
    config: &FolioConfig,
) -> anyhow::Result<serde_json::Value> {
    let mut tracker = PortfolioTracker::new(config)?;

    match action {
        PortfolioAction::Status => {
            let provider = build_provider(config)?;
            let prices = last_prices(tracker.get(), &provider).await;
            let performance = PortfolioPerformance::from_prices(tracker.get(), &prices);
            Ok(json!({
                "name": tracker.get().name,
                "performance": performance,
                "weights": performance.position_weights(),
                "updated_at": tracker.get().updated_at,
            }))
        }
        PortfolioAction::Positions => Ok(json!({
            "positions": tracker.positions(),
            "position_count": tracker.get().position_count(),
            "total_cost": tracker.total_cost(),
        })),
        PortfolioAction::Buy {
            symbol,
            quantity,
            price,
        } => {
            let position = tracker.buy(&normalize(&symbol), quantity, price)?;
            tracker.save()?;
            Ok(json!({ "position": position }))
        }
        PortfolioAction::Sell {
            symbol,
            quantity,
            price,
        } => {
            let position = tracker.sell(&normalize(&symbol), quantity, price)?;
            tracker.save()?;
            Ok(json!({
                "position": position,
                "closed": position.quantity == 0.0,
            }))
        }
        PortfolioAction::Remove { symbol } => {
            let removed = tracker.remove_position(&normalize(&symbol))?;
            tracker.save()?;
            Ok(json!({ "removed": removed }))
        }
    }
}

async fn handle_returns(
    ticker: Option<String>,
    range: &DateRange,
    config: &FolioConfig,
) -> anyhow::Result<serde_json::Value> {
    let (start, end) = range.bounds();
    let provider = build_provider(config)?;

    match ticker {
        Some(ticker) => {
            let ticker = normalize(&ticker);
            let returns = asset_returns(&ticker, start, end, &provider).await;
            Ok(json!({ "ticker": ticker, "returns": returns }))
        }
        None => {
            let tracker = PortfolioTracker::new(config)?;
            if tracker.positions().is_empty() {
                anyhow::bail!("portfolio has no positions");
            }
            let returns = portfolio_returns(tracker.get(), start, end, &provider).await;
            Ok(json!({ "portfolio": tracker.get().name, "returns": returns }))
        }
    }
}

async fn handle_metrics(
    benchmark: Option<String>,
    risk_free: Option<f64>,
    range: &DateRange,
    config: &FolioConfig,
) -> anyhow::Result<serde_json::Value> {
    let (start, end) = range.bounds();
    let benchmark = normalize(benchmark.as_deref().unwrap_or(&config.benchmark.ticker));
    let risk_free = risk_free.unwrap_or(config.benchmark.risk_free_rate);

    let tracker = PortfolioTracker::new(config)?;
    if tracker.positions().is_empty() {
        anyhow::bail!("portfolio has no positions");
    }

    let provider = build_provider(config)?;
    let analysis = analyze(tracker.get(), &benchmark, start, end, risk_free, &provider).await;
    let metrics = *analysis.require_metrics()?;

    Ok(json!({
        "benchmark": analysis.benchmark,
        "risk_free_rate": risk_free,
        "start": start,
        "end": end,
        "observations": analysis.paired_observations,
        "metrics": metrics,
    }))
}
