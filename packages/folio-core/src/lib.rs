//! Folio Core - Portfolio valuation and benchmark-relative performance analytics.
//!
//! This crate turns daily price history and portfolio positions into return
//! series and a standard set of risk statistics:
//!
//! - **Valuation**: date-aligned mark-to-market series for a whole portfolio
//! - **Returns**: simple period returns with compounded cumulative return
//! - **Metrics**: alpha, beta, R², volatility, tracking error, information
//!   ratio and Sharpe ratios against a benchmark
//! - **Prices**: pluggable daily-history providers (HTTP, files, in-memory)
//! - **Tracking**: positions, trade application and JSON persistence
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use folio_core::portfolio::analyze;
//! use folio_core::prices::YahooPriceProvider;
//! use folio_core::Portfolio;
//!
//! # async fn run() -> folio_core::Result<()> {
//! let provider = YahooPriceProvider::new()?;
//! let portfolio = Portfolio::from_holdings(&[("AAPL", 10.0), ("MSFT", 5.0)]);
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let analysis = analyze(&portfolio, "^GSPC", start, end, 0.02, &provider).await;
//! println!("beta = {:.2}", analysis.metrics.beta);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod portfolio;
pub mod prices;
pub mod symbol;
pub mod types;

// Re-export commonly used types
pub use config::FolioConfig;
pub use types::{
    ApiResponse, MetricsResult, Portfolio, Position, PriceBar, ReturnPoint, Trade, TradeSide,
    ValuePoint,
};

// Re-export main functionality
pub use portfolio::{
    analyze, asset_returns, compute_metrics, compute_returns, portfolio_returns,
    portfolio_valuation, Analysis, PortfolioPerformance, PortfolioTracker,
};
pub use prices::PriceProvider;

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price provider error for {ticker}: {message}")]
    Provider { ticker: String, message: String },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
