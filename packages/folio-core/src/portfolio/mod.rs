//! Portfolio analytics module.
//!
//! Provides position tracking, date-aligned valuation, return series and
//! benchmark-relative risk metrics.

mod analysis;
mod metrics;
mod performance;
mod returns;
mod tracker;
mod valuation;

pub use analysis::{analyze, Analysis};
pub use metrics::{
    compute_metrics, daily_risk_free, mean, pair_by_date, sample_covariance, sample_variance,
    sharpe_ratio, MIN_PAIRED_OBSERVATIONS, TRADING_DAYS,
};
pub use performance::{last_prices, PortfolioPerformance, PricedPosition};
pub use returns::{asset_returns, compute_returns, portfolio_returns, returns_from_bars};
pub use tracker::PortfolioTracker;
pub use valuation::{merge_valuations, portfolio_valuation, MIN_VALUATION_POINTS};
