//! End-to-end portfolio vs. benchmark analysis.

use super::metrics::{compute_metrics, pair_by_date, MIN_PAIRED_OBSERVATIONS};
use super::returns::{asset_returns, portfolio_returns};
use crate::prices::PriceProvider;
use crate::types::{MetricsResult, Portfolio, ReturnPoint};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Both return series plus the metrics computed from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub benchmark: String,
    pub portfolio_returns: Vec<ReturnPoint>,
    pub benchmark_returns: Vec<ReturnPoint>,
    /// Number of dates present in both return series
    pub paired_observations: usize,
    pub metrics: MetricsResult,
}

impl Analysis {
    /// Whether the metrics were actually computed rather than zero-filled.
    pub fn has_sufficient_data(&self) -> bool {
        self.paired_observations >= MIN_PAIRED_OBSERVATIONS
    }

    /// The metrics, or `InsufficientData` when they were zero-filled.
    pub fn require_metrics(&self) -> Result<&MetricsResult> {
        if self.has_sufficient_data() {
            Ok(&self.metrics)
        } else {
            Err(Error::InsufficientData(format!(
                "{} paired daily returns against {}, need at least {}",
                self.paired_observations, self.benchmark, MIN_PAIRED_OBSERVATIONS
            )))
        }
    }
}

/// Run the whole pipeline for `portfolio` against `benchmark`.
///
/// The portfolio and benchmark histories are fetched concurrently.
pub async fn analyze<P: PriceProvider + ?Sized>(
    portfolio: &Portfolio,
    benchmark: &str,
    start: NaiveDate,
    end: NaiveDate,
    risk_free_annual: f64,
    provider: &P,
) -> Analysis {
    let (portfolio_returns, benchmark_returns) = futures::join!(
        portfolio_returns(portfolio, start, end, provider),
        asset_returns(benchmark, start, end, provider)
    );

    let paired_observations = pair_by_date(&portfolio_returns, &benchmark_returns).len();
    let metrics = compute_metrics(&portfolio_returns, &benchmark_returns, risk_free_annual);

    tracing::debug!(
        "Analysis vs {}: {} portfolio returns, {} benchmark returns, {} paired",
        benchmark,
        portfolio_returns.len(),
        benchmark_returns.len(),
        paired_observations
    );

    Analysis {
        benchmark: benchmark.to_string(),
        portfolio_returns,
        benchmark_returns,
        paired_observations,
        metrics,
    }
}
