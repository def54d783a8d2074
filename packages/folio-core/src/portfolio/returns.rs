//! Return series construction.

use super::valuation::{portfolio_valuation, MIN_VALUATION_POINTS};
use crate::prices::PriceProvider;
use crate::types::{Portfolio, PriceBar, ReturnPoint, ValuePoint};
use chrono::NaiveDate;

/// Turn a valuation series into simple period returns.
///
/// The first point has no prior period, so the output always holds exactly
/// `values.len() - 1` points (or none for fewer than two inputs). Point `i`
/// carries `(v[i] - v[i-1]) / v[i-1]` and the compounded return since the
/// first valuation. Gaps between dates are not adjusted for. A non-positive
/// prior value contributes a zero return.
pub fn compute_returns(values: &[ValuePoint]) -> Vec<ReturnPoint> {
    let mut out = Vec::with_capacity(values.len().saturating_sub(1));
    let mut growth = 1.0;

    for pair in values.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let r = if prev.value > 0.0 {
            (cur.value - prev.value) / prev.value
        } else {
            0.0
        };
        growth *= 1.0 + r;
        out.push(ReturnPoint::new(cur.date, r, growth - 1.0));
    }

    out
}

/// Returns of a single asset from its closing prices.
pub fn returns_from_bars(bars: &[PriceBar]) -> Vec<ReturnPoint> {
    let closes: Vec<ValuePoint> = bars
        .iter()
        .map(|b| ValuePoint::new(b.date, b.close))
        .collect();
    compute_returns(&closes)
}

/// Daily returns of a whole portfolio over `[start, end)`.
///
/// Empty when fewer than three valuation dates could be assembled.
pub async fn portfolio_returns<P: PriceProvider + ?Sized>(
    portfolio: &Portfolio,
    start: NaiveDate,
    end: NaiveDate,
    provider: &P,
) -> Vec<ReturnPoint> {
    let values = portfolio_valuation(portfolio, start, end, provider).await;
    if values.len() < MIN_VALUATION_POINTS {
        tracing::debug!(
            "Only {} valuation dates, not computing portfolio returns",
            values.len()
        );
        return Vec::new();
    }
    compute_returns(&values)
}

/// Daily returns of a single ticker (e.g. the benchmark) over `[start, end)`.
///
/// A failed fetch yields an empty series.
pub async fn asset_returns<P: PriceProvider + ?Sized>(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    provider: &P,
) -> Vec<ReturnPoint> {
    match provider.daily_history(ticker, start, end).await {
        Ok(bars) => returns_from_bars(&bars),
        Err(e) => {
            tracing::warn!("Price fetch for {} failed, no returns: {}", ticker, e);
            Vec::new()
        }
    }
}
