//! Date-aligned valuation of a whole portfolio.
//!
//! Each holding's history is fetched independently and concurrently. The
//! valuation dates are the union of every ticker's bar dates; on each date
//! a ticker contributes `quantity * close` only if it has a bar on that
//! exact day. There is no forward fill, so a ticker missing a day simply
//! drops out of that day's total.

use crate::prices::PriceProvider;
use crate::types::{Portfolio, PriceBar, ValuePoint};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};

/// Fewer valuation dates than this is not enough history for returns.
pub const MIN_VALUATION_POINTS: usize = 3;

/// Mark-to-market series of `portfolio` over `[start, end)`.
///
/// A ticker whose fetch fails contributes no dates. Dates whose total is
/// not strictly positive are left out.
pub async fn portfolio_valuation<P: PriceProvider + ?Sized>(
    portfolio: &Portfolio,
    start: NaiveDate,
    end: NaiveDate,
    provider: &P,
) -> Vec<ValuePoint> {
    let holdings = portfolio.holdings();

    let fetches = holdings.iter().map(|(ticker, quantity)| async move {
        let bars = match provider.daily_history(ticker, start, end).await {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!("Price fetch for {} failed, skipping: {}", ticker, e);
                Vec::new()
            }
        };
        tracing::debug!("{}: {} bars", ticker, bars.len());
        (*quantity, bars)
    });

    let series = join_all(fetches).await;
    merge_valuations(&series)
}

/// Merge per-holding `(quantity, bars)` series into one valuation series.
///
/// Output dates are strictly increasing.
pub fn merge_valuations(series: &[(f64, Vec<PriceBar>)]) -> Vec<ValuePoint> {
    let closes_by_date: Vec<(f64, HashMap<NaiveDate, f64>)> = series
        .iter()
        .map(|(quantity, bars)| {
            let closes: HashMap<NaiveDate, f64> = bars.iter().map(|b| (b.date, b.close)).collect();
            (*quantity, closes)
        })
        .collect();

    let dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect();

    dates
        .into_iter()
        .filter_map(|date| {
            let total: f64 = closes_by_date
                .iter()
                .filter_map(|(quantity, closes)| closes.get(&date).map(|close| quantity * close))
                .sum();
            (total > 0.0).then(|| ValuePoint::new(date, total))
        })
        .collect()
}
