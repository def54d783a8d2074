//! Daily price history sources.
//!
//! Every source implements [`PriceProvider`]. Providers hand back bars
//! sorted ascending by date with unusable (non-positive) bars already
//! removed; a ticker the source knows nothing about yields an empty list.
//! Transport failures surface as `Err` and callers that merge several
//! tickers treat them as empty series.

mod cache;
mod file;
mod memory;
mod yahoo;

pub use cache::CachedPriceProvider;
pub use file::FilePriceProvider;
pub use memory::InMemoryPriceProvider;
pub use yahoo::{parse_chart, YahooPriceProvider};

use crate::types::PriceBar;
use crate::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};

/// Capability to fetch daily bars for a ticker over `[start, end)`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily bars with `start <= date < end`, ascending by date.
    ///
    /// When `end <= start` the range is widened to a single day.
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>>;

    /// Most recent positive close over the trailing week.
    async fn last_price(&self, ticker: &str) -> Result<Option<f64>> {
        let today = Utc::now().date_naive();
        let end = today + Days::new(1);
        let start = end - Days::new(7);
        let bars = self.daily_history(ticker, start, end).await?;
        Ok(bars.iter().rev().map(|b| b.close).find(|c| *c > 0.0))
    }
}

#[async_trait]
impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        (**self).daily_history(ticker, start, end).await
    }

    async fn last_price(&self, ticker: &str) -> Result<Option<f64>> {
        (**self).last_price(ticker).await
    }
}

/// Normalize a requested range: an empty or inverted range becomes one day.
pub fn effective_range(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if end <= start {
        (start, start + Days::new(1))
    } else {
        (start, end)
    }
}

/// Drop invalid bars, sort ascending and keep one bar per date.
///
/// When a date appears twice the later bar in input order wins.
pub fn sanitize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(PriceBar::is_valid);
    // stable sort keeps input order within a date
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Keep bars inside `[start, end)`.
pub fn select_range(bars: &[PriceBar], start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.iter()
        .filter(|b| b.date >= start && b.date < end)
        .copied()
        .collect()
}
