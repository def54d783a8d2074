//! In-memory price source, used for tests and pre-loaded data.

use super::{effective_range, sanitize_bars, select_range, PriceProvider};
use crate::types::PriceBar;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves bars from a ticker-keyed map.
#[derive(Debug, Default)]
pub struct InMemoryPriceProvider {
    series: HashMap<String, Vec<PriceBar>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl InMemoryPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the full history of a ticker.
    pub fn with_series(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    /// Add a ticker as a plain close series; open/high/low mirror the close.
    pub fn with_closes(self, ticker: &str, closes: &[(NaiveDate, f64)]) -> Self {
        let bars = closes
            .iter()
            .map(|&(date, close)| PriceBar::new(date, close, close, close, close))
            .collect();
        self.with_series(ticker, bars)
    }

    /// Make every fetch for `ticker` fail.
    pub fn with_failure(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_uppercase());
        self
    }

    pub fn insert(&mut self, ticker: &str, bars: Vec<PriceBar>) {
        self.series.insert(ticker.to_uppercase(), sanitize_bars(bars));
    }

    /// Number of `daily_history` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for InMemoryPriceProvider {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = ticker.to_uppercase();

        if self.failing.contains(&key) {
            return Err(Error::Provider {
                ticker: key,
                message: "simulated fetch failure".to_string(),
            });
        }

        let (start, end) = effective_range(start, end);
        Ok(self
            .series
            .get(&key)
            .map(|bars| select_range(bars, start, end))
            .unwrap_or_default())
    }
}
