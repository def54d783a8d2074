//! Price source backed by a directory of per-ticker JSON files.
//!
//! Each file is named `<TICKER>.json` and holds an array of bars:
//!
//! ```json
//! [{"date": "2024-01-02", "open": 1.0, "high": 1.2, "low": 0.9, "close": 1.1, "volume": 100}]
//! ```

use super::{effective_range, sanitize_bars, select_range, PriceProvider};
use crate::types::PriceBar;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FilePriceProvider {
    dir: PathBuf,
}

impl FilePriceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.json", ticker.trim().to_uppercase()))
    }
}

#[async_trait]
impl PriceProvider for FilePriceProvider {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let path = self.file_for(ticker);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No price file for {} at {}", ticker, path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let bars: Vec<PriceBar> = serde_json::from_str(&content)?;
        let (start, end) = effective_range(start, end);
        Ok(select_range(&sanitize_bars(bars), start, end))
    }
}
