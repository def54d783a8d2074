//! Time-bounded history cache in front of another provider.

use super::{effective_range, PriceProvider};
use crate::types::PriceBar;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

type CacheKey = (String, NaiveDate, NaiveDate);

#[derive(Debug)]
struct CacheEntry {
    bars: Vec<PriceBar>,
    expires_at: Instant,
}

/// Caches non-empty history responses per `(ticker, start, end)` for a TTL.
///
/// Errors and empty responses are never cached so a transient outage does
/// not stick.
#[derive(Debug)]
pub struct CachedPriceProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<P: PriceProvider> CachedPriceProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[async_trait]
impl<P: PriceProvider> PriceProvider for CachedPriceProvider<P> {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let (start, end) = effective_range(start, end);
        let key = (ticker.trim().to_uppercase(), start, end);

        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if Instant::now() <= entry.expires_at {
                    tracing::trace!("History cache hit for {}", key.0);
                    return Ok(entry.bars.clone());
                }
            }
        }

        let bars = self.inner.daily_history(ticker, start, end).await?;
        if !bars.is_empty() {
            self.entries.lock().await.insert(
                key,
                CacheEntry {
                    bars: bars.clone(),
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::InMemoryPriceProvider;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let inner = InMemoryPriceProvider::new().with_closes("A", &[(day(1), 1.0), (day(2), 2.0)]);
        let cached = CachedPriceProvider::new(inner, Duration::from_secs(60));

        let first = cached.daily_history("a", day(1), day(9)).await.unwrap();
        let second = cached.daily_history("A", day(1), day(9)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner().calls(), 1);

        cached.clear().await;
        cached.daily_history("A", day(1), day(9)).await.unwrap();
        assert_eq!(cached.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let inner = InMemoryPriceProvider::new().with_closes("A", &[(day(1), 1.0)]);
        let cached = CachedPriceProvider::new(inner, Duration::ZERO);

        cached.daily_history("A", day(1), day(9)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cached.daily_history("A", day(1), day(9)).await.unwrap();

        assert_eq!(cached.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_failed_responses_not_cached() {
        let inner = InMemoryPriceProvider::new().with_failure("BAD");
        let cached = CachedPriceProvider::new(inner, Duration::from_secs(60));

        assert!(cached.daily_history("NONE", day(1), day(9)).await.unwrap().is_empty());
        assert!(cached.daily_history("NONE", day(1), day(9)).await.unwrap().is_empty());
        assert!(cached.daily_history("BAD", day(1), day(9)).await.is_err());
        assert!(cached.daily_history("BAD", day(1), day(9)).await.is_err());

        assert_eq!(cached.inner().calls(), 4);
    }
}
