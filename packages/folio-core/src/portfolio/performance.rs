//! Point-in-time performance snapshot of the current holdings.

use crate::prices::PriceProvider;
use crate::types::{Portfolio, Position};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A position marked at its last known price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedPosition {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    /// Last traded price, if one could be found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value: Option<f64>,
    /// Unrealized gain/loss in currency units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_loss: Option<f64>,
    /// Unrealized gain/loss percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_loss_percent: Option<f64>,
}

impl PricedPosition {
    fn new(position: &Position, last_price: Option<f64>) -> Self {
        let total_cost = position.total_cost();
        let market_value = last_price.map(|p| position.market_value(p));
        let gain_loss = market_value.map(|mv| mv - total_cost);
        let gain_loss_percent = gain_loss.map(|g| {
            if total_cost > 0.0 {
                (g / total_cost) * 100.0
            } else {
                0.0
            }
        });

        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            avg_price: position.avg_price,
            last_price,
            market_value,
            gain_loss,
            gain_loss_percent,
        }
    }
}

/// Portfolio performance summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    pub positions: Vec<PricedPosition>,
    /// Total cost basis of all positions
    pub total_cost: f64,
    /// Market value of the priced positions
    pub total_market_value: f64,
    /// Unrealized gain/loss of the priced positions
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub position_count: usize,
    pub positions_in_profit: usize,
    pub positions_in_loss: usize,
    /// Positions for which no last price was available
    pub positions_unpriced: usize,
}

impl PortfolioPerformance {
    /// Mark every position against a ticker → last price map.
    ///
    /// Lookups are case-insensitive. Totals only include priced positions.
    pub fn from_prices(portfolio: &Portfolio, last_prices: &HashMap<String, f64>) -> Self {
        let by_ticker: HashMap<String, f64> = last_prices
            .iter()
            .map(|(t, p)| (t.to_uppercase(), *p))
            .collect();

        let positions: Vec<PricedPosition> = portfolio
            .positions
            .iter()
            .map(|p| PricedPosition::new(p, by_ticker.get(&p.symbol.to_uppercase()).copied()))
            .collect();

        let total_cost = portfolio.total_cost();
        let priced_cost: f64 = portfolio
            .positions
            .iter()
            .zip(&positions)
            .filter(|(_, pp)| pp.market_value.is_some())
            .map(|(p, _)| p.total_cost())
            .sum();
        let total_market_value: f64 = positions.iter().filter_map(|p| p.market_value).sum();
        let total_gain_loss: f64 = positions.iter().filter_map(|p| p.gain_loss).sum();

        let total_gain_loss_percent = if priced_cost > 0.0 {
            (total_gain_loss / priced_cost) * 100.0
        } else {
            0.0
        };

        let count = |pred: fn(f64) -> bool| {
            positions
                .iter()
                .filter(|p| p.gain_loss.map(pred).unwrap_or(false))
                .count()
        };

        Self {
            total_cost,
            total_market_value,
            total_gain_loss,
            total_gain_loss_percent,
            position_count: positions.len(),
            positions_in_profit: count(|g| g > 0.0),
            positions_in_loss: count(|g| g < 0.0),
            positions_unpriced: positions.iter().filter(|p| p.last_price.is_none()).count(),
            positions,
        }
    }

    /// Weight of each priced position in the priced market value.
    pub fn position_weights(&self) -> Vec<(String, f64)> {
        if self.total_market_value <= 0.0 {
            return Vec::new();
        }

        self.positions
            .iter()
            .filter_map(|p| {
                p.market_value
                    .map(|mv| (p.symbol.clone(), mv / self.total_market_value))
            })
            .collect()
    }
}

/// Last prices for every held ticker, fetched concurrently.
///
/// Tickers without a price, or whose lookup fails, are absent from the map.
pub async fn last_prices<P: PriceProvider + ?Sized>(
    portfolio: &Portfolio,
    provider: &P,
) -> HashMap<String, f64> {
    let lookups = portfolio.holdings().into_iter().map(|(ticker, _)| async move {
        match provider.last_price(&ticker).await {
            Ok(price) => price.map(|p| (ticker, p)),
            Err(e) => {
                tracing::warn!("Last price lookup for {} failed: {}", ticker, e);
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::InMemoryPriceProvider;
    use approx::assert_relative_eq;
    use chrono::{Days, Utc};

    fn sample_portfolio() -> Portfolio {
        let mut portfolio = Portfolio::new();
        portfolio.positions.push(Position::new("AAPL", 10.0, 150.0));
        portfolio.positions.push(Position::new("GOOGL", 5.0, 100.0));
        portfolio.positions.push(Position::new("TSLA", 2.0, 200.0));
        portfolio
    }

    #[test]
    fn test_portfolio_performance() {
        let prices = HashMap::from([("aapl".to_string(), 175.0), ("GOOGL".to_string(), 90.0)]);

        let perf = PortfolioPerformance::from_prices(&sample_portfolio(), &prices);

        assert_eq!(perf.total_cost, 2400.0); // 1500 + 500 + 400
        assert_eq!(perf.total_market_value, 2200.0); // 1750 + 450
        assert_eq!(perf.total_gain_loss, 200.0); // 250 - 50
        assert_relative_eq!(perf.total_gain_loss_percent, 10.0, max_relative = 1e-12); // 200 / 2000
        assert_eq!(perf.position_count, 3);
        assert_eq!(perf.positions_in_profit, 1); // AAPL
        assert_eq!(perf.positions_in_loss, 1); // GOOGL
        assert_eq!(perf.positions_unpriced, 1); // TSLA

        let aapl = &perf.positions[0];
        assert_eq!(aapl.market_value, Some(1750.0));
        assert_relative_eq!(aapl.gain_loss_percent.unwrap(), 50.0 / 3.0, max_relative = 1e-12);
        assert!(perf.positions[2].gain_loss.is_none());
    }

    #[test]
    fn test_position_weights() {
        let mut portfolio = Portfolio::new();
        portfolio.positions.push(Position::new("AAPL", 10.0, 100.0));
        portfolio.positions.push(Position::new("GOOGL", 10.0, 100.0));
        let prices = HashMap::from([("AAPL".to_string(), 100.0), ("GOOGL".to_string(), 100.0)]);

        let weights = PortfolioPerformance::from_prices(&portfolio, &prices).position_weights();

        assert_eq!(weights.len(), 2);
        assert!((weights[0].1 - 0.5).abs() < 0.01); // 50% each
        assert!((weights[1].1 - 0.5).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_last_prices_skip_unknown_and_failed() {
        let today = Utc::now().date_naive();
        let provider = InMemoryPriceProvider::new()
            .with_closes("AAPL", &[(today - Days::new(2), 180.0), (today, 182.5)])
            .with_failure("GOOGL");

        let prices = last_prices(&sample_portfolio(), &provider).await;

        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get("AAPL"), Some(&182.5));
    }
}
