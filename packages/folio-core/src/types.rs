//! Core data types for the folio analytics engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One trading day's OHLCV record for a single ticker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    /// Calendar day of the bar (no time-of-day)
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded volume (0 when the source does not report one)
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    /// Create a bar with zero volume.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: 0,
        }
    }

    /// Set the volume.
    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    /// A bar is usable only when every price field is strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Mark-to-market value of something (a portfolio, an asset) on a given day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ValuePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// One period's simple return relative to the prior period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReturnPoint {
    /// Date of the later of the two valuations the return spans
    pub date: NaiveDate,
    /// Simple return as a fraction (0.012 = +1.2%)
    #[serde(rename = "return")]
    pub ret: f64,
    /// Compounded return since the start of the series
    pub cumulative: f64,
}

impl ReturnPoint {
    pub fn new(date: NaiveDate, ret: f64, cumulative: f64) -> Self {
        Self {
            date,
            ret,
            cumulative,
        }
    }
}

/// Benchmark-relative performance statistics.
///
/// All fields are zero when there was not enough overlapping history to
/// compute them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct MetricsResult {
    /// Daily alpha compounded over 252 trading days
    pub alpha_annual: f64,
    pub beta: f64,
    /// Coefficient of determination, always within [0, 1]
    pub r_squared: f64,
    /// Annualized standard deviation of portfolio returns
    pub volatility_annual: f64,
    /// Annualized standard deviation of the beta-adjusted residual
    pub tracking_error_annual: f64,
    pub information_ratio: f64,
    pub sharpe_portfolio: f64,
    pub sharpe_benchmark: f64,
}

impl MetricsResult {
    /// True when every statistic is exactly zero (the low-data result).
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// A holding of a single security.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Ticker symbol (uppercase)
    pub symbol: String,
    /// Number of shares held
    pub quantity: f64,
    /// Average purchase price per share
    pub avg_price: f64,
}

impl Position {
    /// Create a new position with the given symbol, quantity, and average price.
    pub fn new(symbol: &str, quantity: f64, avg_price: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            quantity,
            avg_price,
        }
    }

    /// Calculate the total cost of this position.
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.avg_price
    }

    /// Value of the position at the given price.
    pub fn market_value(&self, last_price: f64) -> f64 {
        self.quantity * last_price
    }

    /// Apply a trade to this position.
    ///
    /// Buys average the entry price in; sells reduce the quantity but never
    /// below zero. A flat position carries no average price. Trades for
    /// another symbol are ignored.
    pub fn apply_trade(&mut self, trade: &Trade) {
        if !trade.symbol.eq_ignore_ascii_case(&self.symbol) {
            return;
        }

        match trade.side {
            TradeSide::Buy => {
                let new_quantity = self.quantity + trade.quantity;
                if new_quantity <= 0.0 {
                    self.quantity = 0.0;
                    self.avg_price = 0.0;
                    return;
                }
                self.avg_price = (self.avg_price * self.quantity
                    + trade.price * trade.quantity)
                    / new_quantity;
                self.quantity = new_quantity;
            }
            TradeSide::Sell => {
                self.quantity = (self.quantity - trade.quantity).max(0.0);
                if self.quantity == 0.0 {
                    self.avg_price = 0.0;
                }
            }
        }
    }
}

/// A named collection of positions plus the trades that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub positions: Vec<Position>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    /// When the portfolio was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the portfolio was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            name: "My Portfolio".to_string(),
            positions: Vec::new(),
            trades: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Portfolio {
    /// Create a new empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a portfolio directly from `(ticker, quantity)` pairs.
    pub fn from_holdings<S: AsRef<str>>(holdings: &[(S, f64)]) -> Self {
        Self {
            positions: holdings
                .iter()
                .map(|(ticker, qty)| Position::new(ticker.as_ref(), *qty, 0.0))
                .collect(),
            ..Default::default()
        }
    }

    /// Find a position by ticker, case-insensitively.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(ticker))
    }

    fn position_or_create(&mut self, ticker: &str) -> &mut Position {
        let idx = match self
            .positions
            .iter()
            .position(|p| p.symbol.eq_ignore_ascii_case(ticker))
        {
            Some(idx) => idx,
            None => {
                self.positions.push(Position::new(ticker, 0.0, 0.0));
                self.positions.len() - 1
            }
        };
        &mut self.positions[idx]
    }

    /// Record a trade and apply it to the matching position.
    pub fn apply(&mut self, trade: Trade) {
        self.position_or_create(&trade.symbol).apply_trade(&trade);
        self.trades.push(trade);
    }

    /// Drop positions whose quantity is zero.
    pub fn prune_zero_quantity(&mut self) {
        self.positions.retain(|p| p.quantity != 0.0);
    }

    /// Read-only `(ticker, quantity)` view of non-zero holdings.
    ///
    /// Tickers are uppercased and duplicates are summed, in first-seen order.
    pub fn holdings(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = Vec::new();
        for p in &self.positions {
            let ticker = p.symbol.to_uppercase();
            match out.iter_mut().find(|(t, _)| *t == ticker) {
                Some((_, qty)) => *qty += p.quantity,
                None => out.push((ticker, p.quantity)),
            }
        }
        out.retain(|(_, qty)| *qty != 0.0);
        out
    }

    /// Calculate total cost basis of all positions.
    pub fn total_cost(&self) -> f64 {
        self.positions.iter().map(|p| p.total_cost()).sum()
    }

    /// Get the number of positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

/// A single executed trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Ticker symbol
    pub symbol: String,
    /// Buy or Sell
    pub side: TradeSide,
    /// Number of shares
    pub quantity: f64,
    /// Clean price per share at execution
    pub price: f64,
    /// When the trade was executed
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Create a new trade executed now.
    pub fn new(symbol: &str, side: TradeSide, quantity: f64, price: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            side,
            quantity,
            price,
            executed_at: Utc::now(),
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// API response wrapper used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
