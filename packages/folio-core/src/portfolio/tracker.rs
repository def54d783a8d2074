//! Position bookkeeping and JSON persistence.

use crate::config::FolioConfig;
use crate::types::{Portfolio, Position, Trade, TradeSide};
use crate::{Error, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps a portfolio in memory and persists it to a JSON file.
#[derive(Debug)]
pub struct PortfolioTracker {
    /// Path to the portfolio JSON file, empty for in-memory trackers
    path: PathBuf,
    portfolio: Portfolio,
}

impl PortfolioTracker {
    /// Open the portfolio file named by the configuration.
    ///
    /// `FOLIO_PORTFOLIO_FILE` overrides the configured location.
    pub fn new(config: &FolioConfig) -> Result<Self> {
        Self::open(config.portfolio_path())
    }

    /// Open a tracker backed by `path`.
    ///
    /// A missing file starts an empty portfolio. A file that cannot be
    /// read or parsed is an error, so it is never overwritten by `save`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let portfolio = Self::load_from_path(&path)?;
        Ok(Self { path, portfolio })
    }

    /// Create an in-memory tracker (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            portfolio: Portfolio::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<Portfolio> {
        if !path.exists() {
            return Ok(Portfolio::default());
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        // A bare list of positions is accepted as well
        let mut portfolio = if data.is_array() {
            let positions: Vec<Position> = serde_json::from_value(data)?;
            Portfolio {
                positions,
                ..Default::default()
            }
        } else {
            serde_json::from_value(data)?
        };

        portfolio.prune_zero_quantity();
        Ok(portfolio)
    }

    /// Save the current portfolio to disk.
    pub fn save(&mut self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let now = Utc::now();
        self.portfolio.created_at.get_or_insert(now);
        self.portfolio.updated_at = Some(now);

        let content = serde_json::to_string_pretty(&self.portfolio)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved portfolio to {}", self.path.display());
        Ok(())
    }

    /// Discard in-memory changes and re-read the file.
    pub fn reload(&mut self) -> Result<()> {
        self.portfolio = Self::load_from_path(&self.path)?;
        Ok(())
    }

    pub fn get(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn get_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    pub fn positions(&self) -> &[Position] {
        &self.portfolio.positions
    }

    /// Find a position by symbol, case-insensitively.
    pub fn find_position(&self, symbol: &str) -> Option<&Position> {
        self.portfolio.position(symbol)
    }

    /// Buy `quantity` shares of `symbol` at `price`.
    ///
    /// The entry price is averaged into an existing position. Returns the
    /// position after the trade.
    pub fn buy(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<Position> {
        validate_trade(quantity, price)?;
        self.apply_trade(Trade::new(symbol, TradeSide::Buy, quantity, price))
    }

    /// Sell `quantity` shares of a held `symbol` at `price`.
    ///
    /// Selling more than is held closes the position, which is then
    /// dropped from the portfolio.
    pub fn sell(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<Position> {
        validate_trade(quantity, price)?;
        if self.find_position(symbol).is_none() {
            return Err(Error::PositionNotFound(symbol.to_uppercase()));
        }
        self.apply_trade(Trade::new(symbol, TradeSide::Sell, quantity, price))
    }

    /// Record a trade, returning the affected position as it now stands.
    pub fn apply_trade(&mut self, trade: Trade) -> Result<Position> {
        let symbol = trade.symbol.clone();
        self.portfolio.apply(trade);

        let position = self
            .portfolio
            .position(&symbol)
            .cloned()
            .ok_or_else(|| Error::PositionNotFound(symbol.clone()))?;
        self.portfolio.prune_zero_quantity();
        Ok(position)
    }

    /// Remove a position from the portfolio.
    pub fn remove_position(&mut self, symbol: &str) -> Result<Position> {
        match self
            .portfolio
            .positions
            .iter()
            .position(|p| p.symbol.eq_ignore_ascii_case(symbol))
        {
            Some(idx) => Ok(self.portfolio.positions.remove(idx)),
            None => Err(Error::PositionNotFound(symbol.to_uppercase())),
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.portfolio.total_cost()
    }

    /// Clear all positions. The trade log is kept.
    pub fn clear_positions(&mut self) {
        self.portfolio.positions.clear();
    }
}

fn validate_trade(quantity: f64, price: f64) -> Result<()> {
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(Error::InvalidOperation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if !(price.is_finite() && price > 0.0) {
        return Err(Error::InvalidOperation(format!(
            "price must be positive, got {}",
            price
        )));
    }
    Ok(())
}
