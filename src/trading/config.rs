//! Trading configuration.

use anyhow::{ensure, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for signal evaluation and order sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Exchange symbol used when the signal's pair has no mapping
    pub symbol: String,

    /// Fixed size of every entry order, in contracts
    pub trade_size: Decimal,

    /// Largest position the bot should ever hold (advisory)
    pub max_position_size: Decimal,

    /// Log would-be orders instead of submitting them
    pub dry_run: bool,

    /// Minimum signal confidence to act on (0.0 to 1.0)
    pub min_confidence: f64,

    /// Entry limit offset from the last price, in basis points.
    /// Buys are priced above the market, sells below.
    pub entry_offset_bps: Decimal,

    /// Minutes between scheduled cycles (0 disables scheduling)
    pub poll_interval_minutes: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: "PF_XBTUSD".to_string(),
            trade_size: dec!(0.001),        // Small size for safety
            max_position_size: dec!(0.01),
            dry_run: true,                  // Never trade live by accident
            min_confidence: 0.65,
            entry_offset_bps: Decimal::ZERO,
            poll_interval_minutes: 15,
        }
    }
}

impl TradingConfig {
    /// Reject configurations the pipeline cannot trade safely with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.symbol.trim().is_empty(), "trading symbol must not be empty");
        ensure!(self.trade_size > Decimal::ZERO, "trade size must be positive, got {}", self.trade_size);
        ensure!(
            self.trade_size <= self.max_position_size,
            "trade size {} exceeds max position size {}",
            self.trade_size,
            self.max_position_size
        );
        ensure!(
            (0.0..=1.0).contains(&self.min_confidence),
            "min confidence must be within 0..=1, got {}",
            self.min_confidence
        );
        ensure!(
            self.entry_offset_bps >= Decimal::ZERO && self.entry_offset_bps < dec!(10000),
            "entry offset must be within 0..10000 bps, got {}",
            self.entry_offset_bps
        );
        Ok(())
    }
}
