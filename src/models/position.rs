//! Open position as reported by Kraken Futures `openpositions`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }
}

/// Exchange-side position. Fetched fresh every cycle, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Exchange symbol (e.g. "PF_XBTUSD")
    pub symbol: String,

    pub side: PositionSide,

    /// Contracts held. Kraken reports a magnitude, but signed values are tolerated.
    pub size: Decimal,

    /// Average entry price
    #[serde(default)]
    pub price: Option<Decimal>,

    /// Unrealized funding / P&L
    #[serde(default)]
    pub unrealized_funding: Option<Decimal>,
}

impl Position {
    #[cfg(test)]
    pub fn new(symbol: impl Into<String>, side: PositionSide, size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            price: None,
            unrealized_funding: None,
        }
    }

    /// Size to close, always non-negative.
    pub fn close_size(&self) -> Decimal {
        self.size.abs()
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// Case-insensitive symbol match.
    pub fn is_for(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }
}
