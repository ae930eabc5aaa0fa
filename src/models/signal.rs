//! Trading signal model as consumed from the external signal bot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction recommended by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalSide {
    Buy,
    Sell,
    /// HOLD, NEUTRAL or anything the bot does not recognise.
    Hold,
}

impl SignalSide {
    /// Parse the side string sent by the signal bot.
    ///
    /// Unknown values collapse to `Hold` so a malformed instruction never trades.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            _ => Self::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }

    /// Whether this side asks for a position at all.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl std::fmt::Display for SignalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal for one cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub side: SignalSide,

    /// Model confidence (0.0 to 1.0)
    pub confidence: f64,

    /// Take-profit level, if the bot supplied a positive one
    pub price_target: Option<Decimal>,

    /// Stop-loss level, if the bot supplied a positive one
    pub stop_loss: Option<Decimal>,

    /// Source-side pair name (e.g. "XXBTZUSD")
    pub pair_used: String,
}

impl Signal {
    pub fn new(
        side: SignalSide,
        confidence: f64,
        price_target: Option<Decimal>,
        stop_loss: Option<Decimal>,
        pair_used: impl Into<String>,
    ) -> Self {
        Self {
            side,
            confidence,
            price_target: price_target.filter(|p| *p > Decimal::ZERO),
            stop_loss: stop_loss.filter(|p| *p > Decimal::ZERO),
            pair_used: pair_used.into(),
        }
    }

    /// Both bracket levels are present.
    pub fn has_levels(&self) -> bool {
        self.price_target.is_some() && self.stop_loss.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_parsing() {
        assert_eq!(SignalSide::parse("BUY"), SignalSide::Buy);
        assert_eq!(SignalSide::parse("sell"), SignalSide::Sell);
        assert_eq!(SignalSide::parse("HOLD"), SignalSide::Hold);
        assert_eq!(SignalSide::parse("NEUTRAL"), SignalSide::Hold);
        assert_eq!(SignalSide::parse("moon"), SignalSide::Hold);
    }

    #[test]
    fn test_non_positive_levels_are_absent() {
        let signal = Signal::new(SignalSide::Buy, 0.9, Some(dec!(0)), Some(dec!(-5)), "XBTUSD");
        assert_eq!(signal.price_target, None);
        assert_eq!(signal.stop_loss, None);
        assert!(!signal.has_levels());

        let signal = Signal::new(SignalSide::Buy, 0.9, Some(dec!(70000)), Some(dec!(64000)), "XBTUSD");
        assert!(signal.has_levels());
    }
}
