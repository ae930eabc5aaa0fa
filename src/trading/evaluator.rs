//! Signal policy: decides whether a signal is worth acting on.

use tracing::info;

use crate::models::Signal;

/// Why a signal was not acted on.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// HOLD / NEUTRAL: nothing to do
    Hold,
    /// Confidence below the configured threshold
    LowConfidence { confidence: f64, threshold: f64 },
    /// BUY/SELL without both a target and a stop
    MissingLevels,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Hold => write!(f, "hold signal"),
            Rejection::LowConfidence { confidence, threshold } => {
                write!(f, "confidence {} below minimum {}", confidence, threshold)
            }
            Rejection::MissingLevels => write!(f, "missing price_target or stop_loss"),
        }
    }
}

/// Pure evaluation of a signal against the confidence threshold.
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    min_confidence: f64,
}

impl SignalEvaluator {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Apply the rules in order; the first failing rule rejects.
    pub fn evaluate(&self, signal: &Signal) -> Result<(), Rejection> {
        if !signal.side.is_actionable() {
            return Err(Rejection::Hold);
        }

        if signal.confidence < self.min_confidence {
            return Err(Rejection::LowConfidence {
                confidence: signal.confidence,
                threshold: self.min_confidence,
            });
        }

        if !signal.has_levels() {
            return Err(Rejection::MissingLevels);
        }

        Ok(())
    }

    /// `evaluate`, logging any rejection.
    fn review(&self, signal: &Signal) -> Result<(), Rejection> {
        let result = self.evaluate(signal);
        match &result {
            Ok(()) => {}
            Err(Rejection::Hold) => {
                info!(pair = %signal.pair_used, "HOLD signal received - no action taken");
            }
            Err(reason) => {
                info!(
                    side = %signal.side,
                    pair = %signal.pair_used,
                    reason = %reason,
                    "Signal rejected"
                );
            }
        }
        result
    }

    /// Gate for the cycle: true only for an actionable signal. Rejections are logged.
    pub fn should_execute(&self, signal: &Signal) -> bool {
        self.review(signal).is_ok()
    }
}
