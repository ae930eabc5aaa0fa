//! Trading pipeline: signal policy, reconciliation, order sequencing.

mod config;
mod evaluator;
mod reconciler;
mod sequencer;
mod symbols;

#[cfg(test)]
pub(crate) mod mock_exchange;

pub use config::TradingConfig;
pub use evaluator::{Rejection, SignalEvaluator};
pub use reconciler::{PositionReconciler, ReconcileError};
pub use sequencer::{OrderSequencer, ProtectionStatus, SequenceOutcome};
pub use symbols::{parse_symbol_overrides, SymbolMap};
