//! Data models for signals, market data, positions, and orders.

mod market;
mod order;
mod position;
mod signal;

pub use market::{Instrument, Ticker};
pub use order::{OrderAck, OrderRequest, OrderSide};
pub use position::{Position, PositionSide};
pub use signal::{Signal, SignalSide};
