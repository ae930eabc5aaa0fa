//! Seams between the trading pipeline and its remote collaborators.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Instrument, OrderAck, OrderRequest, Position, Signal, Ticker};

/// Request/response operations the pipeline needs from the exchange.
///
/// Every call is a single bounded request. Implementations own timeouts and
/// any retrying of idempotent reads; order submission is never retried.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn get_tickers(&self) -> Result<Vec<Ticker>>;

    async fn get_instruments(&self) -> Result<Vec<Instrument>>;

    async fn get_open_positions(&self) -> Result<Vec<Position>>;

    async fn send_order(&self, order: &OrderRequest) -> Result<OrderAck>;

    /// Cancel every open order on `symbol`, returning the exchange status.
    async fn cancel_all_orders(&self, symbol: &str) -> Result<String>;
}

/// Source of the latest trading signal.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// `Ok(None)` when the source answered but has no signal to offer.
    async fn fetch_signal(&self) -> Result<Option<Signal>>;
}
