//! Position reconciliation: flattens existing exposure before a new entry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::api::ExchangeApi;
use crate::models::{OrderRequest, OrderSide};

/// Positions could not be confirmed closed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("could not fetch open positions: {0}")]
    Fetch(String),

    #[error("close order [{order}] failed: {reason}")]
    Close { order: String, reason: String },
}

/// Closes every open position on a symbol with market reduce-only orders.
pub struct PositionReconciler {
    exchange: Arc<dyn ExchangeApi>,
    dry_run: bool,
}

impl PositionReconciler {
    pub fn new(exchange: Arc<dyn ExchangeApi>, dry_run: bool) -> Self {
        Self { exchange, dry_run }
    }

    /// Close all positions on `symbol`. Idempotent: no positions, no orders.
    ///
    /// Returns the close orders that were submitted (or, in dry-run, would have
    /// been). Stops at the first failure so the caller never enters on top of
    /// an unknown position state.
    pub async fn close_all(&self, symbol: &str) -> Result<Vec<OrderRequest>, ReconcileError> {
        let positions = self.exchange.get_open_positions().await.map_err(|e| {
            let reason = format!("{:#}", e);
            error!(symbol = %symbol, error = %reason, "Error fetching open positions");
            ReconcileError::Fetch(reason)
        })?;

        let matching: Vec<_> = positions
            .into_iter()
            .filter(|p| p.is_for(symbol) && !p.is_flat())
            .collect();

        if matching.is_empty() {
            info!(symbol = %symbol, "No open positions to close");
            return Ok(Vec::new());
        }

        info!(symbol = %symbol, count = matching.len(), "Closing open positions");

        let mut closes = Vec::with_capacity(matching.len());
        for position in matching {
            let order = OrderRequest::close(
                &position.symbol,
                OrderSide::closing(position.side),
                position.close_size(),
            );

            info!(
                order = %order,
                position_side = position.side.as_str(),
                pnl = ?position.unrealized_funding,
                "Closing position"
            );

            if self.dry_run {
                info!(order = %order, "[DRY RUN] Would submit close order");
                closes.push(order);
                continue;
            }

            match self.exchange.send_order(&order).await {
                Ok(ack) if ack.is_placed() => {
                    info!(order_id = ?ack.order_id, "Close order placed");
                    closes.push(order);
                }
                Ok(ack) => {
                    error!(order = %order, status = %ack.status, "Close order not placed");
                    return Err(ReconcileError::Close {
                        order: order.to_string(),
                        reason: format!("status {}", ack.status),
                    });
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    error!(order = %order, error = %reason, "Close order failed");
                    return Err(ReconcileError::Close {
                        order: order.to_string(),
                        reason,
                    });
                }
            }
        }

        info!(symbol = %symbol, closed = closes.len(), "Position closing completed");
        Ok(closes)
    }
}
