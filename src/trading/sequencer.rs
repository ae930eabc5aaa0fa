//! Order sequencing: turns an accepted signal into entry + stop-loss + take-profit.
//!
//! Each step gates the next:
//! 1. Resolve the exchange symbol
//! 2. Load instrument specs (tick size)
//! 3. Load the last traded price
//! 4. Check the stop-loss sits on the protective side of the price
//! 5. Flatten existing positions on the symbol
//! 6. Submit the entry limit order
//! 7. Only if the entry was placed: submit the stop-loss and take-profit
//!
//! Any failed submission triggers a best-effort cancel of all orders on the symbol.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::ExchangeApi;
use crate::models::{Instrument, OrderAck, OrderRequest, OrderSide, Signal, SignalSide};

use super::{PositionReconciler, ReconcileError, SymbolMap, TradingConfig};

/// Why a cycle stopped before (or while) entering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortReason {
    #[error("signal is not actionable")]
    NotActionable,

    #[error("instrument info unavailable for {symbol}: {detail}")]
    InstrumentUnavailable { symbol: String, detail: String },

    #[error("current price unavailable for {symbol}: {detail}")]
    PriceUnavailable { symbol: String, detail: String },

    #[error("inconsistent signal: {side} stop loss {stop_loss} is on the wrong side of price {price}")]
    InconsistentStop {
        side: SignalSide,
        stop_loss: Decimal,
        price: Decimal,
    },

    #[error("reconciliation failed: {0}")]
    Reconciliation(#[from] ReconcileError),

    #[error("entry order [{order}] failed: {error}")]
    EntryFailed { order: String, error: String },
}

/// Orders a cycle intends to submit, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub symbol: String,
    pub closes: Vec<OrderRequest>,
    pub entry: OrderRequest,
    pub stop_loss: OrderRequest,
    pub take_profit: Option<OrderRequest>,
}

/// Result of the best-effort cancel-all after a failed submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Cleanup {
    Cancelled(String),
    Failed(String),
}

/// What happened to the protective orders after an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtectionStatus {
    Protected {
        stop_loss: OrderAck,
        take_profit: Option<OrderAck>,
    },
    /// Entry was not placed, so nothing needed protecting.
    Skipped { entry_status: String },
    /// Entry placed but protection failed: a live, unprotected position.
    Gap { error: String, cleanup: Cleanup },
}

/// Outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    Aborted(AbortReason),
    /// Dry run: everything up to submission ran, nothing was sent.
    Simulated(OrderPlan),
    Executed {
        plan: OrderPlan,
        entry: OrderAck,
        protection: ProtectionStatus,
    },
}

/// Submits the bracketed order sequence for an accepted signal.
pub struct OrderSequencer {
    exchange: Arc<dyn ExchangeApi>,
    reconciler: PositionReconciler,
    symbols: Arc<SymbolMap>,
    trade_size: Decimal,
    entry_offset_bps: Decimal,
    dry_run: bool,
}

impl OrderSequencer {
    pub fn new(exchange: Arc<dyn ExchangeApi>, symbols: Arc<SymbolMap>, config: &TradingConfig) -> Self {
        Self {
            reconciler: PositionReconciler::new(exchange.clone(), config.dry_run),
            exchange,
            symbols,
            trade_size: config.trade_size,
            entry_offset_bps: config.entry_offset_bps,
            dry_run: config.dry_run,
        }
    }

    /// Run the sequence for a signal that passed evaluation.
    pub async fn execute(&self, signal: &Signal) -> SequenceOutcome {
        match self.run(signal).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(reason = %reason, "Aborting trade");
                SequenceOutcome::Aborted(reason)
            }
        }
    }

    async fn run(&self, signal: &Signal) -> Result<SequenceOutcome, AbortReason> {
        let entry_side = OrderSide::from_signal(signal.side).ok_or(AbortReason::NotActionable)?;
        let stop_loss = signal.stop_loss.ok_or(AbortReason::NotActionable)?;
        let symbol = self.symbols.resolve(&signal.pair_used).to_string();

        info!(
            side = %signal.side,
            pair = %signal.pair_used,
            symbol = %symbol,
            confidence = signal.confidence,
            price_target = ?signal.price_target,
            stop_loss = %stop_loss,
            "Processing signal"
        );

        let instrument = self.instrument_info(&symbol).await?;
        let price = self.current_price(&symbol).await?;
        info!(symbol = %instrument.symbol, price = %price, "Current market price");

        // Every abort path runs before reconciliation touches the account.
        check_stop_loss(signal.side, stop_loss, price)?;
        let stop_price = instrument.round_to_tick(stop_loss);
        check_stop_loss(signal.side, stop_price, price)?;

        // Always flatten before entering; never stack on an unknown position.
        let closes = self.reconciler.close_all(&instrument.symbol).await?;

        let plan = self.build_plan(&instrument, entry_side, price, stop_price, signal.price_target, closes);

        if self.dry_run {
            info!(entry = %plan.entry, "[DRY RUN] Entry order");
            info!(stop_loss = %plan.stop_loss, "[DRY RUN] Stop-loss order");
            if let Some(tp) = &plan.take_profit {
                info!(take_profit = %tp, "[DRY RUN] Take-profit order");
            }
            info!("[DRY RUN] Orders would have been placed");
            return Ok(SequenceOutcome::Simulated(plan));
        }

        self.submit(plan).await
    }

    async fn instrument_info(&self, symbol: &str) -> Result<Instrument, AbortReason> {
        let unavailable = |detail: String| AbortReason::InstrumentUnavailable {
            symbol: symbol.to_string(),
            detail,
        };

        let instruments = self
            .exchange
            .get_instruments()
            .await
            .map_err(|e| unavailable(format!("{:#}", e)))?;

        let instrument = instruments
            .into_iter()
            .find(|i| i.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| unavailable("not listed".to_string()))?;

        if !instrument.tradeable {
            return Err(unavailable("not tradeable".to_string()));
        }

        info!(
            symbol = %instrument.symbol,
            tick_size = ?instrument.tick_size,
            contract_size = ?instrument.contract_size,
            "Instrument info"
        );
        Ok(instrument)
    }

    async fn current_price(&self, symbol: &str) -> Result<Decimal, AbortReason> {
        let unavailable = |detail: String| AbortReason::PriceUnavailable {
            symbol: symbol.to_string(),
            detail,
        };

        let tickers = self
            .exchange
            .get_tickers()
            .await
            .map_err(|e| unavailable(format!("{:#}", e)))?;

        let Some(ticker) = tickers.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol)) else {
            let available: Vec<_> = tickers.iter().take(20).map(|t| t.symbol.as_str()).collect();
            warn!(symbol = %symbol, available = ?available, "Ticker not found");
            return Err(unavailable("ticker not found".to_string()));
        };

        ticker
            .last_price()
            .ok_or_else(|| unavailable("no last price".to_string()))
    }

    fn build_plan(
        &self,
        instrument: &Instrument,
        entry_side: OrderSide,
        price: Decimal,
        stop_price: Decimal,
        price_target: Option<Decimal>,
        closes: Vec<OrderRequest>,
    ) -> OrderPlan {
        let symbol = instrument.symbol.as_str();
        let entry_price = instrument.round_to_tick(self.entry_price(entry_side, price));

        OrderPlan {
            symbol: symbol.to_string(),
            closes,
            entry: OrderRequest::entry(symbol, entry_side, self.trade_size, entry_price),
            stop_loss: OrderRequest::stop_loss(symbol, entry_side, self.trade_size, stop_price),
            take_profit: price_target.map(|target| {
                OrderRequest::take_profit(symbol, entry_side, self.trade_size, instrument.round_to_tick(target))
            }),
        }
    }

    /// Last price shifted by the configured offset: buys above, sells below.
    fn entry_price(&self, side: OrderSide, price: Decimal) -> Decimal {
        let offset = price * self.entry_offset_bps / dec!(10000);
        match side {
            OrderSide::Buy => price + offset,
            OrderSide::Sell => price - offset,
        }
    }

    async fn submit(&self, plan: OrderPlan) -> Result<SequenceOutcome, AbortReason> {
        info!(entry = %plan.entry, "Placing entry order");

        let entry = match self.exchange.send_order(&plan.entry).await {
            Ok(ack) => ack,
            Err(e) => {
                let error = format!("{:#}", e);
                error!(order = %plan.entry, error = %error, "Entry order failed");
                self.cleanup(&plan.symbol).await;
                return Err(AbortReason::EntryFailed {
                    order: plan.entry.to_string(),
                    error,
                });
            }
        };

        info!(order_id = ?entry.order_id, status = %entry.status, "Entry order submitted");

        if !entry.is_placed() {
            warn!(status = %entry.status, "Entry order was not placed, skipping stop-loss and take-profit");
            let protection = ProtectionStatus::Skipped {
                entry_status: entry.status.clone(),
            };
            return Ok(SequenceOutcome::Executed { plan, entry, protection });
        }

        let protection = match self.protect(&plan).await {
            Ok((stop_loss, take_profit)) => ProtectionStatus::Protected { stop_loss, take_profit },
            Err(error) => {
                error!(
                    symbol = %plan.symbol,
                    entry_order_id = ?entry.order_id,
                    error = %error,
                    "UNPROTECTED POSITION: entry placed but protective orders failed, manual intervention required"
                );
                let cleanup = self.cleanup(&plan.symbol).await;
                ProtectionStatus::Gap { error, cleanup }
            }
        };

        Ok(SequenceOutcome::Executed { plan, entry, protection })
    }

    /// Stop-loss, then take-profit. The first failure stops the chain.
    async fn protect(&self, plan: &OrderPlan) -> Result<(OrderAck, Option<OrderAck>), String> {
        info!(stop_loss = %plan.stop_loss, "Placing stop-loss order");
        let stop_loss = self.submit_protective(&plan.stop_loss).await?;

        let take_profit = match &plan.take_profit {
            Some(order) => {
                info!(take_profit = %order, "Placing take-profit order");
                Some(self.submit_protective(order).await?)
            }
            None => None,
        };

        Ok((stop_loss, take_profit))
    }

    async fn submit_protective(&self, order: &OrderRequest) -> Result<OrderAck, String> {
        match self.exchange.send_order(order).await {
            Ok(ack) if ack.is_placed() => {
                info!(order_id = ?ack.order_id, order = %order, "Protective order placed");
                Ok(ack)
            }
            Ok(ack) => Err(format!("[{}] not placed: status {}", order, ack.status)),
            Err(e) => Err(format!("[{}] failed: {:#}", order, e)),
        }
    }

    /// Best-effort cancel of every open order on the symbol. Always logs its result.
    async fn cleanup(&self, symbol: &str) -> Cleanup {
        info!(symbol = %symbol, "Attempting to cancel any open orders");
        match self.exchange.cancel_all_orders(symbol).await {
            Ok(status) => {
                info!(symbol = %symbol, status = %status, "Cancel result");
                Cleanup::Cancelled(status)
            }
            Err(e) => {
                let error = format!("{:#}", e);
                error!(symbol = %symbol, error = %error, "Error canceling orders");
                Cleanup::Failed(error)
            }
        }
    }
}

/// A BUY's stop must sit strictly below the price, a SELL's strictly above.
fn check_stop_loss(side: SignalSide, stop_loss: Decimal, price: Decimal) -> Result<(), AbortReason> {
    let consistent = match side {
        SignalSide::Buy => stop_loss < price,
        SignalSide::Sell => stop_loss > price,
        SignalSide::Hold => false,
    };

    if consistent {
        Ok(())
    } else {
        warn!(side = %side, stop_loss = %stop_loss, price = %price, "Stop loss on the wrong side of the market");
        Err(AbortReason::InconsistentStop { side, stop_loss, price })
    }
}
