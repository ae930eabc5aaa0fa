//! Recording in-memory exchange and signal source for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::api::{ExchangeApi, SignalSource};
use crate::models::{Instrument, OrderAck, OrderRequest, Position, Signal, Ticker};

pub const SYMBOL: &str = "PF_XBTUSD";

/// A call the pipeline made against the exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Tickers,
    Instruments,
    Positions,
    SendOrder(OrderRequest),
    CancelAll(String),
}

/// Scripted response to a `send_order` call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ack(OrderAck),
    Fail(String),
}

pub struct MockExchange {
    tickers: Vec<Ticker>,
    instruments: Vec<Instrument>,
    positions: Vec<Position>,
    positions_fail: bool,
    cancel_fails: bool,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl MockExchange {
    /// PF_XBTUSD trading at `price` with a 0.5 tick, no positions, every order placed.
    pub fn new(price: Decimal) -> Self {
        Self {
            tickers: vec![Ticker::new("PF_ETHUSD", dec!(3100)), Ticker::new(SYMBOL, price)],
            instruments: vec![Instrument::new(SYMBOL, dec!(0.5), dec!(1))],
            positions: Vec::new(),
            positions_fail: false,
            cancel_fails: false,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tickers(mut self, tickers: Vec<Ticker>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn with_instruments(mut self, instruments: Vec<Instrument>) -> Self {
        self.instruments = instruments;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    pub fn failing_positions(mut self) -> Self {
        self.positions_fail = true;
        self
    }

    pub fn failing_cancel(mut self) -> Self {
        self.cancel_fails = true;
        self
    }

    /// Replies consumed in order by `send_order`; once exhausted every order is placed.
    pub fn with_replies(self, replies: Vec<Reply>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendOrder(order) => Some(order),
                _ => None,
            })
            .collect()
    }

    /// Calls that would change exchange state.
    pub fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::SendOrder(_) | Call::CancelAll(_)))
            .count()
    }

    pub fn cancellations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CancelAll(symbol) => Some(symbol),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    async fn get_tickers(&self) -> Result<Vec<Ticker>> {
        self.record(Call::Tickers);
        Ok(self.tickers.clone())
    }

    async fn get_instruments(&self) -> Result<Vec<Instrument>> {
        self.record(Call::Instruments);
        Ok(self.instruments.clone())
    }

    async fn get_open_positions(&self) -> Result<Vec<Position>> {
        self.record(Call::Positions);
        if self.positions_fail {
            return Err(anyhow!("GET /derivatives/api/v3/openpositions: HTTP 500 - internal error"));
        }
        Ok(self.positions.clone())
    }

    async fn send_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        self.record(Call::SendOrder(order.clone()));
        let count = self.orders().len();
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Ack(ack)) => Ok(ack),
            Some(Reply::Fail(msg)) => Err(anyhow!(msg)),
            None => Ok(OrderAck::placed(format!("order-{}", count))),
        }
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<String> {
        self.record(Call::CancelAll(symbol.to_string()));
        if self.cancel_fails {
            return Err(anyhow!("POST /derivatives/api/v3/cancelallorders: request failed"));
        }
        Ok("cancelled".to_string())
    }
}

/// Signal source returning a fixed answer.
pub struct FixedSignal {
    signal: Option<Signal>,
    fail: bool,
}

impl FixedSignal {
    pub fn some(signal: Signal) -> Self {
        Self { signal: Some(signal), fail: false }
    }

    pub fn none() -> Self {
        Self { signal: None, fail: false }
    }

    pub fn failing() -> Self {
        Self { signal: None, fail: true }
    }
}

#[async_trait]
impl SignalSource for FixedSignal {
    async fn fetch_signal(&self) -> Result<Option<Signal>> {
        if self.fail {
            return Err(anyhow!("GET http://signals.local: request failed: connection refused"));
        }
        Ok(self.signal.clone())
    }
}
