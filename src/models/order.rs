//! Order requests sent to Kraken Futures and their acknowledgements.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PositionSide, SignalSide};

/// Status Kraken reports for an accepted order.
pub const STATUS_PLACED: &str = "placed";

/// Order type as understood by the `sendorder` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "mkt")]
    Market,
    #[serde(rename = "lmt")]
    Limit,
    #[serde(rename = "stp")]
    Stop,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "mkt",
            OrderType::Limit => "lmt",
            OrderType::Stop => "stp",
        }
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Entry side for a signal. `None` for HOLD.
    pub fn from_signal(side: SignalSide) -> Option<Self> {
        match side {
            SignalSide::Buy => Some(OrderSide::Buy),
            SignalSide::Sell => Some(OrderSide::Sell),
            SignalSide::Hold => None,
        }
    }

    /// Side that flattens a position.
    pub fn closing(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        }
    }
}

/// A single order submission. Built per cycle and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_type: OrderType,
    pub symbol: String,
    pub side: OrderSide,
    pub size: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Market, reduce-only order flattening an existing position.
    pub fn close(symbol: &str, side: OrderSide, size: Decimal) -> Self {
        Self {
            order_type: OrderType::Market,
            symbol: symbol.to_string(),
            side,
            size,
            limit_price: None,
            stop_price: None,
            reduce_only: true,
        }
    }

    /// Limit order opening a position.
    pub fn entry(symbol: &str, side: OrderSide, size: Decimal, limit_price: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit,
            symbol: symbol.to_string(),
            side,
            size,
            limit_price: Some(limit_price),
            stop_price: None,
            reduce_only: false,
        }
    }

    /// Reduce-only stop protecting a position opened on `entry_side`.
    pub fn stop_loss(symbol: &str, entry_side: OrderSide, size: Decimal, stop_price: Decimal) -> Self {
        Self {
            order_type: OrderType::Stop,
            symbol: symbol.to_string(),
            side: entry_side.opposite(),
            size,
            limit_price: None,
            stop_price: Some(stop_price),
            reduce_only: true,
        }
    }

    /// Reduce-only limit taking profit on a position opened on `entry_side`.
    pub fn take_profit(symbol: &str, entry_side: OrderSide, size: Decimal, limit_price: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit,
            symbol: symbol.to_string(),
            side: entry_side.opposite(),
            size,
            limit_price: Some(limit_price),
            stop_price: None,
            reduce_only: true,
        }
    }

    /// Form fields in the order `sendorder` expects them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("orderType", self.order_type.as_str().to_string()),
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("size", self.size.normalize().to_string()),
        ];
        if let Some(price) = self.limit_price {
            fields.push(("limitPrice", price.normalize().to_string()));
        }
        if let Some(price) = self.stop_price {
            fields.push(("stopPrice", price.normalize().to_string()));
        }
        fields.push(("reduceOnly", self.reduce_only.to_string()));
        fields
    }
}

impl std::fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.order_type.as_str(), self.side.as_str(), self.size, self.symbol)?;
        if let Some(price) = self.limit_price {
            write!(f, " limit={}", price)?;
        }
        if let Some(price) = self.stop_price {
            write!(f, " stop={}", price)?;
        }
        if self.reduce_only {
            write!(f, " reduce-only")?;
        }
        Ok(())
    }
}

/// Exchange acknowledgement for a submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub status: String,
    pub order_id: Option<String>,
}

impl OrderAck {
    #[cfg(test)]
    pub fn placed(order_id: impl Into<String>) -> Self {
        Self {
            status: STATUS_PLACED.to_string(),
            order_id: Some(order_id.into()),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.status == STATUS_PLACED
    }
}
