//! Market data models: tickers and instrument specifications.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ticker entry from the `tickers` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,

    /// Last traded price. Missing for instruments that have not traded.
    #[serde(default)]
    pub last: Option<Decimal>,

    #[serde(default)]
    pub mark_price: Option<Decimal>,

    #[serde(default)]
    pub bid: Option<Decimal>,

    #[serde(default)]
    pub ask: Option<Decimal>,
}

impl Ticker {
    #[cfg(test)]
    pub fn new(symbol: impl Into<String>, last: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            last: Some(last),
            mark_price: None,
            bid: None,
            ask: None,
        }
    }

    /// Last price if it is usable for pricing an order.
    pub fn last_price(&self) -> Option<Decimal> {
        self.last.filter(|p| *p > Decimal::ZERO)
    }
}

/// Instrument specification from the `instruments` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,

    #[serde(default)]
    pub tick_size: Option<Decimal>,

    /// Contract value (Kraken calls it `contractSize` on perpetuals)
    #[serde(default, alias = "contractValue")]
    pub contract_size: Option<Decimal>,

    #[serde(default = "default_tradeable")]
    pub tradeable: bool,
}

fn default_tradeable() -> bool {
    true
}

impl Instrument {
    #[cfg(test)]
    pub fn new(symbol: impl Into<String>, tick_size: Decimal, contract_size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size: Some(tick_size),
            contract_size: Some(contract_size),
            tradeable: true,
        }
    }

    /// Round a price to the nearest valid tick. Prices pass through unchanged
    /// when the instrument does not publish a tick size.
    pub fn round_to_tick(&self, price: Decimal) -> Decimal {
        match self.tick_size {
            Some(tick) if tick > Decimal::ZERO => ((price / tick).round() * tick).normalize(),
            _ => price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_to_tick() {
        let inst = Instrument::new("PF_XBTUSD", dec!(0.5), dec!(1));
        assert_eq!(inst.round_to_tick(dec!(65000.26)), dec!(65000.5));
        assert_eq!(inst.round_to_tick(dec!(65000.2)), dec!(65000));
        assert_eq!(inst.round_to_tick(dec!(64000)), dec!(64000));

        let no_tick = Instrument {
            tick_size: None,
            ..inst
        };
        assert_eq!(no_tick.round_to_tick(dec!(65000.26)), dec!(65000.26));
    }

    #[test]
    fn test_parse_instrument() {
        let json = r#"{"symbol":"PF_ETHUSD","type":"flexible_futures","tickSize":0.1,"contractSize":1,"tradeable":false}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.tick_size, Some(dec!(0.1)));
        assert_eq!(inst.contract_size, Some(dec!(1)));
        assert!(!inst.tradeable);

        let json = r#"{"symbol":"PI_XBTUSD","tickSize":0.5,"contractValue":1}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.contract_size, Some(dec!(1)));
        assert!(inst.tradeable);
    }

    #[test]
    fn test_ticker_without_last_price() {
        let ticker: Ticker = serde_json::from_str(r#"{"symbol":"FI_XBTUSD_240628"}"#).unwrap();
        assert_eq!(ticker.last_price(), None);
        assert_eq!(Ticker::new("PF_XBTUSD", dec!(65000)).last_price(), Some(dec!(65000)));
    }
}
