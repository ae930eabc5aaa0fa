//! Wire types for the Kraken Futures REST API and the signal bot.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{Instrument, Position, Signal, SignalSide, Ticker};

/// Every Kraken Futures response carries `result`; errors also carry `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn is_error(&self) -> bool {
        self.result.as_deref() == Some("error")
    }
}

/// Response from `GET /derivatives/api/v3/tickers`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickersResponse {
    #[serde(default)]
    pub tickers: Vec<Ticker>,
}

/// Response from `GET /derivatives/api/v3/instruments`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentsResponse {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

/// Response from `GET /derivatives/api/v3/openpositions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionsResponse {
    #[serde(default)]
    pub open_positions: Vec<Position>,
}

/// Response from `POST /derivatives/api/v3/sendorder`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOrderResponse {
    pub send_status: Option<SendStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendStatus {
    #[serde(default, alias = "orderId")]
    pub order_id: Option<String>,
    pub status: String,
}

/// Response from `POST /derivatives/api/v3/cancelallorders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllResponse {
    pub cancel_status: Option<CancelStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelStatus {
    pub status: String,
    #[serde(default)]
    pub cancelled_orders: Vec<serde_json::Value>,
}

/// Payload served by the signal bot.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SignalData>,
    #[serde(default)]
    pub pair_used: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalData {
    pub signal: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub price_target: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
}

impl SignalEnvelope {
    /// Convert into a domain signal. `None` when the bot reported no signal.
    pub fn into_signal(self) -> Option<Signal> {
        if !self.success {
            return None;
        }
        let data = self.data?;
        Some(Signal::new(
            SignalSide::parse(&data.signal),
            data.confidence,
            data.price_target,
            data.stop_loss,
            self.pair_used.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signal_envelope_success() {
        let json = r#"{
            "success": true,
            "data": {"signal": "BUY", "confidence": 0.8, "price_target": 70000, "stop_loss": 64000.5},
            "pair_used": "XXBTZUSD"
        }"#;
        let env: SignalEnvelope = serde_json::from_str(json).unwrap();
        let signal = env.into_signal().unwrap();

        assert_eq!(signal.side, SignalSide::Buy);
        assert_eq!(signal.confidence, 0.8);
        assert_eq!(signal.price_target, Some(dec!(70000)));
        assert_eq!(signal.stop_loss, Some(dec!(64000.5)));
        assert_eq!(signal.pair_used, "XXBTZUSD");
    }

    #[test]
    fn test_signal_envelope_unsuccessful() {
        let json = r#"{"success": false, "error": "model warming up"}"#;
        let env: SignalEnvelope = serde_json::from_str(json).unwrap();
        assert!(env.into_signal().is_none());
    }

    #[test]
    fn test_signal_envelope_hold_with_null_levels() {
        let json = r#"{
            "success": true,
            "data": {"signal": "HOLD", "confidence": 0.4, "price_target": null, "stop_loss": null},
            "pair_used": "XETHZUSD"
        }"#;
        let signal = serde_json::from_str::<SignalEnvelope>(json)
            .unwrap()
            .into_signal()
            .unwrap();
        assert_eq!(signal.side, SignalSide::Hold);
        assert!(!signal.has_levels());
    }

    #[test]
    fn test_send_order_response() {
        let json = r#"{
            "result": "success",
            "sendStatus": {"order_id": "c18f0c17-9971-40e6-8e5b-10df05d422f0", "status": "placed", "receivedTime": "2024-05-01T10:00:00.000Z"},
            "serverTime": "2024-05-01T10:00:00.000Z"
        }"#;
        let resp: SendOrderResponse = serde_json::from_str(json).unwrap();
        let status = resp.send_status.unwrap();
        assert_eq!(status.status, "placed");
        assert_eq!(status.order_id.as_deref(), Some("c18f0c17-9971-40e6-8e5b-10df05d422f0"));
    }

    #[test]
    fn test_error_envelope() {
        let env: ResultEnvelope =
            serde_json::from_str(r#"{"result":"error","error":"apiLimitExceeded"}"#).unwrap();
        assert!(env.is_error());
        assert_eq!(env.error.as_deref(), Some("apiLimitExceeded"));

        let ok: ResultEnvelope = serde_json::from_str(r#"{"result":"success","tickers":[]}"#).unwrap();
        assert!(!ok.is_error());
    }
}
