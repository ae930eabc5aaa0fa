//! HTTP client for the external signal bot.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::models::Signal;

use super::error::ApiError;
use super::exchange::SignalSource;
use super::types::SignalEnvelope;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BUDGET: Duration = Duration::from_secs(10);

/// Fetches the latest signal from the signal bot's HTTP endpoint.
pub struct SignalClient {
    client: Client,
    url: String,
}

impl SignalClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn fetch_once(&self) -> Result<SignalEnvelope, ApiError> {
        let endpoint = format!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl SignalSource for SignalClient {
    async fn fetch_signal(&self) -> Result<Option<Signal>> {
        debug!(url = %self.url, "Fetching trading signal");

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(RETRY_BUDGET))
            .build();

        let envelope = backoff::future::retry(policy, || async {
            self.fetch_once().await.map_err(|e| {
                if e.is_transient() {
                    warn!(error = %e, "Signal fetch failed, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
        .context("Failed to fetch signal")?;

        match envelope.into_signal() {
            Some(signal) => {
                info!(
                    side = %signal.side,
                    confidence = signal.confidence,
                    price_target = ?signal.price_target,
                    stop_loss = ?signal.stop_loss,
                    pair = %signal.pair_used,
                    "Signal received"
                );
                Ok(Some(signal))
            }
            None => {
                info!("Signal source reported no valid signal");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::SignalSide;

    #[tokio::test]
    async fn test_fetch_signal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/signal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"signal": "SELL", "confidence": 0.8, "price_target": 60000, "stop_loss": 66000},
                "pair_used": "XBTUSD"
            })))
            .mount(&server)
            .await;

        let client = SignalClient::new(&format!("{}/signal", server.uri())).unwrap();
        let signal = client.fetch_signal().await.unwrap().unwrap();
        assert_eq!(signal.side, SignalSide::Sell);
        assert_eq!(signal.stop_loss, Some(dec!(66000)));
    }

    #[tokio::test]
    async fn test_unsuccessful_payload_is_no_signal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})))
            .mount(&server)
            .await;

        let client = SignalClient::new(&server.uri()).unwrap();
        assert!(client.fetch_signal().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such route"))
            .expect(1)
            .mount(&server)
            .await;

        let client = SignalClient::new(&server.uri()).unwrap();
        let err = client.fetch_signal().await.unwrap_err();
        assert!(format!("{:#}", err).contains("404"));
    }
}
