//! Kraken Futures REST client.
//!
//! Handles:
//! - `Authent` request signing (SHA-256 then HMAC-SHA512 with the base64 secret)
//! - Nonce generation (epoch millis + 5-digit rolling counter)
//! - Public market data and private position/order endpoints
//!
//! Idempotent GETs retry transient failures with bounded exponential backoff.
//! POSTs are single-shot: a failed order is reported, never resent.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256, Sha512};
use tracing::{debug, warn};

use crate::models::{Instrument, OrderAck, OrderRequest, Position, Ticker};

use super::error::ApiError;
use super::exchange::ExchangeApi;
use super::types::*;

type HmacSha512 = Hmac<Sha512>;

/// Production base URL.
pub const KRAKEN_FUTURES_URL: &str = "https://futures.kraken.com";

const TICKERS: &str = "/derivatives/api/v3/tickers";
const INSTRUMENTS: &str = "/derivatives/api/v3/instruments";
const OPEN_POSITIONS: &str = "/derivatives/api/v3/openpositions";
const SEND_ORDER: &str = "/derivatives/api/v3/sendorder";
const CANCEL_ALL_ORDERS: &str = "/derivatives/api/v3/cancelallorders";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BUDGET: Duration = Duration::from_secs(10);

/// Signed client for the Kraken Futures API.
pub struct KrakenClient {
    http: Client,
    base_url: String,
    api_key: String,
    secret: Vec<u8>,
    nonce_counter: AtomicU32,
}

impl KrakenClient {
    /// Create a client against `base_url` (production is [`KRAKEN_FUTURES_URL`]).
    ///
    /// # Arguments
    /// * `api_key` - Kraken Futures public API key
    /// * `api_secret` - Kraken Futures private key, base64 as issued
    pub fn with_base_url(api_key: &str, api_secret: &str, base_url: &str) -> Result<Self> {
        let secret = BASE64_STANDARD
            .decode(api_secret.trim())
            .map_err(|e| anyhow!("Kraken API secret is not valid base64: {}", e))?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("kraken-signal-trader/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            secret,
            nonce_counter: AtomicU32::new(0),
        })
    }

    /// Unique nonce: epoch milliseconds followed by a zero-padded 5-digit counter.
    fn next_nonce(&self) -> String {
        let counter = self.nonce_counter.fetch_add(1, Ordering::Relaxed) % 10_000;
        format!("{}{:05}", Utc::now().timestamp_millis(), counter)
    }

    /// Compute the `Authent` header value.
    ///
    /// Message: `post_data + nonce + path`, where `path` drops a leading `/derivatives`.
    pub fn sign(&self, endpoint: &str, nonce: &str, post_data: &str) -> Result<String, ApiError> {
        let path = endpoint.strip_prefix("/derivatives").unwrap_or(endpoint);
        let digest = Sha256::digest(format!("{}{}{}", post_data, nonce, path).as_bytes());

        let mut mac = HmacSha512::new_from_slice(&self.secret)
            .map_err(|e| ApiError::Signing(format!("invalid key length: {}", e)))?;
        mac.update(&digest);

        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn auth_headers(&self, endpoint: &str, post_data: &str) -> Result<HeaderMap, ApiError> {
        let nonce = self.next_nonce();
        let authent = self.sign(endpoint, &nonce, post_data)?;

        let value = |v: &str| HeaderValue::from_str(v).map_err(|e| ApiError::Signing(e.to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("apikey"), value(&self.api_key)?);
        headers.insert(HeaderName::from_static("nonce"), value(&nonce)?);
        headers.insert(HeaderName::from_static("authent"), value(&authent)?);
        Ok(headers)
    }

    fn retry_policy() -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(RETRY_BUDGET))
            .build()
    }

    /// GET with bounded retry on transient failures.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, authenticated: bool) -> Result<T, ApiError> {
        backoff::future::retry(Self::retry_policy(), || async {
            self.get_once(endpoint, authenticated).await.map_err(|e| {
                if e.is_transient() {
                    warn!(endpoint = %endpoint, error = %e, "Transient error, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    async fn get_once<T: DeserializeOwned>(&self, endpoint: &str, authenticated: bool) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let label = format!("GET {}", endpoint);
        debug!(url = %url, "Kraken request");

        let mut request = self.http.get(&url);
        if authenticated {
            request = request.headers(self.auth_headers(endpoint, "")?);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint: label.clone(), source })?;

        Self::read_json(label, response).await
    }

    /// Signed form POST. Never retried.
    async fn post<T: DeserializeOwned>(&self, endpoint: &str, fields: &[(&str, String)]) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let label = format!("POST {}", endpoint);

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        debug!(url = %url, body = %body, "Kraken request");

        let response = self
            .http
            .post(&url)
            .headers(self.auth_headers(endpoint, &body)?)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint: label.clone(), source })?;

        Self::read_json(label, response).await
    }

    async fn read_json<T: DeserializeOwned>(endpoint: String, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => return Err(ApiError::Transport { endpoint, source }),
        };

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        // Kraken reports failures as HTTP 200 with `"result": "error"`.
        if let Ok(envelope) = serde_json::from_str::<ResultEnvelope>(&body) {
            if envelope.is_error() {
                warn!(endpoint = %endpoint, error = ?envelope.error, "Kraken rejected request");
                return Err(ApiError::Rejected { endpoint, body });
            }
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ExchangeApi for KrakenClient {
    async fn get_tickers(&self) -> Result<Vec<Ticker>> {
        let resp: TickersResponse = self.get(TICKERS, false).await?;
        Ok(resp.tickers)
    }

    async fn get_instruments(&self) -> Result<Vec<Instrument>> {
        let resp: InstrumentsResponse = self.get(INSTRUMENTS, false).await?;
        Ok(resp.instruments)
    }

    async fn get_open_positions(&self) -> Result<Vec<Position>> {
        let resp: OpenPositionsResponse = self.get(OPEN_POSITIONS, true).await?;
        Ok(resp.open_positions)
    }

    async fn send_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let resp: SendOrderResponse = self.post(SEND_ORDER, &order.form_fields()).await?;
        let status = resp
            .send_status
            .ok_or_else(|| anyhow!("sendorder response has no sendStatus"))?;

        Ok(OrderAck {
            status: status.status,
            order_id: status.order_id,
        })
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<String> {
        let fields = [("symbol", symbol.to_string())];
        let resp: CancelAllResponse = self.post(CANCEL_ALL_ORDERS, &fields).await?;

        Ok(resp
            .cancel_status
            .map(|s| format!("{} ({} orders)", s.status, s.cancelled_orders.len()))
            .unwrap_or_else(|| "unknown".to_string()))
    }
}
