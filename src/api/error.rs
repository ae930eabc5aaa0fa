//! Transport errors shared by the HTTP clients.

use thiserror::Error;

/// Failure talking to a remote HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("{endpoint}: HTTP {status} - {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// HTTP 200 but the API reported `"result": "error"`.
    #[error("{endpoint}: rejected - {body}")]
    Rejected { endpoint: String, body: String },

    /// Response body did not match the expected shape.
    #[error("{endpoint}: could not parse response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request could not be signed (bad secret, bad header value).
    #[error("request signing failed: {0}")]
    Signing(String),
}

impl ApiError {
    /// Worth retrying for an idempotent request.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
