//! Kraken Futures and signal-bot API clients.

mod error;
mod exchange;
mod kraken_client;
mod signal_client;
mod types;

pub use exchange::{ExchangeApi, SignalSource};
pub use kraken_client::{KrakenClient, KRAKEN_FUTURES_URL};
pub use signal_client::SignalClient;
