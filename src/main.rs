//! Kraken Futures Signal Trader
//!
//! Polls an external signal bot and turns confident BUY/SELL signals into
//! bracketed Kraken Futures orders: entry, stop-loss and take-profit.

mod api;
mod bot;
mod models;
mod trading;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::{KrakenClient, SignalClient, KRAKEN_FUTURES_URL};
use crate::bot::TradingBot;
use crate::trading::{parse_symbol_overrides, SymbolMap, TradingConfig};

/// Kraken Futures signal trader CLI.
#[derive(Parser)]
#[command(name = "sigtrader")]
#[command(about = "Trade Kraken Futures from an external signal bot", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Kraken Futures API key
    #[arg(long, env = "KRAKEN_API_KEY", hide_env_values = true)]
    kraken_api_key: Option<String>,

    /// Kraken Futures API secret (base64)
    #[arg(long, env = "KRAKEN_API_SECRET", hide_env_values = true)]
    kraken_api_secret: Option<String>,

    /// Kraken Futures base URL
    #[arg(long, env = "KRAKEN_BASE_URL", default_value = KRAKEN_FUTURES_URL)]
    kraken_base_url: String,

    /// Signal bot endpoint
    #[arg(long, env = "SIGNAL_BOT_URL")]
    signal_url: Option<String>,

    /// Default exchange symbol for unmapped pairs
    #[arg(long, env = "TRADING_SYMBOL", default_value = "PF_XBTUSD")]
    symbol: String,

    /// Order size in contracts
    #[arg(long, env = "TRADE_SIZE", default_value = "0.001")]
    trade_size: Decimal,

    /// Upper bound for the trade size
    #[arg(long, env = "MAX_POSITION_SIZE", default_value = "0.01")]
    max_position_size: Decimal,

    /// Dry run unless explicitly "false"
    #[arg(long, env = "DRY_RUN", default_value = "true", value_parser = parse_dry_run, action = clap::ArgAction::Set)]
    dry_run: bool,

    /// Minimum signal confidence (0-1)
    #[arg(long, env = "MIN_CONFIDENCE", default_value = "0.65")]
    min_confidence: f64,

    /// Minutes between cycles (0 disables scheduling)
    #[arg(long, env = "POLL_INTERVAL_MINUTES", default_value = "15")]
    poll_interval_minutes: u64,

    /// Entry limit offset from last price in basis points
    #[arg(long, env = "ENTRY_OFFSET_BPS", default_value = "0")]
    entry_offset_bps: Decimal,

    /// Extra pair mappings, PAIR=SYMBOL,PAIR=SYMBOL
    #[arg(long, env = "SYMBOL_MAP", default_value = "")]
    symbol_map: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduled trading loop
    Run,

    /// Run a single trading cycle now
    Execute,

    /// Show current configuration
    Config,
}

/// Anything but "false" keeps dry run on.
fn parse_dry_run(value: &str) -> Result<bool, String> {
    Ok(!value.trim().eq_ignore_ascii_case("false"))
}

impl Cli {
    fn trading_config(&self) -> TradingConfig {
        TradingConfig {
            symbol: self.symbol.clone(),
            trade_size: self.trade_size,
            max_position_size: self.max_position_size,
            dry_run: self.dry_run,
            min_confidence: self.min_confidence,
            entry_offset_bps: self.entry_offset_bps,
            poll_interval_minutes: self.poll_interval_minutes,
        }
    }

    fn build_bot(&self, config: &TradingConfig, symbols: Arc<SymbolMap>) -> Result<TradingBot> {
        let (Some(key), Some(secret)) = (&self.kraken_api_key, &self.kraken_api_secret) else {
            bail!("KRAKEN_API_KEY and KRAKEN_API_SECRET must be set");
        };
        let signal_url = self
            .signal_url
            .as_deref()
            .context("SIGNAL_BOT_URL must be set")?;

        let exchange = KrakenClient::with_base_url(key, secret, &self.kraken_base_url)
            .context("Failed to create Kraken client")?;
        let signals = SignalClient::new(signal_url).context("Failed to create signal client")?;

        Ok(TradingBot::new(Arc::new(signals), Arc::new(exchange), symbols, config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = cli.trading_config();
    config.validate().context("Invalid trading configuration")?;

    let overrides = parse_symbol_overrides(&cli.symbol_map).context("Invalid SYMBOL_MAP")?;
    let symbols = Arc::new(SymbolMap::new(&config.symbol, &overrides));

    match cli.command {
        Commands::Run => {
            if config.poll_interval_minutes == 0 {
                bail!("scheduling is disabled (POLL_INTERVAL_MINUTES=0); use 'sigtrader execute'");
            }

            let bot = cli.build_bot(&config, symbols)?;

            info!(
                symbol = %config.symbol,
                trade_size = %config.trade_size,
                interval_minutes = config.poll_interval_minutes,
                dry_run = config.dry_run,
                "Starting signal trader"
            );

            println!("\n=== Kraken Futures Signal Trader ===");
            println!("Symbol:           {}", config.symbol);
            println!("Trade size:       {}", config.trade_size);
            println!("Polling interval: {}m", config.poll_interval_minutes);
            println!("Mode: {}", if config.dry_run { "DRY RUN (no real trades)" } else { "LIVE TRADING" });
            println!("\nPress Ctrl+C to stop.\n");

            if let Err(e) = bot.run(Duration::from_secs(config.poll_interval_minutes * 60)).await {
                tracing::error!(error = %e, "Bot error");
            }

            // Show final stats
            println!("\n{}", bot.get_stats());
        }

        Commands::Execute => {
            let bot = cli.build_bot(&config, symbols)?;
            let outcome = bot.trigger().await?;
            println!("\nCycle outcome: {}", outcome);
        }

        Commands::Config => {
            let configured = |v: &Option<String>| if v.is_some() { "configured" } else { "missing" };

            println!("\n=== Trading Configuration ===\n");
            println!("Exchange:");
            println!("  Base URL:             {}", cli.kraken_base_url);
            println!("  API Key:              {}", configured(&cli.kraken_api_key));
            println!("  API Secret:           {}", configured(&cli.kraken_api_secret));

            println!("\nSignal Source:");
            println!("  URL:                  {}", cli.signal_url.as_deref().unwrap_or("missing"));
            println!("  Min Confidence:       {}", config.min_confidence);

            println!("\nOrders:");
            println!("  Default Symbol:       {}", config.symbol);
            println!("  Trade Size:           {}", config.trade_size);
            println!("  Max Position Size:    {}", config.max_position_size);
            println!("  Entry Offset:         {} bps", config.entry_offset_bps);
            println!("  Dry Run:              {}", config.dry_run);

            println!("\nScheduling:");
            if config.poll_interval_minutes == 0 {
                println!("  Interval:             disabled");
            } else {
                println!("  Interval:             {}m", config.poll_interval_minutes);
            }

            println!("\nSymbol Map:");
            for (pair, symbol) in symbols.entries() {
                println!("  {:<22}{}", pair, symbol);
            }
            println!("  {:<22}{}", "(default)", symbols.default_symbol());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_parsing() {
        assert_eq!(parse_dry_run("false"), Ok(false));
        assert_eq!(parse_dry_run("FALSE"), Ok(false));
        assert_eq!(parse_dry_run("true"), Ok(true));
        assert_eq!(parse_dry_run("0"), Ok(true));
        assert_eq!(parse_dry_run(""), Ok(true));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["sigtrader", "config"]).unwrap();
        assert!(cli.trading_config().validate().is_ok());
    }
}
