//! Bot runner: one trading cycle per tick.
//!
//! Handles:
//! - Fetching the latest signal
//! - Evaluating it against the confidence policy
//! - Handing accepted signals to the order sequencer
//! - Scheduling, manual triggers and the single-slot run lock

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::{ExchangeApi, SignalSource};
use crate::trading::{
    OrderSequencer, ProtectionStatus, Rejection, SequenceOutcome, SignalEvaluator, SymbolMap,
    TradingConfig,
};

/// What a single cycle ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Source answered but had no valid signal
    NoSignal,
    /// Source could not be reached or returned garbage
    SignalUnavailable(String),
    Rejected(Rejection),
    Sequenced(SequenceOutcome),
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleOutcome::NoSignal => write!(f, "no signal"),
            CycleOutcome::SignalUnavailable(e) => write!(f, "signal unavailable: {}", e),
            CycleOutcome::Rejected(r) => write!(f, "rejected: {}", r),
            CycleOutcome::Sequenced(SequenceOutcome::Aborted(reason)) => write!(f, "aborted: {}", reason),
            CycleOutcome::Sequenced(SequenceOutcome::Simulated(plan)) => {
                write!(f, "simulated: {}", plan.entry)
            }
            CycleOutcome::Sequenced(SequenceOutcome::Executed { entry, protection, .. }) => {
                match protection {
                    ProtectionStatus::Protected { .. } => {
                        write!(f, "executed: entry {:?} protected", entry.order_id)
                    }
                    ProtectionStatus::Skipped { entry_status } => {
                        write!(f, "entry not placed ({})", entry_status)
                    }
                    ProtectionStatus::Gap { error, .. } => {
                        write!(f, "UNPROTECTED: entry {:?} placed, {}", entry.order_id, error)
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    cycles: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
    aborted: AtomicU64,
    simulated: AtomicU64,
    executed: AtomicU64,
    unprotected: AtomicU64,
}

/// Signal-driven trading bot.
pub struct TradingBot {
    signals: Arc<dyn SignalSource>,
    evaluator: SignalEvaluator,
    sequencer: OrderSequencer,
    dry_run: bool,

    /// One cycle at a time, scheduled or manual
    run_lock: Mutex<()>,
    counters: Counters,

    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl TradingBot {
    pub fn new(
        signals: Arc<dyn SignalSource>,
        exchange: Arc<dyn ExchangeApi>,
        symbols: Arc<SymbolMap>,
        config: &TradingConfig,
    ) -> Self {
        Self {
            signals,
            evaluator: SignalEvaluator::new(config.min_confidence),
            sequencer: OrderSequencer::new(exchange, symbols, config),
            dry_run: config.dry_run,
            run_lock: Mutex::new(()),
            counters: Counters::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Scheduled entry point. Skips (returns `None`) while another cycle holds the lock.
    pub async fn run_cycle(&self) -> Option<CycleOutcome> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("Previous trading cycle still running, skipping this tick");
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        Some(self.cycle().await)
    }

    /// Manual entry point. Errors instead of waiting when a cycle is in flight.
    pub async fn trigger(&self) -> Result<CycleOutcome> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            bail!("a trading cycle is already running");
        };
        info!("Manual trading cycle triggered");
        Ok(self.cycle().await)
    }

    /// Main run loop: a cycle per tick until Ctrl+C.
    pub async fn run(&self, period: Duration) -> Result<()> {
        info!(
            dry_run = self.dry_run,
            interval_secs = period.as_secs(),
            "Starting bot run loop"
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Register shutdown handler
        let shutdown = self.shutdown.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
            wake.notify_one();
        });

        while !self.shutdown.load(Ordering::SeqCst) {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            self.run_cycle().await;
        }

        info!("Bot shutdown complete");
        Ok(())
    }

    /// Run the stages once. Every failure ends up as an outcome, never a panic or error.
    async fn cycle(&self) -> CycleOutcome {
        let span = info_span!("cycle", cycle_id = %Uuid::new_v4());
        async {
            let started = Utc::now();
            info!(started_at = %started.to_rfc3339(), dry_run = self.dry_run, "=== Starting trading cycle ===");

            let outcome = self.stages().await;
            self.record(&outcome);

            let elapsed_ms = (Utc::now() - started).num_milliseconds();
            info!(elapsed_ms = elapsed_ms, outcome = %outcome, "=== Trading cycle complete ===");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn stages(&self) -> CycleOutcome {
        let signal = match self.signals.fetch_signal().await {
            Ok(Some(signal)) => signal,
            Ok(None) => {
                info!("No valid signal available");
                return CycleOutcome::NoSignal;
            }
            Err(e) => {
                let error = format!("{:#}", e);
                error!(error = %error, "Failed to fetch signal");
                return CycleOutcome::SignalUnavailable(error);
            }
        };

        if !self.evaluator.should_execute(&signal) {
            // `evaluate` is pure, so this is the verdict the gate just logged
            let rejection = self.evaluator.evaluate(&signal).err().unwrap_or(Rejection::Hold);
            return CycleOutcome::Rejected(rejection);
        }

        CycleOutcome::Sequenced(self.sequencer.execute(&signal).await)
    }

    fn record(&self, outcome: &CycleOutcome) {
        let c = &self.counters;
        c.cycles.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            CycleOutcome::NoSignal | CycleOutcome::SignalUnavailable(_) => return,
            CycleOutcome::Rejected(_) => &c.rejected,
            CycleOutcome::Sequenced(SequenceOutcome::Aborted(_)) => &c.aborted,
            CycleOutcome::Sequenced(SequenceOutcome::Simulated(_)) => &c.simulated,
            CycleOutcome::Sequenced(SequenceOutcome::Executed { protection, .. }) => {
                if matches!(protection, ProtectionStatus::Gap { .. }) {
                    c.unprotected.fetch_add(1, Ordering::Relaxed);
                }
                &c.executed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current stats.
    pub fn get_stats(&self) -> BotStats {
        let c = &self.counters;
        BotStats {
            cycles: c.cycles.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            aborted: c.aborted.load(Ordering::Relaxed),
            simulated: c.simulated.load(Ordering::Relaxed),
            executed: c.executed.load(Ordering::Relaxed),
            unprotected: c.unprotected.load(Ordering::Relaxed),
            is_running: !self.shutdown.load(Ordering::SeqCst),
            dry_run: self.dry_run,
        }
    }
}

/// Bot statistics.
#[derive(Debug, Clone)]
pub struct BotStats {
    pub cycles: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub aborted: u64,
    pub simulated: u64,
    pub executed: u64,
    pub unprotected: u64,
    pub is_running: bool,
    pub dry_run: bool,
}

impl std::fmt::Display for BotStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Bot Statistics ===")?;
        writeln!(f, "Cycles Run:      {} (Skipped: {})", self.cycles, self.skipped)?;
        writeln!(f, "Rejected:        {}", self.rejected)?;
        writeln!(f, "Aborted:         {}", self.aborted)?;
        writeln!(f, "Simulated:       {}", self.simulated)?;
        writeln!(f, "Executed:        {} (Unprotected: {})", self.executed, self.unprotected)?;
        writeln!(f, "Status:          {} {}",
            if self.is_running { "Running" } else { "Stopped" },
            if self.dry_run { "(Dry Run)" } else { "" })?;
        Ok(())
    }
}
