// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Background Monitor
// ─────────────────────────────────────────────────────────────────────
//! Tamper detection between scans.
//!
//! Each tick compares a fresh stabilised reading with the ledger's
//! expected mass. The monitor is advisory: it reports, it never mutates
//! the ledger or the session.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use trolley_types::{AlertKind, MonitorReport, SkipReason, TrolleyConfig};

use crate::sensor::WeightSampler;
use crate::state::SharedCart;
use crate::trolley::SmartTrolley;

pub struct BackgroundMonitor {
    config: TrolleyConfig,
    sampler: Arc<WeightSampler>,
}

impl BackgroundMonitor {
    pub fn new(config: TrolleyConfig, sampler: Arc<WeightSampler>) -> Self {
        Self { config, sampler }
    }

    /// One monitoring tick.
    ///
    /// Owns the scale for the whole tick; a scan arriving meanwhile is
    /// rejected with `PROCESSING`.
    pub fn check(&self, cart: &SharedCart) -> MonitorReport {
        let Some(_claim) = cart.claim_scale() else {
            return MonitorReport::Skipped {
                reason: SkipReason::ScanActive,
            };
        };
        if !cart.session_state().monitoring_enabled {
            return MonitorReport::Skipped {
                reason: SkipReason::Disabled,
            };
        }

        let actual = self.sampler.stabilize();
        let expected = cart.ledger().expected_mass();

        if self.config.within_margin(actual, expected) {
            return MonitorReport::Ok { actual, expected };
        }
        let kind = if actual > expected {
            AlertKind::ExtraItem
        } else {
            AlertKind::MissingItem
        };
        log::error!(
            "SECURITY ALERT: {} (actual {actual:.2} g, expected {expected:.2} g)",
            kind.message()
        );
        MonitorReport::Alert {
            kind,
            actual,
            expected,
            message: kind.message().to_string(),
        }
    }
}

/// Background thread ticking the monitor on a fixed cadence.
///
/// Stops on [`MonitorHandle::stop`] or when dropped.
pub struct MonitorHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn spawn(trolley: Arc<SmartTrolley>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let join = std::thread::Builder::new()
            .name("trolley-monitor".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let report = trolley.monitor_tick();
                        log::trace!("monitor tick: {report:?}");
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        log::info!("background monitor started ({interval:?})");
        Ok(Self {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("background monitor thread panicked");
            }
            log::info!("background monitor stopped");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
