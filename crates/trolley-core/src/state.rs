// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Shared Cart State
// ─────────────────────────────────────────────────────────────────────
//! State shared by the verifier, the monitor and the payment desk.
//!
//! # Locking
//!
//! - `scan_lock` is ownership of the scale. Scans, removals, monitor
//!   ticks and checkout all take it with `try_lock`, so a contender is
//!   rejected or skipped, never queued.
//! - `ledger` and `session` are held for short critical sections and
//!   never across a sampling window.
//! - Lock order when nesting: `scan_lock` → `ledger` → `session`.

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use trolley_types::SessionState;

use crate::ledger::CartLedger;

pub struct SharedCart {
    ledger: RwLock<CartLedger>,
    session: Mutex<SessionState>,
    scan_lock: Mutex<()>,
}

impl SharedCart {
    pub fn new(ledger: CartLedger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            session: Mutex::new(SessionState::default()),
            scan_lock: Mutex::new(()),
        }
    }

    /// Claim the scale for one scan or removal.
    ///
    /// Returns `None` if another one is in flight. While the guard lives
    /// monitoring is suspended; dropping it re-enables monitoring on
    /// every exit path, unwinding included.
    pub fn begin_scan(&self) -> Option<ScanGuard<'_>> {
        let claim = self.claim_scale()?;
        self.session.lock().monitoring_enabled = false;
        Some(ScanGuard {
            _claim: claim,
            session: &self.session,
        })
    }

    /// Claim the scale without touching the session flags.
    ///
    /// Used by monitor ticks and checkout. `None` while anyone else
    /// holds it.
    pub fn claim_scale(&self) -> Option<ScaleClaim<'_>> {
        self.scan_lock
            .try_lock()
            .map(|lock| ScaleClaim { _lock: lock })
    }

    /// Whether a scan, tick or checkout currently owns the scale.
    pub fn scan_in_flight(&self) -> bool {
        self.scan_lock.is_locked()
    }

    pub fn ledger(&self) -> RwLockReadGuard<'_, CartLedger> {
        self.ledger.read()
    }

    pub fn ledger_mut(&self) -> RwLockWriteGuard<'_, CartLedger> {
        self.ledger.write()
    }

    pub fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock()
    }

    /// Snapshot of the checkout flags.
    pub fn session_state(&self) -> SessionState {
        *self.session.lock()
    }

    /// Empty the ledger and reset every session flag.
    ///
    /// Requires the scale, so no scan is left to commit afterwards.
    pub fn clear(&self, _claim: &ScaleClaim<'_>) {
        let mut ledger = self.ledger.write();
        ledger.clear();
        self.session.lock().reset();
    }
}

/// Exclusive use of the scale. See [`SharedCart::claim_scale`].
pub struct ScaleClaim<'a> {
    _lock: MutexGuard<'a, ()>,
}

/// Scoped ownership of the scale for a scan. See [`SharedCart::begin_scan`].
pub struct ScanGuard<'a> {
    _claim: ScaleClaim<'a>,
    session: &'a Mutex<SessionState>,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.session.lock().monitoring_enabled = true;
        log::debug!("monitoring resumed");
    }
}
