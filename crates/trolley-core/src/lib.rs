// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Cart Kernel
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Weight-verified cart state machine for a self-checkout trolley.
//!
//! Every scan or removal is cross-checked against the trolley scale
//! before the cart changes; a background monitor watches for items
//! slipped in or out between scans; a small payment session gates
//! checkout.
//!
//! # Invariants
//!
//! 1. **Reconciliation**: whenever no scan is in flight,
//!    `expected_mass == Σ quantity × catalog mass` over the ledger.
//!    The ledger is mutated once per accepted request, atomically.
//!
//! 2. **Rejections are inert**: a rejected scan, removal or payment
//!    step leaves the ledger exactly as it was.
//!
//! 3. **One scan at a time**: scans and removals contend for a single
//!    guard taken with `try_lock`; losers get `PROCESSING`. The guard
//!    re-enables monitoring on drop, so no exit path can leave the
//!    monitor suspended.
//!
//! 4. **Monitor is advisory**: ticks skip while a scan holds the scale
//!    and never write to the ledger or session.
//!
//! 5. **Sensor faults are absorbed**: transport errors degrade to the
//!    last stable weight; they never surface as an error kind.

pub mod catalog;
pub mod ledger;
pub mod monitor;
pub mod payment;
pub mod sensor;
pub mod state;
pub mod trolley;
pub mod verifier;

pub use catalog::Catalog;
pub use ledger::CartLedger;
pub use monitor::{BackgroundMonitor, MonitorHandle};
pub use payment::PaymentDesk;
pub use sensor::{DetachedSource, ExternalSource, ScriptedSource, WeightSampler, WeightSource};
pub use state::{ScanGuard, SharedCart};
pub use trolley::SmartTrolley;
pub use verifier::ScanVerifier;
