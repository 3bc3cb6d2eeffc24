// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! smart trolley kernel: the weight-verified self-checkout cart.

pub mod cart;
pub mod config;
pub mod error;
pub mod outcome;

pub use cart::{clamp_mass, CartSnapshot, CatalogEntry, Grams, LineItem, SessionState};
pub use config::{PaymentConfig, TrolleyConfig};
pub use error::{ErrorKind, SensorError, TrolleyError, TrolleyResult};
pub use outcome::{
    AlertKind, ApiReply, CustomerConfirmation, MonitorReport, PaymentRequest, ScanOutcome,
    SkipReason, VerifyOutcome,
};
