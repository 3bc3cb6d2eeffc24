// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Scan Verifier
// ─────────────────────────────────────────────────────────────────────
//! Weight-verified add and remove flows.
//!
//! Each request claims the scale, measures a before/after window,
//! compares the observed delta with the catalog mass and either commits
//! to the ledger or rejects. Acceptance is `|delta - expected| <= margin`.
//!
//! The post-action weight is the most extreme qualifying sample in the
//! window (peak for placement, trough for removal). Any settle-detection
//! policy that honours the same tolerance contract could replace it.

use std::sync::Arc;

use trolley_types::{Grams, ScanOutcome, TrolleyConfig, TrolleyError, TrolleyResult};

use crate::catalog::Catalog;
use crate::sensor::WeightSampler;
use crate::state::SharedCart;

pub struct ScanVerifier {
    config: TrolleyConfig,
    catalog: Arc<Catalog>,
    sampler: Arc<WeightSampler>,
}

impl ScanVerifier {
    pub fn new(config: TrolleyConfig, catalog: Arc<Catalog>, sampler: Arc<WeightSampler>) -> Self {
        Self {
            config,
            catalog,
            sampler,
        }
    }

    /// Verify a placement and add one unit of `id`.
    pub fn add_item(&self, cart: &SharedCart, id: &str) -> TrolleyResult<ScanOutcome> {
        let _guard = cart.begin_scan().ok_or(TrolleyError::Processing)?;
        log::debug!("scanned item {id}");

        let entry = self
            .catalog
            .lookup(id)
            .ok_or_else(|| TrolleyError::UnknownItem { id: id.to_string() })?;
        let expected = entry.expected_mass;

        // The running baseline already reflects every accepted item.
        let before = self.sampler.last_stable();
        log::info!("place {} on the trolley (baseline {before:.2} g)", entry.name);

        let after = self
            .sampler
            .peak_above(before + self.config.rise_threshold_g, self.config.placement_window())
            .unwrap_or(before);
        let measured = (after - before).abs();
        log::debug!("weight after placing {after:.2} g, delta {measured:.2} g");

        if !self.config.within_margin(measured, expected) {
            log::warn!(
                "rejected {}: measured {measured:.1} g, expected {expected} g",
                entry.name
            );
            return Err(TrolleyError::WeightMismatch { measured, expected });
        }

        let mut ledger = cart.ledger_mut();
        let quantity = ledger.add(id, 1)?;
        let baseline = self.sampler.adjust_last_stable(expected);
        log::info!(
            "added {} ({measured:.2} g ≈ {expected} g), trolley baseline {baseline:.2} g",
            entry.name
        );

        Ok(ScanOutcome {
            message: format!("{} added successfully!", entry.name),
            id: id.to_string(),
            name: entry.name.clone(),
            quantity,
            measured,
            expected,
            total: ledger.total(),
            items: ledger.as_list(),
        })
    }

    /// Verify a removal and take one unit of `id` out of the cart.
    pub fn remove_item(&self, cart: &SharedCart, id: &str) -> TrolleyResult<ScanOutcome> {
        let _guard = cart.begin_scan().ok_or(TrolleyError::Processing)?;

        let not_in_cart = || TrolleyError::NotInCart { id: id.to_string() };
        if cart.ledger().quantity(id) == 0 {
            return Err(not_in_cart());
        }
        let entry = self.catalog.lookup(id).ok_or_else(not_in_cart)?;
        let expected = entry.expected_mass;

        let before = self.sampler.stabilize();
        log::info!("remove {} from the trolley (baseline {before:.2} g)", entry.name);

        let after = self
            .sampler
            .trough_below(before - self.config.drop_threshold_g, self.config.removal_window())
            .unwrap_or(before);
        let measured: Grams = (before - after).abs();
        log::debug!("weight after removal {after:.2} g, drop {measured:.2} g");

        if !self.config.within_margin(measured, expected) {
            log::warn!(
                "removal of {} rejected: drop {measured:.1} g, expected {expected} g",
                entry.name
            );
            return Err(TrolleyError::WeightNotDropped { measured, expected });
        }

        let mut ledger = cart.ledger_mut();
        let quantity = ledger.remove(id, 1)?;
        let baseline = self.sampler.adjust_last_stable(-expected);
        log::info!(
            "removed {} ({measured:.2} g ≈ {expected} g), trolley baseline {baseline:.2} g",
            entry.name
        );

        Ok(ScanOutcome {
            message: format!("Removed {}", entry.name),
            id: id.to_string(),
            name: entry.name.clone(),
            quantity,
            measured,
            expected,
            total: ledger.total(),
            items: ledger.as_list(),
        })
    }

    pub fn config(&self) -> &TrolleyConfig {
        &self.config
    }
}
