// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Cart Ledger
// ─────────────────────────────────────────────────────────────────────
//! Accepted line items plus the running expected trolley mass.
//!
//! Only the scan verifier mutates the ledger, and only after a
//! verification decision. Every mutation is all-or-nothing: a rejected
//! call returns before touching any field.

use std::sync::Arc;

use rust_decimal::Decimal;

use trolley_types::{clamp_mass, CartSnapshot, Grams, LineItem, TrolleyError, TrolleyResult};

use crate::catalog::Catalog;

pub struct CartLedger {
    catalog: Arc<Catalog>,
    /// Scan order.
    items: Vec<LineItem>,
    expected_mass: Grams,
}

impl CartLedger {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            items: Vec::new(),
            expected_mass: 0.0,
        }
    }

    /// Create or increment a line and grow the expected mass.
    ///
    /// Returns the new quantity.
    pub fn add(&mut self, id: &str, qty_delta: u32) -> TrolleyResult<u32> {
        let entry = self
            .catalog
            .lookup(id)
            .ok_or_else(|| TrolleyError::UnknownItem { id: id.to_string() })?;

        let quantity = match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(qty_delta)
                    .ok_or_else(|| TrolleyError::QuantityOverflow { id: id.to_string() })?;
                item.quantity
            }
            None => {
                self.items.push(LineItem {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    quantity: qty_delta,
                    unit_price: entry.unit_price,
                });
                qty_delta
            }
        };
        self.expected_mass += f64::from(qty_delta) * entry.expected_mass;

        // A zero-quantity add must not leave an empty line behind.
        if quantity == 0 {
            self.items.retain(|item| item.id != id);
        }
        Ok(quantity)
    }

    /// Decrement a line (deleting it at zero) and shrink the expected mass.
    ///
    /// Returns the remaining quantity.
    pub fn remove(&mut self, id: &str, qty_delta: u32) -> TrolleyResult<u32> {
        let not_in_cart = || TrolleyError::NotInCart { id: id.to_string() };
        let pos = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(not_in_cart)?;
        if self.items[pos].quantity < qty_delta {
            return Err(not_in_cart());
        }
        let mass = self
            .catalog
            .lookup(id)
            .map(|entry| entry.expected_mass)
            .unwrap_or(0.0);

        let remaining = self.items[pos].quantity - qty_delta;
        if remaining == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = remaining;
        }
        self.expected_mass = clamp_mass(self.expected_mass - f64::from(qty_delta) * mass);
        Ok(remaining)
    }

    pub fn quantity(&self, id: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map_or(0, |item| item.quantity)
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    pub fn as_list(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    pub fn expected_mass(&self) -> Grams {
        self.expected_mass
    }

    /// Σ quantity × catalog mass, recomputed from scratch.
    pub fn reconciled_mass(&self) -> Grams {
        self.items
            .iter()
            .map(|item| {
                let mass = self
                    .catalog
                    .lookup(&item.id)
                    .map_or(0.0, |entry| entry.expected_mass);
                f64::from(item.quantity) * mass
            })
            .sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.as_list(),
            total: self.total(),
            expected_mass: self.expected_mass,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.expected_mass = 0.0;
    }
}
