// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Cart Data Model
// ─────────────────────────────────────────────────────────────────────

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mass in grams.
pub type Grams = f64;

/// Floor a running mass at zero, mapping NaN to zero.
///
/// Absorbs floating-point drift when expected masses are subtracted.
#[inline]
pub fn clamp_mass(value: Grams) -> Grams {
    if value.is_nan() {
        log::warn!("clamp_mass: NaN detected, clamping to 0");
        return 0.0;
    }
    value.max(0.0)
}

/// Reference data for one sellable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Mass the scale should gain when one unit is placed.
    pub expected_mass: Grams,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        expected_mass: Grams,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            expected_mass,
        }
    }
}

/// One accepted product line in the cart. `quantity` is always > 0
/// while the line is held by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Read-only view of the cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub expected_mass: Grams,
}

/// Checkout flags shared by the verifier, monitor and payment desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub payment_started: bool,
    pub customer_confirmed: bool,
    pub monitoring_enabled: bool,
}

impl Default for SessionState {
    /// Fresh trolley: monitoring on, no payment in progress.
    fn default() -> Self {
        Self {
            payment_started: false,
            customer_confirmed: false,
            monitoring_enabled: true,
        }
    }
}

impl SessionState {
    /// All flags off. Applied whenever the cart is cleared.
    pub fn reset(&mut self) {
        *self = Self {
            payment_started: false,
            customer_confirmed: false,
            monitoring_enabled: false,
        };
    }
}
