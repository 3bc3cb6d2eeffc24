// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cart::Grams;
use crate::error::{TrolleyError, TrolleyResult};

/// Runtime configuration for the trolley kernel.
///
/// Every tolerance and timing window used by the sampler, verifier
/// and monitor lives here. All masses are grams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrolleyConfig {
    /// Inclusive tolerance between measured and expected delta.
    /// Default: 20 g.
    pub margin_g: Grams,

    /// Add flow: a reading only counts once it exceeds baseline + this.
    /// Default: 5 g.
    pub rise_threshold_g: Grams,

    /// Remove flow: a reading only counts once it falls below baseline − this.
    /// Default: 5 g.
    pub drop_threshold_g: Grams,

    /// Readings whose spread stays within this band are considered settled.
    /// Default: 2 g.
    pub jitter_band_g: Grams,

    /// Settled averages closer to zero than this are reported as exactly 0.
    /// Default: 3 g.
    pub zero_snap_g: Grams,

    /// Sliding window length used while stabilising.
    /// Default: 3 readings.
    pub stable_window: usize,

    /// Readings required before convergence is evaluated.
    /// Default: 2.
    pub stable_min_readings: usize,

    /// Give up stabilising after this long and use the fallback.
    /// Default: 2500 ms.
    pub stabilize_timeout_ms: u64,

    /// Pause between stabilisation samples.
    /// Default: 100 ms.
    pub stabilize_interval_ms: u64,

    /// Add flow sampling window after prompting placement.
    /// Default: 6000 ms.
    pub placement_window_ms: u64,

    /// Remove flow sampling window after prompting removal.
    /// Default: 6000 ms.
    pub removal_window_ms: u64,

    /// Pause between samples inside placement/removal windows.
    /// Default: 250 ms.
    pub sample_interval_ms: u64,

    /// Cadence of the bundled background monitor thread.
    /// Default: 2000 ms.
    pub monitor_interval_ms: u64,

    pub payment: PaymentConfig,
}

/// Checkout settings: staff passkey and payee used in payment links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub security_passkey: String,
    pub payee_address: String,
    pub payee_name: String,
    pub currency: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            security_passkey: "1234".to_string(),
            payee_address: "smarttrolley@upi".to_string(),
            payee_name: "Smart Trolley".to_string(),
            currency: "INR".to_string(),
        }
    }
}

impl Default for TrolleyConfig {
    fn default() -> Self {
        Self {
            margin_g: 20.0,
            rise_threshold_g: 5.0,
            drop_threshold_g: 5.0,
            jitter_band_g: 2.0,
            zero_snap_g: 3.0,
            stable_window: 3,
            stable_min_readings: 2,
            stabilize_timeout_ms: 2_500,
            stabilize_interval_ms: 100,
            placement_window_ms: 6_000,
            removal_window_ms: 6_000,
            sample_interval_ms: 250,
            monitor_interval_ms: 2_000,
            payment: PaymentConfig::default(),
        }
    }
}

impl TrolleyConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> TrolleyResult<()> {
        if !(self.margin_g.is_finite() && self.margin_g > 0.0) {
            return Err(TrolleyError::Config(format!(
                "margin_g must be > 0, got {}",
                self.margin_g
            )));
        }
        for (name, value) in [
            ("rise_threshold_g", self.rise_threshold_g),
            ("drop_threshold_g", self.drop_threshold_g),
            ("jitter_band_g", self.jitter_band_g),
            ("zero_snap_g", self.zero_snap_g),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TrolleyError::Config(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        if self.stable_min_readings < 2 {
            return Err(TrolleyError::Config(format!(
                "stable_min_readings must be >= 2, got {}",
                self.stable_min_readings
            )));
        }
        if self.stable_min_readings > self.stable_window {
            return Err(TrolleyError::Config(format!(
                "stable_min_readings ({}) exceeds stable_window ({})",
                self.stable_min_readings, self.stable_window
            )));
        }
        for (name, value) in [
            ("stabilize_timeout_ms", self.stabilize_timeout_ms),
            ("placement_window_ms", self.placement_window_ms),
            ("removal_window_ms", self.removal_window_ms),
            ("monitor_interval_ms", self.monitor_interval_ms),
        ] {
            if value == 0 {
                return Err(TrolleyError::Config(format!("{name} must be > 0")));
            }
        }
        self.payment.validate()
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> TrolleyResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrolleyError::Config(format!("JSON parse error: {e}")))
    }

    pub fn stabilize_timeout(&self) -> Duration {
        Duration::from_millis(self.stabilize_timeout_ms)
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_millis(self.stabilize_interval_ms)
    }

    pub fn placement_window(&self) -> Duration {
        Duration::from_millis(self.placement_window_ms)
    }

    pub fn removal_window(&self) -> Duration {
        Duration::from_millis(self.removal_window_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Inclusive tolerance check: `|measured - expected| <= margin_g`.
    pub fn within_margin(&self, measured: Grams, expected: Grams) -> bool {
        (measured - expected).abs() <= self.margin_g
    }
}

impl PaymentConfig {
    pub fn validate(&self) -> TrolleyResult<()> {
        for (name, value) in [
            ("security_passkey", &self.security_passkey),
            ("payee_address", &self.payee_address),
            ("payee_name", &self.payee_name),
            ("currency", &self.currency),
        ] {
            if value.trim().is_empty() {
                return Err(TrolleyError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
