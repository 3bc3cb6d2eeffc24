// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Controller
// ─────────────────────────────────────────────────────────────────────
//! Single owner of one trolley session.
//!
//! Wires the sampler, ledger, verifier, monitor and payment desk
//! together and exposes the operations the web/CLI layer calls. Each
//! returns a `TrolleyResult`; wrap it in [`trolley_types::ApiReply`] for
//! the `{ok, ...}` envelope.

use std::sync::Arc;

use rust_decimal::Decimal;

use trolley_types::{
    CartSnapshot, CustomerConfirmation, Grams, MonitorReport, PaymentRequest, ScanOutcome,
    SessionState, TrolleyConfig, TrolleyError, TrolleyResult, VerifyOutcome,
};

use crate::catalog::Catalog;
use crate::ledger::CartLedger;
use crate::monitor::BackgroundMonitor;
use crate::payment::PaymentDesk;
use crate::sensor::{WeightSampler, WeightSource};
use crate::state::SharedCart;
use crate::verifier::ScanVerifier;

pub struct SmartTrolley {
    config: TrolleyConfig,
    catalog: Arc<Catalog>,
    sampler: Arc<WeightSampler>,
    cart: SharedCart,
    verifier: ScanVerifier,
    monitor: BackgroundMonitor,
    payment: PaymentDesk,
}

impl SmartTrolley {
    pub fn new(
        config: TrolleyConfig,
        catalog: Catalog,
        source: Arc<dyn WeightSource>,
    ) -> TrolleyResult<Self> {
        config.validate()?;
        let catalog = Arc::new(catalog);
        let sampler = Arc::new(WeightSampler::new(source, config.clone()));
        let cart = SharedCart::new(CartLedger::new(Arc::clone(&catalog)));
        let verifier = ScanVerifier::new(config.clone(), Arc::clone(&catalog), Arc::clone(&sampler));
        let monitor = BackgroundMonitor::new(config.clone(), Arc::clone(&sampler));
        let payment = PaymentDesk::new(config.payment.clone(), Arc::clone(&sampler));
        log::info!("trolley ready with {} catalog items", catalog.len());

        Ok(Self {
            config,
            catalog,
            sampler,
            cart,
            verifier,
            monitor,
            payment,
        })
    }

    pub fn add_item(&self, id: &str) -> TrolleyResult<ScanOutcome> {
        let id = normalize_id(id)?;
        self.verifier.add_item(&self.cart, id)
    }

    pub fn remove_item(&self, id: &str) -> TrolleyResult<ScanOutcome> {
        let id = id.trim();
        self.verifier.remove_item(&self.cart, id)
    }

    pub fn cart_snapshot(&self) -> CartSnapshot {
        self.cart.ledger().snapshot()
    }

    pub fn cart_total(&self) -> Decimal {
        self.cart.ledger().total()
    }

    pub fn start_payment(&self) -> TrolleyResult<PaymentRequest> {
        self.payment.start_payment(&self.cart)
    }

    pub fn confirm_customer_paid(&self) -> CustomerConfirmation {
        self.payment.mark_customer_paid(&self.cart)
    }

    pub fn security_verify(&self, passkey: &str, confirm: bool) -> TrolleyResult<VerifyOutcome> {
        self.payment.security_verify(&self.cart, passkey, confirm)
    }

    pub fn monitor_tick(&self) -> MonitorReport {
        self.monitor.check(&self.cart)
    }

    pub fn clear_cart(&self) -> TrolleyResult<()> {
        self.payment.clear(&self.cart)?;
        log::info!("cart cleared");
        Ok(())
    }

    pub fn session_state(&self) -> SessionState {
        self.cart.session_state()
    }

    pub fn expected_mass(&self) -> Grams {
        self.cart.ledger().expected_mass()
    }

    pub fn last_stable_weight(&self) -> Grams {
        self.sampler.last_stable()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &TrolleyConfig {
        &self.config
    }
}

fn normalize_id(raw: &str) -> TrolleyResult<&str> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(TrolleyError::UnknownItem { id: String::new() });
    }
    Ok(id)
}
