// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Payment / Security Session
// ─────────────────────────────────────────────────────────────────────
//! Checkout gate: payment started → customer confirmed → security
//! verified → cart cleared. Independent of the weight logic apart from
//! reading ledger totals and resetting the fallback weight on clear.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::Decimal;

use trolley_types::{
    CustomerConfirmation, PaymentConfig, PaymentRequest, TrolleyError, TrolleyResult,
    VerifyOutcome,
};

use crate::sensor::WeightSampler;
use crate::state::{ScaleClaim, SharedCart};

pub struct PaymentDesk {
    config: PaymentConfig,
    sampler: Arc<WeightSampler>,
}

impl PaymentDesk {
    pub fn new(config: PaymentConfig, sampler: Arc<WeightSampler>) -> Self {
        Self { config, sampler }
    }

    /// Open the payment page for the current cart.
    pub fn start_payment(&self, cart: &SharedCart) -> TrolleyResult<PaymentRequest> {
        let (total, items) = {
            let ledger = cart.ledger();
            (ledger.total(), ledger.as_list())
        };
        if total <= Decimal::ZERO {
            return Err(TrolleyError::EmptyCart);
        }

        {
            let mut session = cart.session();
            session.payment_started = true;
            session.customer_confirmed = false;
        }
        let reference = self.payment_reference(total);
        log::info!("payment started for {total} {}", self.config.currency);

        Ok(PaymentRequest {
            total,
            reference,
            items,
            message: "Scan QR to pay".to_string(),
        })
    }

    /// Customer says they paid. Deliberately ungated.
    pub fn mark_customer_paid(&self, cart: &SharedCart) -> CustomerConfirmation {
        cart.session().customer_confirmed = true;
        log::info!("customer confirmed payment");
        CustomerConfirmation {
            payment_confirmed: true,
        }
    }

    /// Staff check that releases the trolley.
    pub fn security_verify(
        &self,
        cart: &SharedCart,
        passkey: &str,
        confirm: bool,
    ) -> TrolleyResult<VerifyOutcome> {
        let claim = cart.claim_scale().ok_or(TrolleyError::Processing)?;
        let state = cart.session_state();
        if !state.payment_started {
            return Err(TrolleyError::NoPaymentPage);
        }
        if cart.ledger().is_empty() {
            cart.session().monitoring_enabled = false;
            return Ok(VerifyOutcome::AlreadyFinished {
                message: "Cart already empty. Session finished.".to_string(),
            });
        }
        if !state.customer_confirmed {
            return Err(TrolleyError::CustomerNotConfirmed);
        }
        if passkey != self.config.security_passkey {
            log::warn!("security check failed: wrong passkey");
            return Err(TrolleyError::BadPasskey);
        }
        if !confirm {
            return Err(TrolleyError::NotConfirmed);
        }

        self.clear_claimed(cart, &claim);
        log::info!("payment verified, cart cleared");
        Ok(VerifyOutcome::Verified {
            message: "Payment verified. Cart cleared!".to_string(),
        })
    }

    /// Empty the cart, forget the fallback weight, reset every flag.
    ///
    /// Fails with `PROCESSING` while a scan or tick owns the scale.
    pub fn clear(&self, cart: &SharedCart) -> TrolleyResult<()> {
        let claim = cart.claim_scale().ok_or(TrolleyError::Processing)?;
        self.clear_claimed(cart, &claim);
        Ok(())
    }

    fn clear_claimed(&self, cart: &SharedCart, claim: &ScaleClaim<'_>) {
        cart.clear(claim);
        self.sampler.reset_fallback();
    }

    /// UPI deep link embedding the amount due.
    pub fn payment_reference(&self, total: Decimal) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu={}",
            self.config.payee_address,
            encode_component(&self.config.payee_name),
            total.normalize(),
            self.config.currency
        )
    }
}

/// RFC 3986 unreserved characters pass through.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::Catalog;
    use crate::ledger::CartLedger;
    use crate::sensor::tests::fast_config;
    use crate::sensor::DetachedSource;
    use trolley_types::CatalogEntry;

    fn setup() -> (PaymentDesk, SharedCart, Arc<WeightSampler>) {
        let catalog =
            Catalog::from_entries([CatalogEntry::new("A", "Vim Bar", dec!(10), 60.0)]).unwrap();
        let sampler = Arc::new(WeightSampler::new(Arc::new(DetachedSource), fast_config()));
        let desk = PaymentDesk::new(fast_config().payment, sampler.clone());
        let cart = SharedCart::new(CartLedger::new(Arc::new(catalog)));
        (desk, cart, sampler)
    }

    fn stocked() -> (PaymentDesk, SharedCart, Arc<WeightSampler>) {
        let (desk, cart, sampler) = setup();
        cart.ledger_mut().add("A", 1).unwrap();
        sampler.adjust_last_stable(60.0);
        (desk, cart, sampler)
    }

    #[test]
    fn test_start_payment_empty_cart() {
        let (desk, cart, _) = setup();
        assert_eq!(desk.start_payment(&cart).unwrap_err(), TrolleyError::EmptyCart);
        assert!(!cart.session_state().payment_started);
    }

    #[test]
    fn test_start_payment_builds_reference() {
        let (desk, cart, _) = stocked();
        cart.session().customer_confirmed = true;
        let request = desk.start_payment(&cart).unwrap();
        assert_eq!(request.total, dec!(10));
        assert_eq!(
            request.reference,
            "upi://pay?pa=smarttrolley@upi&pn=Smart%20Trolley&am=10&cu=INR"
        );
        assert_eq!(request.items.len(), 1);
        let state = cart.session_state();
        assert!(state.payment_started);
        assert!(!state.customer_confirmed);
    }

    #[test]
    fn test_reference_normalises_amount() {
        let (desk, _, _) = setup();
        assert!(desk.payment_reference(dec!(20.50)).contains("am=20.5&"));
    }

    #[test]
    fn test_mark_paid_ungated() {
        let (desk, cart, _) = setup();
        let confirmation = desk.mark_customer_paid(&cart);
        assert!(confirmation.payment_confirmed);
        assert!(cart.session_state().customer_confirmed);
    }

    #[test]
    fn test_verify_requires_payment_page() {
        let (desk, cart, _) = stocked();
        assert_eq!(
            desk.security_verify(&cart, "1234", true).unwrap_err(),
            TrolleyError::NoPaymentPage
        );
    }

    #[test]
    fn test_verify_gates_in_order() {
        let (desk, cart, _) = stocked();
        desk.start_payment(&cart).unwrap();
        assert_eq!(
            desk.security_verify(&cart, "1234", true).unwrap_err(),
            TrolleyError::CustomerNotConfirmed
        );
        desk.mark_customer_paid(&cart);
        assert_eq!(
            desk.security_verify(&cart, "0000", true).unwrap_err(),
            TrolleyError::BadPasskey
        );
        assert_eq!(
            desk.security_verify(&cart, "1234", false).unwrap_err(),
            TrolleyError::NotConfirmed
        );
        assert_eq!(cart.ledger().len(), 1);
    }

    #[test]
    fn test_verify_clears_cart() {
        let (desk, cart, sampler) = stocked();
        desk.start_payment(&cart).unwrap();
        desk.mark_customer_paid(&cart);
        let outcome = desk.security_verify(&cart, "1234", true).unwrap();
        assert!(matches!(outcome, VerifyOutcome::Verified { .. }));
        assert!(cart.ledger().is_empty());
        assert_eq!(cart.ledger().total(), Decimal::ZERO);
        assert_eq!(sampler.last_stable(), 0.0);
        let state = cart.session_state();
        assert!(!state.payment_started);
        assert!(!state.customer_confirmed);
        assert!(!state.monitoring_enabled);
    }

    #[test]
    fn test_verify_empty_cart_short_circuits() {
        let (desk, cart, _) = stocked();
        desk.start_payment(&cart).unwrap();
        cart.ledger_mut().clear();
        let outcome = desk.security_verify(&cart, "wrong", false).unwrap();
        assert!(matches!(outcome, VerifyOutcome::AlreadyFinished { .. }));
        assert!(!cart.session_state().monitoring_enabled);
    }

    #[test]
    fn test_verify_and_clear_wait_for_scan() {
        let (desk, cart, _) = stocked();
        desk.start_payment(&cart).unwrap();
        desk.mark_customer_paid(&cart);
        let guard = cart.begin_scan().unwrap();
        assert_eq!(
            desk.security_verify(&cart, "1234", true).unwrap_err(),
            TrolleyError::Processing
        );
        assert_eq!(desk.clear(&cart).unwrap_err(), TrolleyError::Processing);
        assert_eq!(cart.ledger().len(), 1);
        drop(guard);
        assert!(desk.security_verify(&cart, "1234", true).is_ok());
        assert!(cart.ledger().is_empty());
    }

    #[test]
    fn test_clear_resets_fallback() {
        let (desk, cart, sampler) = stocked();
        desk.clear(&cart).unwrap();
        assert!(cart.ledger().is_empty());
        assert_eq!(sampler.last_stable(), 0.0);
        assert!(!cart.session_state().monitoring_enabled);
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("Anna's Store"), "Anna%27s%20Store");
        assert_eq!(encode_component("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_component("Café"), "Caf%C3%A9");
    }
}
