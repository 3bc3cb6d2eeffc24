// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Operation Outcomes and Replies
// ─────────────────────────────────────────────────────────────────────

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Grams, LineItem};
use crate::error::{ErrorKind, TrolleyResult};

/// Accepted scan or removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub message: String,
    pub id: String,
    pub name: String,
    /// Quantity of this item after the commit (0 once the line is gone).
    pub quantity: u32,
    /// Observed mass delta.
    pub measured: Grams,
    /// Catalog mass delta.
    pub expected: Grams,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub items: Vec<LineItem>,
}

/// Payment page payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Payment deep link embedding the total.
    pub reference: String,
    pub items: Vec<LineItem>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerConfirmation {
    pub payment_confirmed: bool,
}

/// Successful security check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Cart cleared and monitoring stopped.
    Verified { message: String },
    /// The cart was already empty: the session had already finished.
    AlreadyFinished { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A scan or removal holds the scale.
    ScanActive,
    /// Monitoring was switched off (checkout finished or cart cleared).
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Scale reads more than the cart accounts for.
    ExtraItem,
    /// Scale reads less than the cart accounts for.
    MissingItem,
}

impl AlertKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::ExtraItem => "Extra item added without scanning!",
            Self::MissingItem => "Item removed without scanning!",
        }
    }
}

/// Result of one background monitor tick. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonitorReport {
    Skipped {
        reason: SkipReason,
    },
    Ok {
        actual: Grams,
        expected: Grams,
    },
    Alert {
        kind: AlertKind,
        actual: Grams,
        expected: Grams,
        message: String,
    },
}

impl MonitorReport {
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::Alert { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Uniform `{ok, ...}` envelope handed to the web/CLI layer.
///
/// Success flattens the payload next to `ok: true`; failure carries
/// `error` (machine code) and `message` (human text).
#[derive(Debug, Clone, Serialize)]
pub struct ApiReply<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> From<TrolleyResult<T>> for ApiReply<T> {
    fn from(result: TrolleyResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
                message: None,
            },
            Err(err) => Self {
                ok: false,
                data: None,
                error: Some(err.kind()),
                message: Some(err.to_string()),
            },
        }
    }
}

impl<T: Serialize> ApiReply<T> {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            log::error!("reply serialisation failed: {e}");
            serde_json::json!({ "ok": false, "message": e.to_string() })
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::TrolleyError;

    #[test]
    fn test_reply_success_flattens_payload() {
        let request = PaymentRequest {
            total: dec!(10),
            reference: "upi://pay?am=10".into(),
            items: Vec::new(),
            message: "Scan QR to pay".into(),
        };
        let result: TrolleyResult<PaymentRequest> = Ok(request);
        let reply = ApiReply::from(result);
        let json = reply.to_json();
        assert_eq!(json["ok"], true);
        assert_eq!(json["total"].as_f64(), Some(10.0));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_reply_failure_carries_kind() {
        let reply: ApiReply<PaymentRequest> = ApiReply::from(Err(TrolleyError::EmptyCart));
        let json = reply.to_json();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "EMPTY_CART");
        assert_eq!(json["message"], "cart is empty");
    }

    #[test]
    fn test_monitor_report_tagging() {
        let report = MonitorReport::Alert {
            kind: AlertKind::ExtraItem,
            actual: 120.0,
            expected: 60.0,
            message: AlertKind::ExtraItem.message().into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "alert");
        assert_eq!(json["kind"], "extra_item");
        assert!(report.is_alert());
        assert!(!report.is_skipped());
    }
}
