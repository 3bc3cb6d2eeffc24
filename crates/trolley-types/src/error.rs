// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Grams;

/// Root error type for every rejected trolley operation.
///
/// All variants are recoverable: they are reported to the caller and
/// never take the process down. Rejections leave the cart untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrolleyError {
    /// Another scan or removal is already in flight.
    #[error("another scan is being processed")]
    Processing,

    /// The identifier is not in the catalog.
    #[error("item {id} not found")]
    UnknownItem { id: String },

    /// Placement delta fell outside the tolerance around the expected mass.
    #[error("Measured: {measured:.1}g (Expected: {expected}g)")]
    WeightMismatch { measured: Grams, expected: Grams },

    /// Removal requested for an item the cart does not hold.
    #[error("item {id} is not in the cart")]
    NotInCart { id: String },

    /// Removal delta fell outside the tolerance around the expected mass.
    #[error("Drop: {measured:.1}g (Expected: {expected}g)")]
    WeightNotDropped { measured: Grams, expected: Grams },

    /// Payment requested on a cart whose total is zero.
    #[error("cart is empty")]
    EmptyCart,

    /// Security check attempted before payment was started.
    #[error("payment has not been started")]
    NoPaymentPage,

    /// Security check attempted before the customer confirmed payment.
    #[error("customer has not confirmed payment")]
    CustomerNotConfirmed,

    /// Staff passkey mismatch.
    #[error("wrong security passkey")]
    BadPasskey,

    /// Staff did not tick the confirmation flag.
    #[error("security check not confirmed")]
    NotConfirmed,

    /// A line quantity would exceed `u32::MAX`.
    #[error("quantity of {id} would overflow")]
    QuantityOverflow { id: String },

    /// Configuration rejected at construction.
    #[error("config error: {0}")]
    Config(String),

    /// Catalog rejected at load time.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl TrolleyError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Processing => ErrorKind::Processing,
            Self::UnknownItem { .. } => ErrorKind::UnknownItem,
            Self::WeightMismatch { .. } => ErrorKind::WeightMismatch,
            Self::NotInCart { .. } => ErrorKind::NotInCart,
            Self::WeightNotDropped { .. } => ErrorKind::WeightNotDropped,
            Self::EmptyCart => ErrorKind::EmptyCart,
            Self::NoPaymentPage => ErrorKind::NoPaymentPage,
            Self::CustomerNotConfirmed => ErrorKind::CustomerNotConfirmed,
            Self::BadPasskey => ErrorKind::BadPasskey,
            Self::NotConfirmed => ErrorKind::NotConfirmed,
            Self::QuantityOverflow { .. } => ErrorKind::QuantityOverflow,
            Self::Config(_) => ErrorKind::InvalidConfig,
            Self::Catalog(_) => ErrorKind::InvalidCatalog,
        }
    }
}

/// Error codes as exposed to the web/CLI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Processing,
    UnknownItem,
    WeightMismatch,
    NotInCart,
    WeightNotDropped,
    EmptyCart,
    NoPaymentPage,
    CustomerNotConfirmed,
    BadPasskey,
    NotConfirmed,
    QuantityOverflow,
    InvalidConfig,
    InvalidCatalog,
}

/// Failures of the physical weight transport.
///
/// These are absorbed by the sampler and never surface from the
/// public trolley operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// No transport attached, or the link is down.
    #[error("weight sensor unavailable")]
    Unavailable,

    /// Request/serial I/O failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Sensor answered with something that is not a finite mass.
    #[error("malformed reading: {0}")]
    Malformed(String),
}

pub type TrolleyResult<T> = Result<T, TrolleyError>;
