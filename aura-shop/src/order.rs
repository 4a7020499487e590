//! Order identifiers and the frozen post-checkout summary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::CartItem;
use crate::payment::{ConfirmationId, PaymentSummary};
use crate::shipping::ShippingInfo;

/// Checkout-session order identifier, e.g. `AA-MBXTT0QZ`.
///
/// Base-36 uppercase encoding of a millisecond timestamp. Generated once per
/// session and stable across re-reads; also serves as the bank-transfer
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate from the current wall clock.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_millis(Utc::now().timestamp_millis().unsigned_abs())
    }

    /// Deterministic construction for tests and replays.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self(format!("AA-{}", encode_base36(millis)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        let idx = usize::try_from(value % 36).unwrap_or(0);
        digits.push(BASE36[idx]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Record frozen at the moment an order is placed.
///
/// Captures the pre-clear item snapshot and the totals that produced the
/// charge; later cart or form mutations cannot change it. Serializable as the
/// payload a future `POST /orders` integration would send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_number: OrderNumber,
    pub shipping: ShippingInfo,
    pub payment: PaymentSummary,
    /// Line items captured before the cart was cleared.
    pub items: Vec<CartItem>,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_cost: i64,
    pub order_total: i64,
    pub confirmation: ConfirmationId,
}
