//! Payment form state, validity guards, input formatters, and the gateway
//! capability the checkout flow charges through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported tender types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    MobileMoney,
    BankTransfer,
}

/// Payment form state across all tender types; only the fields belonging to
/// the selected method are consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub card_name: String,
    /// Display-formatted card number ("1234 5678 9012 3456").
    #[serde(default)]
    pub card_number: String,
    /// `MM/YY`.
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub momo_number: String,
}

impl PaymentInfo {
    /// Card guard: named holder, exactly 16 digits once spaces are stripped,
    /// `MM/YY` expiry shape, and a CVV of at least three digits.
    #[must_use]
    pub fn card_valid(&self) -> bool {
        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        !self.card_name.trim().is_empty()
            && digits.len() == 16
            && digits.chars().all(|c| c.is_ascii_digit())
            && expiry_shape_valid(&self.expiry)
            && self.cvv.len() >= 3
            && self.cvv.chars().all(|c| c.is_ascii_digit())
    }

    /// Mobile-money guard: a phone-like entry of at least ten characters.
    #[must_use]
    pub fn momo_valid(&self) -> bool {
        self.momo_number.trim().len() >= 10
    }

    /// Whether the selected tender has everything submission needs. Advisory
    /// for the UI's button state, mandatory before an order is placed.
    #[must_use]
    pub fn ready(&self) -> bool {
        match self.method {
            PaymentMethod::Card => self.card_valid(),
            PaymentMethod::MobileMoney => self.momo_valid(),
            PaymentMethod::BankTransfer => true,
        }
    }

    /// Last four card digits for receipts.
    #[must_use]
    pub fn card_last4(&self) -> String {
        let digits: String = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let cut = digits.len().saturating_sub(4);
        digits[cut..].to_string()
    }
}

fn expiry_shape_valid(expiry: &str) -> bool {
    let bytes = expiry.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'/'
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit()
}

/// Keep digits only, truncate to 16, and group in blocks of four separated by
/// single spaces.
#[must_use]
pub fn format_card_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(16).collect();
    let mut grouped = String::with_capacity(19);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && idx % 4 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

/// Keep digits only, truncate to four, and insert `/` after the second digit.
#[must_use]
pub fn format_expiry(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(4).collect();
    if digits.len() < 2 {
        return digits;
    }
    format!("{}/{}", &digits[..2], &digits[2..])
}

/// Keep digits only, truncated to the four-digit Amex maximum.
#[must_use]
pub fn format_cvv(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(4).collect()
}

/// Receipt-safe description of how an order was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum PaymentSummary {
    Card { last4: String },
    MobileMoney { number: String },
    BankTransfer { reference: String },
}

/// Static transfer instructions shown for the bank tender; the per-order
/// reference is the order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BankTransferDetails {
    pub bank: &'static str,
    pub account_name: &'static str,
    pub account_number: &'static str,
    pub branch: &'static str,
}

/// Ankara Aura settlement account.
pub const BANK_TRANSFER_DETAILS: BankTransferDetails = BankTransferDetails {
    bank: "GCB Bank Ltd",
    account_name: "Ankara Aura Ltd",
    account_number: "1234567890",
    branch: "Accra Central",
};

/// Opaque gateway confirmation for a settled charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(pub String);

/// A charge the gateway refused.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("payment declined: {reason}")]
pub struct PaymentDeclined {
    pub reason: String,
}

impl PaymentDeclined {
    #[must_use]
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

/// Capability for settling an order total.
///
/// The checkout flow depends only on this trait: production wires a real
/// gateway adapter, demos and tests inject [`DemoProcessor`] or a declining
/// double. Timing (the storefront's simulated processing delay) belongs to
/// the embedding layer, never to the flow.
pub trait PaymentProcessor {
    /// Attempt to charge `amount` (whole GH₵) against the entered tender.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentDeclined`] when the gateway refuses the charge.
    fn charge(&self, payment: &PaymentInfo, amount: i64)
    -> Result<ConfirmationId, PaymentDeclined>;
}

/// Simulated gateway that approves every charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoProcessor;

impl PaymentProcessor for DemoProcessor {
    fn charge(
        &self,
        payment: &PaymentInfo,
        amount: i64,
    ) -> Result<ConfirmationId, PaymentDeclined> {
        let tag = match payment.method {
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "momo",
            PaymentMethod::BankTransfer => "bank",
        };
        Ok(ConfirmationId(format!("SIM-{tag}-{amount}")))
    }
}
