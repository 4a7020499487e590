//! Shipping details and delivery method surcharges.

use serde::{Deserialize, Serialize};

/// Delivery method with a flat additive fee in whole GH₵.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    /// Flat surcharge determined solely by the method, never by cart contents.
    #[must_use]
    pub const fn surcharge(self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Express => 50,
            Self::Overnight => 120,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard Delivery",
            Self::Express => "Express Delivery",
            Self::Overnight => "Overnight Delivery",
        }
    }

    /// Customer-facing delivery window shown on the method picker and the
    /// confirmation screen.
    #[must_use]
    pub const fn delivery_estimate(self) -> &'static str {
        match self {
            Self::Standard => "5–7 business days",
            Self::Express => "2–3 business days",
            Self::Overnight => "Next business day",
        }
    }
}

/// Shipping form state. Phone and region are optional extras; the
/// required-field guard covers everything else the wizard needs before
/// advancing past the Shipping step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
    pub method: ShippingMethod,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            region: String::new(),
            country: "Ghana".to_string(),
            method: ShippingMethod::Standard,
        }
    }
}

impl ShippingInfo {
    /// First name, last name, email, address, and city must all carry visible
    /// characters before the wizard may advance past Shipping.
    #[must_use]
    pub fn required_fields_present(&self) -> bool {
        !(self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.address.trim().is_empty()
            || self.city.trim().is_empty())
    }
}
