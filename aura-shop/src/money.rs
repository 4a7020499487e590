//! Integer currency helpers centralizing GH₵ arithmetic and display.
//!
//! Amounts are whole cedis stored as `i64`; keeping every derivation in
//! integer math means totals can be recomputed from line items at any time
//! without drift.

/// Flat ten-percent promotional discount, floored to a whole currency unit.
#[must_use]
pub const fn ten_percent_floor(amount: i64) -> i64 {
    amount / 10
}

/// Group an amount's digits in threes, e.g. `1234567` -> `"1,234,567"`.
#[must_use]
pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Storefront display string for an amount, e.g. `GH₵ 1,950`.
#[must_use]
pub fn format_ghs(amount: i64) -> String {
    format!("GH₵ {}", group_thousands(amount))
}
