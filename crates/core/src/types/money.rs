//! Money formatting helpers.
//!
//! All monetary amounts flow through [`rust_decimal::Decimal`] so that
//! `499.5` renders as `499.50` and never as `499.5` or `499.49999`.
//! Floats are deliberately absent from this module.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with exactly two decimal places.
///
/// This is the single rendering rule for order totals, cart totals, and
/// line prices. Rounding is half-away-from-zero, then the result is padded
/// to two fractional digits.
///
/// ```rust
/// # use rust_decimal::Decimal;
/// # use tamarind_core::format_amount;
/// assert_eq!(format_amount(Decimal::new(4995, 1)), "499.50");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Total for one line: unit price times quantity.
///
/// Saturates instead of overflowing; a cart large enough to saturate a
/// 96-bit decimal is not a cart we need to price accurately.
#[must_use]
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price.saturating_mul(Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_two_decimals() {
        assert_eq!(format_amount(Decimal::new(4995, 1)), "499.50");
        assert_eq!(format_amount(Decimal::new(1299, 0)), "1299.00");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_amount(Decimal::new(10_005, 3)), "10.01");
        assert_eq!(format_amount(Decimal::new(10_004, 3)), "10.00");
    }

    #[test]
    fn line_total_multiplies_exactly() {
        let price = Decimal::new(1999, 2); // 19.99
        assert_eq!(line_total(price, 3), Decimal::new(5997, 2));
        assert_eq!(line_total(price, 0), Decimal::ZERO);
    }
}
