//! Monetary amount helpers
//!
//! All balances and transfer amounts are `rust_decimal::Decimal` with two
//! fractional digits. All rounding MUST go through this module so the
//! policy (round half to even) is applied in exactly one place.
//!
//! Binary floating point is never used for money.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits carried by every monetary value.
pub const SCALE: u32 = 2;

/// Round a decimal to [`SCALE`] digits, half-to-even.
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointNearestEven)
}

/// True if the value carries no more than [`SCALE`] fractional digits.
///
/// Trailing zeros do not count: `1.500` is representable, `1.505` is not.
pub fn is_representable(value: Decimal) -> bool {
    value.scale() <= SCALE || value.normalize().scale() <= SCALE
}

/// True if the value is a valid transfer amount: strictly positive and
/// representable at [`SCALE`] digits.
pub fn is_valid_amount(value: Decimal) -> bool {
    value > Decimal::ZERO && is_representable(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round(dec!(1.005)), dec!(1.00));
        assert_eq!(round(dec!(1.015)), dec!(1.02));
        assert_eq!(round(dec!(1.025)), dec!(1.02));
        assert_eq!(round(dec!(-1.005)), dec!(-1.00));
    }

    #[test]
    fn test_round_is_stable_at_scale() {
        assert_eq!(round(dec!(300.00)), dec!(300.00));
        assert_eq!(round(dec!(0.1)), dec!(0.10));
    }

    #[test]
    fn test_is_representable() {
        assert!(is_representable(dec!(100)));
        assert!(is_representable(dec!(100.25)));
        assert!(is_representable(dec!(1.500))); // trailing zero
        assert!(!is_representable(dec!(1.505)));
        assert!(!is_representable(dec!(0.001)));
    }

    #[test]
    fn test_is_valid_amount() {
        assert!(is_valid_amount(dec!(0.01)));
        assert!(is_valid_amount(dec!(300.00)));
        assert!(!is_valid_amount(dec!(0)));
        assert!(!is_valid_amount(dec!(-5.00)));
        assert!(!is_valid_amount(dec!(0.005)));
    }
}
