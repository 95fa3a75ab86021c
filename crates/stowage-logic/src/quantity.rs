//! Boundary checks for caller-supplied quantities.
//!
//! Every public entry point that accepts an `f64` runs it through
//! [`check_amount`] before touching any ledger. Negative or non-finite
//! values are programmer faults, not shortfalls.

use crate::constants::AMOUNT_EPSILON;
use crate::error::QuantityError;

/// Accept a finite, non-negative quantity.
pub fn check_amount(value: f64) -> Result<f64, QuantityError> {
    if !value.is_finite() {
        return Err(QuantityError::NonFinite(value));
    }
    if value < 0.0 {
        return Err(QuantityError::Negative(value));
    }
    Ok(value)
}

/// Whole units an effort budget pays for. Fractions are dropped.
pub fn whole_units(budget: f64) -> u32 {
    if budget <= 0.0 {
        0
    } else if budget >= u32::MAX as f64 {
        u32::MAX
    } else {
        budget.floor() as u32
    }
}

/// Treat anything within [`AMOUNT_EPSILON`] of zero as zero.
pub fn is_negligible(value: f64) -> bool {
    value.abs() <= AMOUNT_EPSILON
}

/// `a - b`, floored at zero and snapped to zero when negligible.
pub fn positive_difference(a: f64, b: f64) -> f64 {
    let d = a - b;
    if d <= AMOUNT_EPSILON {
        0.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_amount_accepts_zero_and_positive() {
        assert_eq!(check_amount(0.0), Ok(0.0));
        assert_eq!(check_amount(12.5), Ok(12.5));
    }

    #[test]
    fn test_check_amount_rejects_negative() {
        assert_eq!(check_amount(-0.1), Err(QuantityError::Negative(-0.1)));
    }

    #[test]
    fn test_check_amount_rejects_non_finite() {
        assert!(matches!(
            check_amount(f64::NAN),
            Err(QuantityError::NonFinite(_))
        ));
        assert!(matches!(
            check_amount(f64::INFINITY),
            Err(QuantityError::NonFinite(_))
        ));
    }

    #[test]
    fn test_whole_units_rounds_down() {
        assert_eq!(whole_units(0.0), 0);
        assert_eq!(whole_units(0.99), 0);
        assert_eq!(whole_units(1.0), 1);
        assert_eq!(whole_units(3.7), 3);
        assert_eq!(whole_units(1e12), u32::MAX);
    }

    #[test]
    fn test_positive_difference() {
        assert_eq!(positive_difference(10.0, 4.0), 6.0);
        assert_eq!(positive_difference(4.0, 10.0), 0.0);
        assert_eq!(positive_difference(1.0, 1.0 - 1e-12), 0.0);
        assert!(is_negligible(1e-12));
        assert!(!is_negligible(1e-3));
    }
}
