//! Money arithmetic
//!
//! Records carry prices as `f64` the way the database returns them. Sums and
//! tax are computed in `Decimal` and rounded to cents only when converted back.

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Convert a stored amount to `Decimal`. Non-finite input becomes zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Sum that stops at the largest representable amount instead of panicking
pub fn sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `price × quantity`, saturating like [`sum`]
#[inline]
pub fn times(price: Decimal, quantity: i32) -> Decimal {
    price.saturating_mul(Decimal::from(quantity))
}

/// Round half away from zero to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to cents and convert for display or storage
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// Lenient amount parsing for free-form input such as the discount field.
///
/// The longest numeric prefix is used (`"5 soles"` is 5); input without one
/// is zero.
pub fn parse_amount(input: &str) -> Decimal {
    let trimmed = input.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return Decimal::ZERO;
    }

    let number = trimmed[..end].trim_end_matches('.');
    Decimal::from_str(number.trim_start_matches('+')).unwrap_or_default()
}

/// `S/ 12.50`
pub fn format_amount(value: Decimal) -> String {
    format!("S/ {:.2}", round_money(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
        assert_eq!(to_f64(Decimal::new(-1005, 3)), -1.01);
        assert_eq!(to_f64(Decimal::new(1004, 3)), 1.0);
    }

    #[test]
    fn huge_amounts_saturate() {
        let huge = to_decimal(1e28);
        assert_eq!(times(huge, 1_000_000_000), Decimal::MAX);
        assert_eq!(sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
        assert_eq!(to_f64(sum([to_decimal(1.25), to_decimal(2.5)])), 3.75);
    }

    #[test]
    fn decimal_sums_avoid_float_drift() {
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn non_finite_amounts_become_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_is_lenient() {
        assert_eq!(parse_amount("5"), Decimal::new(5, 0));
        assert_eq!(parse_amount(" 2.50 "), Decimal::new(250, 2));
        assert_eq!(parse_amount("3.5 soles"), Decimal::new(35, 1));
        assert_eq!(parse_amount("-1"), Decimal::new(-1, 0));
        assert_eq!(parse_amount("7."), Decimal::new(7, 0));
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("-"), Decimal::ZERO);
    }

    #[test]
    fn format_amount_shows_cents() {
        assert_eq!(format_amount(Decimal::new(125, 1)), "S/ 12.50");
    }
}
