//! Decimal truncation used by every convergence test in the crate.

/// Number of decimal digits an iterate is rounded to before comparison.
pub type Precision = u32;

/// Rounds `value` to `precision` fractional decimal digits.
///
/// Uses scale-round-unscale with round-half-away-from-zero ([`f64::round`]).
/// Non-finite inputs are returned unchanged so callers can detect them.
pub fn round_to(value: f64, precision: Precision) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }

    #[test]
    fn rounding_is_idempotent() {
        let samples = [
            0.1,
            -1.302_345_6,
            21.575_087_660_063_37,
            1e-9,
            123_456.789_012,
            std::f64::consts::PI,
        ];
        for value in samples {
            for precision in 0..=12 {
                let once = round_to(value, precision);
                assert_eq!(round_to(once, precision), once, "{value} at {precision}");
            }
        }
    }

    #[test]
    fn non_finite_values_pass_through() {
        assert!(round_to(f64::NAN, 3).is_nan());
        assert_eq!(round_to(f64::INFINITY, 3), f64::INFINITY);
    }
}
