//! # Rounding Rules
//!
//! Every rounding tier used by the estimator lives here as a named function.
//! Scaling by a reciprocal (`x / 0.2`) drifts in binary floating point, so
//! fractional increments are expressed as a number of divisions per unit
//! and multiply first, then divide.
//!
//! ## Example
//!
//! ```rust
//! use hailnet_core::rounding::{net_length_for_row, net_width_for_spacing};
//!
//! assert_eq!(net_width_for_spacing(3.0), 3.6);
//! assert_eq!(net_length_for_row(100.0), 115.0);
//! ```

use crate::catalog::advanced::{ANCHOR_MARGIN_M, NET_LENGTH_STEP_M, NET_WIDTH_DIVISIONS_PER_M};

/// Round `value` up to the next `1 / divisions` increment.
///
/// `ceil_to_fraction(3.4641, 5.0)` rounds up to the next 0.2 → `3.6`.
pub fn ceil_to_fraction(value: f64, divisions: f64) -> f64 {
    (value * divisions).ceil() / divisions
}

/// Round `value` up to the next whole multiple of `multiple`.
pub fn ceil_to_multiple(value: f64, multiple: f64) -> f64 {
    (value / multiple).ceil() * multiple
}

/// Round a real-valued quantity up to a whole count.
///
/// The float-to-integer cast saturates: negative values and NaN become 0,
/// +Infinity becomes `u64::MAX`.
pub fn ceil_count(value: f64) -> u64 {
    value.ceil() as u64
}

/// Snap `value` to the nearest entry of `options`.
///
/// Options are scanned in order and a later option only replaces the current
/// pick when it is strictly closer, so ties go to the option seen first (the
/// lower one for an ascending list). NaN never compares closer and therefore
/// yields the first option. An empty option list returns `value` unchanged.
pub fn snap_to_nearest(value: f64, options: &[f64]) -> f64 {
    let mut iter = options.iter().copied();
    let Some(first) = iter.next() else {
        return value;
    };
    iter.fold(first, |best, candidate| {
        if (candidate - value).abs() < (best - value).abs() {
            candidate
        } else {
            best
        }
    })
}

/// Net width for a row spacing: `2 × spacing / √3`, rounded up to 0.2 m.
pub fn net_width_for_spacing(row_spacing_m: f64) -> f64 {
    let raw = 2.0 * row_spacing_m / 3f64.sqrt();
    ceil_to_fraction(raw, NET_WIDTH_DIVISIONS_PER_M)
}

/// Net length for a row: row length plus the anchoring margin, rounded up to 5 m.
pub fn net_length_for_row(row_length_m: f64) -> f64 {
    ceil_to_multiple(row_length_m + ANCHOR_MARGIN_M, NET_LENGTH_STEP_M)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_to_fraction() {
        assert_eq!(ceil_to_fraction(4.14, 5.0), 4.2);
        assert_eq!(ceil_to_fraction(4.21, 5.0), 4.4);
        assert_eq!(ceil_to_fraction(4.0, 5.0), 4.0);
    }

    #[test]
    fn test_ceil_to_multiple() {
        assert_eq!(ceil_to_multiple(115.0, 5.0), 115.0);
        assert_eq!(ceil_to_multiple(116.0, 5.0), 120.0);
        assert_eq!(ceil_to_multiple(0.1, 5.0), 5.0);
    }

    #[test]
    fn test_ceil_count() {
        assert_eq!(ceil_count(7500.0), 7500);
        assert_eq!(ceil_count(7500.0001), 7501);
        assert_eq!(ceil_count(-3.0), 0);
        assert_eq!(ceil_count(f64::NAN), 0);
        assert_eq!(ceil_count(f64::INFINITY), u64::MAX);
    }

    #[test]
    fn test_net_width_for_spacing() {
        // 2 × 3 / √3 = 3.4641 → ×5 = 17.32 → 18 → 3.6
        assert_eq!(net_width_for_spacing(3.0), 3.6);
        // 2 × 4 / √3 = 4.6188 → 4.8
        assert_eq!(net_width_for_spacing(4.0), 4.8);
    }

    #[test]
    fn test_net_length_for_row() {
        assert_eq!(net_length_for_row(100.0), 115.0);
        assert_eq!(net_length_for_row(101.0), 120.0);
        assert_eq!(net_length_for_row(1.0), 20.0);
    }

    #[test]
    fn test_snap_to_nearest() {
        let options = [5.0, 10.0, 20.0, 50.0, 100.0];
        assert_eq!(snap_to_nearest(7.0, &options), 5.0);
        assert_eq!(snap_to_nearest(8.0, &options), 10.0);
        // Equidistant from 10 and 20: the first one scanned wins
        assert_eq!(snap_to_nearest(15.0, &options), 10.0);
        assert_eq!(snap_to_nearest(75.0, &options), 50.0);
        assert_eq!(snap_to_nearest(1000.0, &options), 100.0);
        assert_eq!(snap_to_nearest(f64::NAN, &options), 5.0);
        assert_eq!(snap_to_nearest(42.0, &[]), 42.0);
    }
}
