//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Truncate a f64 toward zero, saturating at the i64 bounds.
/// Returns `None` for non-finite values.
#[must_use]
pub fn trunc_f64_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    cast::<f64, i64>(truncated).or(Some(if truncated.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    }))
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Clamp an i64 into the i32 range.
#[must_use]
pub fn clamp_i64_to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Clamp an i64 into `lo..=hi` and convert to u32. Negative bounds collapse to 0.
#[must_use]
pub fn clamp_i64_to_u32(value: i64, lo: u32, hi: u32) -> u32 {
    let clamped = value.clamp(i64::from(lo), i64::from(hi));
    u32::try_from(clamped).unwrap_or(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trunc_rounds_toward_zero() {
        assert_eq!(trunc_f64_to_i64(12.9), Some(12));
        assert_eq!(trunc_f64_to_i64(-3.7), Some(-3));
        assert_eq!(trunc_f64_to_i64(f64::NAN), None);
        assert_eq!(trunc_f64_to_i64(f64::INFINITY), None);
        assert_eq!(trunc_f64_to_i64(1e300), Some(i64::MAX));
        assert_eq!(trunc_f64_to_i64(-1e300), Some(i64::MIN));
        assert_eq!(trunc_f64_to_i64(9.3e18), Some(i64::MAX));
    }

    #[test]
    fn clamps_cover_ranges() {
        assert_eq!(clamp_i64_to_i32(i64::MAX), i32::MAX);
        assert_eq!(clamp_i64_to_i32(i64::MIN), i32::MIN);
        assert_eq!(clamp_i64_to_i32(-5), -5);
        assert_eq!(clamp_i64_to_u32(250, 1, 100), 100);
        assert_eq!(clamp_i64_to_u32(-8, 1, 100), 1);
        assert!((i64_to_f64(7) - 7.0).abs() < f64::EPSILON);
    }
}
