//! Numeric conversion helpers centralizing the float-to-integer casts used by
//! telemetry fields.

use num_traits::cast::cast;

/// Round to the nearest integer, clamped to the i32 range; NaN maps to 0.
#[must_use]
pub fn round_to_i32(value: f64) -> i32 {
    saturate_i32(value.round())
}

/// Truncate toward zero, clamped to the i32 range; NaN maps to 0.
#[must_use]
pub fn trunc_to_i32(value: f64) -> i32 {
    saturate_i32(value.trunc())
}

/// Floor-divide, clamped to the i64 range; non-finite input maps to 0.
#[must_use]
pub fn floor_div_to_i64(value: f64, divisor: f64) -> i64 {
    let quotient = (value / divisor).floor();
    if !quotient.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(quotient.clamp(min, max)).unwrap_or(0)
}

fn saturate_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    cast::<f64, i32>(clamped).unwrap_or(0)
}
