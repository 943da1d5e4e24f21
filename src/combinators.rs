//! Boolean and blending operators over distance values.
//!
//! All operators are pure, allocation-free and safe to call per sample. Blend
//! radii are checked once when a field graph is validated; here a radius of
//! zero (or below) simply falls back to the hard operator.

use crate::{interp::lerp, types::Value};

#[inline]
pub fn union(a: Value, b: Value) -> Value {
    a.min(b)
}

#[inline]
pub fn intersection(a: Value, b: Value) -> Value {
    a.max(b)
}

/// Carves `b` out of `a`.
#[inline]
pub fn subtraction(a: Value, b: Value) -> Value {
    a.max(-b)
}

/// Polynomial smooth minimum with blend radius `k`.
///
/// ```text
/// h = clamp(0.5 + 0.5·(b - a)/k, 0, 1)
/// d = mix(b, a, h) - k·h·(1 - h)
/// ```
///
/// Outside the band `|a - b| < k` this is exactly `min(a, b)`; inside it the
/// result dips below both inputs by at most `k/4`.
#[inline]
pub fn smooth_union(a: Value, b: Value, k: Value) -> Value {
    if k <= 0.0 {
        return union(a, b);
    }
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    lerp(b, a, h) - k * h * (1.0 - h)
}

/// Mirrored form of [`smooth_union`]: a rounded maximum.
///
/// ```text
/// h = clamp(0.5 - 0.5·(b - a)/k, 0, 1)
/// d = mix(b, a, h) + k·h·(1 - h)
/// ```
#[inline]
pub fn smooth_intersection(a: Value, b: Value, k: Value) -> Value {
    if k <= 0.0 {
        return intersection(a, b);
    }
    let h = (0.5 - 0.5 * (b - a) / k).clamp(0.0, 1.0);
    lerp(b, a, h) + k * h * (1.0 - h)
}

/// Rounded version of [`subtraction`].
#[inline]
pub fn smooth_subtraction(a: Value, b: Value, k: Value) -> Value {
    smooth_intersection(a, -b, k)
}

/// Exponential smooth minimum; `k` is a blend radius like in [`smooth_union`].
///
/// Unlike the polynomial form this blends everywhere, never returning exactly
/// `min(a, b)`, which gives softer, more organic joins.
#[inline]
pub fn smooth_min_exponential(a: Value, b: Value, k: Value) -> Value {
    if k <= 0.0 {
        return union(a, b);
    }
    // Shift by the hard minimum so the exponentials never overflow.
    let m = a.min(b);
    let sum = (-(a - m) / k).exp() + (-(b - m) / k).exp();
    m - k * sum.ln()
}
