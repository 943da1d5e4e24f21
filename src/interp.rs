use crate::types::{Value, Vector};

// Linear interpolation, `mix` in shading-language terms
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

#[inline]
pub fn clamp01(x: Value) -> Value {
    x.clamp(0.0, 1.0)
}

/// Hermite step between `edge0` and `edge1`.
///
/// Equal edges behave like a hard step at `edge0` instead of dividing by zero.
#[inline]
pub fn smoothstep(edge0: Value, edge1: Value, x: Value) -> Value {
    let span = edge1 - edge0;
    if span == 0.0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp01((x - edge0) / span);
    t * t * (3.0 - 2.0 * t)
}

// Fractional part, always in [0, 1) (unlike `f32::fract`, which keeps the sign)
#[inline]
pub fn fract(x: Value) -> Value {
    x - x.floor()
}

// Component-wise linear interpolation between two vectors
#[inline]
pub fn lerp3(a: Vector, b: Vector, t: Value) -> Vector {
    a + (b - a) * t
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn should_keep_fract_positive_for_negative_input() {
        assert_abs_diff_eq!(fract(-0.25), 0.75);
        assert_abs_diff_eq!(fract(2.5), 0.5);
    }

    #[test]
    fn should_smoothstep_saturate_outside_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn should_treat_equal_edges_as_hard_step() {
        assert_eq!(smoothstep(1.0, 1.0, 0.999), 0.0);
        assert_eq!(smoothstep(1.0, 1.0, 1.0), 1.0);
    }
}
