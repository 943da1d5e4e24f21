//! Distance functions for simple shapes.
//!
//! All primitives take a point relative to the shape's own origin and return
//! an (approximately) signed distance: negative inside, positive outside.

use crate::{
    interp::smoothstep,
    noise::Fbm,
    types::{Value, Vector, Vector2D},
};

/// Exact distance to a sphere of radius `r` centred on the origin.
///
/// ```text
/// sphere(p, r) = |p| - r
/// ```
#[inline]
pub fn sphere(p: &Vector, r: Value) -> Value {
    p.norm() - r
}

/// Exact distance to a box with the given half extents and rounded edges.
///
/// `radius` is subtracted from the box, so the outer dimensions stay at
/// `half_extents` and corners are rounded inwards.
///
/// ```text
/// q = |p| - b + r
/// d = |max(q, 0)| + min(max(q.x, q.y, q.z), 0) - r
/// ```
#[inline]
pub fn rounded_box(p: &Vector, half_extents: &Vector, radius: Value) -> Value {
    let q = p.abs() - half_extents + Vector::repeat(radius);
    let outside = q.map(|c| c.max(0.0)).norm();
    let inside = q.x.max(q.y.max(q.z)).min(0.0);
    outside + inside - radius
}

/// Sharp-edged box; [`rounded_box`] with zero radius.
#[inline]
pub fn cuboid(p: &Vector, half_extents: &Vector) -> Value {
    rounded_box(p, half_extents, 0.0)
}

/// Torus lying in the `xz` plane.
#[inline]
pub fn torus(p: &Vector, major: Value, minor: Value) -> Value {
    let ring = Vector2D::new(p.xz().norm() - major, p.y);
    ring.norm() - minor
}

/// Capsule between `a` and `b` with radius `r`.
#[inline]
pub fn capsule(p: &Vector, a: &Vector, b: &Vector, r: Value) -> Value {
    let pa = p - a;
    let ba = b - a;
    let len2 = ba.norm_squared();
    let h = if len2 > 0.0 {
        (pa.dot(&ba) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (pa - ba * h).norm() - r
}

/// Approximate distance to an axis-aligned ellipsoid with the given radii.
///
/// Not exact away from the surface, but never overestimates by more than the
/// ratio between the largest and smallest radius.
#[inline]
pub fn ellipsoid(p: &Vector, radii: &Vector) -> Value {
    let k0 = p.component_div(radii).norm();
    let k1 = p.component_div(&radii.component_mul(radii)).norm();
    if k1 == 0.0 {
        return -radii.min();
    }
    k0 * (k0 - 1.0) / k1
}

/// Horizontal plane at `height`.
#[inline]
pub fn plane(p: &Vector, height: Value) -> Value {
    p.y - height
}

/// Horizontal ground at `height`, displaced by a 2D fractal noise field sampled on `xz`.
///
/// ```text
/// ground(p) = p.y - height - noise(p.xz)
/// ```
///
/// The noise makes this a pseudo-distance; steep noise needs a step scale
/// below one in the march.
#[inline]
pub fn ground_plane(p: &Vector, height: Value, noise: &Fbm) -> Value {
    p.y - height - noise.sample2(p.xz())
}

/// Soft indicator of a polar shape: `1` inside `boundary`, `0` beyond `boundary + edge`.
///
/// ```text
/// mask = 1 - smoothstep(f, f + ε, radius)
/// ```
#[inline]
pub fn shape_mask(radius: Value, boundary: Value, edge: Value) -> Value {
    1.0 - smoothstep(boundary, boundary + edge, radius)
}

/// Polar coordinates `(angle, radius)` of a planar point; angle in `(-π, π]`.
#[inline]
pub fn polar(p: Vector2D) -> (Value, Value) {
    (p.y.atan2(p.x), p.norm())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn should_get_sphere_distance() {
        assert_abs_diff_eq!(sphere(&Vector::new(2.0, 0.0, 0.0), 1.0), 1.0);
        assert_abs_diff_eq!(sphere(&Vector::zeros(), 1.0), -1.0);
    }

    #[test]
    fn should_get_box_face_and_corner_distance() {
        let b = Vector::new(1.0, 1.0, 1.0);
        assert_abs_diff_eq!(cuboid(&Vector::new(2.0, 0.0, 0.0), &b), 1.0);
        assert_abs_diff_eq!(
            cuboid(&Vector::new(2.0, 2.0, 2.0), &b),
            3.0_f32.sqrt(),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(cuboid(&Vector::zeros(), &b), -1.0);
    }

    #[test]
    fn should_round_box_corners_inwards() {
        let b = Vector::new(1.0, 1.0, 1.0);
        let corner = Vector::new(1.0, 1.0, 1.0);
        assert!(rounded_box(&corner, &b, 0.25) > 0.0);
        assert_abs_diff_eq!(
            rounded_box(&Vector::new(1.0, 0.0, 0.0), &b, 0.25),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn should_get_torus_distance_on_ring() {
        assert_abs_diff_eq!(torus(&Vector::new(2.0, 0.0, 0.0), 2.0, 0.5), -0.5);
        assert_abs_diff_eq!(torus(&Vector::new(0.0, 0.0, 0.0), 2.0, 0.5), 1.5);
    }

    #[test]
    fn should_handle_degenerate_capsule_as_sphere() {
        let a = Vector::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(capsule(&Vector::new(3.0, 0.0, 0.0), &a, &a, 1.0), 1.0);
    }

    #[test]
    fn should_match_sphere_for_round_ellipsoid() {
        let p = Vector::new(0.0, 3.0, 0.0);
        assert_abs_diff_eq!(ellipsoid(&p, &Vector::repeat(1.0)), sphere(&p, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn should_get_flat_ground_without_noise() {
        assert_abs_diff_eq!(ground_plane(&Vector::new(5.0, 2.0, -1.0), 0.5, &Fbm::FLAT), 1.5);
    }

    #[test]
    fn should_mask_inside_and_outside() {
        assert_eq!(shape_mask(0.5, 1.0, 0.1), 1.0);
        assert_eq!(shape_mask(1.2, 1.0, 0.1), 0.0);
        let edge = shape_mask(1.05, 1.0, 0.1);
        assert!(edge > 0.0 && edge < 1.0);
    }

    #[test]
    fn should_get_polar_coordinates() {
        let (angle, radius) = polar(Vector2D::new(0.0, 2.0));
        assert_abs_diff_eq!(angle, std::f32::consts::FRAC_PI_2);
        assert_abs_diff_eq!(radius, 2.0);
    }
}
