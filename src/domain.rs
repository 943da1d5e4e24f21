//! Domain operators: transformations applied to the sample point before a
//! shape is evaluated.

use crate::{
    interp::fract,
    types::{Value, Vector, Vector2D},
};

/// A point folded into its repetition cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// Point relative to the centre of its cell, each component in `[-c/2, c/2)`.
    pub local: Vector,
    /// Integer lattice coordinate of the cell, used as a hash seed.
    pub id: Vector,
}

/// Tiles space into cells of size `cell` along every axis.
///
/// ```text
/// local = (fract(p / c) - 0.5) · c
/// id    = floor(p / c)
/// ```
///
/// Axes with a non-positive cell size are left untouched (id `0`).
#[inline]
pub fn repeat(p: &Vector, cell: &Vector) -> Cell {
    let mut local = *p;
    let mut id = Vector::zeros();
    for axis in 0..3 {
        let c = cell[axis];
        if c > 0.0 {
            let scaled = p[axis] / c;
            local[axis] = (fract(scaled) - 0.5) * c;
            id[axis] = scaled.floor();
        }
    }
    Cell { local, id }
}

/// Like [`repeat`], but only the cells whose id lies within `±limit` repeat;
/// beyond that the outermost cell is stretched.
#[inline]
pub fn repeat_limited(p: &Vector, cell: &Vector, limit: &Vector) -> Cell {
    let mut local = *p;
    let mut id = Vector::zeros();
    for axis in 0..3 {
        let c = cell[axis];
        if c > 0.0 {
            let centred = (p[axis] / c).round().clamp(-limit[axis], limit[axis]);
            local[axis] = p[axis] - c * centred;
            id[axis] = centred;
        }
    }
    Cell { local, id }
}

/// Rotates a planar vector counter-clockwise by `angle` radians.
#[inline]
pub fn rotate2(v: Vector2D, angle: Value) -> Vector2D {
    let (s, c) = angle.sin_cos();
    Vector2D::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Rotates a point about the `y` axis.
#[inline]
pub fn rotate_y(p: &Vector, angle: Value) -> Vector {
    let xz = rotate2(Vector2D::new(p.x, p.z), angle);
    Vector::new(xz.x, p.y, xz.y)
}

/// Twists space about the `y` axis by `rate` radians per unit height.
#[inline]
pub fn twist_y(p: &Vector, rate: Value) -> Vector {
    rotate_y(p, rate * p.y)
}

/// Mirrors space across the `x = 0` plane.
#[inline]
pub fn mirror_x(p: &Vector) -> Vector {
    Vector::new(p.x.abs(), p.y, p.z)
}
