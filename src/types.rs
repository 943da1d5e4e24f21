use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// A 2D vector with [`Value`] components.
///
/// Used for pixel coordinates, normalized screen coordinates and the
/// horizontal `xz` plane sampled by terrain noise.
pub type Vector2D = Vector2<Value>;

/// Linear RGBA color, each channel nominally in `[0, 1]`.
pub type Rgba = Vector4<Value>;

