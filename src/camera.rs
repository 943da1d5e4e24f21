//! Pinhole camera rig with optional time-driven motion.

use crate::{
    error::{BackdropError, Result, ensure_finite, ensure_non_negative, ensure_positive},
    march::Ray,
    types::{Point, Value, Vector, Vector2D},
};

/// How the camera moves over time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraMotion {
    Still,
    /// Circles the target at a fixed radius and height.
    Orbit { radius: Value, height: Value, speed: Value },
    /// Moves back and forth along the view axis.
    Dolly { span: Value, speed: Value },
    /// Sideways and vertical sway around the rest position.
    Sway { amplitude: Vector2D, speed: Value },
    /// Constant flight along `velocity`; the target moves along with the camera.
    Fly { velocity: Vector },
}

/// Camera placement and lens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub position: Point,
    pub target: Point,
    pub up: Vector,
    /// Vertical field of view in radians.
    pub fov_y: Value,
    pub motion: CameraMotion,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Point::new(0.0, 1.0, -3.5),
            target: Point::origin(),
            up: Vector::y(),
            fov_y: 60.0_f32.to_radians(),
            motion: CameraMotion::Still,
        }
    }
}

/// Camera basis at a given instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub eye: Point,
    pub forward: Vector,
    pub right: Vector,
    pub up: Vector,
    /// `1 / tan(fov_y / 2)`: distance of the image plane for a unit half-height.
    pub focal_length: Value,
}

impl CameraRig {
    pub fn looking_at(position: Point, target: Point) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    pub fn with_fov_y(mut self, fov_y: Value) -> Self {
        self.fov_y = fov_y;
        self
    }

    pub fn with_motion(mut self, motion: CameraMotion) -> Self {
        self.motion = motion;
        self
    }

    /// Eye and target positions at `time`.
    pub fn placement(&self, time: Value) -> (Point, Point) {
        match self.motion {
            CameraMotion::Still => (self.position, self.target),
            CameraMotion::Orbit {
                radius,
                height,
                speed,
            } => {
                let angle = time * speed;
                let eye = self.target
                    + Vector::new(radius * angle.sin(), height, -radius * angle.cos());
                (eye, self.target)
            }
            CameraMotion::Dolly { span, speed } => {
                let axis = self.target - self.position;
                let offset = match axis.try_normalize(Value::EPSILON) {
                    Some(dir) => dir * (span * (time * speed).sin()),
                    None => Vector::zeros(),
                };
                (self.position + offset, self.target)
            }
            CameraMotion::Sway { amplitude, speed } => {
                let offset = Vector::new(
                    amplitude.x * (time * speed).sin(),
                    amplitude.y * (time * speed * 0.7).cos(),
                    0.0,
                );
                (self.position + offset, self.target)
            }
            CameraMotion::Fly { velocity } => {
                let offset = velocity * time;
                (self.position + offset, self.target + offset)
            }
        }
    }

    /// Orthonormal camera basis at `time`.
    ///
    /// A camera looking straight along `up` falls back to `z` as its up vector.
    pub fn frame(&self, time: Value) -> CameraFrame {
        let (eye, target) = self.placement(time);
        let forward = (target - eye)
            .try_normalize(Value::EPSILON)
            .unwrap_or_else(Vector::z);
        let right = self
            .up
            .cross(&forward)
            .try_normalize(Value::EPSILON)
            .or_else(|| Vector::z().cross(&forward).try_normalize(Value::EPSILON))
            .unwrap_or_else(Vector::x);
        let up = forward.cross(&right);
        CameraFrame {
            eye,
            forward,
            right,
            up,
            focal_length: 1.0 / (0.5 * self.fov_y).tan(),
        }
    }

    /// Primary ray through screen point `uv`.
    ///
    /// `uv` is centred on the viewport with `y` up and spans `[-1, 1]`
    /// vertically; see [`utils::pixel_to_uv`](crate::utils::pixel_to_uv).
    #[inline]
    pub fn ray(&self, uv: Vector2D, time: Value) -> Ray {
        self.frame(time).ray(uv)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for c in self.position.iter().chain(self.target.iter()).chain(self.up.iter()) {
            ensure_finite("camera.position", *c)?;
        }
        ensure_positive("camera.fov_y", self.fov_y)?;
        if self.fov_y >= std::f32::consts::PI {
            return Err(BackdropError::InvalidParameter {
                name: "camera.fov_y",
                value: self.fov_y,
            });
        }
        match self.motion {
            CameraMotion::Still => Ok(()),
            CameraMotion::Orbit {
                radius,
                height,
                speed,
            } => {
                ensure_positive("orbit.radius", radius)?;
                ensure_finite("orbit.height", height)?;
                ensure_finite("orbit.speed", speed)
            }
            CameraMotion::Dolly { span, speed } => {
                ensure_non_negative("dolly.span", span)?;
                ensure_finite("dolly.speed", speed)
            }
            CameraMotion::Sway { amplitude, speed } => {
                ensure_non_negative("sway.amplitude", amplitude.x)?;
                ensure_non_negative("sway.amplitude", amplitude.y)?;
                ensure_finite("sway.speed", speed)
            }
            CameraMotion::Fly { velocity } => {
                velocity.iter().try_for_each(|c| ensure_finite("fly.velocity", *c))
            }
        }
    }
}

impl CameraFrame {
    #[inline]
    pub fn ray(&self, uv: Vector2D) -> Ray {
        let direction = self.right * uv.x + self.up * uv.y + self.forward * self.focal_length;
        Ray::new(self.eye, direction)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn should_shoot_centre_ray_at_target() {
        let rig = CameraRig::looking_at(Point::new(0.0, 0.0, -4.0), Point::origin());
        let ray = rig.ray(Vector2D::zeros(), 0.0);
        assert_abs_diff_eq!(ray.direction.into_inner(), Vector::z(), epsilon = 1e-6);
        assert_eq!(ray.origin, Point::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn should_map_positive_uv_to_right_and_up() {
        let rig = CameraRig::looking_at(Point::new(0.0, 0.0, -4.0), Point::origin());
        let ray = rig.ray(Vector2D::new(0.5, 0.5), 0.0);
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn should_build_orthonormal_basis_when_looking_straight_down() {
        let rig = CameraRig::looking_at(Point::new(0.0, 5.0, 0.0), Point::origin());
        let frame = rig.frame(0.0);
        assert_abs_diff_eq!(frame.forward, -Vector::y(), epsilon = 1e-6);
        assert_abs_diff_eq!(frame.right.norm(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(frame.right.dot(&frame.forward), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(frame.up.dot(&frame.forward), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn should_orbit_at_fixed_radius() {
        let rig = CameraRig::default().with_motion(CameraMotion::Orbit {
            radius: 3.0,
            height: 1.0,
            speed: 0.5,
        });
        for i in 0..10 {
            let (eye, target) = rig.placement(i as Value * 0.7);
            let flat = (eye - target).xz();
            assert_abs_diff_eq!(flat.norm(), 3.0, epsilon = 1e-5);
            assert_abs_diff_eq!(eye.y - target.y, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn should_fly_eye_and_target_together() {
        let rig = CameraRig::default().with_motion(CameraMotion::Fly {
            velocity: Vector::new(0.0, 0.0, 2.0),
        });
        let (eye, target) = rig.placement(1.5);
        assert_abs_diff_eq!(eye.z, -3.5 + 3.0);
        assert_abs_diff_eq!(target.z, 3.0);
    }

    #[test]
    fn should_reject_wide_fov() {
        assert!(CameraRig::default().with_fov_y(4.0).validate().is_err());
        assert!(CameraRig::default().validate().is_ok());
    }
}
