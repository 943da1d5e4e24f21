//! Sphere tracing.
//!
//! ```text
//!            ┌────────────── t += d ──────────────┐
//!            v                                    │
//! MARCHING: p = o + dir·t ─> d = F(p) ─> d < ε ? ─┴─ no ─> t > max_distance ? ─> MAX_DISTANCE
//!                                          │                 step budget out ? ─> MAX_STEPS
//!                                          └─ yes ─> HIT
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::Unit;

use crate::{
    error::{BackdropError, Result, ensure_positive},
    types::{Point, Value, Vector},
};

/// Distance below which a sample counts as being on the surface.
pub const SURFACE_EPSILON: Value = 0.001;

/// Distance along the ray beyond which the march gives up.
pub const MAX_DISTANCE: Value = 100.0;

/// Default step budget per ray.
pub const MAX_STEPS: u32 = 100;

static DEGENERATE_RAY_REPORTED: AtomicBool = AtomicBool::new(false);
static NON_FINITE_SAMPLE_REPORTED: AtomicBool = AtomicBool::new(false);

/// Logs `message` the first time `flag` is raised in this process.
pub(crate) fn warn_once(flag: &AtomicBool, message: &str) {
    if !flag.swap(true, Ordering::Relaxed) {
        tracing::warn!("{message}; further occurrences are not reported");
    }
}

/// A half-line with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point,
    pub direction: Unit<Vector>,
}

impl Ray {
    /// Direction substituted for degenerate input.
    pub const DEFAULT_DIRECTION: Vector = Vector::new(0.0, 0.0, 1.0);

    /// Builds a ray, substituting safe values for degenerate input.
    ///
    /// A zero-length or non-finite `direction` becomes
    /// [`DEFAULT_DIRECTION`](Ray::DEFAULT_DIRECTION); a non-finite `origin`
    /// becomes the world origin. Either case is logged once per process.
    pub fn new(origin: Point, direction: Vector) -> Self {
        match Self::try_new(origin, direction) {
            Ok(ray) => ray,
            Err(_) => {
                warn_once(
                    &DEGENERATE_RAY_REPORTED,
                    "degenerate camera ray replaced with a default ray",
                );
                let origin = if origin.coords.iter().all(|c| c.is_finite()) {
                    origin
                } else {
                    Point::origin()
                };
                let direction = Unit::try_new(direction, Value::EPSILON)
                    .filter(|d| d.iter().all(|c| c.is_finite()))
                    .unwrap_or_else(|| Unit::new_unchecked(Self::DEFAULT_DIRECTION));
                Self { origin, direction }
            }
        }
    }

    /// Builds a ray, rejecting a non-finite origin or a zero-length/non-finite direction.
    pub fn try_new(origin: Point, direction: Vector) -> Result<Self> {
        if let Some(bad) = origin.coords.iter().find(|c| !c.is_finite()) {
            return Err(BackdropError::InvalidParameter {
                name: "ray.origin",
                value: *bad,
            });
        }
        let norm = direction.norm();
        if !(norm.is_finite() && norm > Value::EPSILON) {
            return Err(BackdropError::InvalidParameter {
                name: "ray.direction",
                value: norm,
            });
        }
        Ok(Self {
            origin,
            direction: Unit::new_unchecked(direction / norm),
        })
    }

    /// Ray from `origin` through `target`.
    pub fn towards(origin: Point, target: Point) -> Self {
        Self::new(origin, target - origin)
    }

    #[inline]
    pub fn at(&self, t: Value) -> Point {
        self.origin + self.direction.as_ref() * t
    }
}

/// Step and distance budgets of a march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchConfig {
    pub max_steps: u32,
    pub max_distance: Value,
    pub surface_epsilon: Value,
    /// Fraction of the sampled distance actually stepped, in `(0, 1]`.
    ///
    /// Values below one trade speed for robustness against pseudo-distances
    /// that overestimate.
    pub step_scale: Value,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            max_distance: MAX_DISTANCE,
            surface_epsilon: SURFACE_EPSILON,
            step_scale: 1.0,
        }
    }
}

impl MarchConfig {
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_distance(mut self, max_distance: Value) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_step_scale(mut self, step_scale: Value) -> Self {
        self.step_scale = step_scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(BackdropError::InvalidParameter {
                name: "march.max_steps",
                value: 0.0,
            });
        }
        ensure_positive("march.max_distance", self.max_distance)?;
        ensure_positive("march.surface_epsilon", self.surface_epsilon)?;
        ensure_positive("march.step_scale", self.step_scale)?;
        if self.step_scale > 1.0 {
            return Err(BackdropError::InvalidParameter {
                name: "march.step_scale",
                value: self.step_scale,
            });
        }
        Ok(())
    }
}

/// State of a march; every state but [`Marching`](MarchState::Marching) is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarchState {
    Marching,
    /// The field dropped below the surface epsilon.
    Hit,
    /// The step budget ran out before anything was reached.
    MaxSteps,
    /// The ray left the scene, or the field stopped returning finite values.
    MaxDistance,
}

impl MarchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MarchState::Marching)
    }
}

/// Outcome of [`march`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchResult {
    /// Distance travelled along the ray.
    pub t: Value,
    /// Number of field samples taken.
    pub steps: u32,
    /// Last sampled point.
    pub point: Point,
    /// Last sampled field value.
    pub distance: Value,
    pub exit: MarchState,
}

impl MarchResult {
    pub fn is_hit(&self) -> bool {
        self.exit == MarchState::Hit
    }

    /// `steps / max_steps`, in `[0, 1]`.
    pub fn step_ratio(&self, config: &MarchConfig) -> Value {
        (self.steps as Value / config.max_steps.max(1) as Value).min(1.0)
    }
}

/// A single sphere-tracing march, advanced one sample at a time.
///
/// Mostly useful for inspecting intermediate states; [`march`] runs one to
/// completion.
#[derive(Clone, Copy, Debug)]
pub struct Marcher<'a> {
    ray: &'a Ray,
    config: &'a MarchConfig,
    t: Value,
    steps: u32,
    point: Point,
    distance: Value,
    state: MarchState,
}

impl<'a> Marcher<'a> {
    pub fn new(ray: &'a Ray, config: &'a MarchConfig) -> Self {
        Self {
            ray,
            config,
            t: 0.0,
            steps: 0,
            point: ray.origin,
            distance: Value::MAX,
            state: MarchState::Marching,
        }
    }

    pub fn state(&self) -> MarchState {
        self.state
    }

    /// Takes one sample and returns the new state. Terminal states are sticky.
    #[inline]
    pub fn step<F>(&mut self, field: &F) -> MarchState
    where
        F: Fn(Point) -> Value + ?Sized,
    {
        if self.state.is_terminal() {
            return self.state;
        }
        if self.steps >= self.config.max_steps {
            self.state = MarchState::MaxSteps;
            return self.state;
        }

        self.point = self.ray.at(self.t);
        let d = field(self.point);
        self.steps += 1;
        self.distance = d;

        if !d.is_finite() {
            warn_once(
                &NON_FINITE_SAMPLE_REPORTED,
                "field returned a non-finite value; ray treated as a miss",
            );
            self.state = MarchState::MaxDistance;
        } else if d < self.config.surface_epsilon {
            self.state = MarchState::Hit;
        } else {
            self.t += d * self.config.step_scale;
            if self.t > self.config.max_distance {
                self.state = MarchState::MaxDistance;
            } else if self.steps >= self.config.max_steps {
                self.state = MarchState::MaxSteps;
            }
        }
        self.state
    }

    pub fn result(&self) -> MarchResult {
        MarchResult {
            t: self.t,
            steps: self.steps,
            point: self.point,
            distance: self.distance,
            exit: self.state,
        }
    }
}

/// Sphere-traces `ray` through `field`.
///
/// Always terminates within `config.max_steps` samples. Fields that add
/// several distances together are marched as-is; they may overshoot thin
/// geometry, which is accepted as part of their look.
#[inline]
pub fn march<F>(ray: &Ray, field: &F, config: &MarchConfig) -> MarchResult
where
    F: Fn(Point) -> Value + ?Sized,
{
    let mut marcher = Marcher::new(ray, config);
    while !marcher.step(field).is_terminal() {}
    marcher.result()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn should_hit_sphere_in_front() {
        let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vector::z());
        let result = march(&ray, &|p: Point| p.coords.norm() - 1.0, &MarchConfig::default());
        assert_eq!(result.exit, MarchState::Hit);
        assert_abs_diff_eq!(result.t, 4.0, epsilon = SURFACE_EPSILON);
    }

    #[test]
    fn should_miss_sphere_behind() {
        let ray = Ray::new(Point::new(0.0, 0.0, -5.0), -Vector::z());
        let result = march(&ray, &|p: Point| p.coords.norm() - 1.0, &MarchConfig::default());
        assert_eq!(result.exit, MarchState::MaxDistance);
        assert!(result.t > MAX_DISTANCE);
    }

    #[test]
    fn should_hit_immediately_inside_negative_field() {
        let ray = Ray::new(Point::origin(), Vector::x());
        let result = march(&ray, &|_: Point| -1.0, &MarchConfig::default());
        assert_eq!(result.exit, MarchState::Hit);
        assert_eq!(result.steps, 1);
        assert_eq!(result.t, 0.0);
    }

    #[test]
    fn should_exhaust_step_budget_on_creeping_field() {
        let config = MarchConfig::default().with_max_steps(10);
        let ray = Ray::new(Point::origin(), Vector::x());
        let result = march(&ray, &|_: Point| 0.01, &config);
        assert_eq!(result.exit, MarchState::MaxSteps);
        assert_eq!(result.steps, 10);
    }

    #[test]
    fn should_treat_nan_field_as_miss() {
        let ray = Ray::new(Point::origin(), Vector::x());
        let result = march(&ray, &|_: Point| Value::NAN, &MarchConfig::default());
        assert_eq!(result.exit, MarchState::MaxDistance);
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn should_substitute_default_direction_for_zero_vector() {
        let ray = Ray::new(Point::origin(), Vector::zeros());
        assert_eq!(ray.direction.into_inner(), Ray::DEFAULT_DIRECTION);
        assert!(Ray::try_new(Point::origin(), Vector::zeros()).is_err());
    }

    #[test]
    fn should_substitute_origin_for_non_finite_origin() {
        let ray = Ray::new(Point::new(Value::NAN, 0.0, 0.0), Vector::y());
        assert_eq!(ray.origin, Point::origin());
        assert_eq!(ray.direction.into_inner(), Vector::y());
    }

    #[test]
    fn should_normalize_direction() {
        let ray = Ray::towards(Point::new(0.0, 1.0, -3.5), Point::origin());
        assert_abs_diff_eq!(ray.direction.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn should_keep_terminal_state_sticky() {
        let ray = Ray::new(Point::origin(), Vector::x());
        let config = MarchConfig::default();
        let mut marcher = Marcher::new(&ray, &config);
        assert_eq!(marcher.step(&|_: Point| -1.0), MarchState::Hit);
        assert_eq!(marcher.step(&|_: Point| 5.0), MarchState::Hit);
        assert_eq!(marcher.result().steps, 1);
    }

    #[test]
    fn should_reject_invalid_config() {
        assert!(MarchConfig::default().with_max_steps(0).validate().is_err());
        assert!(MarchConfig::default().with_step_scale(1.5).validate().is_err());
        assert!(MarchConfig::default().validate().is_ok());
    }
}
