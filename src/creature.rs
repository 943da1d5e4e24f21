//! Parametric "creature" shapes and repeated populations of them.
//!
//! A creature is described in polar coordinates of its local `xy` plane: a
//! periodic boundary radius `f(angle)` turns into a soft mask
//!
//! ```text
//! mask = 1 - smoothstep(f, f + edge, radius)
//! ```
//!
//! which is then folded into a pseudo-distance so it can be blended with real
//! distance fields. The result is not a true SDF; [`CreatureConfig::step_scale`]
//! shrinks it so sphere tracing does not overshoot spiky outlines.

use std::f32::consts::TAU;

use crate::{
    domain::repeat,
    error::{Result, ensure_finite, ensure_non_negative, ensure_positive},
    field::FieldContext,
    interp::lerp,
    noise::hash33,
    primitives::{polar, shape_mask},
    types::{Value, Vector, Vector2D},
};

/// Periodic outline of a creature, as a function of polar angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CreatureShape {
    /// `arms` pointed lobes: `1 + depth·cos(arms·θ)`.
    Star { arms: u32, depth: Value },
    /// Rounded petals: `1 + depth·|cos(petals·θ/2)|`.
    Flower { petals: u32, depth: Value },
    /// Bell with a wobbling rim; the top half is wider than the bottom.
    Jelly { lobes: u32, wobble: Value, speed: Value },
    /// Thin spikes: `1 + depth·|cos(spikes·θ/2)|^sharpness`.
    Urchin { spikes: u32, sharpness: Value, depth: Value },
    /// Arms that wind outwards with `twist` radians per unit radius.
    Spiral { arms: u32, twist: Value, depth: Value },
    /// Slowly morphing amoeba.
    Blob { depth: Value, speed: Value },
}

impl CreatureShape {
    /// Relative boundary radius (around `1.0`) at `angle`.
    ///
    /// `depth_scale` multiplies the shape's depth; `phase` rotates the outline;
    /// `radius` is only read by shapes whose outline winds (spirals).
    #[inline]
    fn relative_boundary(
        &self,
        angle: Value,
        radius: Value,
        phase: Value,
        depth_scale: Value,
        time: Value,
    ) -> Value {
        match *self {
            CreatureShape::Star { arms, depth } => {
                1.0 + depth * depth_scale * (arms as Value * (angle + phase)).cos()
            }
            CreatureShape::Flower { petals, depth } => {
                1.0 + depth * depth_scale * (0.5 * petals as Value * (angle + phase)).cos().abs()
            }
            CreatureShape::Jelly { lobes, wobble, speed } => {
                let rim = 1.0
                    + wobble * depth_scale * (lobes as Value * angle + time * speed + phase).sin();
                // sin(angle) is +1 straight up, -1 straight down
                rim * (0.75 + 0.25 * angle.sin())
            }
            CreatureShape::Urchin {
                spikes,
                sharpness,
                depth,
            } => {
                let c = (0.5 * spikes as Value * (angle + phase)).cos().abs();
                1.0 + depth * depth_scale * c.powf(sharpness)
            }
            CreatureShape::Spiral { arms, twist, depth } => {
                let wave = (arms as Value * angle - twist * radius + phase).sin();
                1.0 + depth * depth_scale * (0.5 + 0.5 * wave)
            }
            CreatureShape::Blob { depth, speed } => {
                let t = time * speed + phase;
                1.0 + depth * depth_scale * (3.0 * angle + t).sin() * (2.0 * angle - 0.7 * t).sin()
            }
        }
    }

    /// Largest value [`relative_boundary`](Self::relative_boundary) can reach for `depth_scale = 1`.
    fn max_relative_boundary(&self) -> Value {
        match *self {
            CreatureShape::Star { depth, .. }
            | CreatureShape::Flower { depth, .. }
            | CreatureShape::Urchin { depth, .. }
            | CreatureShape::Spiral { depth, .. }
            | CreatureShape::Blob { depth, .. } => 1.0 + depth.abs(),
            CreatureShape::Jelly { wobble, .. } => 1.0 + wobble.abs(),
        }
    }

    fn validate(&self) -> Result<()> {
        let count = |name: &'static str, n: u32| {
            if n == 0 {
                Err(crate::error::BackdropError::InvalidParameter { name, value: 0.0 })
            } else {
                Ok(())
            }
        };
        match *self {
            CreatureShape::Star { arms, depth } => {
                count("star.arms", arms)?;
                ensure_finite("star.depth", depth)
            }
            CreatureShape::Flower { petals, depth } => {
                count("flower.petals", petals)?;
                ensure_finite("flower.depth", depth)
            }
            CreatureShape::Jelly { lobes, wobble, speed } => {
                count("jelly.lobes", lobes)?;
                ensure_finite("jelly.wobble", wobble)?;
                ensure_finite("jelly.speed", speed)
            }
            CreatureShape::Urchin {
                spikes,
                sharpness,
                depth,
            } => {
                count("urchin.spikes", spikes)?;
                ensure_positive("urchin.sharpness", sharpness)?;
                ensure_finite("urchin.depth", depth)
            }
            CreatureShape::Spiral { arms, twist, depth } => {
                count("spiral.arms", arms)?;
                ensure_finite("spiral.twist", twist)?;
                ensure_finite("spiral.depth", depth)
            }
            CreatureShape::Blob { depth, speed } => {
                ensure_finite("blob.depth", depth)?;
                ensure_finite("blob.speed", speed)
            }
        }
    }
}

/// A single creature centred on its local origin, facing `-z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatureConfig {
    pub shape: CreatureShape,
    /// Base boundary radius.
    pub radius: Value,
    /// Width of the soft edge of the mask.
    pub edge: Value,
    /// Half thickness of the slab the outline is extruded into, along `z`.
    pub thickness: Value,
    /// Outline rotation speed in radians per second.
    pub spin: Value,
    /// How strongly the animated shape factor deepens the outline.
    pub shape_response: Value,
    /// Multiplier in `(0, 1]` applied to the pseudo-distance.
    pub step_scale: Value,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            shape: CreatureShape::Star { arms: 5, depth: 0.3 },
            radius: 0.5,
            edge: 0.05,
            thickness: 0.08,
            spin: 0.0,
            shape_response: 0.0,
            step_scale: 0.6,
        }
    }
}

impl CreatureConfig {
    pub fn new(shape: CreatureShape, radius: Value) -> Self {
        Self {
            shape,
            radius,
            ..Default::default()
        }
    }

    pub fn with_edge(mut self, edge: Value) -> Self {
        self.edge = edge;
        self
    }

    pub fn with_thickness(mut self, thickness: Value) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_spin(mut self, spin: Value) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_shape_response(mut self, shape_response: Value) -> Self {
        self.shape_response = shape_response;
        self
    }

    pub fn with_step_scale(mut self, step_scale: Value) -> Self {
        self.step_scale = step_scale;
        self
    }

    /// Boundary radius `f(angle)` in local units.
    #[inline]
    pub fn boundary(&self, angle: Value, radius: Value, phase: Value, ctx: &FieldContext) -> Value {
        let depth_scale = 1.0 + self.shape_response * ctx.shape_factor.sin();
        let phase = phase + self.spin * ctx.time;
        self.radius
            * self
                .shape
                .relative_boundary(angle, radius, phase, depth_scale, ctx.time)
                .max(0.0)
    }

    /// Soft indicator in `[0, 1]` of the outline at planar point `p`.
    #[inline]
    pub fn mask(&self, p: Vector2D, phase: Value, ctx: &FieldContext) -> Value {
        let (angle, radius) = polar(p);
        shape_mask(radius, self.boundary(angle, radius, phase, ctx), self.edge)
    }

    /// Blendable pseudo-distance at local point `p`.
    ///
    /// ```text
    /// planar = radius - f(angle)                   (> 0 outside the outline)
    /// d2     = planar·(1 - mask) - edge·mask       (continuous, negative inside)
    /// d      = max(d2, |z| - thickness) · step_scale
    /// ```
    #[inline]
    pub fn distance(&self, p: &Vector, phase: Value, ctx: &FieldContext) -> Value {
        let (angle, radius) = polar(p.xy());
        let f = self.boundary(angle, radius, phase, ctx);
        let mask = shape_mask(radius, f, self.edge);
        let planar = radius - f;
        let d2 = planar * (1.0 - mask) - self.edge * mask;
        d2.max(p.z.abs() - self.thickness) * self.step_scale
    }

    /// Radius of a sphere that always contains the creature (at `shape_response` zero).
    pub fn bounding_radius(&self) -> Value {
        (self.radius * self.shape.max_relative_boundary() + self.edge).hypot(self.thickness)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        ensure_positive("creature.radius", self.radius)?;
        ensure_positive("creature.edge", self.edge)?;
        ensure_positive("creature.thickness", self.thickness)?;
        ensure_finite("creature.spin", self.spin)?;
        ensure_finite("creature.shape_response", self.shape_response)?;
        ensure_positive("creature.step_scale", self.step_scale)?;
        if self.step_scale > 1.0 {
            return Err(crate::error::BackdropError::InvalidParameter {
                name: "creature.step_scale",
                value: self.step_scale,
            });
        }
        Ok(())
    }
}

/// Per-cell randomization of a repeated population.
///
/// Every cell hashes its lattice id into three independent numbers that pick
/// a size, a height offset and a motion phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellVariation {
    /// Scale is picked uniformly from `[min, max]`.
    pub scale: [Value; 2],
    /// Maximum vertical offset from the population's anchor height, either way.
    pub height_jitter: Value,
    /// Amplitude of the vertical bobbing motion.
    pub bob_amplitude: Value,
    /// Angular speed of the bobbing motion, in radians per second.
    pub bob_speed: Value,
    /// How far a creature is thrown from its cell centre at explode intensity `1`.
    pub explode_reach: Value,
}

impl Default for CellVariation {
    fn default() -> Self {
        Self {
            scale: [0.7, 1.2],
            height_jitter: 0.3,
            bob_amplitude: 0.15,
            bob_speed: 1.0,
            explode_reach: 0.0,
        }
    }
}

impl CellVariation {
    /// No variation at all: every cell is identical.
    pub const NONE: CellVariation = CellVariation {
        scale: [1.0, 1.0],
        height_jitter: 0.0,
        bob_amplitude: 0.0,
        bob_speed: 0.0,
        explode_reach: 0.0,
    };

    fn validate(&self) -> Result<()> {
        ensure_positive("variation.scale.min", self.scale[0])?;
        ensure_positive("variation.scale.max", self.scale[1])?;
        if self.scale[1] < self.scale[0] {
            return Err(crate::error::BackdropError::InvalidParameter {
                name: "variation.scale.max",
                value: self.scale[1],
            });
        }
        ensure_non_negative("variation.height_jitter", self.height_jitter)?;
        ensure_non_negative("variation.bob_amplitude", self.bob_amplitude)?;
        ensure_finite("variation.bob_speed", self.bob_speed)?;
        ensure_non_negative("variation.explode_reach", self.explode_reach)
    }
}

/// The per-cell values derived from a cell's hash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSample {
    pub scale: Value,
    pub offset: Vector,
    pub phase: Value,
}

/// A creature repeated on a lattice, each copy varied by its cell hash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreaturePopulation {
    pub creature: CreatureConfig,
    /// Lattice spacing; an axis with spacing `0` is not repeated.
    pub spacing: Vector,
    /// Position of the lattice origin.
    pub anchor: Vector,
    /// Constant drift of the whole population, in units per second.
    pub drift: Vector,
    pub variation: CellVariation,
}

impl CreaturePopulation {
    pub fn new(creature: CreatureConfig, spacing: Vector) -> Self {
        Self {
            creature,
            spacing,
            anchor: Vector::zeros(),
            drift: Vector::zeros(),
            variation: CellVariation::default(),
        }
    }

    pub fn with_anchor(mut self, anchor: Vector) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_drift(mut self, drift: Vector) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_variation(mut self, variation: CellVariation) -> Self {
        self.variation = variation;
        self
    }

    /// Hash-derived size, displacement and phase of the creature in cell `id`.
    ///
    /// ```text
    /// h       = hash33(id)
    /// scale   = mix(min, max, h.x)
    /// offset  = (0, jitter·(2h.z - 1) + bob·sin(time·speed + 2π·h.y), 0)
    ///         + normalize(h - 0.5) · reach · explode_intensity
    /// phase   = 2π·h.x
    /// ```
    #[inline]
    pub fn cell_sample(&self, id: &Vector, ctx: &FieldContext) -> CellSample {
        let v = &self.variation;
        let h = hash33(*id);
        let scale = lerp(v.scale[0], v.scale[1], h.x);
        let bob = v.bob_amplitude * (ctx.time * v.bob_speed + TAU * h.y).sin();
        let height = v.height_jitter * (2.0 * h.z - 1.0);

        let spread = h - Vector::repeat(0.5);
        let spread_len = spread.norm();
        let throw = if spread_len > 1e-6 {
            spread * (v.explode_reach * ctx.explode_intensity / spread_len)
        } else {
            Vector::zeros()
        };

        CellSample {
            scale,
            offset: Vector::new(0.0, height + bob, 0.0) + throw,
            phase: TAU * h.x,
        }
    }

    /// Pseudo-distance to the nearest creature of the population.
    ///
    /// Only the creature of the cell containing `p` is evaluated, so copies
    /// displaced across a cell border are clipped there.
    #[inline]
    pub fn distance(&self, p: &Vector, ctx: &FieldContext) -> Value {
        let moved = p - self.anchor - self.drift * ctx.time;
        let cell = repeat(&moved, &self.spacing);
        let sample = self.cell_sample(&cell.id, ctx);
        let local = (cell.local - sample.offset) / sample.scale;
        self.creature.distance(&local, sample.phase, ctx) * sample.scale
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.creature.validate()?;
        self.variation.validate()?;
        for axis in 0..3 {
            ensure_non_negative("population.spacing", self.spacing[axis])?;
            ensure_finite("population.anchor", self.anchor[axis])?;
            ensure_finite("population.drift", self.drift[axis])?;
        }
        Ok(())
    }
}
