//! Surface normals, soft shadows and the configurable colour pipeline.
//!
//! Colour synthesis is a list of [`ShadeStage`]s folded over a starting
//! colour. Each stage reads a [`ShadeContext`] (the march result, surface
//! data, uniforms, screen position) and returns a new colour, so a variant's
//! look is data rather than code.

use std::{fmt, sync::Arc};

use crate::{
    error::{BackdropError, Result, ensure_finite, ensure_non_negative, ensure_positive},
    field::{FieldContext, FieldNode, SceneField},
    interp::{clamp01, lerp, lerp3, smoothstep},
    march::{MarchConfig, MarchResult, Ray},
    noise::Fbm,
    palette::CosinePalette,
    types::{Point, Rgba, Value, Vector, Vector2D},
    uniforms::Uniforms,
};

/// Default finite-difference step of [`estimate_normal`].
pub const NORMAL_EPSILON: Value = 0.001;

/// Surface normal by central differences.
///
/// ```text
/// n = normalize(F(p + εx) - F(p - εx), F(p + εy) - F(p - εy), F(p + εz) - F(p - εz))
/// ```
///
/// Returns `+y` where the gradient vanishes or is not finite.
#[inline]
pub fn estimate_normal<F>(field: &F, p: Point, epsilon: Value) -> Vector
where
    F: Fn(Point) -> Value + ?Sized,
{
    let dx = Vector::new(epsilon, 0.0, 0.0);
    let dy = Vector::new(0.0, epsilon, 0.0);
    let dz = Vector::new(0.0, 0.0, epsilon);
    let gradient = Vector::new(
        field(p + dx) - field(p - dx),
        field(p + dy) - field(p - dy),
        field(p + dz) - field(p - dz),
    );
    gradient
        .try_normalize(Value::EPSILON)
        .filter(|n| n.iter().all(|c| c.is_finite()))
        .unwrap_or_else(Vector::y)
}

/// Budget of the secondary shadow march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowConfig {
    pub max_distance: Value,
    pub max_iterations: u32,
    /// Distance from the surface the shadow ray starts at.
    pub start_offset: Value,
    /// Smallest step taken, so the march keeps moving inside occluders.
    pub min_step: Value,
    /// Lower clamp of the shadow factor.
    pub floor: Value,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            max_distance: 5.0,
            max_iterations: 24,
            start_offset: 0.02,
            min_step: 0.01,
            floor: 0.2,
        }
    }
}

impl ShadowConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure_positive("shadow.max_distance", self.max_distance)?;
        ensure_non_negative("shadow.start_offset", self.start_offset)?;
        ensure_positive("shadow.min_step", self.min_step)?;
        ensure_non_negative("shadow.floor", self.floor)?;
        if self.floor > 1.0 {
            return Err(BackdropError::InvalidParameter {
                name: "shadow.floor",
                value: self.floor,
            });
        }
        Ok(())
    }
}

/// Soft shadow factor in `[floor, 1]` for `origin` lit from `light`.
///
/// Marches toward the light, halving the factor every time a sample comes
/// closer to a surface than `surface_epsilon`. Steps are half the sampled
/// distance for a smoother penumbra.
pub fn soft_shadow<F>(
    field: &F,
    origin: Point,
    light: Point,
    config: &ShadowConfig,
    surface_epsilon: Value,
) -> Value
where
    F: Fn(Point) -> Value + ?Sized,
{
    let to_light = light - origin;
    let Some(direction) = to_light.try_normalize(Value::EPSILON) else {
        return 1.0;
    };
    let limit = config.max_distance.min(to_light.norm());

    let mut factor: Value = 1.0;
    let mut t = config.start_offset;
    for _ in 0..config.max_iterations {
        if t > limit {
            break;
        }
        let d = field(origin + direction * t);
        if !d.is_finite() {
            break;
        }
        if d < surface_epsilon {
            factor *= 0.5;
        }
        t += (0.5 * d).max(config.min_step);
    }
    factor.clamp(config.floor, 1.0)
}

/// Which screen point drives the pointer-reactive stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadeMode {
    /// The pointer is over the view: effects follow it.
    Interactive,
    /// No pointer: effects are centred on the viewport.
    Ambient,
}

impl ShadeMode {
    #[inline]
    pub fn from_hovered(hovered: bool) -> Self {
        if hovered {
            ShadeMode::Interactive
        } else {
            ShadeMode::Ambient
        }
    }

    /// Distance from `ndc` to the focus point of this mode.
    #[inline]
    pub fn focus_distance(&self, ndc: Vector2D, pointer: Vector2D) -> Value {
        match self {
            ShadeMode::Interactive => (ndc - pointer).norm(),
            ShadeMode::Ambient => ndc.norm(),
        }
    }
}

/// Everything a shading stage may read about one pixel.
#[derive(Clone, Copy, Debug)]
pub struct ShadeContext<'a> {
    pub result: &'a MarchResult,
    pub march: &'a MarchConfig,
    pub ray: &'a Ray,
    /// Surface normal; `None` when the ray missed.
    pub normal: Option<Vector>,
    /// Soft shadow factor, `1` when unshadowed or when shadows are off.
    pub shadow: Value,
    pub uniforms: &'a Uniforms,
    pub field: &'a SceneField,
    pub field_context: &'a FieldContext,
    /// Normalized device coordinates of the pixel, `[-1, 1]²`, `y` up.
    pub ndc: Vector2D,
    pub mode: ShadeMode,
    /// Distance from the pixel to the current mode's focus, in NDC units.
    pub focus_distance: Value,
}

impl ShadeContext<'_> {
    pub fn is_hit(&self) -> bool {
        self.result.is_hit()
    }

    /// `1 - steps / max_steps`: bright where the march converged quickly.
    pub fn depth_grey(&self) -> Value {
        1.0 - self.result.step_ratio(self.march)
    }
}

/// The scalar a [`ShadeStage::Palette`] stage looks up its colour with.
#[derive(Clone, Debug, PartialEq)]
pub enum PaletteSource {
    /// [`ShadeContext::depth_grey`].
    Depth,
    /// The soft shadow factor.
    Shadow,
    /// Distance to the mode's focus point.
    Focus,
    /// `depth_grey^power` perturbed by 3D noise at the last sampled point.
    RayPower { power: Value, noise: Fbm },
    /// A second field evaluated at the last sampled point, times `scale`.
    SecondaryField { node: Arc<FieldNode>, scale: Value },
}

impl PaletteSource {
    fn sample(&self, ctx: &ShadeContext<'_>) -> Value {
        match self {
            PaletteSource::Depth => ctx.depth_grey(),
            PaletteSource::Shadow => ctx.shadow,
            PaletteSource::Focus => ctx.focus_distance,
            PaletteSource::RayPower { power, noise } => {
                ctx.depth_grey().powf(*power) + noise.sample3(ctx.result.point.coords)
            }
            PaletteSource::SecondaryField { node, scale } => {
                node.distance(&ctx.result.point.coords, ctx.field_context) * scale
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            PaletteSource::Depth | PaletteSource::Shadow | PaletteSource::Focus => Ok(()),
            PaletteSource::RayPower { power, noise } => {
                ensure_positive("ray_power.power", *power)?;
                noise.validate()
            }
            PaletteSource::SecondaryField { node, scale } => {
                ensure_finite("secondary_field.scale", *scale)?;
                node.validate()
            }
        }
    }
}

/// A user-supplied shading stage.
#[derive(Clone)]
pub struct CustomStage(pub Arc<dyn Fn(&ShadeContext<'_>, Rgba) -> Rgba + Send + Sync>);

impl CustomStage {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ShadeContext<'_>, Rgba) -> Rgba + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for CustomStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomStage")
    }
}

/// One step of the colour pipeline.
#[derive(Clone, Debug)]
pub enum ShadeStage {
    /// Blends towards the step-count grey. Hits only.
    DepthGrey { weight: Value },
    /// Diffuse lighting from a directional light. Hits only.
    Lambert { light_dir: Vector, ambient: Value },
    /// Multiplies by the soft shadow factor. Hits only.
    Shadow { strength: Value },
    /// Brightens near the focus point and fades opacity with distance from it.
    PointerGlow {
        radius: Value,
        strength: Value,
        opacity_falloff: Value,
        min_opacity: Value,
    },
    /// Modulates brightness by `0.5 + 0.5·sin(time·speed + focus·spatial_frequency)`.
    TimeOscillation {
        amplitude: Value,
        speed: Value,
        spatial_frequency: Value,
    },
    /// Blends towards a palette colour picked by `source`.
    Palette {
        palette: CosinePalette,
        source: PaletteSource,
        weight: Value,
        /// Added to the palette coordinate every second.
        cycle_speed: Value,
    },
    /// Exponential distance fog. Hits only.
    Fog { density: Value, color: Rgba },
    Custom(CustomStage),
}

impl ShadeStage {
    fn apply(&self, ctx: &ShadeContext<'_>, color: Rgba) -> Rgba {
        match self {
            ShadeStage::DepthGrey { weight } => {
                if !ctx.is_hit() {
                    return color;
                }
                let grey = ctx.depth_grey();
                with_rgb(color, lerp3(color.xyz(), Vector::repeat(grey), *weight))
            }
            ShadeStage::Lambert { light_dir, ambient } => match ctx.normal {
                Some(normal) => {
                    let light = light_dir.try_normalize(Value::EPSILON).unwrap_or_else(Vector::y);
                    let diffuse = normal.dot(&light).max(0.0);
                    with_rgb(color, color.xyz() * (ambient + (1.0 - ambient) * diffuse))
                }
                None => color,
            },
            ShadeStage::Shadow { strength } => {
                if !ctx.is_hit() {
                    return color;
                }
                with_rgb(color, color.xyz() * lerp(1.0, ctx.shadow, *strength))
            }
            ShadeStage::PointerGlow {
                radius,
                strength,
                opacity_falloff,
                min_opacity,
            } => {
                let glow = strength * (1.0 - smoothstep(0.0, *radius, ctx.focus_distance));
                let opacity = (1.0 - ctx.focus_distance * opacity_falloff).clamp(*min_opacity, 1.0);
                let rgb = color.xyz() + Vector::repeat(glow);
                Rgba::new(rgb.x, rgb.y, rgb.z, color.w * opacity)
            }
            ShadeStage::TimeOscillation {
                amplitude,
                speed,
                spatial_frequency,
            } => {
                let phase = ctx.uniforms.time * speed + ctx.focus_distance * spatial_frequency;
                let oscillation = 0.5 + 0.5 * phase.sin();
                with_rgb(color, color.xyz() * lerp(1.0, oscillation, *amplitude))
            }
            ShadeStage::Palette {
                palette,
                source,
                weight,
                cycle_speed,
            } => {
                let t = source.sample(ctx) + ctx.uniforms.time * cycle_speed;
                with_rgb(color, lerp3(color.xyz(), palette.color(t), *weight))
            }
            ShadeStage::Fog { density, color: fog } => {
                if !ctx.is_hit() {
                    return color;
                }
                let amount = 1.0 - (-density * ctx.result.t).exp();
                color.lerp(fog, amount)
            }
            ShadeStage::Custom(custom) => (custom.0)(ctx, color),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ShadeStage::DepthGrey { weight } => ensure_unit("depth_grey.weight", *weight),
            ShadeStage::Lambert { light_dir, ambient } => {
                light_dir.iter().try_for_each(|c| ensure_finite("lambert.light_dir", *c))?;
                ensure_unit("lambert.ambient", *ambient)
            }
            ShadeStage::Shadow { strength } => ensure_unit("shadow.strength", *strength),
            ShadeStage::PointerGlow {
                radius,
                strength,
                opacity_falloff,
                min_opacity,
            } => {
                ensure_positive("pointer_glow.radius", *radius)?;
                ensure_finite("pointer_glow.strength", *strength)?;
                ensure_non_negative("pointer_glow.opacity_falloff", *opacity_falloff)?;
                ensure_unit("pointer_glow.min_opacity", *min_opacity)
            }
            ShadeStage::TimeOscillation {
                amplitude,
                speed,
                spatial_frequency,
            } => {
                ensure_unit("oscillation.amplitude", *amplitude)?;
                ensure_finite("oscillation.speed", *speed)?;
                ensure_finite("oscillation.spatial_frequency", *spatial_frequency)
            }
            ShadeStage::Palette {
                palette,
                source,
                weight,
                cycle_speed,
            } => {
                if !palette.is_finite() {
                    return Err(BackdropError::InvalidParameter {
                        name: "palette",
                        value: Value::NAN,
                    });
                }
                ensure_unit("palette.weight", *weight)?;
                ensure_finite("palette.cycle_speed", *cycle_speed)?;
                source.validate()
            }
            ShadeStage::Fog { density, color } => {
                ensure_non_negative("fog.density", *density)?;
                color.iter().try_for_each(|c| ensure_finite("fog.color", *c))
            }
            ShadeStage::Custom(_) => Ok(()),
        }
    }
}

fn ensure_unit(name: &'static str, value: Value) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BackdropError::InvalidParameter { name, value })
    }
}

#[inline]
fn with_rgb(color: Rgba, rgb: Vector) -> Rgba {
    Rgba::new(rgb.x, rgb.y, rgb.z, color.w)
}

/// Ordered list of shading stages plus the colours they start from.
#[derive(Clone, Debug)]
pub struct ShadePipeline {
    /// Starting colour of pixels whose ray hit a surface.
    pub surface: Rgba,
    /// Starting colour of pixels whose ray missed.
    pub background: Rgba,
    pub stages: Vec<ShadeStage>,
}

impl Default for ShadePipeline {
    fn default() -> Self {
        Self {
            surface: Rgba::new(1.0, 1.0, 1.0, 1.0),
            background: Rgba::new(0.0, 0.0, 0.0, 1.0),
            stages: vec![ShadeStage::DepthGrey { weight: 1.0 }],
        }
    }
}

impl ShadePipeline {
    pub fn new(surface: Rgba, background: Rgba) -> Self {
        Self {
            surface,
            background,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: ShadeStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Runs every stage in order and clamps the result to `[0, 1]`.
    pub fn shade(&self, ctx: &ShadeContext<'_>) -> Rgba {
        let start = if ctx.is_hit() { self.surface } else { self.background };
        self.stages
            .iter()
            .fold(start, |color, stage| stage.apply(ctx, color))
            .map(|c| if c.is_finite() { clamp01(c) } else { 0.0 })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for c in self.surface.iter().chain(self.background.iter()) {
            ensure_finite("pipeline.color", *c)?;
        }
        self.stages.iter().try_for_each(ShadeStage::validate)
    }
}
