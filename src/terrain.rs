//! Terrain generators: the ground, fluid surfaces and repeated scenery the
//! creatures are blended into.

use std::f32::consts::TAU;

use crate::{
    domain::repeat,
    error::{BackdropError, Result, ensure_finite, ensure_non_negative, ensure_positive},
    field::FieldContext,
    interp::{fract, lerp},
    noise::{Fbm, hash21},
    primitives::{ground_plane, rounded_box, sphere},
    types::{Value, Vector, Vector2D},
};

/// Noisy ground at a fixed height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundConfig {
    pub height: Value,
    pub noise: Fbm,
    /// Horizontal scroll speed of the noise, in units per second.
    pub scroll: Vector2D,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            height: 0.0,
            noise: Fbm::default(),
            scroll: Vector2D::zeros(),
        }
    }
}

/// Directional sand dunes: a sharpened sine ridge along `direction` plus noise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DunesConfig {
    pub height: Value,
    pub amplitude: Value,
    pub wavelength: Value,
    /// Ridge direction as an angle in the `xz` plane, in radians.
    pub direction: Value,
    pub noise: Fbm,
}

impl Default for DunesConfig {
    fn default() -> Self {
        Self {
            height: 0.0,
            amplitude: 0.4,
            wavelength: 4.0,
            direction: 0.3,
            noise: Fbm::default().with_amplitude(0.15),
        }
    }
}

/// One travelling wave of a fluid surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    pub amplitude: Value,
    pub wavelength: Value,
    /// Phase speed in units per second.
    pub speed: Value,
    /// Travel direction as an angle in the `xz` plane, in radians.
    pub direction: Value,
}

/// Fluid surface built from a sum of travelling sine waves.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterConfig {
    pub height: Value,
    pub waves: Vec<Wave>,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            height: 0.0,
            waves: vec![
                Wave {
                    amplitude: 0.12,
                    wavelength: 3.0,
                    speed: 0.8,
                    direction: 0.0,
                },
                Wave {
                    amplitude: 0.05,
                    wavelength: 1.1,
                    speed: 1.3,
                    direction: 2.1,
                },
            ],
        }
    }
}

/// Field of rounded pillars on an `xz` lattice with hashed heights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PillarsConfig {
    pub base: Value,
    pub spacing: Value,
    pub half_width: Value,
    /// Heights are picked uniformly from `[min, max]` per cell.
    pub heights: [Value; 2],
    pub rounding: Value,
    /// Amplitude of the horizontal sway, per cell phase.
    pub sway: Value,
}

impl Default for PillarsConfig {
    fn default() -> Self {
        Self {
            base: 0.0,
            spacing: 3.0,
            half_width: 0.35,
            heights: [0.5, 2.5],
            rounding: 0.1,
            sway: 0.0,
        }
    }
}

/// Columns of bubbles rising on an `xz` lattice and wrapping around at `ceiling`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BubblesConfig {
    pub floor: Value,
    pub ceiling: Value,
    pub spacing: Value,
    pub radius: Value,
    pub rise_speed: Value,
    pub wobble: Value,
}

impl Default for BubblesConfig {
    fn default() -> Self {
        Self {
            floor: 0.0,
            ceiling: 4.0,
            spacing: 2.0,
            radius: 0.2,
            rise_speed: 0.5,
            wobble: 0.2,
        }
    }
}

/// The terrain layer of a scene.
#[derive(Clone, Debug, PartialEq)]
pub enum Terrain {
    Ground(GroundConfig),
    Dunes(DunesConfig),
    Water(WaterConfig),
    Pillars(PillarsConfig),
    Bubbles(BubblesConfig),
}

impl Terrain {
    /// Pseudo-distance from `p` to the terrain at the context's time.
    #[inline]
    pub fn distance(&self, p: &Vector, ctx: &FieldContext) -> Value {
        match self {
            Terrain::Ground(ground) => {
                let shifted = p - Vector::new(ground.scroll.x, 0.0, ground.scroll.y) * ctx.time;
                ground_plane(&shifted, ground.height, &ground.noise)
            }
            Terrain::Dunes(dunes) => dunes_distance(dunes, p),
            Terrain::Water(water) => water_distance(water, p, ctx.time),
            Terrain::Pillars(pillars) => pillars_distance(pillars, p, ctx.time),
            Terrain::Bubbles(bubbles) => bubbles_distance(bubbles, p, ctx.time),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Terrain::Ground(ground) => {
                ensure_finite("ground.height", ground.height)?;
                ensure_finite("ground.scroll", ground.scroll.x)?;
                ensure_finite("ground.scroll", ground.scroll.y)?;
                ground.noise.validate()
            }
            Terrain::Dunes(dunes) => {
                ensure_finite("dunes.height", dunes.height)?;
                ensure_non_negative("dunes.amplitude", dunes.amplitude)?;
                ensure_positive("dunes.wavelength", dunes.wavelength)?;
                ensure_finite("dunes.direction", dunes.direction)?;
                dunes.noise.validate()
            }
            Terrain::Water(water) => {
                ensure_finite("water.height", water.height)?;
                for wave in &water.waves {
                    ensure_non_negative("wave.amplitude", wave.amplitude)?;
                    ensure_positive("wave.wavelength", wave.wavelength)?;
                    ensure_finite("wave.speed", wave.speed)?;
                    ensure_finite("wave.direction", wave.direction)?;
                }
                Ok(())
            }
            Terrain::Pillars(pillars) => {
                ensure_finite("pillars.base", pillars.base)?;
                ensure_positive("pillars.spacing", pillars.spacing)?;
                ensure_positive("pillars.half_width", pillars.half_width)?;
                ensure_positive("pillars.heights.min", pillars.heights[0])?;
                ensure_positive("pillars.heights.max", pillars.heights[1])?;
                ensure_non_negative("pillars.rounding", pillars.rounding)?;
                ensure_non_negative("pillars.sway", pillars.sway)?;
                if pillars.heights[1] < pillars.heights[0] {
                    return Err(BackdropError::InvalidParameter {
                        name: "pillars.heights.max",
                        value: pillars.heights[1],
                    });
                }
                if 2.0 * (pillars.half_width + pillars.sway) >= pillars.spacing {
                    return Err(BackdropError::InvalidParameter {
                        name: "pillars.half_width",
                        value: pillars.half_width,
                    });
                }
                Ok(())
            }
            Terrain::Bubbles(bubbles) => {
                ensure_finite("bubbles.floor", bubbles.floor)?;
                ensure_positive("bubbles.spacing", bubbles.spacing)?;
                ensure_positive("bubbles.radius", bubbles.radius)?;
                ensure_finite("bubbles.rise_speed", bubbles.rise_speed)?;
                ensure_non_negative("bubbles.wobble", bubbles.wobble)?;
                if bubbles.ceiling <= bubbles.floor {
                    return Err(BackdropError::InvalidParameter {
                        name: "bubbles.ceiling",
                        value: bubbles.ceiling,
                    });
                }
                Ok(())
            }
        }
    }
}

#[inline]
fn direction(angle: Value) -> Vector2D {
    let (s, c) = angle.sin_cos();
    Vector2D::new(c, s)
}

/// ```text
/// ridge = 1 - |sin(π · x·dir / wavelength)|      (sharp crests, round troughs)
/// d     = p.y - height - amplitude·ridge - noise(p.xz)
/// ```
fn dunes_distance(dunes: &DunesConfig, p: &Vector) -> Value {
    let along = p.xz().dot(&direction(dunes.direction)) / dunes.wavelength;
    let ridge = 1.0 - (std::f32::consts::PI * along).sin().abs();
    ground_plane(p, dunes.height + dunes.amplitude * ridge, &dunes.noise)
}

fn water_distance(water: &WaterConfig, p: &Vector, time: Value) -> Value {
    let xz = p.xz();
    let swell: Value = water
        .waves
        .iter()
        .map(|wave| {
            let k = TAU / wave.wavelength;
            let phase = k * (xz.dot(&direction(wave.direction)) - wave.speed * time);
            wave.amplitude * phase.sin()
        })
        .sum();
    p.y - water.height - swell
}

fn pillars_distance(pillars: &PillarsConfig, p: &Vector, time: Value) -> Value {
    let spacing = Vector::new(pillars.spacing, 0.0, pillars.spacing);
    let cell = repeat(p, &spacing);
    let h = hash21(cell.id.xz());
    let height = lerp(pillars.heights[0], pillars.heights[1], h);
    let sway = pillars.sway * (time + TAU * h).sin();

    let centre = Vector::new(sway, pillars.base + 0.5 * height, 0.0);
    let half_extents = Vector::new(pillars.half_width, 0.5 * height, pillars.half_width);
    let rounding = pillars.rounding.min(pillars.half_width);
    rounded_box(&(cell.local - centre), &half_extents, rounding)
}

fn bubbles_distance(bubbles: &BubblesConfig, p: &Vector, time: Value) -> Value {
    let spacing = Vector::new(bubbles.spacing, 0.0, bubbles.spacing);
    let cell = repeat(p, &spacing);
    let h = hash21(cell.id.xz());
    let span = bubbles.ceiling - bubbles.floor;

    let rise = fract(h + time * bubbles.rise_speed / span);
    let y = bubbles.floor + rise * span;
    let wobble = bubbles.wobble * (3.0 * time + TAU * h).sin();
    let radius = bubbles.radius * lerp(0.6, 1.0, fract(h * 7.0));

    let centre = Vector::new(wobble, y, 0.0);
    sphere(&(cell.local - centre), radius)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn at(time: Value) -> FieldContext {
        FieldContext {
            time,
            ..Default::default()
        }
    }

    #[test]
    fn should_get_flat_ground_height() {
        let ground = Terrain::Ground(GroundConfig {
            height: -1.0,
            noise: Fbm::FLAT,
            scroll: Vector2D::zeros(),
        });
        assert_abs_diff_eq!(ground.distance(&Vector::new(3.0, 1.0, -2.0), &at(0.0)), 2.0);
    }

    #[test]
    fn should_scroll_ground_noise_with_time() {
        let ground = GroundConfig {
            scroll: Vector2D::new(1.0, 0.0),
            ..Default::default()
        };
        let terrain = Terrain::Ground(ground);
        let now = terrain.distance(&Vector::new(1.0, 0.0, 0.0), &at(1.0));
        let before = terrain.distance(&Vector::new(0.0, 0.0, 0.0), &at(0.0));
        assert_abs_diff_eq!(now, before, epsilon = 1e-6);
    }

    #[test]
    fn should_stay_within_dune_amplitude() {
        let dunes = DunesConfig {
            noise: Fbm::FLAT,
            ..Default::default()
        };
        let terrain = Terrain::Dunes(dunes);
        for i in 0..50 {
            let x = i as Value * 0.31;
            let d = terrain.distance(&Vector::new(x, 0.0, -x), &at(0.0));
            assert!(d <= 0.0 && d >= -dunes.amplitude - 1e-6);
        }
    }

    #[test]
    fn should_move_water_waves_with_time() {
        let terrain = Terrain::Water(WaterConfig::default());
        let p = Vector::new(0.3, 0.0, 0.7);
        assert!(terrain.distance(&p, &at(0.0)) != terrain.distance(&p, &at(0.5)));
    }

    #[test]
    fn should_flatten_calm_water() {
        let terrain = Terrain::Water(WaterConfig {
            height: 0.5,
            waves: Vec::new(),
        });
        assert_abs_diff_eq!(terrain.distance(&Vector::new(9.0, 1.5, 9.0), &at(3.0)), 1.0);
    }

    #[test]
    fn should_be_inside_pillar_at_cell_centre() {
        let terrain = Terrain::Pillars(PillarsConfig::default());
        assert!(terrain.distance(&Vector::new(1.5, 0.2, 1.5), &at(0.0)) < 0.0);
        assert!(terrain.distance(&Vector::new(0.0, 0.2, 0.0), &at(0.0)) > 0.0);
    }

    #[test]
    fn should_keep_bubbles_between_floor_and_ceiling() {
        let bubbles = BubblesConfig {
            wobble: 0.0,
            ..Default::default()
        };
        let terrain = Terrain::Bubbles(bubbles);
        // Far above the ceiling every sample is at least the gap away.
        let d = terrain.distance(&Vector::new(1.0, 10.0, 1.0), &at(2.0));
        assert!(d >= 10.0 - bubbles.ceiling - bubbles.radius - 1e-4);
    }

    #[test]
    fn should_reject_overlapping_pillars() {
        let terrain = Terrain::Pillars(PillarsConfig {
            half_width: 2.0,
            ..Default::default()
        });
        assert!(terrain.validate().is_err());
        assert!(Terrain::Pillars(PillarsConfig::default()).validate().is_ok());
    }
}
