//! Ready-made looks.
//!
//! Each preset is plain data: a [`SceneDescription`] plus camera, march and
//! shading records. Tweak a returned [`VariantConfig`] with its `with_*`
//! methods to derive a new look.

use std::{f32::consts::FRAC_PI_4, sync::Arc};

use crate::{
    camera::{CameraMotion, CameraRig},
    composer::{Blend, SceneDescription},
    creature::{CellVariation, CreatureConfig, CreaturePopulation, CreatureShape},
    error::{BackdropError, Result},
    field::FieldNode,
    march::MarchConfig,
    noise::Fbm,
    palette::CosinePalette,
    shading::{PaletteSource, ShadePipeline, ShadeStage, ShadowConfig},
    terrain::{BubblesConfig, DunesConfig, GroundConfig, PillarsConfig, Terrain, Wave, WaterConfig},
    types::{Point, Rgba, Vector, Vector2D},
    variant::VariantConfig,
};

pub const PRESET_NAMES: [&str; 6] = ["meadow", "dunes", "deep_sea", "forge", "tidepool", "nebula"];

/// Looks up a preset by name.
pub fn preset(name: &str) -> Result<VariantConfig> {
    match name {
        "meadow" => Ok(meadow()),
        "dunes" => Ok(dunes()),
        "deep_sea" => Ok(deep_sea()),
        "forge" => Ok(forge()),
        "tidepool" => Ok(tidepool()),
        "nebula" => Ok(nebula()),
        _ => Err(BackdropError::UnknownPreset(name.to_owned())),
    }
}

/// Every preset, in [`PRESET_NAMES`] order.
pub fn all_presets() -> Vec<VariantConfig> {
    vec![meadow(), dunes(), deep_sea(), forge(), tidepool(), nebula()]
}

fn pointer_glow() -> ShadeStage {
    ShadeStage::PointerGlow {
        radius: 0.6,
        strength: 0.25,
        opacity_falloff: 0.3,
        min_opacity: 0.6,
    }
}

/// Flowers swaying over rolling grass.
pub fn meadow() -> VariantConfig {
    let flowers = CreaturePopulation::new(
        CreatureConfig::new(CreatureShape::Flower { petals: 6, depth: 0.35 }, 0.4)
            .with_spin(0.3)
            .with_shape_response(0.2),
        Vector::new(2.5, 0.0, 2.5),
    )
    .with_anchor(Vector::new(0.0, 0.6, 0.0));

    let scene = SceneDescription::new(Blend::smooth(0.6))
        .with_terrain(Terrain::Ground(GroundConfig {
            height: 0.0,
            noise: Fbm::default().with_amplitude(0.25),
            scroll: Vector2D::new(0.0, 0.2),
        }))
        .with_population(flowers);

    let shading = ShadePipeline::default()
        .with_stage(ShadeStage::Lambert {
            light_dir: Vector::new(0.4, 1.0, -0.3),
            ambient: 0.35,
        })
        .with_stage(ShadeStage::Shadow { strength: 0.8 })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::MOSS,
            source: PaletteSource::Shadow,
            weight: 0.6,
            cycle_speed: 0.02,
        })
        .with_stage(pointer_glow());

    VariantConfig::new("meadow", scene)
        .with_camera(CameraRig::default().with_motion(CameraMotion::Sway {
            amplitude: Vector2D::new(0.3, 0.1),
            speed: 0.4,
        }))
        .with_shadow(ShadowConfig::default(), Point::new(2.0, 5.0, -3.0))
        .with_shading(shading)
}

/// Starfish drifting across wind-shaped dunes at dusk.
pub fn dunes() -> VariantConfig {
    let stars = CreaturePopulation::new(
        CreatureConfig::new(CreatureShape::Star { arms: 5, depth: 0.4 }, 0.35)
            .with_shape_response(0.3),
        Vector::new(3.0, 0.0, 3.0),
    )
    .with_anchor(Vector::new(0.0, 0.5, 0.0))
    .with_drift(Vector::new(0.3, 0.0, 0.0));

    let scene = SceneDescription::new(Blend::exponential(0.4))
        .with_terrain(Terrain::Dunes(DunesConfig::default()))
        .with_population(stars);

    let sand = Rgba::new(1.0, 0.9, 0.75, 1.0);
    let dusk = Rgba::new(0.15, 0.08, 0.2, 1.0);
    let shading = ShadePipeline::new(sand, dusk)
        .with_stage(ShadeStage::DepthGrey { weight: 0.5 })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::SUNSET,
            source: PaletteSource::Depth,
            weight: 0.7,
            cycle_speed: 0.0,
        })
        .with_stage(ShadeStage::Fog {
            density: 0.05,
            color: Rgba::new(0.6, 0.35, 0.4, 1.0),
        })
        .with_stage(pointer_glow());

    VariantConfig::new("dunes", scene)
        .with_camera(
            CameraRig::looking_at(Point::new(0.0, 1.5, -4.0), Point::new(0.0, 0.3, 0.0))
                .with_motion(CameraMotion::Fly { velocity: Vector::new(0.0, 0.0, 0.5) }),
        )
        .with_shading(shading)
}

/// Jellyfish and rising bubbles above a dark sea floor.
pub fn deep_sea() -> VariantConfig {
    let jellies = CreaturePopulation::new(
        CreatureConfig::new(
            CreatureShape::Jelly {
                lobes: 8,
                wobble: 0.15,
                speed: 1.5,
            },
            0.45,
        )
        .with_thickness(0.2),
        Vector::new(3.0, 0.0, 3.5),
    )
    .with_anchor(Vector::new(0.0, 1.6, 0.0))
    .with_variation(CellVariation {
        bob_amplitude: 0.3,
        bob_speed: 0.8,
        explode_reach: 0.6,
        ..Default::default()
    });

    let scene = SceneDescription::new(Blend::smooth(0.8))
        .with_terrain(Terrain::Ground(GroundConfig {
            height: -0.2,
            noise: Fbm::default().with_frequency(0.6),
            scroll: Vector2D::zeros(),
        }))
        .with_terrain(Terrain::Bubbles(BubblesConfig {
            floor: -0.2,
            ceiling: 5.0,
            ..Default::default()
        }))
        .with_population(jellies);

    let shading = ShadePipeline::new(Rgba::new(0.7, 0.9, 1.0, 1.0), Rgba::new(0.0, 0.03, 0.08, 1.0))
        .with_stage(ShadeStage::Lambert {
            light_dir: Vector::new(0.0, 1.0, 0.2),
            ambient: 0.2,
        })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::DEEP_SEA,
            source: PaletteSource::Focus,
            weight: 0.5,
            cycle_speed: 0.05,
        })
        .with_stage(ShadeStage::Fog {
            density: 0.12,
            color: Rgba::new(0.0, 0.05, 0.12, 1.0),
        })
        .with_stage(pointer_glow());

    VariantConfig::new("deep_sea", scene)
        .with_camera(CameraRig::default().with_motion(CameraMotion::Dolly {
            span: 0.5,
            speed: 0.2,
        }))
        .with_shading(shading)
}

/// Urchins wedged between glowing pillars.
pub fn forge() -> VariantConfig {
    let urchins = CreaturePopulation::new(
        CreatureConfig::new(
            CreatureShape::Urchin {
                spikes: 14,
                sharpness: 6.0,
                depth: 0.5,
            },
            0.3,
        )
        .with_spin(0.8),
        Vector::new(3.0, 0.0, 3.0),
    )
    .with_anchor(Vector::new(1.5, 0.4, 1.5));

    let scene = SceneDescription::new(Blend::smooth(0.3))
        .with_terrain(Terrain::Ground(GroundConfig {
            noise: Fbm::FLAT,
            ..Default::default()
        }))
        .with_terrain(Terrain::Pillars(PillarsConfig {
            sway: 0.05,
            ..Default::default()
        }))
        .with_population(urchins);

    let shading = ShadePipeline::new(Rgba::new(1.0, 0.8, 0.6, 1.0), Rgba::new(0.05, 0.02, 0.0, 1.0))
        .with_stage(ShadeStage::DepthGrey { weight: 0.4 })
        .with_stage(ShadeStage::Shadow { strength: 1.0 })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::EMBER,
            source: PaletteSource::RayPower {
                power: 2.0,
                noise: Fbm::default().with_amplitude(0.1),
            },
            weight: 0.8,
            cycle_speed: 0.1,
        })
        .with_stage(ShadeStage::TimeOscillation {
            amplitude: 0.3,
            speed: 2.0,
            spatial_frequency: 10.0,
        });

    VariantConfig::new("forge", scene)
        .with_camera(
            CameraRig::looking_at(Point::new(0.0, 2.0, -5.0), Point::new(0.0, 0.8, 0.0))
                .with_motion(CameraMotion::Orbit {
                    radius: 5.0,
                    height: 2.0,
                    speed: 0.1,
                }),
        )
        .with_march(MarchConfig::default().with_step_scale(0.8))
        .with_shadow(ShadowConfig::default(), Point::new(-3.0, 6.0, -2.0))
        .with_shading(shading)
}

/// Spirals spinning on a rippling water surface.
pub fn tidepool() -> VariantConfig {
    let spirals = CreaturePopulation::new(
        CreatureConfig::new(
            CreatureShape::Spiral {
                arms: 3,
                twist: 4.0,
                depth: 0.3,
            },
            0.4,
        )
        .with_spin(-0.5)
        .with_shape_response(0.15),
        Vector::new(2.0, 0.0, 2.0),
    )
    .with_anchor(Vector::new(0.0, 0.3, 0.0));

    let ripple = FieldNode::sphere(0.6).repeated(Vector::new(1.5, 0.0, 1.5));
    let scene = SceneDescription::new(Blend::smooth(0.5))
        .with_terrain(Terrain::Water(WaterConfig {
            height: 0.0,
            waves: vec![
                Wave {
                    amplitude: 0.08,
                    wavelength: 2.0,
                    speed: 0.6,
                    direction: 0.0,
                },
                Wave {
                    amplitude: 0.04,
                    wavelength: 0.9,
                    speed: 0.9,
                    direction: FRAC_PI_4,
                },
            ],
        }))
        .with_population(spirals);

    let foam = Rgba::new(0.8, 0.95, 1.0, 1.0);
    let sky = Rgba::new(0.85, 0.95, 1.0, 1.0);
    let shading = ShadePipeline::new(foam, sky)
        .with_stage(ShadeStage::Lambert {
            light_dir: Vector::new(-0.3, 1.0, -0.5),
            ambient: 0.4,
        })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::RAINBOW,
            source: PaletteSource::SecondaryField {
                node: Arc::new(ripple),
                scale: 0.5,
            },
            weight: 0.35,
            cycle_speed: 0.03,
        })
        .with_stage(pointer_glow());

    VariantConfig::new("tidepool", scene)
        .with_camera(CameraRig::looking_at(Point::new(0.0, 2.5, -3.0), Point::new(0.0, 0.0, 1.0)))
        .with_shading(shading)
}

/// Floating blobs in a noise-warped void.
///
/// The noise overlay is summed onto the blended distance, so the march only
/// approximates the surface; the smaller step scale keeps it from tunnelling.
pub fn nebula() -> VariantConfig {
    let blobs = CreaturePopulation::new(
        CreatureConfig::new(CreatureShape::Blob { depth: 0.25, speed: 0.7 }, 0.6)
            .with_thickness(0.4)
            .with_shape_response(0.25),
        Vector::new(3.0, 3.0, 3.0),
    )
    .with_variation(CellVariation {
        explode_reach: 0.8,
        ..Default::default()
    });

    let core = FieldNode::sphere(0.9)
        .spinning(0.2)
        .translated(Vector::new(0.0, 0.5, 1.5))
        .displaced(Fbm::default().with_amplitude(0.15));

    let scene = SceneDescription::new(Blend::smooth(1.2))
        .with_population(blobs)
        .with_prop(core)
        .with_overlay(FieldNode::Noise(Fbm::default().with_frequency(0.8).with_amplitude(0.2)));

    let shading = ShadePipeline::new(Rgba::new(1.0, 1.0, 1.0, 1.0), Rgba::new(0.02, 0.0, 0.05, 1.0))
        .with_stage(ShadeStage::DepthGrey { weight: 1.0 })
        .with_stage(ShadeStage::Palette {
            palette: CosinePalette::RAINBOW,
            source: PaletteSource::RayPower {
                power: 1.5,
                noise: Fbm::default().with_amplitude(0.2),
            },
            weight: 0.9,
            cycle_speed: 0.08,
        })
        .with_stage(ShadeStage::TimeOscillation {
            amplitude: 0.2,
            speed: 1.0,
            spatial_frequency: 10.0,
        })
        .with_stage(pointer_glow());

    VariantConfig::new("nebula", scene)
        .with_march(MarchConfig::default().with_step_scale(0.7))
        .with_shading(shading)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::variant::SceneVariant;

    #[test]
    fn should_build_every_named_preset() {
        for name in PRESET_NAMES {
            let config = preset(name).unwrap();
            assert_eq!(config.name, name);
            assert!(SceneVariant::new(config).is_ok(), "preset {name} failed validation");
        }
    }

    #[test]
    fn should_list_presets_in_name_order() {
        let names: Vec<_> = all_presets().into_iter().map(|config| config.name).collect();
        assert_eq!(names, PRESET_NAMES);
    }

    #[test]
    fn should_reject_unknown_preset() {
        assert_eq!(
            preset("disco").unwrap_err(),
            BackdropError::UnknownPreset("disco".to_owned())
        );
    }

    #[test]
    fn should_evaluate_presets_to_finite_colours() {
        for config in all_presets() {
            let variant = SceneVariant::new(config.with_resolution(32.0, 18.0)).unwrap();
            let pixels = [
                Vector2D::new(16.0, 4.0),
                Vector2D::new(16.0, 14.0),
                Vector2D::new(2.0, 9.0),
            ];
            for pixel in pixels {
                let color = variant.evaluate(pixel);
                assert!(
                    color.iter().all(|c| (0.0..=1.0).contains(c)),
                    "{}: {color:?}",
                    variant.name()
                );
            }
        }
    }
}
