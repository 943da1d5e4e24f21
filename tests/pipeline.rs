use approx::assert_abs_diff_eq;
use bevy_sdf_backdrop::{
    clock::ManualClock,
    composer::{Blend, SceneComposer, SceneDescription},
    controller::UniformController,
    field::{FieldContext, FieldNode},
    march::{MarchConfig, MarchState, Ray, march},
    noise::Fbm,
    presets::{PRESET_NAMES, preset},
    render::render_frame,
    terrain::{GroundConfig, Terrain},
    types::{Point, Value, Vector, Vector2D},
    variant::{SceneVariant, VariantConfig},
};

fn flat_ground() -> SceneDescription {
    SceneDescription::new(Blend::smooth(0.5)).with_terrain(Terrain::Ground(GroundConfig {
        height: 0.0,
        noise: Fbm::FLAT,
        scroll: Vector2D::zeros(),
    }))
}

fn controller() -> UniformController<ManualClock> {
    UniformController::with_clock(ManualClock::default())
}

#[test]
fn should_hit_flat_ground_one_unit_below_camera() {
    let field = SceneComposer::compose(&flat_ground()).unwrap();
    let ctx = FieldContext::default();
    let ray = Ray::new(Point::new(0.0, 1.0, -3.5), Vector::new(0.0, -1.0, 0.0));

    let result = march(&ray, &field.bind(&ctx), &MarchConfig::default());

    assert_eq!(result.exit, MarchState::Hit);
    assert_abs_diff_eq!(result.t, 1.0, epsilon = 1e-3);
    assert!(result.steps <= 5);
}

#[test]
fn should_advance_sine_time_by_one_second_in_sixty_ticks() {
    let mut controller = controller();
    for _ in 0..60 {
        controller.tick(1.0 / 60.0);
    }
    assert_abs_diff_eq!(controller.state().sine_time, 1.0, epsilon = 1e-4);
    assert_eq!(controller.state().ticks, 60);
}

#[test]
fn should_recompute_explode_intensity_on_pointer_move_to_centre() {
    let mut controller = controller();
    let id = controller
        .register_variant(SceneVariant::new(VariantConfig::new("ground", flat_ground())).unwrap())
        .unwrap();
    controller.clock_mut().set(0.75);
    controller.tick(0.25);
    let before = *controller.variant(id).unwrap().uniforms();

    controller.on_pointer_move_ndc(Vector2D::zeros());
    let moved = *controller.variant(id).unwrap().uniforms();
    assert!(moved.hovered);
    assert_eq!(moved.pointer, Vector2D::zeros());
    assert_abs_diff_eq!(moved.explode_intensity, (before.explode_intensity + before.time).sin());

    controller.tick(1.0 / 60.0);
    let ticked = controller.variant(id).unwrap().uniforms();
    assert!(ticked.hovered);
    assert_eq!(ticked.pointer, Vector2D::zeros());
}

#[test]
fn should_leave_pointer_idempotently() {
    let mut controller = controller();
    let id = controller
        .register_variant(SceneVariant::new(VariantConfig::new("ground", flat_ground())).unwrap())
        .unwrap();
    controller.on_pointer_move_ndc(Vector2D::new(0.3, 0.3));

    controller.on_pointer_leave();
    let once = *controller.variant(id).unwrap().uniforms();
    controller.on_pointer_leave();
    let twice = *controller.variant(id).unwrap().uniforms();

    assert!(!once.hovered);
    assert_eq!(once, twice);
}

#[test]
fn should_treat_double_registration_and_stale_ids_as_no_ops() {
    let mut controller = controller();
    let variant = SceneVariant::new(VariantConfig::new("ground", flat_ground())).unwrap();
    let first = controller.register_variant(variant.clone()).unwrap();
    let second = controller.register_variant(variant).unwrap();
    assert_eq!(first, second);
    assert_eq!(controller.variants().len(), 1);

    assert!(controller.unregister_variant(first).is_some());
    assert!(controller.unregister_variant(first).is_none());
    controller.tick(0.1);
    assert!(controller.variants().is_empty());
}

#[test]
fn should_render_identical_frames_for_identical_state() {
    let mut controller = controller();
    let config = preset("meadow").unwrap().with_resolution(24.0, 16.0);
    let id = controller.register_variant(SceneVariant::new(config).unwrap()).unwrap();
    controller.clock_mut().set(3.0);
    controller.tick(0.5);

    let variant = controller.variant(id).unwrap();
    assert_eq!(render_frame(variant, 24, 16), render_frame(variant, 24, 16));
}

#[test]
fn should_follow_resize_in_every_variant() {
    let mut controller = controller();
    let ids: Vec<_> = PRESET_NAMES
        .iter()
        .map(|name| {
            let variant = SceneVariant::new(preset(name).unwrap()).unwrap();
            controller.register_variant(variant).unwrap()
        })
        .collect();

    controller.on_resize(40.0, 30.0);
    for id in ids {
        let uniforms = controller.variant(id).unwrap().uniforms();
        assert_eq!(uniforms.resolution, Vector2D::new(40.0, 30.0));
        assert_eq!(uniforms.time, 0.0);
    }
}

#[test]
fn should_animate_rendered_output_over_time() {
    let drifter = FieldNode::sphere(0.5)
        .translated(Vector::new(0.0, 0.5, 0.0))
        .drifting(Vector::new(1.0, 0.0, 0.0));
    let scene = flat_ground().with_prop(drifter);
    let config = VariantConfig::new("drift", scene).with_resolution(32.0, 18.0);
    let mut controller = controller();
    let id = controller.register_variant(SceneVariant::new(config).unwrap()).unwrap();

    controller.tick(0.0);
    let still = render_frame(controller.variant(id).unwrap(), 32, 18);
    controller.clock_mut().set(1.0);
    controller.tick(1.0);
    let moved = render_frame(controller.variant(id).unwrap(), 32, 18);

    assert_ne!(still, moved);
    let elapsed: Value = controller.variant(id).unwrap().uniforms().time;
    assert_eq!(elapsed, 1.0);
}
