use bevy::{
    asset::RenderAssetUsages,
    ecs::entity::EntityHashMap,
    prelude::*,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
    window::{CursorLeft, CursorMoved, PrimaryWindow, WindowResized},
};

use crate::{
    backdrop::{Backdrop, RenderedFrame},
    clock::ManualClock,
    controller::UniformController,
    frame::Frame,
    registry::VariantId,
    render::render_frame,
    types::{Value, Vector2D},
    utils::{client_to_ndc, scaled_extent},
    variant::SceneVariant,
};

/// System sets for the backdrop pipeline.
///
/// Use these to order your own systems relative to rendering:
///
/// ```rust,ignore
/// // Tint finished frames before they reach the GPU:
/// app.add_systems(Update, tint_frames.after(BackdropSet::Generate)
///                                    .before(BackdropSet::Upload));
/// ```
///
/// ```text
/// BackdropSet::Animate  →  BackdropSet::Spawn  →  [async compute]  →  BackdropSet::Generate  →  [your systems]  →  BackdropSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackdropSet {
    /// Feeds time, pointer and window events into the [`BackdropController`].
    Animate,
    /// Spawns an async render task per ready [`Backdrop`].
    Spawn,
    /// Polls render tasks and inserts [`RenderedFrame`] on completion.
    Generate,
    /// Copies [`RenderedFrame`] pixels into the backdrop's [`Image`].
    Upload,
}

/// Holds the in-flight render task for a [`Backdrop`].
#[derive(Component)]
pub struct RenderTask(Task<Frame>);

/// Runtime configuration for the backdrop pipeline.
///
/// Inserted as a resource by [`BackdropPlugin`]:
///
/// ```rust,ignore
/// app.add_plugins(BackdropPlugin { render_scale: 0.5, ..default() });
///
/// // Or change it at runtime:
/// fn low_power(mut config: ResMut<BackdropConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource, Debug)]
pub struct BackdropConfig {
    /// Maximum number of render tasks spawned per frame. Default: `2`.
    pub max_tasks_per_frame: usize,
    /// Render resolution relative to the window size. Default: `0.25`.
    ///
    /// Every pixel runs a full raymarch on the CPU, so full resolution is
    /// rarely affordable.
    pub render_scale: Value,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 2,
            render_scale: 0.25,
        }
    }
}

/// The [`UniformController`] driving every [`Backdrop`], fed by Bevy's [`Time`].
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct BackdropController(pub UniformController<ManualClock>);

impl Default for BackdropController {
    fn default() -> Self {
        Self(UniformController::with_clock(ManualClock::default()))
    }
}

/// Which variant each backdrop entity registered, so despawns can release it.
#[derive(Resource, Debug, Default)]
struct BackdropIndex(EntityHashMap<VariantId>);

/// Bevy plugin that animates and renders [`Backdrop`]s.
///
/// When the `auto_render` feature is enabled, any [`Backdrop`] added to the
/// world is registered and re-rendered every frame. Rendering runs on Bevy's
/// `AsyncComputeTaskPool` so the main thread is never blocked:
///
/// ```text
/// Backdrop added
///   → variant registered, Image + ImageNode inserted   (register_backdrops)
///   → uniforms advanced                                 (BackdropSet::Animate)
///   → RenderTask spawned on a variant snapshot          (BackdropSet::Spawn)
///   → [async compute runs]
///   → RenderedFrame inserted                            (BackdropSet::Generate)
///   → [your systems here]
///   → Image updated, RenderedFrame removed              (BackdropSet::Upload)
/// Backdrop removed
///   → variant unregistered                              (release_backdrops)
/// ```
pub struct BackdropPlugin {
    /// Initial value for [`BackdropConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
    /// Initial value for [`BackdropConfig::render_scale`].
    pub render_scale: Value,
}

impl Default for BackdropPlugin {
    fn default() -> Self {
        let config = BackdropConfig::default();
        Self {
            max_tasks_per_frame: config.max_tasks_per_frame,
            render_scale: config.render_scale,
        }
    }
}

impl Plugin for BackdropPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(BackdropConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
            render_scale: self.render_scale,
        })
        .init_resource::<BackdropController>()
        .init_resource::<BackdropIndex>();

        #[cfg(feature = "auto_render")]
        app.configure_sets(
            Update,
            (
                BackdropSet::Animate,
                BackdropSet::Spawn,
                BackdropSet::Generate,
                BackdropSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                (register_backdrops, animate_uniforms)
                    .chain()
                    .in_set(BackdropSet::Animate),
                spawn_render_tasks.in_set(BackdropSet::Spawn),
                poll_render_tasks.in_set(BackdropSet::Generate),
                upload_frames.in_set(BackdropSet::Upload),
                release_backdrops.before(BackdropSet::Animate),
            ),
        )
        .add_systems(Last, dispose_on_exit);
    }
}

/// Size of the render target for a window, after [`BackdropConfig::render_scale`].
fn render_extent(window: &Window, config: &BackdropConfig) -> (u32, u32) {
    scaled_extent(window.width(), window.height(), config.render_scale)
}

fn blank_image(width: u32, height: u32) -> Image {
    Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// Builds and registers the variant of every newly added [`Backdrop`].
///
/// Each entity gets its own variant, keyed by the config name and the entity,
/// so two backdrops showing the same preset never share one. Invalid
/// configurations are logged and leave the backdrop unregistered; it never
/// renders.
fn register_backdrops(
    mut commands: Commands,
    config: Res<BackdropConfig>,
    mut controller: ResMut<BackdropController>,
    mut index: ResMut<BackdropIndex>,
    mut images: ResMut<Assets<Image>>,
    window: Query<&Window, With<PrimaryWindow>>,
    mut query: Query<(Entity, &mut Backdrop), Added<Backdrop>>,
) {
    for (entity, mut backdrop) in query.iter_mut() {
        let mut variant_config = backdrop.config.clone();
        variant_config.name = format!("{}#{entity}", variant_config.name);
        if let Ok(window) = window.single() {
            let (width, height) = render_extent(window, &config);
            variant_config.resolution = Vector2D::new(width as Value, height as Value);
        }

        let variant = match SceneVariant::new(variant_config) {
            Ok(variant) => variant,
            Err(err) => {
                warn!(?entity, %err, "backdrop has an invalid configuration");
                continue;
            }
        };
        let resolution = variant.uniforms().resolution;

        let Some(id) = controller.register_variant(variant) else {
            continue;
        };
        index.0.insert(entity, id);

        let image = images.add(blank_image(resolution.x as u32, resolution.y as u32));
        backdrop.variant = Some(id);
        backdrop.image = Some(image.clone());
        commands.entity(entity).insert(ImageNode::new(image));
    }
}

/// Drives the controller from [`Time`] and the window messages of this frame.
///
/// The tick runs first so pointer reactions are visible in the frame rendered
/// right after the move.
fn animate_uniforms(
    time: Res<Time>,
    config: Res<BackdropConfig>,
    mut controller: ResMut<BackdropController>,
    windows: Query<&Window>,
    mut resized: MessageReader<WindowResized>,
    mut moved: MessageReader<CursorMoved>,
    mut left: MessageReader<CursorLeft>,
) {
    controller.clock_mut().set(time.elapsed_secs());
    controller.tick(time.delta_secs());

    if let Some(resize) = resized.read().last() {
        let (width, height) = scaled_extent(resize.width, resize.height, config.render_scale);
        controller.on_resize(width as Value, height as Value);
    }

    if let Some(cursor) = moved.read().last() {
        let ndc = windows.get(cursor.window).ok().and_then(|window| {
            client_to_ndc(
                Vector2D::new(cursor.position.x, cursor.position.y),
                Vector2D::new(window.width(), window.height()),
            )
        });
        if let Some(ndc) = ndc {
            controller.on_pointer_move_ndc(ndc);
        }
    }

    if left.read().count() > 0 {
        controller.on_pointer_leave();
    }
}

/// Spawns async render tasks for registered [`Backdrop`]s, up to
/// [`BackdropConfig::max_tasks_per_frame`] per frame.
fn spawn_render_tasks(
    mut commands: Commands,
    config: Res<BackdropConfig>,
    controller: Res<BackdropController>,
    query: Query<(Entity, &Backdrop), (Without<RenderTask>, Without<RenderedFrame>)>,
) {
    let task_pool = AsyncComputeTaskPool::get();

    let ready = query
        .iter()
        .filter(|(_, backdrop)| backdrop.animate || backdrop.frames == 0)
        .filter_map(|(entity, backdrop)| {
            let variant = controller.variant(backdrop.variant?)?;
            Some((entity, variant))
        });

    for (entity, variant) in ready.take(config.max_tasks_per_frame) {
        // Frozen copy: later uniform pushes wait for the next frame.
        let snapshot = variant.clone();
        let resolution = snapshot.uniforms().resolution;
        let (width, height) = (resolution.x as usize, resolution.y as usize);

        let task = task_pool.spawn(async move { render_frame(&snapshot, width, height) });

        commands.entity(entity).insert(RenderTask(task));
    }
}

/// Polls in-flight [`RenderTask`]s each frame and inserts [`RenderedFrame`] on completion.
///
/// Non-blocking: tasks that haven't finished are skipped and retried next frame.
fn poll_render_tasks(mut commands: Commands, mut query: Query<(Entity, &mut RenderTask)>) {
    for (entity, mut render_task) in query.iter_mut() {
        if let Some(frame) = block_on(future::poll_once(&mut render_task.0)) {
            commands
                .entity(entity)
                .insert(RenderedFrame(frame))
                .remove::<RenderTask>();
        }
    }
}

/// Copies each [`RenderedFrame`] into its backdrop's [`Image`], then removes it.
///
/// A frame of a new size replaces the image instead of writing into it.
fn upload_frames(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut query: Query<(Entity, &mut Backdrop, &RenderedFrame, Option<&mut ImageNode>)>,
) {
    for (entity, mut backdrop, rendered, image_node) in query.iter_mut() {
        commands.entity(entity).remove::<RenderedFrame>();

        let frame = &rendered.0;
        let (width, height) = (frame.width() as u32, frame.height() as u32);
        if width == 0 || height == 0 {
            continue;
        }

        let copied = backdrop
            .image
            .as_ref()
            .and_then(|handle| images.get_mut(handle))
            .and_then(|mut image| {
                if image.width() != width || image.height() != height {
                    return None;
                }
                image.data.as_mut().map(|data| frame.copy_into(data))
            })
            .unwrap_or(false);

        if !copied {
            let mut image = blank_image(width, height);
            image.data = Some(frame.to_rgba8());
            let handle = images.add(image);
            debug!(?entity, width, height, "backdrop image resized");
            if let Some(mut image_node) = image_node {
                image_node.image = handle.clone();
            }
            backdrop.image = Some(handle);
        }
        backdrop.frames += 1;
    }
}

/// Unregisters the variants of despawned backdrops.
fn release_backdrops(
    mut removed: RemovedComponents<Backdrop>,
    mut controller: ResMut<BackdropController>,
    mut index: ResMut<BackdropIndex>,
) {
    for entity in removed.read() {
        if let Some(id) = index.0.remove(&entity) {
            controller.unregister_variant(id);
        }
    }
}

fn dispose_on_exit(mut exit: MessageReader<AppExit>, mut controller: ResMut<BackdropController>) {
    if exit.read().count() > 0 {
        controller.dispose();
    }
}

#[cfg(all(test, feature = "auto_render"))]
mod test {
    use super::*;
    use bevy::asset::AssetPlugin;

    fn app(max_tasks_per_frame: usize) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .add_message::<WindowResized>()
            .add_message::<CursorMoved>()
            .add_message::<CursorLeft>()
            .add_plugins(BackdropPlugin {
                max_tasks_per_frame,
                ..default()
            });
        app
    }

    fn backdrop(name: &str) -> Backdrop {
        let mut backdrop = Backdrop::from_preset(name).unwrap();
        backdrop.config = backdrop.config.with_resolution(16.0, 9.0);
        backdrop
    }

    fn variant_of(app: &App, entity: Entity) -> VariantId {
        app.world()
            .get::<Backdrop>(entity)
            .and_then(Backdrop::variant)
            .unwrap()
    }

    #[test]
    fn should_give_each_backdrop_its_own_variant() {
        let mut app = app(0);
        let a = app.world_mut().spawn(backdrop("meadow")).id();
        let b = app.world_mut().spawn(backdrop("meadow")).id();
        app.update();

        let (id_a, id_b) = (variant_of(&app, a), variant_of(&app, b));
        assert_ne!(id_a, id_b);
        assert_eq!(app.world().resource::<BackdropController>().variants().len(), 2);
        assert!(app.world().get::<ImageNode>(a).is_some());

        app.world_mut().despawn(a);
        app.update();

        let controller = app.world().resource::<BackdropController>();
        assert!(controller.variant(id_a).is_none());
        assert!(controller.variant(id_b).is_some());
        assert_eq!(controller.variants().len(), 1);
    }

    #[test]
    fn should_release_before_registering_a_replacement() {
        let mut app = app(0);
        let old = app.world_mut().spawn(backdrop("forge")).id();
        app.update();
        let old_id = variant_of(&app, old);

        app.world_mut().despawn(old);
        let new = app.world_mut().spawn(backdrop("forge")).id();
        app.update();

        let new_id = variant_of(&app, new);
        let controller = app.world().resource::<BackdropController>();
        assert!(controller.variant(old_id).is_none());
        assert!(controller.variant(new_id).is_some());
        assert_eq!(controller.variants().len(), 1);
    }

    #[test]
    fn should_leave_invalid_backdrops_unregistered() {
        let mut app = app(0);
        let mut broken = backdrop("dunes");
        broken.config = broken.config.with_resolution(0.0, 9.0);
        let entity = app.world_mut().spawn(broken).id();
        app.update();

        let backdrop = app.world().get::<Backdrop>(entity).unwrap();
        assert!(backdrop.variant().is_none());
        assert!(app.world().get::<ImageNode>(entity).is_none());
        assert!(app.world().resource::<BackdropController>().variants().is_empty());
    }

    #[test]
    fn should_upload_rendered_frames() {
        let mut app = app(2);
        let entity = app
            .world_mut()
            .spawn(backdrop("deep_sea").with_animate(false))
            .id();

        for _ in 0..500 {
            app.update();
            if app.world().get::<Backdrop>(entity).unwrap().frames() > 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let backdrop = app.world().get::<Backdrop>(entity).unwrap();
        assert_eq!(backdrop.frames(), 1);
        let image = app
            .world()
            .resource::<Assets<Image>>()
            .get(backdrop.image().unwrap())
            .unwrap();
        assert_eq!((image.width(), image.height()), (16, 9));
    }

    #[test]
    fn should_dispose_controller_on_exit() {
        let mut app = app(0);
        app.update();
        app.world_mut().write_message(AppExit::Success);
        app.update();
        assert!(app.world().resource::<BackdropController>().is_disposed());
    }
}
