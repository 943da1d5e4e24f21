use bevy::prelude::*;
use bevy_sdf_backdrop::{Backdrop, BackdropPlugin, presets::PRESET_NAMES};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            BackdropPlugin {
                render_scale: 0.2,
                ..default()
            },
        ))
        .init_resource::<CurrentPreset>()
        .add_systems(Startup, setup)
        .add_systems(Update, cycle_presets)
        .run();
}

#[derive(Resource, Default)]
struct CurrentPreset(usize);

fn backdrop_node() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        ..default()
    }
}

fn setup(mut commands: Commands, current: Res<CurrentPreset>) {
    commands.spawn(Camera2d);

    match Backdrop::from_preset(PRESET_NAMES[current.0]) {
        Ok(backdrop) => {
            commands.spawn((backdrop, backdrop_node()));
        }
        Err(err) => error!(%err, "could not load preset"),
    }
}

/// Space switches to the next preset.
fn cycle_presets(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    mut current: ResMut<CurrentPreset>,
    backdrops: Query<Entity, With<Backdrop>>,
) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }

    for entity in backdrops.iter() {
        commands.entity(entity).despawn();
    }

    current.0 = (current.0 + 1) % PRESET_NAMES.len();
    let name = PRESET_NAMES[current.0];
    info!(preset = name, "switching backdrop");
    if let Ok(backdrop) = Backdrop::from_preset(name) {
        commands.spawn((backdrop, backdrop_node()));
    }
}
