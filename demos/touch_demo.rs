//! Touch controlled player on a small test level.
//!
//! Left half of the screen: drag to walk. Right half: drag to look around.
//!
//! Settings are read from `touch_controller.json` in the working directory if
//! it exists. Pass `--third-person` to force the third person rig.

use std::path::Path;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::render::camera::Exposure;

use touch_player::*;

const SETTINGS_FILE: &str = "touch_controller.json";

#[derive(PhysicsLayer, Default)]
enum GameLayer {
    #[default]
    Default,
    Player,
    Environment,
}

fn main() {
    let mut settings = if Path::new(SETTINGS_FILE).exists() {
        TouchControllerSettings::load(SETTINGS_FILE).unwrap_or_else(|err| {
            eprintln!("{err:#}, falling back to defaults");
            TouchControllerSettings::default()
        })
    } else {
        TouchControllerSettings::default()
    };
    if std::env::args().any(|arg| arg == "--third-person") {
        settings.mode = ControlMode::ThirdPerson;
    }

    App::new()
        .add_plugins((
            DefaultPlugins,
            PhysicsPlugins::default(),
            bevy_framepace::FramepacePlugin,
            TouchControllerPlugin(settings),
        ))
        .add_systems(Startup, (setup_level, spawn_player))
        .run();
}

fn setup_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 7.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let environment = CollisionLayers::new(GameLayer::Environment, LayerMask::ALL);
    let stone = materials.add(Color::srgb(0.8, 0.7, 0.6));

    // floor
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(100.0, 1.0, 100.0),
        environment,
        Friction::new(0.99),
        Mesh3d(meshes.add(Cuboid::new(100.0, 1.0, 100.0))),
        MeshMaterial3d(stone.clone()),
        Transform::from_xyz(0.0, -0.5, 0.0),
    ));

    // pillars for the third person camera to bump into
    for (x, z) in [(4.0, -3.0), (-5.0, 2.0), (1.0, 6.0), (-2.0, -8.0)] {
        commands.spawn((
            RigidBody::Static,
            Collider::cuboid(1.0, 4.0, 1.0),
            environment,
            Mesh3d(meshes.add(Cuboid::new(1.0, 4.0, 1.0))),
            MeshMaterial3d(stone.clone()),
            Transform::from_xyz(x, 2.0, z),
        ));
    }
}

fn spawn_player(
    mut commands: Commands,
    settings: Res<TouchControllerSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let height = 1.8;
    let player = commands
        .spawn((
            Collider::cylinder(0.4, height),
            CollisionLayers::new(GameLayer::Player, [GameLayer::Default, GameLayer::Environment]),
            Friction::new(0.0),
            Restitution {
                coefficient: 0.0,
                combine_rule: CoefficientCombine::Min,
            },
            LinearVelocity::ZERO,
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Mass(70.0),
            Transform::from_xyz(0.0, height / 2.0, 0.0),
            Visibility::default(),
            TouchPlayer::new(settings.mode),
        ))
        .id();

    match settings.mode {
        ControlMode::FirstPerson => {
            commands.spawn((
                Camera3d::default(),
                Exposure::SUNLIGHT,
                PitchPivot { player },
                Transform::from_xyz(0.0, height / 2.0 - 0.1, 0.0),
                ChildOf(player),
            ));
        }
        ControlMode::ThirdPerson => {
            let boom = commands
                .spawn((
                    PitchPivot { player },
                    Transform::from_xyz(0.0, height / 2.0, 0.0)
                        .with_rotation(Quat::from_rotation_x(-0.3)),
                    Visibility::default(),
                    ChildOf(player),
                ))
                .id();
            let camera = commands
                .spawn((
                    Camera3d::default(),
                    Exposure::SUNLIGHT,
                    Transform::from_xyz(0.0, 0.0, 4.0),
                    ChildOf(boom),
                ))
                .id();
            commands
                .entity(boom)
                .insert(CameraBoom::new(camera, GameLayer::Environment));

            let body = commands
                .spawn((
                    PlayerGraphics { player },
                    Mesh3d(meshes.add(Capsule3d::new(0.4, height - 0.8))),
                    MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.8))),
                    Transform::default(),
                    ChildOf(player),
                ))
                .id();
            // nose, so the facing is visible
            commands.spawn((
                Mesh3d(meshes.add(Cuboid::new(0.2, 0.2, 0.3))),
                MeshMaterial3d(materials.add(Color::srgb(0.9, 0.3, 0.2))),
                Transform::from_xyz(0.0, 0.5, -0.45),
                ChildOf(body),
            ));
        }
    }
}
