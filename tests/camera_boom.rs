//! Third person camera boom against real avian colliders, headless.

use std::time::Duration;

use avian3d::prelude::*;
use bevy::input::InputPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use touch_player::*;

const EPSILON: f32 = 1e-3;

struct BoomRig {
    boom: Entity,
    camera: Entity,
}

/// Helper: headless app with physics and the touch controller.
fn create_physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        TransformPlugin,
        AssetPlugin::default(),
        bevy::scene::ScenePlugin,
        InputPlugin,
        PhysicsPlugins::default(),
        TouchControllerPlugin(TouchControllerSettings {
            mode: ControlMode::ThirdPerson,
            ..default()
        }),
    ))
    .init_asset::<Mesh>()
    .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(20)));
    // `app.update()` does not run plugin `finish`/`cleanup`; avian registers resources there.
    app.finish();
    app.cleanup();
    app
}

/// Player at the origin, boom on it, camera 4 units behind along +Z.
fn spawn_boom_rig(app: &mut App, mode: ControlMode) -> BoomRig {
    let world = app.world_mut();
    let player = world
        .spawn((TouchPlayer::new(mode), Transform::default()))
        .id();
    let boom = world
        .spawn((PitchPivot { player }, Transform::default(), ChildOf(player)))
        .id();
    let camera = world
        .spawn((Transform::from_xyz(0.0, 0.0, 4.0), ChildOf(boom)))
        .id();
    world
        .entity_mut(boom)
        .insert(CameraBoom::new(camera, LayerMask::ALL));
    BoomRig { boom, camera }
}

/// Wall whose near face sits at z = 1.5.
fn spawn_wall(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            RigidBody::Static,
            Collider::cuboid(4.0, 4.0, 1.0),
            Transform::from_xyz(0.0, 0.0, 2.0),
        ))
        .id()
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn camera_local(app: &App, camera: Entity) -> Vec3 {
    app.world().get::<Transform>(camera).unwrap().translation
}

#[test]
fn boom_length_comes_from_camera_spawn_position() {
    let mut app = create_physics_app();
    let rig = spawn_boom_rig(&mut app, ControlMode::ThirdPerson);
    run_frames(&mut app, 2);

    let boom = app.world().get::<CameraBoom>(rig.boom).unwrap();
    assert_eq!(boom.max_distance, 4.0);
}

#[test]
fn wall_pulls_camera_in_and_clears_when_removed() {
    let mut app = create_physics_app();
    let rig = spawn_boom_rig(&mut app, ControlMode::ThirdPerson);
    let wall = spawn_wall(&mut app);
    run_frames(&mut app, 10);

    let local = camera_local(&app, rig.camera);
    assert!(
        local.abs_diff_eq(Vec3::new(0.0, 0.0, 1.5), EPSILON),
        "camera at {local}"
    );

    app.world_mut().despawn(wall);
    run_frames(&mut app, 10);

    let local = camera_local(&app, rig.camera);
    assert!(
        local.abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), EPSILON),
        "camera at {local}"
    );
}

#[test]
fn first_person_rig_ignores_the_boom() {
    let mut app = create_physics_app();
    let rig = spawn_boom_rig(&mut app, ControlMode::FirstPerson);
    spawn_wall(&mut app);
    run_frames(&mut app, 10);

    assert_eq!(camera_local(&app, rig.camera), Vec3::new(0.0, 0.0, 4.0));
}
