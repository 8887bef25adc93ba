use avian3d::prelude::*;
use bevy::prelude::*;

use crate::camera_boom::{init_camera_boom, update_camera_boom};
use crate::input_plugin::{ScreenZones, TouchInputPlugin, TouchZones};
use crate::settings::{ControlMode, TouchControllerSettings};

/// Touch driven player controls. Touch tracking happens in `PreUpdate`, look
/// and steering in `Update`, and everything that talks to physics in
/// `FixedUpdate`.
///
/// Systems that want to read the frame's look/steer result should run
/// after [`TouchControllerSet`]:
///
/// ```
/// # use bevy::prelude::*;
/// # use touch_player::TouchControllerSet;
/// struct MyPlugin;
/// impl Plugin for MyPlugin {
///     fn build(&self, app: &mut App) {
///         app.add_systems(Update, my_system.after(TouchControllerSet));
///     }
/// }
///
/// fn my_system() {}
/// ```
#[derive(Default)]
pub struct TouchControllerPlugin(pub TouchControllerSettings);

impl Plugin for TouchControllerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<TouchControllerSettings>()
            .register_type::<TouchPlayer>()
            .insert_resource(self.0.clone())
            .add_plugins(TouchInputPlugin)
            .add_systems(
                Update,
                (init_pivots, init_camera_boom, look_around, steer)
                    .chain()
                    .in_set(TouchControllerSet),
            )
            .add_systems(
                FixedUpdate,
                (
                    apply_wish_velocity,
                    update_camera_boom.run_if(resource_exists::<SpatialQueryPipeline>),
                ),
            );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TouchControllerSet;

/// The physics body the touch controls drive.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct TouchPlayer {
    pub mode: ControlMode,
    /// Camera pitch in radians, positive looks up.
    pub pitch: f32,
    /// Whether the move finger is outside the dead zone.
    pub is_moving: bool,
    /// Planar velocity requested by the move finger, in world space.
    pub wish_velocity: Vec3,
}

impl TouchPlayer {
    pub fn new(mode: ControlMode) -> Self {
        Self {
            mode,
            ..default()
        }
    }
}

/// The entity that pitches: the camera itself in first person, the camera
/// boom in third person.
#[derive(Component, Debug, Clone, Copy)]
pub struct PitchPivot {
    pub player: Entity,
}

/// Visual model of a third person player. It keeps its world facing while the
/// player turns in place and snaps back in line once the player walks.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerGraphics {
    pub player: Entity,
}

/// Result of one look step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookStep {
    pub pitch: f32,
    /// Rotation about the player's up axis, positive turns left.
    pub yaw_delta: f32,
}

/// Maps the look finger's scaled delta (screen orientation, y down) to a new
/// pitch and a yaw step. Dragging up looks up, dragging right turns right.
pub fn look_step(pitch: f32, look_input: Vec2, pitch_limit: f32) -> LookStep {
    LookStep {
        pitch: (pitch - look_input.y).clamp(-pitch_limit, pitch_limit),
        yaw_delta: -look_input.x,
    }
}

/// World space planar velocity for the given stick offset, or `None` while the
/// offset is inside the dead zone.
pub fn planar_velocity(
    move_input: Vec2,
    dead_zone_sq: f32,
    speed: f32,
    right: Vec3,
    forward: Vec3,
) -> Option<Vec3> {
    if move_input.length_squared() <= dead_zone_sq {
        return None;
    }
    let direction = move_input.normalize() * speed;
    Some(right * direction.x + forward * direction.y)
}

pub fn init_pivots(
    pivots: Query<(&PitchPivot, &Transform), Added<PitchPivot>>,
    mut players: Query<&mut TouchPlayer>,
) {
    for (pivot, transform) in &pivots {
        let Ok(mut player) = players.get_mut(pivot.player) else {
            warn!("pitch pivot points at {} which is not a touch player", pivot.player);
            continue;
        };
        let (_, pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
        player.pitch = pitch;
    }
}

pub fn look_around(
    touch_zones: Res<TouchZones>,
    settings: Res<TouchControllerSettings>,
    mut players: Query<(&mut TouchPlayer, &mut Transform)>,
    mut pivots: Query<(&PitchPivot, &mut Transform), Without<TouchPlayer>>,
    mut graphics: Query<
        (&PlayerGraphics, &mut Transform),
        (Without<TouchPlayer>, Without<PitchPivot>),
    >,
) {
    if !touch_zones.is_looking_finger_down() {
        return;
    }

    for (mut player, mut transform) in &mut players {
        let step = look_step(player.pitch, touch_zones.look_input, settings.pitch_limit);
        player.pitch = step.pitch;
        transform.rotate_local_y(step.yaw_delta);
    }

    for (pivot, mut transform) in &mut pivots {
        if let Ok((player, _)) = players.get(pivot.player) {
            transform.rotation = Quat::from_rotation_x(player.pitch);
        }
    }

    for (model, mut transform) in &mut graphics {
        let Ok((player, _)) = players.get(model.player) else {
            continue;
        };
        if player.mode == ControlMode::ThirdPerson && !player.is_moving {
            transform.rotate_local_y(touch_zones.look_input.x);
        }
    }
}

pub fn steer(
    touch_zones: Res<TouchZones>,
    settings: Res<TouchControllerSettings>,
    zones: Res<ScreenZones>,
    mut players: Query<(Entity, &mut TouchPlayer, &Transform)>,
    mut graphics: Query<(&PlayerGraphics, &mut Transform), Without<TouchPlayer>>,
) {
    for (entity, mut player, transform) in &mut players {
        let wish = if touch_zones.is_moving_finger_down() {
            planar_velocity(
                touch_zones.move_input,
                zones.dead_zone_sq,
                settings.move_speed,
                *transform.right(),
                *transform.forward(),
            )
        } else {
            None
        };

        match wish {
            Some(velocity) => {
                if !player.is_moving {
                    for (model, mut model_transform) in &mut graphics {
                        if model.player == entity {
                            model_transform.rotation = Quat::IDENTITY;
                        }
                    }
                    player.is_moving = true;
                }
                player.wish_velocity = velocity;
            }
            None => {
                player.is_moving = false;
                player.wish_velocity = Vec3::ZERO;
            }
        }
    }
}

/// Hands the planar wish velocity to the physics body, vertical velocity stays
/// with gravity.
pub fn apply_wish_velocity(mut query: Query<(&TouchPlayer, &mut LinearVelocity)>) {
    for (player, mut velocity) in &mut query {
        velocity.0.x = player.wish_velocity.x;
        velocity.0.z = player.wish_velocity.z;
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn pitch_is_clamped() {
        let step = look_step(1.5, Vec2::new(0.0, -1.0), FRAC_PI_2);
        assert_eq!(step.pitch, FRAC_PI_2);
        let step = look_step(-1.5, Vec2::new(0.0, 1.0), FRAC_PI_2);
        assert_eq!(step.pitch, -FRAC_PI_2);
    }

    #[test]
    fn dragging_up_looks_up_and_right_turns_right() {
        // Screen y grows downwards, so dragging up is a negative delta.
        let step = look_step(0.0, Vec2::new(0.2, -0.1), FRAC_PI_2);
        assert!(step.pitch > 0.0);
        assert!(step.yaw_delta < 0.0);
    }

    #[test]
    fn dead_zone_blocks_small_offsets() {
        assert_eq!(
            planar_velocity(Vec2::new(3.0, 4.0), 25.0, 5.0, Vec3::X, Vec3::NEG_Z),
            None
        );
        assert!(planar_velocity(Vec2::new(3.0, 4.1), 25.0, 5.0, Vec3::X, Vec3::NEG_Z).is_some());
    }

    #[test]
    fn velocity_has_full_speed_along_player_axes() {
        let velocity =
            planar_velocity(Vec2::new(0.0, 50.0), 1.0, 4.0, Vec3::X, Vec3::NEG_Z).unwrap();
        assert!(velocity.abs_diff_eq(Vec3::new(0.0, 0.0, -4.0), 1e-5));

        let velocity =
            planar_velocity(Vec2::new(30.0, 40.0), 1.0, 5.0, Vec3::X, Vec3::NEG_Z).unwrap();
        assert!(velocity.abs_diff_eq(Vec3::new(3.0, 0.0, -4.0), 1e-5));
    }
}
