use avian3d::prelude::*;
use bevy::prelude::*;

use crate::character_controller::{PitchPivot, TouchPlayer};
use crate::settings::ControlMode;

/// Third person camera pole. Lives on the [`PitchPivot`] entity and keeps its
/// camera child from clipping into the environment.
#[derive(Component, Debug, Clone, Copy)]
pub struct CameraBoom {
    pub camera: Entity,
    /// Local z of the camera when nothing is in the way. Picked up from the
    /// camera's spawn position.
    pub max_distance: f32,
    pub obstacles: LayerMask,
}

impl CameraBoom {
    pub fn new(camera: Entity, obstacles: impl Into<LayerMask>) -> Self {
        Self {
            camera,
            max_distance: 0.0,
            obstacles: obstacles.into(),
        }
    }
}

/// Local z the camera should sit at, given the distance to the first obstacle
/// along the boom (if any).
pub fn boom_local_offset(hit_distance: Option<f32>, max_distance: f32) -> f32 {
    match hit_distance {
        Some(distance) => distance.min(max_distance.abs()).copysign(max_distance),
        None => max_distance,
    }
}

pub fn init_camera_boom(
    mut booms: Query<&mut CameraBoom, Added<CameraBoom>>,
    cameras: Query<&Transform>,
) {
    for mut boom in &mut booms {
        match cameras.get(boom.camera) {
            Ok(camera) => {
                boom.max_distance = camera.translation.z;
                debug!("camera boom length {}", boom.max_distance);
            }
            Err(_) => warn!("camera boom points at {} which has no transform", boom.camera),
        }
    }
}

pub fn update_camera_boom(
    spatial_query_pipeline: Res<SpatialQueryPipeline>,
    booms: Query<(&CameraBoom, &PitchPivot, &GlobalTransform)>,
    players: Query<&TouchPlayer>,
    mut cameras: Query<&mut Transform, Without<CameraBoom>>,
) {
    for (boom, pivot, boom_global) in &booms {
        let Ok(player) = players.get(pivot.player) else {
            continue;
        };
        if player.mode != ControlMode::ThirdPerson {
            continue;
        }
        let Ok(mut camera) = cameras.get_mut(boom.camera) else {
            continue;
        };

        let origin = boom_global.translation();
        // The camera rides the boom's local z axis, so the ray follows it.
        let Ok(direction) = Dir3::new(boom_global.rotation() * Vec3::Z * boom.max_distance.signum())
        else {
            continue;
        };

        let filter = SpatialQueryFilter::from_mask(boom.obstacles)
            .with_excluded_entities([pivot.player]);
        let hit = spatial_query_pipeline.cast_ray(
            origin,
            direction,
            boom.max_distance.abs(),
            true,
            &filter,
        );

        // Boom and camera are unscaled, so world distance along the ray is the
        // camera's local z.
        let local_z = boom_local_offset(hit.map(|hit| hit.distance), boom.max_distance);
        camera.translation = Vec3::new(0.0, 0.0, local_z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_boom_keeps_full_length() {
        assert_eq!(boom_local_offset(None, 4.0), 4.0);
        assert_eq!(boom_local_offset(None, -4.0), -4.0);
    }

    #[test]
    fn hit_pulls_camera_in_on_the_same_side() {
        assert_eq!(boom_local_offset(Some(1.5), 4.0), 1.5);
        assert_eq!(boom_local_offset(Some(1.5), -4.0), -1.5);
        assert_eq!(boom_local_offset(Some(9.0), 4.0), 4.0);
    }
}
