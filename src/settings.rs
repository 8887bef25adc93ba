use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use anyhow::{Context, ensure};
use bevy::prelude::*;
use serde::Deserialize;

/// Which camera rig the player drives.
#[derive(Reflect, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

/// Tuning for the touch controls. Usually loaded from a JSON file, any field
/// left out of the file keeps its default.
#[derive(Resource, Reflect, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TouchControllerSettings {
    /// Look finger delta scale, in radians per pixel per second.
    pub camera_sensitivity: f32,
    /// Planar speed in world units per second.
    pub move_speed: f32,
    /// Dead zone radius around the move finger's start, as a fraction of the
    /// screen height.
    pub move_dead_zone: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]`.
    pub pitch_limit: f32,
    pub mode: ControlMode,
}

impl Default for TouchControllerSettings {
    fn default() -> Self {
        Self {
            camera_sensitivity: 0.25,
            move_speed: 5.0,
            move_dead_zone: 0.1,
            pitch_limit: FRAC_PI_2,
            mode: ControlMode::FirstPerson,
        }
    }
}

impl TouchControllerSettings {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let settings: Self =
            serde_json::from_str(json).context("malformed touch controller settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_json_str(&json)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        info!("loaded touch controller settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.camera_sensitivity.is_finite(),
            "camera_sensitivity must be finite, got {}",
            self.camera_sensitivity
        );
        ensure!(
            self.move_speed.is_finite() && self.move_speed >= 0.0,
            "move_speed must be a non-negative number, got {}",
            self.move_speed
        );
        ensure!(
            (0.0..1.0).contains(&self.move_dead_zone),
            "move_dead_zone must be in [0, 1), got {}",
            self.move_dead_zone
        );
        ensure!(
            self.pitch_limit > 0.0 && self.pitch_limit <= FRAC_PI_2,
            "pitch_limit must be in (0, pi/2], got {}",
            self.pitch_limit
        );
        Ok(())
    }

    /// Squared dead zone radius in pixels for a screen of the given height.
    pub fn dead_zone_sq(&self, screen_height: f32) -> f32 {
        let radius = screen_height * self.move_dead_zone;
        radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            TouchControllerSettings::from_json_str(r#"{ "move_speed": 8.0, "mode": "ThirdPerson" }"#)
                .unwrap();
        assert_eq!(settings.move_speed, 8.0);
        assert_eq!(settings.mode, ControlMode::ThirdPerson);
        assert_eq!(
            settings.camera_sensitivity,
            TouchControllerSettings::default().camera_sensitivity
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(TouchControllerSettings::from_json_str(r#"{ "move_dead_zone": 1.5 }"#).is_err());
        assert!(TouchControllerSettings::from_json_str(r#"{ "move_speed": -1.0 }"#).is_err());
        assert!(TouchControllerSettings::from_json_str(r#"{ "pitch_limit": 3.0 }"#).is_err());
        assert!(TouchControllerSettings::from_json_str("not json").is_err());
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = TouchControllerSettings::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn dead_zone_scales_with_screen_height() {
        let settings = TouchControllerSettings {
            move_dead_zone: 0.1,
            ..default()
        };
        assert!((settings.dead_zone_sq(1000.0) - 10_000.0).abs() < 1e-3);
    }
}
