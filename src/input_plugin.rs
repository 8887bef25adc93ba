use std::collections::HashMap;

use bevy::input::touch::{Touch, Touches, touch_screen_input_system};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::settings::TouchControllerSettings;

/// Tracks fingers against the split-screen touch zones. Runs in `PreUpdate`,
/// right after bevy has folded the frame's touch events into [`Touches`].
pub struct TouchInputPlugin;

impl Plugin for TouchInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TouchZones>()
            .init_resource::<ScreenZones>()
            .add_systems(
                PreUpdate,
                (sync_screen_zones, track_touches)
                    .chain()
                    .in_set(TouchInputSet)
                    .after(touch_screen_input_system),
            );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TouchInputSet;

/// Screen geometry derived from the primary window.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenZones {
    /// Touches left of this x coordinate move, touches right of it look.
    pub half_width: f32,
    /// Squared dead zone radius, in pixels.
    pub dead_zone_sq: f32,
}

impl ScreenZones {
    pub fn new(width: f32, height: f32, settings: &TouchControllerSettings) -> Self {
        Self {
            half_width: width / 2.0,
            dead_zone_sq: settings.dead_zone_sq(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerPhase {
    Began,
    Moved,
    Stationary,
    Ended,
}

/// One finger's state for the current frame, in logical window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerSample {
    pub id: u64,
    pub phase: FingerPhase,
    pub position: Vec2,
    pub delta: Vec2,
}

/// Which fingers drive movement and look, and what they currently ask for.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct TouchZones {
    pub move_finger: Option<u64>,
    pub look_finger: Option<u64>,
    pub move_start: Vec2,
    /// Offset of the move finger from where it touched down, y up.
    pub move_input: Vec2,
    /// Scaled look delta for this frame, still in screen orientation (y down).
    pub look_input: Vec2,
}

impl TouchZones {
    pub fn is_moving_finger_down(&self) -> bool {
        self.move_finger.is_some()
    }

    pub fn is_looking_finger_down(&self) -> bool {
        self.look_finger.is_some()
    }

    /// Folds one finger sample into the zone state. `look_scale` multiplies the
    /// look finger's pixel delta (sensitivity times frame time).
    pub fn apply(&mut self, sample: FingerSample, zones: &ScreenZones, look_scale: f32) {
        match sample.phase {
            FingerPhase::Began => {
                if sample.position.x < zones.half_width && self.move_finger.is_none() {
                    debug!("tracking move finger {}", sample.id);
                    self.move_finger = Some(sample.id);
                    self.move_start = sample.position;
                    self.move_input = Vec2::ZERO;
                } else if sample.position.x > zones.half_width && self.look_finger.is_none() {
                    debug!("tracking look finger {}", sample.id);
                    self.look_finger = Some(sample.id);
                    self.look_input = Vec2::ZERO;
                }
            }
            FingerPhase::Ended => {
                if self.move_finger == Some(sample.id) {
                    debug!("stopped tracking move finger {}", sample.id);
                    self.move_finger = None;
                    self.move_input = Vec2::ZERO;
                } else if self.look_finger == Some(sample.id) {
                    debug!("stopped tracking look finger {}", sample.id);
                    self.look_finger = None;
                    self.look_input = Vec2::ZERO;
                }
            }
            FingerPhase::Moved => {
                if self.look_finger == Some(sample.id) {
                    self.look_input = sample.delta * look_scale;
                } else if self.move_finger == Some(sample.id) {
                    self.move_input = screen_to_stick(sample.position - self.move_start);
                }
            }
            FingerPhase::Stationary => {
                if self.look_finger == Some(sample.id) {
                    self.look_input = Vec2::ZERO;
                }
            }
        }
    }
}

/// Window space grows downwards; the stick treats up as forward.
fn screen_to_stick(offset: Vec2) -> Vec2 {
    Vec2::new(offset.x, -offset.y)
}

/// Last seen position of every finger that is down. Bevy's own touch delta
/// only refreshes on frames that carry touch events, so a finger that stops
/// sending them would keep its last delta forever.
#[derive(Debug, Clone, Default)]
pub struct FingerHistory {
    last_positions: HashMap<u64, Vec2>,
}

impl FingerHistory {
    /// Gathers this frame's finger samples. A finger id that was lifted and
    /// put down again within one frame ends before it begins again; a tap that
    /// starts and ends within one frame begins before it ends.
    pub fn samples(&mut self, touches: &Touches) -> Vec<FingerSample> {
        let mut samples = Vec::new();
        let ended = || {
            touches
                .iter_just_released()
                .chain(touches.iter_just_canceled())
        };
        let ended_sample = |touch: &Touch| FingerSample {
            id: touch.id(),
            phase: FingerPhase::Ended,
            position: touch.position(),
            delta: Vec2::ZERO,
        };

        for touch in ended().filter(|touch| touches.get_pressed(touch.id()).is_some()) {
            self.last_positions.remove(&touch.id());
            samples.push(ended_sample(touch));
        }

        for touch in touches.iter_just_pressed() {
            self.last_positions.insert(touch.id(), touch.position());
            samples.push(FingerSample {
                id: touch.id(),
                phase: FingerPhase::Began,
                position: touch.position(),
                delta: Vec2::ZERO,
            });
        }

        for touch in ended().filter(|touch| touches.get_pressed(touch.id()).is_none()) {
            self.last_positions.remove(&touch.id());
            samples.push(ended_sample(touch));
        }

        for touch in touches.iter().filter(|touch| !touches.just_pressed(touch.id())) {
            let position = touch.position();
            let delta = self
                .last_positions
                .insert(touch.id(), position)
                .map_or(Vec2::ZERO, |last| position - last);
            samples.push(FingerSample {
                id: touch.id(),
                phase: if delta == Vec2::ZERO {
                    FingerPhase::Stationary
                } else {
                    FingerPhase::Moved
                },
                position,
                delta,
            });
        }

        samples
    }
}

fn sync_screen_zones(
    settings: Res<TouchControllerSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut zones: ResMut<ScreenZones>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let current = ScreenZones::new(window.width(), window.height(), &settings);
    if zones.set_if_neq(current) {
        debug!(
            "touch zones split at x={} with dead zone {}px",
            current.half_width,
            current.dead_zone_sq.sqrt()
        );
    }
}

fn track_touches(
    mut history: Local<FingerHistory>,
    touches: Res<Touches>,
    time: Res<Time>,
    settings: Res<TouchControllerSettings>,
    zones: Res<ScreenZones>,
    mut touch_zones: ResMut<TouchZones>,
) {
    let look_scale = settings.camera_sensitivity * time.delta_secs();
    for sample in history.samples(&touches) {
        touch_zones.apply(sample, &zones, look_scale);
    }
}
