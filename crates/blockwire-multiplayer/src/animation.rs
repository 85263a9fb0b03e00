//! Animation selection for the local player and limb posing for remote ones.

use blockwire_net::{AnimationState, PlayerState};
use glam::{DVec2, DVec3};

/// Default per-axis horizontal speed above which a player is walking.
pub const WALK_SPEED_THRESHOLD: f64 = 0.1;

/// Peak limb swing in radians.
const LIMB_SWING_AMPLITUDE: f64 = 0.5;

/// Snapshot of the local player handed over by the game loop each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPlayer {
    pub position: DVec3,
    /// `x` is pitch, `y` is yaw.
    pub rotation: DVec2,
    pub velocity: DVec3,
    pub on_ground: bool,
    pub sprinting: bool,
    pub sneaking: bool,
}

impl LocalPlayer {
    /// The state published to the relay, with a derived animation.
    pub fn to_state(&self, walk_threshold: f64) -> PlayerState {
        PlayerState {
            position: self.position.into(),
            rotation: self.rotation.into(),
            velocity: self.velocity.into(),
            on_ground: self.on_ground,
            animation: derive_animation(self, walk_threshold),
        }
    }
}

/// First match wins: sprint, sneak, airborne, moving, idle.
pub fn derive_animation(player: &LocalPlayer, walk_threshold: f64) -> AnimationState {
    if player.sprinting {
        AnimationState::Sprint
    } else if player.sneaking {
        AnimationState::Sneak
    } else if !player.on_ground {
        AnimationState::Jump
    } else if player.velocity.x.abs() > walk_threshold || player.velocity.z.abs() > walk_threshold
    {
        AnimationState::Walk
    } else {
        AnimationState::Idle
    }
}

/// Limb rotations about the body's X axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LimbPose {
    pub left_arm: f64,
    pub right_arm: f64,
    pub left_leg: f64,
    pub right_leg: f64,
}

impl LimbPose {
    pub const REST: Self = Self {
        left_arm: 0.0,
        right_arm: 0.0,
        left_leg: 0.0,
        right_leg: 0.0,
    };
}

/// Pose for `animation` at `time_secs`. Arms and legs swing in opposition
/// while walking, twice as fast while sprinting; anything else is at rest.
pub fn limb_pose(animation: AnimationState, time_secs: f64) -> LimbPose {
    let speed = match animation {
        AnimationState::Walk => 1.0,
        AnimationState::Sprint => 2.0,
        _ => return LimbPose::REST,
    };
    let swing = (time_secs * 10.0 * speed).sin() * LIMB_SWING_AMPLITUDE;
    LimbPose {
        left_arm: swing,
        right_arm: -swing,
        left_leg: -swing,
        right_leg: swing,
    }
}
