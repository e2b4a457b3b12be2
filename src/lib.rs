//! Neon Pinball - a two-stage pinball table
//!
//! Core modules:
//! - `physics`: Rigid-body world (rapier2d) with tagged bodies and contact-begin events
//! - `stage`: Stage layouts and the load/replace of stage bodies
//! - `input`: Keyboard / touch / on-screen button normalization
//! - `sim`: Deterministic table simulation (flippers, plunger, scoring, lives)
//! - `session`: Owns one running game and wires it to audio and score submission

pub mod audio;
pub mod highscores;
pub mod input;
pub mod physics;
pub mod scores;
pub mod session;
pub mod settings;
pub mod sim;
pub mod stage;
pub mod viewport;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::{Settings, TouchControls};

use glam::Vec2;

/// Table configuration constants
///
/// Y points down, units are pixels and seconds.
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Play field
    pub const FIELD_WIDTH: f32 = 700.0;
    pub const FIELD_HEIGHT: f32 = 1100.0;
    /// Downward acceleration (px/s²)
    pub const GRAVITY: f32 = 1000.0;

    /// Ball
    pub const BALL_RADIUS: f32 = 15.0;
    pub const BALL_RESTITUTION: f32 = 0.8;
    /// Lane spawn point (resting on the shelf)
    pub const BALL_SPAWN_X: f32 = 662.0;
    pub const BALL_SPAWN_Y: f32 = SHELF_Y - 20.0;

    /// Lives at session start, restart and stage advance
    pub const START_LIVES: u32 = 3;

    /// Flippers
    pub const FLIPPER_LENGTH: f32 = 100.0;
    pub const FLIPPER_THICKNESS: f32 = 20.0;
    pub const FLIPPER_Y: f32 = 995.0;
    pub const LEFT_FLIPPER_X: f32 = 265.0;
    pub const LEFT_PIVOT_X: f32 = 225.0;
    pub const RIGHT_FLIPPER_X: f32 = 400.0;
    pub const RIGHT_PIVOT_X: f32 = 440.0;
    /// Angular speed (rad/s), 0.3 rad per 60 Hz step
    pub const FLIPPER_SPEED: f32 = 18.0;
    pub const LEFT_FLIPPER_MIN_ANGLE: f32 = -35.0 * std::f32::consts::PI / 180.0;
    pub const LEFT_FLIPPER_MAX_ANGLE: f32 = 15.0 * std::f32::consts::PI / 180.0;
    pub const RIGHT_FLIPPER_MIN_ANGLE: f32 = -15.0 * std::f32::consts::PI / 180.0;
    pub const RIGHT_FLIPPER_MAX_ANGLE: f32 = 35.0 * std::f32::consts::PI / 180.0;

    /// Plunger
    pub const PLUNGER_X: f32 = 662.0;
    pub const PLUNGER_REST_Y: f32 = 1020.0;
    pub const PLUNGER_MAX_PULL_Y: f32 = 1080.0;
    /// Visual pull speed (px/s), 0.8 px per 60 Hz step
    pub const PLUNGER_PULL_SPEED: f32 = 48.0;
    /// Launch speed at full charge (px/s), 55 px per 60 Hz step
    pub const PLUNGER_MAX_LAUNCH_SPEED: f32 = 3300.0;
    /// Longest hold that still adds charge (ms)
    pub const MAX_CHARGE_MS: f64 = 1500.0;
    /// Charge ratio for a tap
    pub const MIN_CHARGE_RATIO: f32 = 0.1;
    /// Top of the shelf the ball rests on inside the lane
    pub const SHELF_Y: f32 = 1010.0;
    /// Launch is only applied while the ball sits inside this box
    pub const LANE_MIN_X: f32 = 630.0;
    pub const LANE_MAX_X: f32 = 695.0;
    pub const LANE_MIN_Y: f32 = SHELF_Y - 25.0;
    pub const LANE_MAX_Y: f32 = SHELF_Y;

    /// Scoring
    pub const TARGET_POINTS: u64 = 300;
    /// Outward velocity added on a bumper hit (px/s), 15 px per 60 Hz step
    pub const BUMPER_KICK: f32 = 900.0;
    pub const BUMPER_RADIUS: f32 = 30.0;
    pub const BUMPER_RESTITUTION: f32 = 1.5;
    pub const TARGET_RESTITUTION: f32 = 1.5;

    /// Reference layout the viewport scale is computed against
    pub const BASE_WIDTH: f32 = 816.0;
    pub const BASE_HEIGHT: f32 = 1296.0;
}

/// Convert degrees to radians
#[inline]
pub fn deg(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn wall_clock_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn wall_clock_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// True if `point` lies strictly inside the axis-aligned box `min`..`max`
#[inline]
pub fn inside_box(point: Vec2, min: Vec2, max: Vec2) -> bool {
    point.x > min.x && point.x < max.x && point.y > min.y && point.y < max.y
}
