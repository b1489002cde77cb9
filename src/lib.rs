//! Serpent Arena - simulation core for a toroidal serpent arena
//!
//! Core modules:
//! - `sim`: World state, tick pipeline, spawn placement, bots
//! - `session`: Match control around one world (player input, pause, restart)
//! - `tuning`: Data-driven game balance and mode presets
//! - `leaderboard`: In-match ranking by body length

pub mod leaderboard;
pub mod session;
pub mod sim;
pub mod tuning;

pub use leaderboard::Leaderboard;
pub use session::{Session, TickInput};
pub use tuning::{BotTuning, GameMode, Tuning, TuningError, TurnModel};

use glam::Vec2;

/// Game configuration defaults (the values `Tuning::default()` starts from)
pub mod consts {
    /// Largest step the session will feed the world (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// World extent (toroidal)
    pub const WORLD_WIDTH: f32 = 12_000.0;
    pub const WORLD_HEIGHT: f32 = 12_000.0;

    /// Consumables
    pub const CONSUMABLE_TARGET: usize = 1760;
    pub const CONSUMABLE_VALUE: f32 = 10.0;
    /// Effective pickup radius (compared squared, 30px -> 900)
    pub const PICKUP_RADIUS: f32 = 30.0;

    /// Movement (px/s)
    pub const BASE_SPEED: f32 = 190.0;
    pub const BOOST_SPEED: f32 = 360.0;

    /// Body
    pub const SEGMENT_SPACING: f32 = 12.0;
    pub const MIN_LENGTH: usize = 6;
    pub const SCORE_PER_SEGMENT: f32 = 50.0;
    pub const HEAD_RADIUS: f32 = 10.0;
    pub const BODY_RADIUS: f32 = 7.0;

    /// Population and lifecycle
    pub const BOT_TARGET: usize = 50;
    pub const RESPAWN_DELAY: f32 = 1.2;
    pub const KILL_BONUS: u64 = 50;
    pub const KILL_GROWTH: u32 = 2;

    /// Gravity wells
    pub const HAZARD_COUNT: usize = 5;
    pub const HAZARD_LETHAL_RADIUS: f32 = 80.0;
    pub const HAZARD_INFLUENCE_RADIUS: f32 = 450.0;
}

/// Heading normalized to [0, 2π)
#[inline]
pub fn normalize_heading(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Shortest signed rotation taking `from` onto `to`, in (-π, π]
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let d = to - from;
    d.sin().atan2(d.cos())
}

/// Unit vector pointing along `angle`
#[inline]
pub fn heading_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
