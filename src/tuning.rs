//! Game balance and match modes
//!
//! One immutable `Tuning` value is handed to the world at construction and
//! shared (by reference) with spawn placement and the bot controller.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised when building or loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    /// A numeric value is out of range
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
    /// The JSON document could not be parsed
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How the current heading follows the desired heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum TurnModel {
    /// Heading snaps to intent every tick
    #[default]
    Instant,
    /// Heading rotates toward intent at most `max_rate` rad/s
    RateLimited { max_rate: f32 },
}

/// Match mode presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Last one standing, no respawn
    #[default]
    Elimination,
    /// Endless play with respawn after a delay
    Respawn,
    /// Elimination against two bots on a sparse map
    QuickDuel,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Elimination => "Elimination",
            GameMode::Respawn => "Respawn",
            GameMode::QuickDuel => "QuickDuel",
        }
    }

    /// Apply the preset on top of an existing tuning
    pub fn apply(&self, tuning: &mut Tuning) {
        match self {
            GameMode::Elimination => tuning.elimination = true,
            GameMode::Respawn => tuning.elimination = false,
            GameMode::QuickDuel => {
                tuning.elimination = true;
                tuning.kill_bonus = 80;
                tuning.consumable_target = 500;
                tuning.bot_target = 2;
            }
        }
    }
}

impl FromStr for GameMode {
    type Err = TuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elimination" | "br" => Ok(GameMode::Elimination),
            "respawn" => Ok(GameMode::Respawn),
            "quickduel" | "duel" => Ok(GameMode::QuickDuel),
            _ => Err(TuningError::Invalid("unknown game mode")),
        }
    }
}

/// Bot controller constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    // === Hazard avoidance ===
    /// Danger radius as a multiple of the scaled lethal radius
    pub danger_factor: f32,
    /// Cap on the linear influence weight before the square-root curve
    pub influence_weight_cap: f32,
    /// Cap on the blended avoidance weight outside immediate escape
    pub avoid_weight_cap: f32,

    // === Combat ===
    /// Numerator of the proximity term (k / distance)
    pub combat_proximity: f32,
    /// Penalty when the target sits inside a hazard's danger radius
    pub combat_hazard_penalty: f32,
    /// Bonus for targeting the human player
    pub combat_player_bonus: f32,
    /// Aim point distance ahead of the target head
    pub combat_lead: f32,
    /// Random aim jitter (± radians)
    pub combat_jitter: f32,
    /// Weight numerator (weight = k / max(min_dist, d))
    pub combat_weight_scale: f32,
    pub combat_weight_min_dist: f32,
    pub combat_weight_cap: f32,
    /// Per-tick boost chance while targeting
    pub combat_boost_chance: f64,

    // === Resource seeking ===
    /// Goal re-evaluation cadence (seconds)
    pub goal_cadence: f32,
    /// Consumable scan radius
    pub scan_radius: f32,
    /// Dense cluster sub-radius and minimum size
    pub dense_radius: f32,
    pub dense_min_count: usize,
    /// Goal lock duration after committing to a dense cluster (seconds)
    pub goal_lock: f32,
    /// Safety margin around hazards, as a multiple of the lethal radius
    pub food_hazard_margin: f32,
    /// Weight multiplier for consumables inside the safety margin
    pub food_hazard_penalty: f32,
    /// Aim jitter toward the goal (± radians)
    pub goal_jitter: f32,
    /// Wander drift (± radians per second)
    pub wander_rate: f32,

    // === Stall failsafes ===
    /// Layer one: sample window (seconds) and distances
    pub stall_window: f32,
    pub stall_distance: f32,
    pub progress_distance: f32,
    /// Layer two: speed below which a tick counts as slow (px/s)
    pub slow_speed: f32,
    /// Stuck duration threshold and cooldown (seconds)
    pub stuck_threshold: f32,
    pub stuck_cooldown: f32,
    /// Maximum forced heading change (± radians)
    pub stuck_turn: f32,
    /// Boost pulse length (seconds)
    pub boost_pulse: f32,
    /// Per-tick idle boost chance
    pub idle_boost_chance: f64,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            danger_factor: 2.0,
            influence_weight_cap: 0.85,
            avoid_weight_cap: 0.85,

            combat_proximity: 800.0,
            combat_hazard_penalty: 300.0,
            combat_player_bonus: 120.0,
            combat_lead: 22.0,
            combat_jitter: 0.05,
            combat_weight_scale: 400.0,
            combat_weight_min_dist: 60.0,
            combat_weight_cap: 0.65,
            combat_boost_chance: 0.15,

            goal_cadence: 0.25,
            scan_radius: 240.0,
            dense_radius: 80.0,
            dense_min_count: 8,
            goal_lock: 0.8,
            food_hazard_margin: 2.5,
            food_hazard_penalty: 0.1,
            goal_jitter: 0.03,
            wander_rate: 0.35,

            stall_window: 1.0,
            stall_distance: 50.0,
            progress_distance: 20.0,
            slow_speed: 8.0,
            stuck_threshold: 1.2,
            stuck_cooldown: 2.5,
            stuck_turn: 1.2,
            boost_pulse: 0.8,
            idle_boost_chance: 0.05,
        }
    }
}

/// Complete numeric tuning table for one world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,

    // === Consumables ===
    pub consumable_target: usize,
    /// Score of a scale-1.0 consumable
    pub consumable_value: f32,
    pub pickup_radius: f32,

    // === Movement ===
    pub base_speed: f32,
    pub boost_speed: f32,
    pub turn_model: TurnModel,

    // === Body ===
    pub segment_spacing: f32,
    pub min_length: usize,
    /// Score divisor in the target length formula
    pub score_per_segment: f32,
    pub head_radius: f32,
    pub body_radius: f32,

    // === Lifecycle ===
    pub bot_target: usize,
    /// Last one standing: no respawn, survivor wins
    pub elimination: bool,
    pub respawn_delay: f32,
    pub player_spawn_invulnerability: f32,
    pub bot_spawn_invulnerability: f32,
    pub respawn_invulnerability: f32,
    pub restart_invulnerability: f32,
    pub kill_bonus: u64,
    pub kill_growth: u32,
    /// Upper bound of the random starting score given to new bots
    pub bot_start_score_max: u64,

    // === Death drop ===
    pub death_drop_min: usize,
    pub death_drop_max: usize,
    pub death_drop_jitter: f32,

    // === Gravity wells ===
    pub hazard_count: usize,
    pub hazard_lethal_radius: f32,
    pub hazard_influence_radius: f32,
    pub hazard_scale_min: f32,
    pub hazard_scale_max: f32,

    // === Spawn placement sample budgets ===
    pub player_spawn_samples: usize,
    pub bot_spawn_samples: usize,
    pub respawn_samples: usize,

    pub bots: BotTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,

            consumable_target: CONSUMABLE_TARGET,
            consumable_value: CONSUMABLE_VALUE,
            pickup_radius: PICKUP_RADIUS,

            base_speed: BASE_SPEED,
            boost_speed: BOOST_SPEED,
            turn_model: TurnModel::Instant,

            segment_spacing: SEGMENT_SPACING,
            min_length: MIN_LENGTH,
            score_per_segment: SCORE_PER_SEGMENT,
            head_radius: HEAD_RADIUS,
            body_radius: BODY_RADIUS,

            bot_target: BOT_TARGET,
            elimination: true,
            respawn_delay: RESPAWN_DELAY,
            player_spawn_invulnerability: 3.0,
            bot_spawn_invulnerability: 4.0,
            respawn_invulnerability: 1.5,
            restart_invulnerability: 1.0,
            kill_bonus: KILL_BONUS,
            kill_growth: KILL_GROWTH,
            bot_start_score_max: 300,

            death_drop_min: 12,
            death_drop_max: 120,
            death_drop_jitter: 4.0,

            hazard_count: HAZARD_COUNT,
            hazard_lethal_radius: HAZARD_LETHAL_RADIUS,
            hazard_influence_radius: HAZARD_INFLUENCE_RADIUS,
            hazard_scale_min: 0.8,
            hazard_scale_max: 1.6,

            player_spawn_samples: 48,
            bot_spawn_samples: 64,
            respawn_samples: 20,

            bots: BotTuning::default(),
        }
    }
}

impl Tuning {
    /// Create a tuning table from a mode preset (applies preset on defaults)
    pub fn from_mode(mode: GameMode) -> Self {
        let mut tuning = Self::default();
        mode.apply(&mut tuning);
        tuning
    }

    /// Parse and validate a JSON tuning document (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check every value the tick pipeline relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(TuningError::Invalid("world dimensions must be positive"));
        }
        if !(self.base_speed >= 0.0 && self.boost_speed >= 0.0) {
            return Err(TuningError::Invalid("speeds must be non-negative"));
        }
        if let TurnModel::RateLimited { max_rate } = self.turn_model {
            if max_rate.is_nan() || max_rate <= 0.0 {
                return Err(TuningError::Invalid("turn rate must be positive"));
            }
        }
        if self.min_length == 0 {
            return Err(TuningError::Invalid("min_length must be at least 1"));
        }
        if self.score_per_segment.is_nan() || self.score_per_segment <= 0.0 {
            return Err(TuningError::Invalid("score_per_segment must be positive"));
        }
        if !(self.head_radius >= 0.0 && self.body_radius >= 0.0 && self.pickup_radius >= 0.0) {
            return Err(TuningError::Invalid("radii must be non-negative"));
        }
        if self.death_drop_min > self.death_drop_max {
            return Err(TuningError::Invalid(
                "death_drop_min cannot exceed death_drop_max",
            ));
        }
        if !(self.hazard_scale_min > 0.0 && self.hazard_scale_min <= self.hazard_scale_max) {
            return Err(TuningError::Invalid(
                "hazard scale range must be positive and ordered",
            ));
        }
        if !(self.hazard_lethal_radius >= 0.0
            && self.hazard_influence_radius >= self.hazard_lethal_radius)
        {
            return Err(TuningError::Invalid(
                "hazard influence radius must cover the lethal radius",
            ));
        }
        if self.respawn_delay < 0.0 {
            return Err(TuningError::Invalid("respawn_delay must be non-negative"));
        }
        if self.player_spawn_samples == 0 || self.bot_spawn_samples == 0 || self.respawn_samples == 0
        {
            return Err(TuningError::Invalid("spawn sample budgets must be non-zero"));
        }
        if !(self.bots.goal_cadence > 0.0 && self.bots.stall_window > 0.0) {
            return Err(TuningError::Invalid("bot cadences must be positive"));
        }
        if !(0.0..=1.0).contains(&self.bots.combat_boost_chance)
            || !(0.0..=1.0).contains(&self.bots.idle_boost_chance)
        {
            return Err(TuningError::Invalid("boost chances must be within [0, 1]"));
        }
        Ok(())
    }

    /// Target body length for a score and an outstanding growth credit
    pub fn target_length(&self, score: u64, pending_growth: u32) -> usize {
        let from_score = (score as f64 / self.score_per_segment as f64).floor() as usize;
        from_score + self.min_length + pending_growth as usize
    }

    /// Number of consumables dropped by a body of `segments` segments
    pub fn death_drop(&self, segments: usize) -> usize {
        segments.clamp(self.death_drop_min, self.death_drop_max)
    }
}
