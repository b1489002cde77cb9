//! Match control around one world
//!
//! A `Session` is what a frontend drives: it owns the world, the bot
//! controller and the population manager, routes player input and paces the
//! simulation. Each `step` runs population, then bot intent, then the world.

use crate::consts::MAX_FRAME_DT;
use crate::leaderboard::Leaderboard;
use crate::sim::{BotController, EntityId, PopulationManager, Skin, World};
use crate::tuning::{GameMode, Tuning, TuningError};

/// Mixed into the session seed for the controller's generator
const CONTROLLER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Input for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired player heading (radians); None keeps the previous intent
    pub heading: Option<f32>,
    /// Boost held
    pub boost: bool,
    /// Pause toggle (one-shot)
    pub pause: bool,
}

/// A running match
#[derive(Debug, Clone)]
pub struct Session {
    world: World,
    controller: BotController,
    population: PopulationManager,
    /// Agent driven by `TickInput`
    player: Option<EntityId>,
    paused: bool,
}

impl Session {
    /// Build a world, spawn the player and fill in the bots
    pub fn new(tuning: Tuning, seed: u64, player_name: &str) -> Result<Self, TuningError> {
        let bot_target = tuning.bot_target;
        let mut world = World::new(tuning, seed)?;
        let player = world.spawn_player(player_name, Skin::default());
        let mut population = PopulationManager::new(bot_target);
        population.maintain(&mut world);
        log::info!(
            "Match started: player {} with {} bots ({})",
            player,
            world.bot_count(),
            if world.tuning().elimination { "elimination" } else { "respawn" }
        );
        Ok(Self {
            world,
            controller: BotController::new(seed ^ CONTROLLER_SEED_SALT),
            population,
            player: Some(player),
            paused: false,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn controller(&self) -> &BotController {
        &self.controller
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::from_world(&self.world, self.player)
    }

    /// Advance by one frame
    ///
    /// Frame time is clamped to `MAX_FRAME_DT`; a paused or finished match
    /// runs with `dt = 0`, which leaves the world untouched.
    pub fn step(&mut self, frame_dt: f32, input: &TickInput) {
        if input.pause {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }

        let dt = if self.paused || self.world.is_game_over() || !frame_dt.is_finite() {
            0.0
        } else {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        };
        if dt <= 0.0 {
            return;
        }

        let intent = self
            .player
            .and_then(|id| self.world.agent(id))
            .filter(|a| a.alive && !a.is_bot)
            .map(|a| (a.id, input.heading.unwrap_or(a.desired_heading)));
        if let Some((id, heading)) = intent {
            self.world.set_intent(id, heading, input.boost);
        }

        self.population.maintain(&mut self.world);
        self.controller.update(&mut self.world, dt);
        self.world.advance(dt);
    }

    /// Start over with the same roster
    pub fn restart_match(&mut self) {
        self.world.restart();
        self.controller.reset();
        self.population.maintain(&mut self.world);
        self.paused = false;
    }

    /// Hand control to the next (`direction > 0`) or previous living agent
    ///
    /// The former player becomes a bot. Returns the newly controlled agent.
    pub fn switch_controlled_agent(&mut self, direction: i32) -> Option<EntityId> {
        let living: Vec<EntityId> = self
            .world
            .agents()
            .iter()
            .filter(|a| a.alive)
            .map(|a| a.id)
            .collect();
        if living.is_empty() {
            return self.player;
        }

        let n = living.len() as i64;
        let next = match self.player.and_then(|p| living.iter().position(|&id| id == p)) {
            Some(i) => living[(i as i64 + direction.signum() as i64).rem_euclid(n) as usize],
            None => living[0],
        };

        if let Some(old) = self.player {
            if old != next {
                self.world.set_bot(old, true);
            }
        }
        self.world.set_bot(next, false);
        self.player = Some(next);
        log::info!("Now controlling agent {}", next);
        self.player
    }

    /// Grow or shrink the bot population
    pub fn set_bot_count(&mut self, count: usize) {
        self.population.set_count(&mut self.world, count);
    }

    /// Install a mode preset on top of the current tuning
    pub fn apply_mode(&mut self, mode: GameMode) -> Result<(), TuningError> {
        let mut tuning = self.world.tuning().clone();
        mode.apply(&mut tuning);
        let bot_target = tuning.bot_target;
        self.world.set_tuning(tuning)?;
        self.population.set_count(&mut self.world, bot_target);
        log::info!("Mode set to {}", mode.as_str());
        if mode == GameMode::QuickDuel {
            self.restart_match();
        }
        Ok(())
    }
}
