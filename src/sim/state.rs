//! World state and core simulation types
//!
//! `World` owns every entity. Other components read through the accessors and
//! write only agent intent (`set_intent`) or go through the spawn/despawn
//! entry points below; segment trails and the consumable/hazard collections
//! are mutated exclusively by the tick pipeline in `tick.rs`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::factory;
use super::spawn::SpawnPlanner;
use super::torus::Torus;
use crate::tuning::{Tuning, TuningError};

/// Stable entity identifier (never reused within a world)
pub type EntityId = u32;

/// Why an agent died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Head ran into another agent's body
    AgentCollision,
    /// Head crossed a gravity well's lethal radius
    Hazard,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::AgentCollision => "snake_collision",
            DeathCause::Hazard => "black_hole",
        }
    }
}

/// Metadata of an agent's most recent death
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub cause: DeathCause,
    /// World clock at death (seconds)
    pub at: f64,
    pub killer: Option<EntityId>,
}

/// Movement speed mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    Normal,
    Boosted,
}

/// Cosmetic skin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Skin {
    Aqua,
    Neon,
    Lime,
    Sun,
    #[default]
    Rose,
    Mint,
    Gold,
    Sky,
    Violet,
    Peach,
}

impl Skin {
    pub const ALL: [Skin; 10] = [
        Skin::Aqua,
        Skin::Neon,
        Skin::Lime,
        Skin::Sun,
        Skin::Rose,
        Skin::Mint,
        Skin::Gold,
        Skin::Sky,
        Skin::Violet,
        Skin::Peach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Aqua => "aqua",
            Skin::Neon => "neon",
            Skin::Lime => "lime",
            Skin::Sun => "sun",
            Skin::Rose => "rose",
            Skin::Mint => "mint",
            Skin::Gold => "gold",
            Skin::Sky => "sky",
            Skin::Violet => "violet",
            Skin::Peach => "peach",
        }
    }
}

/// A serpentine agent (player or bot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: EntityId,
    pub name: String,
    pub skin: Skin,
    /// Body trail, head first
    pub segments: Vec<Vec2>,
    /// Current heading (radians, [0, 2π))
    pub heading: f32,
    /// Intent: heading the agent wants to face
    pub desired_heading: f32,
    /// Intent: boosted speed requested
    pub boost: bool,
    pub score: u64,
    /// Growth credit added to the target length
    pub pending_growth: u32,
    pub alive: bool,
    /// World clock before which collisions cannot kill this agent
    pub invulnerable_until: f64,
    pub is_bot: bool,
    /// Most recent death, kept after respawn for UI
    pub death: Option<DeathRecord>,
}

impl Agent {
    /// Head position (None once the body has been cleared on death)
    #[inline]
    pub fn head(&self) -> Option<Vec2> {
        self.segments.first().copied()
    }

    #[inline]
    pub fn speed_mode(&self) -> SpeedMode {
        if self.boost {
            SpeedMode::Boosted
        } else {
            SpeedMode::Normal
        }
    }

    #[inline]
    pub fn is_invulnerable(&self, now: f64) -> bool {
        now < self.invulnerable_until
    }

    /// Body length in segments
    #[inline]
    pub fn length(&self) -> usize {
        self.segments.len()
    }
}

/// Consumable classes (drawn from a weighted distribution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumableClass {
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Sun,
}

/// Fixed per-class table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassTraits {
    /// Relative spawn weight
    pub weight: u32,
    /// Display scale, also drives growth and score
    pub scale: f32,
}

impl ConsumableClass {
    pub const ALL: [ConsumableClass; 10] = [
        ConsumableClass::Mercury,
        ConsumableClass::Venus,
        ConsumableClass::Earth,
        ConsumableClass::Moon,
        ConsumableClass::Mars,
        ConsumableClass::Jupiter,
        ConsumableClass::Saturn,
        ConsumableClass::Uranus,
        ConsumableClass::Neptune,
        ConsumableClass::Sun,
    ];

    pub const fn traits(&self) -> ClassTraits {
        let (weight, scale) = match self {
            ConsumableClass::Mercury => (8, 0.45),
            ConsumableClass::Venus => (8, 0.8),
            ConsumableClass::Earth => (8, 1.0),
            ConsumableClass::Moon => (10, 0.5),
            ConsumableClass::Mars => (8, 0.7),
            ConsumableClass::Jupiter => (5, 2.5),
            ConsumableClass::Saturn => (5, 2.2),
            ConsumableClass::Uranus => (4, 1.8),
            ConsumableClass::Neptune => (4, 1.6),
            ConsumableClass::Sun => (2, 3.0),
        };
        ClassTraits { weight, scale }
    }

    #[inline]
    pub fn display_scale(&self) -> f32 {
        self.traits().scale
    }

    /// Growth credit granted on consumption
    pub fn growth(&self) -> u32 {
        ((self.display_scale() * 2.0).round() as u32).max(1)
    }

    /// Score granted on consumption for a given base value
    pub fn score(&self, base_value: f32) -> u64 {
        ((base_value * self.display_scale()).round().max(0.0) as u64).max(1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumableClass::Mercury => "mercury",
            ConsumableClass::Venus => "venus",
            ConsumableClass::Earth => "earth",
            ConsumableClass::Moon => "moon",
            ConsumableClass::Mars => "mars",
            ConsumableClass::Jupiter => "jupiter",
            ConsumableClass::Saturn => "saturn",
            ConsumableClass::Uranus => "uranus",
            ConsumableClass::Neptune => "neptune",
            ConsumableClass::Sun => "sun",
        }
    }
}

/// A collectible item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumable {
    pub id: EntityId,
    pub pos: Vec2,
    /// Visual radius
    pub radius: f32,
    pub class: ConsumableClass,
    /// Cosmetic attributes
    pub hue: u16,
    pub ringed: bool,
    pub tilt: f32,
    /// Spin animation (rad/s, signed) and phase at clock 0
    pub spin_speed: f32,
    pub spin_phase: f32,
}

impl Consumable {
    /// Animation phase at a given world clock
    pub fn phase_at(&self, time: f64) -> f32 {
        crate::normalize_heading(self.spin_phase + (self.spin_speed as f64 * time) as f32)
    }
}

/// A gravity well
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: EntityId,
    pub pos: Vec2,
    pub scale: f32,
}

impl Hazard {
    #[inline]
    pub fn lethal_radius(&self, tuning: &Tuning) -> f32 {
        tuning.hazard_lethal_radius * self.scale
    }

    #[inline]
    pub fn influence_radius(&self, tuning: &Tuning) -> f32 {
        tuning.hazard_influence_radius * self.scale
    }
}

/// What kind of agent to create and how to protect it
#[derive(Debug, Clone)]
pub struct AgentSpawn {
    pub name: String,
    pub skin: Skin,
    pub is_bot: bool,
    pub start_score: u64,
    pub invulnerability: f32,
    pub boost: bool,
    /// Candidate budget for the placement engine
    pub samples: usize,
}

/// The authoritative world
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) tuning: Tuning,
    pub(crate) torus: Torus,
    pub(crate) seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation clock (seconds)
    pub(crate) clock: f64,
    /// Sorted by id
    pub(crate) agents: Vec<Agent>,
    pub(crate) consumables: Vec<Consumable>,
    pub(crate) hazards: Vec<Hazard>,
    pub(crate) spawner: SpawnPlanner,
    pub(crate) game_over: bool,
    pub(crate) winner: Option<EntityId>,
    pub(crate) last_collected: Option<ConsumableClass>,
    next_id: EntityId,
}

impl World {
    /// Create a world, placing its hazards and initial consumables
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        let mut world = Self::empty(tuning, seed)?;
        world.replenish_hazards();
        world.replenish_consumables();
        log::info!(
            "World {}x{} seeded {}: {} hazards, {} consumables",
            world.torus.width,
            world.torus.height,
            seed,
            world.hazards.len(),
            world.consumables.len()
        );
        Ok(world)
    }

    /// Create a world with no entities at all
    pub fn empty(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self {
            torus: Torus::new(tuning.world_width, tuning.world_height),
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock: 0.0,
            agents: Vec::new(),
            consumables: Vec::new(),
            hazards: Vec::new(),
            spawner: SpawnPlanner::default(),
            game_over: false,
            winner: None,
            last_collected: None,
            next_id: 1,
        })
    }

    // === Read surface ===

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn torus(&self) -> Torus {
        self.torus
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// World clock (seconds)
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.index_of(id).map(|i| &self.agents[i])
    }

    pub fn consumables(&self) -> &[Consumable] {
        &self.consumables
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<EntityId> {
        self.winner
    }

    /// Class of the most recently consumed item (transient UI feedback)
    pub fn last_collected(&self) -> Option<ConsumableClass> {
        self.last_collected
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    pub fn bot_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_bot).count()
    }

    pub(crate) fn index_of(&self, id: EntityId) -> Option<usize> {
        self.agents.binary_search_by_key(&id, |a| a.id).ok()
    }

    // === Mutation entry points ===

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Swap in a new tuning table (mode change); the world extent is kept
    pub fn set_tuning(&mut self, tuning: Tuning) -> Result<(), TuningError> {
        tuning.validate()?;
        if tuning.world_width != self.torus.width || tuning.world_height != self.torus.height {
            return Err(TuningError::Invalid(
                "world extent cannot change on a live world",
            ));
        }
        self.tuning = tuning;
        Ok(())
    }

    /// Write an agent's intent; returns false for unknown ids
    pub fn set_intent(&mut self, id: EntityId, desired_heading: f32, boost: bool) -> bool {
        match self.index_of(id) {
            Some(i) => {
                let agent = &mut self.agents[i];
                agent.desired_heading = desired_heading;
                agent.boost = boost;
                true
            }
            None => false,
        }
    }

    /// Hand an agent to (or take it from) the bot controller
    pub fn set_bot(&mut self, id: EntityId, is_bot: bool) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.agents[i].is_bot = is_bot;
                true
            }
            None => false,
        }
    }

    /// Create an agent at a safe spawn point
    pub fn spawn_agent(&mut self, spawn: AgentSpawn) -> EntityId {
        let id = self.next_entity_id();
        let pos = self.choose_spawn(spawn.samples);
        let heading = self.rng.random_range(0.0..std::f32::consts::TAU);
        let mut agent = factory::new_agent(id, spawn.name, spawn.skin, pos, heading, &self.tuning, &self.torus);
        agent.is_bot = spawn.is_bot;
        agent.score = spawn.start_score;
        agent.boost = spawn.boost;
        agent.invulnerable_until = self.clock + spawn.invulnerability as f64;
        if spawn.is_bot {
            // Bots start off on a random intent of their own
            agent.desired_heading = self.rng.random_range(0.0..std::f32::consts::TAU);
        }
        log::debug!("Spawned agent {} '{}' at ({:.0}, {:.0})", id, agent.name, pos.x, pos.y);
        // Ids are monotonic, so pushing keeps the roster sorted
        self.agents.push(agent);
        id
    }

    /// Create the human player's agent
    pub fn spawn_player(&mut self, name: impl Into<String>, skin: Skin) -> EntityId {
        let spawn = AgentSpawn {
            name: name.into(),
            skin,
            is_bot: false,
            start_score: 0,
            invulnerability: self.tuning.player_spawn_invulnerability,
            boost: false,
            samples: self.tuning.player_spawn_samples,
        };
        self.spawn_agent(spawn)
    }

    /// Create a bot with a random name, skin and starting score
    pub fn spawn_bot(&mut self) -> EntityId {
        let spawn = AgentSpawn {
            name: factory::random_bot_name(&mut self.rng),
            skin: factory::random_skin(&mut self.rng),
            is_bot: true,
            start_score: self.rng.random_range(0..=self.tuning.bot_start_score_max),
            invulnerability: self.tuning.bot_spawn_invulnerability,
            boost: true,
            samples: self.tuning.bot_spawn_samples,
        };
        self.spawn_agent(spawn)
    }

    /// Remove an agent from the roster entirely
    ///
    /// Removing a living agent can end an elimination match.
    pub fn despawn_agent(&mut self, id: EntityId) -> Option<Agent> {
        let index = self.index_of(id)?;
        let agent = self.agents.remove(index);
        if agent.alive && !self.game_over {
            self.check_last_survivor();
        }
        Some(agent)
    }

    /// Start a fresh match with the same roster
    pub fn restart(&mut self) {
        self.game_over = false;
        self.winner = None;
        self.last_collected = None;
        self.consumables.clear();

        let samples = self.tuning.player_spawn_samples;
        let invulnerability = self.tuning.restart_invulnerability as f64;
        for i in 0..self.agents.len() {
            // Clear first so the old body does not repel its own new spawn
            self.agents[i].alive = false;
            self.agents[i].segments.clear();
            let pos = self.choose_spawn(samples);
            let heading = self.rng.random_range(0.0..std::f32::consts::TAU);
            let agent = &mut self.agents[i];
            agent.segments = factory::lay_out_body(pos, heading, &self.tuning, &self.torus);
            agent.heading = heading;
            agent.desired_heading = heading;
            agent.alive = true;
            agent.score = 0;
            agent.pending_growth = 0;
            agent.death = None;
            agent.invulnerable_until = self.clock + invulnerability;
        }
        log::info!("Match restarted with {} agents", self.agents.len());
    }

    /// Ask the placement engine for an agent spawn point
    pub(crate) fn choose_spawn(&mut self, samples: usize) -> Vec2 {
        let heads: Vec<Vec2> = self
            .agents
            .iter()
            .filter(|a| a.alive)
            .filter_map(|a| a.head())
            .collect();
        let hazards: Vec<Vec2> = self.hazards.iter().map(|h| h.pos).collect();
        self.spawner
            .choose_agent_position(&mut self.rng, &self.torus, &heads, &hazards, samples)
    }
}
