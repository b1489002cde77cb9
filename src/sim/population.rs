//! Bot population control
//!
//! Creation and removal go through the world's spawn/despawn entry points.
//! Dead bots still count toward the population (they wait for respawn or the
//! end of the match); only an explicit shrink removes them.

use super::state::{EntityId, World};

#[derive(Debug, Clone)]
pub struct PopulationManager {
    /// Desired number of bots
    target: usize,
}

impl PopulationManager {
    pub fn new(target: usize) -> Self {
        Self { target }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Spawn bots until the world holds `target` of them; returns how many were added
    pub fn ensure_count(&mut self, world: &mut World, target: usize) -> usize {
        let existing = world.bot_count();
        let missing = target.saturating_sub(existing);
        for _ in 0..missing {
            world.spawn_bot();
        }
        if missing > 0 {
            log::debug!("Spawned {} bots ({} -> {})", missing, existing, target);
        }
        missing
    }

    /// Grow or shrink the bot population to exactly `target`
    ///
    /// Excess bots are removed newest first.
    pub fn set_count(&mut self, world: &mut World, target: usize) {
        self.target = target;
        self.ensure_count(world, target);

        let mut bots: Vec<EntityId> = world
            .agents()
            .iter()
            .filter(|a| a.is_bot)
            .map(|a| a.id)
            .collect();
        while bots.len() > target {
            if let Some(id) = bots.pop() {
                world.despawn_agent(id);
            }
        }
    }

    /// Top the population back up to the stored target
    pub fn maintain(&mut self, world: &mut World) {
        let target = self.target;
        self.ensure_count(world, target);
    }
}
