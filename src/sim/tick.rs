//! Per-tick world update
//!
//! Stages run in a fixed order and each sees the effects of the previous ones:
//! replenish, respawn, motion, consumption, agent collisions, hazard
//! collisions. Deaths are applied by `kill_agent` from the two collision
//! stages. Every stage produces a valid state; nothing here can fail.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::collision::{agent_hits_agent, inside_lethal_radius, within_pickup};
use super::factory;
use super::spawn::{place_separated, plan_hazard_layout, random_point};
use super::state::{DeathCause, DeathRecord, EntityId, World};
use crate::tuning::TurnModel;
use crate::{angle_delta, heading_vec, normalize_heading};

/// Attempts per extra hazard before placing it unconstrained
const HAZARD_TOPUP_ATTEMPTS: usize = 100;

impl World {
    /// Advance the world by `dt` seconds
    ///
    /// `dt <= 0` (or non-finite) is a pause: nothing moves and the clock
    /// stands still. A latched game over freezes the world until restart.
    pub fn advance(&mut self, dt: f32) {
        if self.game_over || dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.clock += dt as f64;

        self.replenish_consumables();
        self.replenish_hazards();
        self.respawn_due_agents();
        self.integrate_motion(dt);
        self.consume();
        self.resolve_agent_collisions();
        self.resolve_hazard_collisions();
    }

    /// Scatter new consumables uniformly until the target count is reached
    pub(crate) fn replenish_consumables(&mut self) {
        let target = self.tuning.consumable_target;
        while self.consumables.len() < target {
            let id = self.next_entity_id();
            let pos = random_point(&mut self.rng, &self.torus);
            let item = factory::new_consumable(&mut self.rng, id, pos);
            self.consumables.push(item);
        }
    }

    /// Bring the hazard count to its target
    ///
    /// An empty world gets a full jittered-grid layout; later top-ups place
    /// one well at a time by rejection, degrading to an unconstrained point
    /// once the attempt budget runs out.
    pub(crate) fn replenish_hazards(&mut self) {
        let target = self.tuning.hazard_count;

        if self.hazards.is_empty() && target > 0 {
            for pos in plan_hazard_layout(&mut self.rng, &self.torus, target) {
                let id = self.next_entity_id();
                let hazard = factory::new_hazard(&mut self.rng, id, pos, &self.tuning);
                self.hazards.push(hazard);
            }
        }

        while self.hazards.len() < target {
            let min_dist = self.torus.width.min(self.torus.height) / 10.0;
            let existing: Vec<Vec2> = self.hazards.iter().map(|h| h.pos).collect();
            let pos = match place_separated(
                &mut self.rng,
                &self.torus,
                &existing,
                min_dist,
                HAZARD_TOPUP_ATTEMPTS,
            ) {
                Some(pos) => pos,
                None => {
                    log::warn!(
                        "No separated spot for hazard {} of {}, placing unconstrained",
                        self.hazards.len() + 1,
                        target
                    );
                    random_point(&mut self.rng, &self.torus)
                }
            };
            let id = self.next_entity_id();
            let hazard = factory::new_hazard(&mut self.rng, id, pos, &self.tuning);
            self.hazards.push(hazard);
        }

        if self.hazards.len() > target {
            log::debug!("Trimming hazards {} -> {}", self.hazards.len(), target);
            self.hazards.truncate(target);
        }
    }

    /// Rebuild dead agents whose respawn delay has elapsed (never in elimination)
    pub(crate) fn respawn_due_agents(&mut self) {
        if self.tuning.elimination {
            return;
        }
        let delay = self.tuning.respawn_delay as f64;
        let due: Vec<EntityId> = self
            .agents
            .iter()
            .filter(|a| !a.alive)
            .filter(|a| a.death.is_none_or(|d| self.clock - d.at >= delay))
            .map(|a| a.id)
            .collect();

        for id in due {
            let pos = self.choose_spawn(self.tuning.respawn_samples);
            let heading = self.rng.random_range(0.0..std::f32::consts::TAU);
            let body = factory::lay_out_body(pos, heading, &self.tuning, &self.torus);
            let invulnerable_until = self.clock + self.tuning.respawn_invulnerability as f64;
            if let Some(i) = self.index_of(id) {
                let agent = &mut self.agents[i];
                agent.segments = body;
                agent.heading = heading;
                agent.desired_heading = heading;
                agent.alive = true;
                agent.pending_growth = 0;
                agent.invulnerable_until = invulnerable_until;
                // Bots get a kick out of the spawn point
                agent.boost = agent.is_bot;
                log::debug!("Respawned agent {} '{}'", agent.id, agent.name);
            }
        }
    }

    /// Turn, move, wrap and re-length every living agent
    pub(crate) fn integrate_motion(&mut self, dt: f32) {
        let tuning = &self.tuning;
        let torus = &self.torus;

        for agent in self.agents.iter_mut().filter(|a| a.alive) {
            let fallback = if agent.heading.is_finite() {
                normalize_heading(agent.heading)
            } else {
                0.0
            };
            let desired = if agent.desired_heading.is_finite() {
                normalize_heading(agent.desired_heading)
            } else {
                log::debug!("Agent {} intent is not finite, keeping heading", agent.id);
                agent.desired_heading = fallback;
                fallback
            };

            agent.heading = match tuning.turn_model {
                TurnModel::Instant => desired,
                TurnModel::RateLimited { max_rate } => {
                    let max_delta = max_rate * dt;
                    let delta = angle_delta(fallback, desired).clamp(-max_delta, max_delta);
                    normalize_heading(fallback + delta)
                }
            };

            let speed = if agent.boost {
                tuning.boost_speed
            } else {
                tuning.base_speed
            };
            let velocity = heading_vec(agent.heading) * speed;

            let min_length = tuning.min_length;
            if agent.segments.is_empty() {
                log::warn!("Agent {} alive without a body, rebuilding", agent.id);
                agent.segments = factory::lay_out_body(
                    torus.wrap(Vec2::ZERO),
                    agent.heading,
                    tuning,
                    torus,
                );
            }
            let head = agent.segments[0];
            let moved = head + velocity * dt;
            let new_head = if moved.is_finite() {
                torus.wrap(moved)
            } else {
                head
            };

            agent.segments.insert(0, new_head);
            let target = tuning.target_length(agent.score, agent.pending_growth);
            agent.segments.truncate(target);

            if agent.segments.len() < min_length {
                log::warn!(
                    "Agent {} below length floor ({} < {}), padding",
                    agent.id,
                    agent.segments.len(),
                    min_length
                );
                let tail = agent.segments[agent.segments.len() - 1];
                agent.segments.resize(min_length, tail);
            }
        }
    }

    /// Heads collect nearby consumables (first agent by id wins ties)
    pub(crate) fn consume(&mut self) {
        let tuning = &self.tuning;
        let torus = &self.torus;
        let mut eaten: HashSet<EntityId> = HashSet::new();

        for agent in self.agents.iter_mut().filter(|a| a.alive) {
            let Some(head) = agent.head() else { continue };
            for item in &self.consumables {
                if eaten.contains(&item.id) || !within_pickup(torus, tuning, head, item.pos) {
                    continue;
                }
                eaten.insert(item.id);
                agent.score += item.class.score(tuning.consumable_value);
                agent.pending_growth += item.class.growth();
                self.last_collected = Some(item.class);
            }
        }

        if !eaten.is_empty() {
            self.consumables.retain(|c| !eaten.contains(&c.id));
        }
    }

    /// Head-into-body kills between distinct agents
    ///
    /// Hits are found on the post-motion snapshot and applied afterwards, so
    /// the outcome does not depend on roster order; two agents that run into
    /// each other in the same tick both die, each credited to the other.
    pub(crate) fn resolve_agent_collisions(&mut self) {
        let now = self.clock;
        let mut hits: Vec<(EntityId, EntityId)> = Vec::new();

        for victim in self.agents.iter().filter(|a| a.alive && !a.is_invulnerable(now)) {
            let killer = self
                .agents
                .iter()
                .filter(|b| b.alive)
                .find(|b| agent_hits_agent(&self.torus, &self.tuning, victim, b));
            if let Some(killer) = killer {
                hits.push((victim.id, killer.id));
            }
        }

        for (victim, killer) in hits {
            self.kill_agent(victim, Some(killer), DeathCause::AgentCollision);
        }
    }

    /// Heads inside a gravity well's lethal radius die
    pub(crate) fn resolve_hazard_collisions(&mut self) {
        let now = self.clock;
        let victims: Vec<EntityId> = self
            .agents
            .iter()
            .filter(|a| a.alive && !a.is_invulnerable(now))
            .filter(|a| {
                a.head().is_some_and(|head| {
                    self.hazards
                        .iter()
                        .any(|h| inside_lethal_radius(&self.torus, &self.tuning, head, h))
                })
            })
            .map(|a| a.id)
            .collect();

        for victim in victims {
            self.kill_agent(victim, None, DeathCause::Hazard);
        }
    }

    /// Mark an agent dead, drop its mass as consumables and reward the killer
    pub(crate) fn kill_agent(&mut self, id: EntityId, killer: Option<EntityId>, cause: DeathCause) {
        let Some(index) = self.index_of(id) else { return };
        if !self.agents[index].alive {
            return;
        }

        let fallback = random_point(&mut self.rng, &self.torus);
        let agent = &mut self.agents[index];
        agent.alive = false;
        agent.death = Some(DeathRecord {
            cause,
            at: self.clock,
            killer,
        });
        let head = agent.head().unwrap_or(fallback);
        let drop = self.tuning.death_drop(agent.segments.len());
        agent.segments.clear();
        log::debug!(
            "Agent {} '{}' died ({}), dropping {}",
            agent.id,
            agent.name,
            cause.as_str(),
            drop
        );

        let jitter = self.tuning.death_drop_jitter;
        for _ in 0..drop {
            let offset = Vec2::new(
                self.rng.random_range(-1.0..=1.0) * jitter,
                self.rng.random_range(-1.0..=1.0) * jitter,
            );
            let pos = self.torus.offset(head, offset);
            let item_id = self.next_entity_id();
            let item = factory::new_consumable(&mut self.rng, item_id, pos);
            self.consumables.push(item);
        }

        if let Some(k) = killer.and_then(|k| self.index_of(k)) {
            let killer = &mut self.agents[k];
            killer.score += self.tuning.kill_bonus;
            killer.pending_growth += self.tuning.kill_growth;
        }

        self.check_last_survivor();
    }

    /// Latch game over once at most one agent is alive (elimination only)
    ///
    /// Re-evaluated on every removal so a same-tick double kill ends with no
    /// winner.
    pub(crate) fn check_last_survivor(&mut self) {
        if !self.tuning.elimination {
            return;
        }
        let mut alive = self.agents.iter().filter(|a| a.alive);
        let first = alive.next().map(|a| a.id);
        if alive.next().is_none() {
            self.game_over = true;
            self.winner = first;
            match first {
                Some(w) => log::info!("Game over: agent {} is the last one standing", w),
                None => log::info!("Game over: no survivors"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::lay_out_body;
    use crate::sim::state::{ConsumableClass, Hazard, Skin};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    /// World with no hazards or consumables unless asked for
    fn bare_world(elimination: bool) -> World {
        let tuning = Tuning {
            consumable_target: 0,
            hazard_count: 0,
            elimination,
            ..Tuning::default()
        };
        World::empty(tuning, 1234).unwrap()
    }

    /// Place an agent body by hand and drop its spawn protection
    fn place(world: &mut World, id: EntityId, head: Vec2, heading: f32) {
        let body = lay_out_body(head, heading, &world.tuning, &world.torus);
        let i = world.index_of(id).unwrap();
        let agent = &mut world.agents[i];
        agent.segments = body;
        agent.heading = heading;
        agent.desired_heading = heading;
        agent.boost = false;
        agent.invulnerable_until = 0.0;
    }

    #[test]
    fn test_replenish_fills_exact_target() {
        let mut world = bare_world(true);
        world.tuning.consumable_target = 250;
        assert!(world.consumables().is_empty());
        world.replenish_consumables();
        assert_eq!(world.consumables().len(), 250);
        for c in world.consumables() {
            assert!(ConsumableClass::ALL.contains(&c.class));
            assert!(world.torus.contains(c.pos));
        }
        // Already at target: nothing more
        world.replenish_consumables();
        assert_eq!(world.consumables().len(), 250);
    }

    #[test]
    fn test_hazard_topup_and_trim() {
        let mut world = bare_world(true);
        world.tuning.hazard_count = 4;
        world.replenish_hazards();
        assert_eq!(world.hazards().len(), 4);
        let first_ids: Vec<EntityId> = world.hazards().iter().map(|h| h.id).collect();

        world.tuning.hazard_count = 6;
        world.replenish_hazards();
        assert_eq!(world.hazards().len(), 6);
        // Existing wells are untouched
        let ids: Vec<EntityId> = world.hazards().iter().take(4).map(|h| h.id).collect();
        assert_eq!(ids, first_ids);

        world.tuning.hazard_count = 2;
        world.replenish_hazards();
        assert_eq!(world.hazards().len(), 2);
    }

    #[test]
    fn test_hazard_topup_degrades_on_crowded_map() {
        let tuning = Tuning {
            world_width: 100.0,
            world_height: 100.0,
            consumable_target: 0,
            hazard_count: 0,
            ..Tuning::default()
        };
        let mut world = World::empty(tuning, 8).unwrap();
        world.hazards.push(Hazard {
            id: 999,
            pos: Vec2::new(50.0, 50.0),
            scale: 1.0,
        });
        world.tuning.hazard_count = 40;
        world.replenish_hazards();
        assert_eq!(world.hazards().len(), 40);
    }

    #[test]
    fn test_motion_moves_head_and_wraps() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(11_999.0, 100.0), 0.0);
        world.advance(0.05);
        let agent = world.agent(id).unwrap();
        let head = agent.head().unwrap();
        // 190 px/s * 0.05 s = 9.5 px, across the right edge
        assert!((head.x - 8.5).abs() < 1e-2);
        assert!((head.y - 100.0).abs() < 1e-3);
        assert_eq!(agent.length(), world.tuning.min_length);
    }

    #[test]
    fn test_boost_moves_faster() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 0.0);
        world.set_intent(id, 0.0, true);
        world.advance(0.1);
        let head = world.agent(id).unwrap().head().unwrap();
        assert!((head.x - 1036.0).abs() < 1e-2);
    }

    #[test]
    fn test_non_finite_intent_keeps_heading() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 1.0);
        world.set_intent(id, f32::NAN, false);
        world.advance(DT);
        let agent = world.agent(id).unwrap();
        assert!((agent.heading - 1.0).abs() < 1e-6);
        assert!(agent.desired_heading.is_finite());
        assert!(agent.head().unwrap().is_finite());
    }

    #[test]
    fn test_rate_limited_turning() {
        let mut world = bare_world(true);
        world.tuning.turn_model = TurnModel::RateLimited { max_rate: 3.0 };
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 0.0);
        world.set_intent(id, std::f32::consts::PI, false);
        world.advance(0.1);
        let heading = world.agent(id).unwrap().heading;
        assert!((angle_delta(0.0, heading).abs() - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_pause_changes_nothing() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        let before = world.agent(id).unwrap().segments.clone();
        world.advance(0.0);
        world.advance(-0.1);
        world.advance(f32::NAN);
        assert_eq!(world.agent(id).unwrap().segments, before);
        assert_eq!(world.clock(), 0.0);
    }

    #[test]
    fn test_growth_follows_score() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 0.0);
        let i = world.index_of(id).unwrap();
        world.agents[i].score = 100;
        world.agents[i].pending_growth = 1;
        // Target 100/50 + 6 + 1 = 9, reached one segment per tick
        for _ in 0..10 {
            world.advance(DT);
        }
        assert_eq!(world.agent(id).unwrap().length(), 9);
    }

    #[test]
    fn test_consumption_scores_by_class() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 0.0);
        let item_id = world.next_entity_id();
        let mut item = factory::new_consumable(&mut world.rng, item_id, Vec2::new(1010.0, 1000.0));
        item.class = ConsumableClass::Sun;
        world.consumables.push(item);

        world.advance(DT);
        let agent = world.agent(id).unwrap();
        assert_eq!(agent.score, 30);
        assert_eq!(agent.pending_growth, 6);
        assert!(world.consumables().is_empty());
        assert_eq!(world.last_collected(), Some(ConsumableClass::Sun));
    }

    #[test]
    fn test_head_into_body_kills_and_rewards() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let b = world.spawn_bot();
        let c = world.spawn_bot();
        // B runs east along y=1000; A cuts up across B's trail behind its head,
        // so A's next head lands inside (10 + 7) of B's third segment
        place(&mut world, b, Vec2::new(1000.0, 1000.0), 0.0);
        place(&mut world, a, Vec2::new(975.0, 1010.0), std::f32::consts::FRAC_PI_2 * 3.0);
        place(&mut world, c, Vec2::new(6000.0, 6000.0), 0.0);
        let b_score = world.agent(b).unwrap().score;
        let a_len = world.agent(a).unwrap().length();

        world.advance(DT);

        let dead = world.agent(a).unwrap();
        assert!(!dead.alive);
        assert!(dead.segments.is_empty());
        let death = dead.death.unwrap();
        assert_eq!(death.cause.as_str(), "snake_collision");
        assert_eq!(death.killer, Some(b));

        let killer = world.agent(b).unwrap();
        assert!(killer.alive);
        assert_eq!(killer.score, b_score + world.tuning.kill_bonus);
        assert_eq!(killer.pending_growth, world.tuning.kill_growth);

        // Mass dropped around A's last head (band 12..=120)
        let dropped = world.consumables().len();
        assert!((12..=120).contains(&dropped));
        assert!(dropped >= a_len);
        for item in world.consumables() {
            assert!(world.torus.distance(item.pos, Vec2::new(975.0, 1010.0)) < 10.0);
        }
        assert!(!world.is_game_over());
    }

    #[test]
    fn test_invulnerable_body_still_kills() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let b = world.spawn_bot();
        let c = world.spawn_bot();
        place(&mut world, b, Vec2::new(1000.0, 1000.0), 0.0);
        place(&mut world, a, Vec2::new(975.0, 1010.0), std::f32::consts::FRAC_PI_2 * 3.0);
        place(&mut world, c, Vec2::new(6000.0, 6000.0), 0.0);
        // Protection only shields B as a victim, not as an obstacle
        let i = world.index_of(b).unwrap();
        world.agents[i].invulnerable_until = 100.0;

        world.advance(DT);
        let dead = world.agent(a).unwrap();
        assert!(!dead.alive);
        assert_eq!(dead.death.unwrap().killer, Some(b));
        assert!(world.agent(b).unwrap().alive);
    }

    #[test]
    fn test_invulnerable_victim_survives() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let b = world.spawn_bot();
        place(&mut world, b, Vec2::new(1000.0, 1000.0), 0.0);
        place(&mut world, a, Vec2::new(975.0, 1010.0), std::f32::consts::FRAC_PI_2 * 3.0);
        world.tuning.hazard_count = 1;
        world.hazards.push(Hazard {
            id: 500,
            pos: Vec2::new(975.0, 1010.0),
            scale: 1.0,
        });
        let i = world.index_of(a).unwrap();
        world.agents[i].invulnerable_until = 100.0;

        world.advance(DT);
        assert!(world.agent(a).unwrap().alive);
    }

    #[test]
    fn test_lone_agent_never_dies_of_itself() {
        let mut world = bare_world(true);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(1000.0, 1000.0), 0.0);
        let i = world.index_of(id).unwrap();
        world.agents[i].score = 5000;
        // Tight circle so the head sweeps over its own trail
        for step in 0..600 {
            world.set_intent(id, step as f32 * 0.2, false);
            world.advance(DT);
        }
        assert!(world.agent(id).unwrap().alive);
    }

    #[test]
    fn test_hazard_kills_without_killer() {
        let mut world = bare_world(false);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(3000.0, 3000.0), 0.0);
        world.tuning.hazard_count = 1;
        world.hazards.push(Hazard {
            id: 700,
            pos: Vec2::new(3040.0, 3000.0),
            scale: 1.0,
        });
        world.advance(DT);
        let agent = world.agent(id).unwrap();
        assert!(!agent.alive);
        let death = agent.death.unwrap();
        assert_eq!(death.cause, DeathCause::Hazard);
        assert_eq!(death.killer, None);
    }

    #[test]
    fn test_respawn_after_delay() {
        let mut world = bare_world(false);
        let id = world.spawn_player("P", Skin::Rose);
        place(&mut world, id, Vec2::new(3000.0, 3000.0), 0.0);
        world.kill_agent(id, None, DeathCause::Hazard);
        assert!(!world.agent(id).unwrap().alive);

        // 1.2 s delay: still dead after 1 s
        for _ in 0..20 {
            world.advance(0.05);
        }
        assert!(!world.agent(id).unwrap().alive);
        for _ in 0..5 {
            world.advance(0.05);
        }
        let agent = world.agent(id).unwrap();
        assert!(agent.alive);
        assert!(agent.is_invulnerable(world.clock()));
        assert!(agent.length() >= world.tuning.min_length);
        assert_eq!(agent.death.map(|d| d.cause), Some(DeathCause::Hazard));
    }

    #[test]
    fn test_elimination_has_no_respawn() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let _b = world.spawn_bot();
        let _c = world.spawn_bot();
        world.kill_agent(a, None, DeathCause::Hazard);
        for _ in 0..100 {
            world.advance(0.05);
        }
        assert!(!world.agent(a).unwrap().alive);
    }

    #[test]
    fn test_last_one_standing_wins() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let b = world.spawn_bot();
        let c = world.spawn_bot();
        world.kill_agent(a, None, DeathCause::Hazard);
        assert!(!world.is_game_over());
        world.kill_agent(b, Some(c), DeathCause::AgentCollision);
        assert!(world.is_game_over());
        assert_eq!(world.winner(), Some(c));

        // Frozen after game over
        let clock = world.clock();
        world.advance(DT);
        assert_eq!(world.clock(), clock);
    }

    #[test]
    fn test_no_survivors_means_no_winner() {
        let mut world = bare_world(true);
        let a = world.spawn_player("A", Skin::Rose);
        let b = world.spawn_bot();
        // Heads meet: each lands on the other's body
        place(&mut world, a, Vec2::new(1000.0, 1000.0), 0.0);
        place(&mut world, b, Vec2::new(1000.0, 1000.0), 0.0);
        world.advance(DT);
        assert!(!world.agent(a).unwrap().alive);
        assert!(!world.agent(b).unwrap().alive);
        assert!(world.is_game_over());
        assert_eq!(world.winner(), None);
        // Mutual kill credits both
        assert_eq!(world.agent(a).unwrap().death.unwrap().killer, Some(b));
        assert_eq!(world.agent(b).unwrap().death.unwrap().killer, Some(a));
    }

    proptest! {
        #[test]
        fn proptest_length_bounded_by_growth_formula(
            score in 0u64..2000,
            credit in 0u32..20,
            ticks in 1usize..80,
            turn in -0.5f32..0.5,
        ) {
            let mut world = bare_world(true);
            let id = world.spawn_player("P", Skin::Rose);
            place(&mut world, id, Vec2::new(5000.0, 5000.0), 0.0);
            let i = world.index_of(id).unwrap();
            world.agents[i].score = score;
            world.agents[i].pending_growth = credit;
            for step in 0..ticks {
                world.set_intent(id, step as f32 * turn, step % 3 == 0);
                world.advance(DT);
                let agent = world.agent(id).unwrap();
                let cap = world.tuning.target_length(agent.score, agent.pending_growth);
                prop_assert!(agent.length() <= cap);
                prop_assert!(agent.length() >= world.tuning.min_length);
            }
        }
    }
}
