//! Autonomous agent controller
//!
//! Each tick every living bot gets a desired heading and a boost flag. The
//! heading starts from a resource goal (or a wander drift), is rotated toward
//! a combat target, then toward an escape from the nearest gravity well.
//! Two stall failsafes run last and may override the blend.
//!
//! Per-bot scratch state lives in a side table keyed by agent id; the world
//! only ever sees the resulting intent.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Agent, EntityId, World};
use super::torus::Torus;
use crate::tuning::{BotTuning, Tuning};
use crate::{angle_delta, heading_vec, normalize_heading};

/// Goals closer than this are dropped as reached
const GOAL_REACHED: f32 = 16.0;

/// Weight floor under which the weighted centroid is ignored
const MIN_CENTROID_WEIGHT: f32 = 1e-4;

/// Transient aim point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub point: Vec2,
    /// Re-evaluation is suppressed until this clock value
    pub locked_until: Option<f64>,
}

impl Goal {
    fn is_locked(&self, now: f64) -> bool {
        self.locked_until.is_some_and(|t| now < t)
    }
}

/// Controller-private state of one bot
#[derive(Debug, Clone)]
pub struct BotMemory {
    // === Stall detection (layer 1) ===
    stall_origin: Vec2,
    stall_since: f64,

    // === Stuck duration (layer 2) ===
    last_head: Vec2,
    stuck_duration: f32,
    last_pulse_at: f64,
    boost_until: Option<f64>,

    // === Goal seeking ===
    pub goal: Option<Goal>,
    retarget_acc: f32,

    // === Counters ===
    /// Times layer 1 forced a random heading
    pub stall_resets: u32,
    /// Times layer 2 fired a boost pulse
    pub stuck_pulses: u32,
}

impl BotMemory {
    fn new(head: Vec2, now: f64) -> Self {
        Self {
            stall_origin: head,
            stall_since: now,
            last_head: head,
            stuck_duration: 0.0,
            last_pulse_at: f64::NEG_INFINITY,
            boost_until: None,
            goal: None,
            retarget_acc: 0.0,
            stall_resets: 0,
            stuck_pulses: 0,
        }
    }

    /// Accumulated slow-movement time
    pub fn stuck_duration(&self) -> f32 {
        self.stuck_duration
    }
}

/// Steering away from the nearest gravity well
#[derive(Debug, Clone, Copy)]
struct Avoidance {
    heading: f32,
    weight: f32,
    immediate: bool,
}

/// Steering toward another agent
#[derive(Debug, Clone, Copy)]
struct Attack {
    heading: f32,
    weight: f32,
}

/// Controller output for one bot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotIntent {
    pub heading: f32,
    pub boost: bool,
}

/// Drives every bot in a world
#[derive(Debug, Clone)]
pub struct BotController {
    rng: Pcg32,
    memory: HashMap<EntityId, BotMemory>,
}

impl BotController {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            memory: HashMap::new(),
        }
    }

    /// Scratch state of a bot, if it has been driven at least once
    pub fn memory(&self, id: EntityId) -> Option<&BotMemory> {
        self.memory.get(&id)
    }

    /// Forget everything (match restart)
    pub fn reset(&mut self) {
        self.memory.clear();
    }

    /// Compute and write intent for every living bot
    pub fn update(&mut self, world: &mut World, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() || world.is_game_over() {
            return;
        }

        // Dead or reassigned agents start from scratch next time
        self.memory
            .retain(|id, _| world.agent(*id).is_some_and(|a| a.alive && a.is_bot));

        let bots: Vec<EntityId> = world
            .agents()
            .iter()
            .filter(|a| a.alive && a.is_bot)
            .map(|a| a.id)
            .collect();

        for id in bots {
            if let Some(intent) = self.decide(world, id, dt) {
                world.set_intent(id, intent.heading, intent.boost);
            }
        }
    }

    /// Decision for a single bot against the current world snapshot
    pub fn decide(&mut self, world: &World, id: EntityId, dt: f32) -> Option<BotIntent> {
        let agent = world.agent(id)?;
        let head = agent.head()?;
        let now = world.clock();
        let tuning = world.tuning();
        let bt = &tuning.bots;
        let torus = world.torus();

        let Self { rng, memory } = self;
        let mem = memory
            .entry(id)
            .or_insert_with(|| BotMemory::new(head, now));

        let mut boost = agent.boost;

        // Stall sampling: progress releases boost, a stall overrides the blend below
        let moved = torus.distance(head, mem.stall_origin);
        let stalled =
            now - mem.stall_since > bt.stall_window as f64 && moved < bt.stall_distance;
        if stalled || moved > bt.progress_distance {
            mem.stall_origin = head;
            mem.stall_since = now;
            if !stalled {
                boost = false;
            }
        }

        // 1) Hazard avoidance
        let avoidance = assess_hazards(world, &torus, tuning, head);
        let immediate = avoidance.is_some_and(|a| a.immediate);

        // 2) Combat targeting
        let attack = if immediate {
            None
        } else {
            pick_target(rng, world, &torus, tuning, agent, head)
        };

        // 3) Goal seeking
        mem.retarget_acc += dt;
        if let Some(goal) = mem.goal {
            if goal.locked_until.is_some_and(|t| now >= t) {
                mem.goal = Some(Goal {
                    locked_until: None,
                    ..goal
                });
            }
            if torus.distance_squared(head, goal.point) < GOAL_REACHED * GOAL_REACHED
                && !goal.is_locked(now)
            {
                mem.goal = None;
            }
        }
        let locked = mem.goal.is_some_and(|g| g.is_locked(now));
        if mem.goal.is_none() || (mem.retarget_acc > bt.goal_cadence && !locked) {
            mem.retarget_acc = 0.0;
            mem.goal = choose_goal(world, &torus, tuning, head, now);
        }

        let mut heading = match mem.goal {
            Some(goal) => {
                torus.angle_to(head, goal.point) + rng.random_range(-bt.goal_jitter..=bt.goal_jitter)
            }
            None => {
                agent.desired_heading
                    + rng.random_range(-bt.wander_rate..=bt.wander_rate) * dt
            }
        };

        // 4) Blend: combat, then avoidance
        if let Some(attack) = attack {
            heading += angle_delta(heading, attack.heading) * attack.weight;
            if rng.random_bool(bt.combat_boost_chance) {
                boost = true;
            }
        }
        if let Some(avoid) = avoidance {
            let delta = angle_delta(heading, avoid.heading);
            let mut weight = if avoid.immediate {
                1.0
            } else {
                avoid.weight.min(bt.avoid_weight_cap)
            };
            if !avoid.immediate && delta.abs() > FRAC_PI_2 {
                weight *= 0.5;
            }
            heading += delta * weight;
        }

        // 5a) Stall failsafe: barely moved over the stall window
        if stalled {
            heading = rng.random_range(0.0..TAU);
            boost = true;
            mem.stall_resets += 1;
            log::debug!("Bot {} stalled, forcing a new heading", id);
        }

        // 5b) Stuck duration: slow ticks add, good ticks drain
        let step = torus.distance(head, mem.last_head);
        mem.last_head = head;
        if step < bt.slow_speed * dt {
            mem.stuck_duration += dt;
        } else {
            mem.stuck_duration = (mem.stuck_duration - 0.5 * dt).max(0.0);
        }
        if mem.stuck_duration > bt.stuck_threshold
            && now - mem.last_pulse_at >= bt.stuck_cooldown as f64
        {
            heading += rng.random_range(-bt.stuck_turn..=bt.stuck_turn);
            boost = true;
            mem.boost_until = Some(now + bt.boost_pulse as f64);
            mem.last_pulse_at = now;
            mem.stuck_duration = 0.0;
            mem.stuck_pulses += 1;
            log::debug!("Bot {} stuck, boost pulse", id);
        }
        match mem.boost_until {
            Some(until) if now < until => boost = true,
            Some(_) => {
                mem.boost_until = None;
                boost = false;
            }
            None => {}
        }

        if !boost {
            boost = rng.random_bool(bt.idle_boost_chance);
        }

        if !heading.is_finite() {
            log::debug!("Bot {} heading is not finite, randomizing", id);
            heading = rng.random_range(0.0..TAU);
        }

        Some(BotIntent {
            heading: normalize_heading(heading),
            boost,
        })
    }
}

/// Escape heading and weight from the nearest hazard, if it is close enough
fn assess_hazards(world: &World, torus: &Torus, tuning: &Tuning, head: Vec2) -> Option<Avoidance> {
    let bt = &tuning.bots;
    let nearest = world.hazards().iter().min_by(|a, b| {
        torus
            .distance_squared(head, a.pos)
            .total_cmp(&torus.distance_squared(head, b.pos))
    })?;

    let d = torus.distance(head, nearest.pos).max(1.0);
    let away = torus.angle_to(nearest.pos, head);
    let danger = nearest.lethal_radius(tuning) * bt.danger_factor;
    let influence = nearest.influence_radius(tuning);

    if d < danger {
        Some(Avoidance {
            heading: away,
            weight: 1.0,
            immediate: true,
        })
    } else if d < influence {
        let w = ((influence - d) / influence).clamp(0.0, bt.influence_weight_cap);
        Some(Avoidance {
            heading: away,
            weight: w.sqrt(),
            immediate: false,
        })
    } else {
        None
    }
}

/// Whether a point lies in the danger ring of any hazard
fn near_hazard(world: &World, torus: &Torus, tuning: &Tuning, point: Vec2, factor: f32) -> bool {
    world.hazards().iter().any(|h| {
        let r = h.lethal_radius(tuning) * factor;
        torus.distance_squared(point, h.pos) < r * r
    })
}

/// Best-scoring living opponent and the heading to intercept it
fn pick_target<R: Rng + ?Sized>(
    rng: &mut R,
    world: &World,
    torus: &Torus,
    tuning: &Tuning,
    me: &Agent,
    head: Vec2,
) -> Option<Attack> {
    let bt = &tuning.bots;
    let mut best: Option<(f32, &Agent, Vec2, f32)> = None;

    for other in world.agents().iter().filter(|a| a.alive && a.id != me.id) {
        let Some(other_head) = other.head() else { continue };
        let d = torus.distance(head, other_head).max(1.0);
        let mut score = bt.combat_proximity / d;
        if near_hazard(world, torus, tuning, other_head, bt.danger_factor) {
            score -= bt.combat_hazard_penalty;
        }
        if !other.is_bot {
            score += bt.combat_player_bonus;
        }
        if best.is_none_or(|(s, ..)| score > s) {
            best = Some((score, other, other_head, d));
        }
    }

    let (_, target, target_head, d) = best?;
    let aim = torus.offset(target_head, heading_vec(target.heading) * bt.combat_lead);
    let heading = torus.angle_to(head, aim) + rng.random_range(-bt.combat_jitter..=bt.combat_jitter);
    Some(Attack {
        heading,
        weight: (bt.combat_weight_scale / d.max(bt.combat_weight_min_dist)).min(bt.combat_weight_cap),
    })
}

/// Pick a resource goal around `head`
///
/// A dense pile wins and is locked; otherwise the inverse-square weighted
/// centroid of nearby items (heavily discounted near hazards); otherwise the
/// single closest item anywhere.
fn choose_goal(world: &World, torus: &Torus, tuning: &Tuning, head: Vec2, now: f64) -> Option<Goal> {
    let bt: &BotTuning = &tuning.bots;
    let scan2 = bt.scan_radius * bt.scan_radius;
    let dense2 = bt.dense_radius * bt.dense_radius;

    let mut weighted = Vec2::ZERO;
    let mut wsum = 0.0f32;
    let mut dense = Vec2::ZERO;
    let mut dense_count = 0usize;
    let mut closest: Option<(f32, Vec2)> = None;

    for item in world.consumables() {
        let delta = torus.delta(head, item.pos);
        let d2 = delta.length_squared();
        if closest.is_none_or(|(c, _)| d2 < c) {
            closest = Some((d2, delta));
        }
        if d2 >= scan2 {
            continue;
        }
        let penalty = if near_hazard(world, torus, tuning, item.pos, bt.food_hazard_margin) {
            bt.food_hazard_penalty
        } else {
            1.0
        };
        let w = penalty / d2.max(64.0);
        weighted += delta * w;
        wsum += w;
        if d2 < dense2 {
            dense += delta;
            dense_count += 1;
        }
    }

    let (offset, locked_until) = if dense_count >= bt.dense_min_count {
        (dense / dense_count as f32, Some(now + bt.goal_lock as f64))
    } else if wsum > MIN_CENTROID_WEIGHT {
        (weighted / wsum, None)
    } else {
        (closest?.1, None)
    };

    Some(Goal {
        point: torus.offset(head, offset),
        locked_until,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::{lay_out_body, new_consumable};
    use crate::sim::state::{Hazard, Skin};

    const DT: f32 = 1.0 / 60.0;

    fn bare_world() -> World {
        let tuning = Tuning {
            consumable_target: 0,
            hazard_count: 0,
            ..Tuning::default()
        };
        World::empty(tuning, 77).unwrap()
    }

    fn place(world: &mut World, id: EntityId, head: Vec2, heading: f32) {
        let body = lay_out_body(head, heading, &world.tuning, &world.torus);
        let i = world.index_of(id).unwrap();
        world.agents[i].segments = body;
        world.agents[i].heading = heading;
        world.agents[i].desired_heading = heading;
    }

    fn drop_item(world: &mut World, pos: Vec2) {
        let id = world.next_entity_id();
        let item = new_consumable(&mut world.rng, id, pos);
        world.consumables.push(item);
    }

    #[test]
    fn test_danger_radius_forces_escape() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        let prey = world.spawn_player("P", Skin::Rose);
        // Hazard just left of the bot across the seam; prey to the left too
        world.hazards.push(Hazard {
            id: 900,
            pos: Vec2::new(11_950.0, 3000.0),
            scale: 1.0,
        });
        place(&mut world, bot, Vec2::new(50.0, 3000.0), std::f32::consts::PI);
        place(&mut world, prey, Vec2::new(11_800.0, 3000.0), 0.0);
        drop_item(&mut world, Vec2::new(11_990.0, 3000.0));

        // Any combat contribution would switch boost on
        world.tuning.bots.combat_boost_chance = 1.0;
        world.tuning.bots.idle_boost_chance = 0.0;
        world.set_intent(bot, std::f32::consts::PI, false);

        let mut controller = BotController::new(1);
        let intent = controller.decide(&world, bot, DT).unwrap();
        // Away from the well is +x, heading 0
        assert!(angle_delta(intent.heading, 0.0).abs() < 1e-3);
        assert!(!intent.boost);
    }

    #[test]
    fn test_combat_boost_survives_progress() {
        let mut world = bare_world();
        world.tuning.bots.combat_boost_chance = 1.0;
        world.tuning.bots.idle_boost_chance = 0.0;
        let bot = world.spawn_bot();
        let player = world.spawn_player("P", Skin::Rose);
        place(&mut world, bot, Vec2::new(2000.0, 2000.0), 0.0);
        place(&mut world, player, Vec2::new(2000.0, 2300.0), 0.0);
        world.set_intent(bot, 0.0, false);

        let mut controller = BotController::new(11);
        let first = controller.decide(&world, bot, DT).unwrap();
        assert!(first.boost);

        // Moved past the progress distance, which releases the old boost
        world.set_intent(bot, first.heading, false);
        place(&mut world, bot, Vec2::new(2030.0, 2000.0), first.heading);
        world.clock += DT as f64;
        let second = controller.decide(&world, bot, DT).unwrap();
        assert!(second.boost);
    }

    #[test]
    fn test_soft_avoidance_bends_toward_escape() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        world.hazards.push(Hazard {
            id: 900,
            pos: Vec2::new(3000.0, 3300.0),
            scale: 1.0,
        });
        place(&mut world, bot, Vec2::new(3000.0, 3000.0), 0.0);
        // Goal straight ahead (+x), hazard 300 below: outside danger, inside influence
        drop_item(&mut world, Vec2::new(3100.0, 3000.0));

        let mut controller = BotController::new(2);
        let intent = controller.decide(&world, bot, DT).unwrap();
        let turn = angle_delta(0.0, intent.heading);
        // Bent away from the well (negative y), but not all the way
        assert!(turn < -0.05);
        assert!(turn > -FRAC_PI_2);
    }

    #[test]
    fn test_dense_cluster_locks_goal() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        place(&mut world, bot, Vec2::new(5000.0, 5000.0), 0.0);
        for i in 0..10 {
            drop_item(&mut world, Vec2::new(5040.0 + i as f32, 5010.0));
        }
        // A lone item elsewhere in range would pull a plain centroid away
        drop_item(&mut world, Vec2::new(5000.0, 4800.0));

        let mut controller = BotController::new(3);
        controller.decide(&world, bot, DT).unwrap();
        let goal = controller.memory(bot).unwrap().goal.unwrap();
        assert!(goal.locked_until.is_some());
        assert!((goal.point - Vec2::new(5044.5, 5010.0)).length() < 1e-2);

        // Within the lock the goal is kept even though the pile moved
        world.consumables.clear();
        drop_item(&mut world, Vec2::new(4900.0, 5000.0));
        world.clock += 0.5;
        controller.decide(&world, bot, 0.3).unwrap();
        assert_eq!(controller.memory(bot).unwrap().goal.unwrap().point, goal.point);
    }

    #[test]
    fn test_goal_falls_back_to_closest_item() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        place(&mut world, bot, Vec2::new(1000.0, 1000.0), 0.0);
        drop_item(&mut world, Vec2::new(1000.0, 3000.0));
        drop_item(&mut world, Vec2::new(8000.0, 8000.0));

        let mut controller = BotController::new(4);
        let intent = controller.decide(&world, bot, DT).unwrap();
        let goal = controller.memory(bot).unwrap().goal.unwrap();
        assert_eq!(goal.point, Vec2::new(1000.0, 3000.0));
        assert!(angle_delta(intent.heading, FRAC_PI_2).abs() < 0.05);
    }

    #[test]
    fn test_no_items_means_wander() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        place(&mut world, bot, Vec2::new(1000.0, 1000.0), 1.0);
        let mut controller = BotController::new(5);
        let intent = controller.decide(&world, bot, DT).unwrap();
        assert!(controller.memory(bot).unwrap().goal.is_none());
        // Drift bounded by wander_rate * dt
        assert!(angle_delta(1.0, intent.heading).abs() <= 0.35 * DT + 1e-5);
    }

    #[test]
    fn test_combat_pulls_toward_player() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        let player = world.spawn_player("P", Skin::Rose);
        place(&mut world, bot, Vec2::new(2000.0, 2000.0), 0.0);
        // Player 100 px below, heading away; no food so the base is a wander at 0
        place(&mut world, player, Vec2::new(2000.0, 2100.0), FRAC_PI_2);
        let mut controller = BotController::new(6);
        let intent = controller.decide(&world, bot, DT).unwrap();
        // Aim ≈ π/2, weight min(0.65, 400 / 100) = 0.65
        let turn = angle_delta(0.0, intent.heading);
        assert!((turn - 0.65 * FRAC_PI_2).abs() < 0.1);
    }

    #[test]
    fn test_stall_failsafe_forces_boost() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        let head = Vec2::new(4000.0, 4000.0);
        place(&mut world, bot, head, 0.0);
        let mut controller = BotController::new(7);

        // Head pinned in place while the clock runs
        for _ in 0..70 {
            world.clock += DT as f64;
            controller.update(&mut world, DT);
        }
        let memory = controller.memory(bot).unwrap();
        assert!(memory.stall_resets >= 1);
        assert!(world.agent(bot).unwrap().boost);
        assert!(world.agent(bot).unwrap().desired_heading.is_finite());
    }

    #[test]
    fn test_stuck_pulse_fires_and_releases() {
        let mut world = bare_world();
        let bot = world.spawn_bot();
        place(&mut world, bot, Vec2::new(4000.0, 4000.0), 0.0);
        let mut controller = BotController::new(8);

        for _ in 0..90 {
            world.clock += DT as f64;
            controller.update(&mut world, DT);
        }
        let memory = controller.memory(bot).unwrap();
        assert_eq!(memory.stuck_pulses, 1);
        // Cooldown holds off a second pulse
        for _ in 0..60 {
            world.clock += DT as f64;
            controller.update(&mut world, DT);
        }
        assert_eq!(controller.memory(bot).unwrap().stuck_pulses, 1);
    }

    #[test]
    fn test_memory_dropped_for_dead_bots() {
        let mut world = bare_world();
        world.tuning.elimination = false;
        let bot = world.spawn_bot();
        let mut controller = BotController::new(9);
        controller.update(&mut world, DT);
        assert!(controller.memory(bot).is_some());
        world.kill_agent(bot, None, crate::sim::state::DeathCause::Hazard);
        controller.update(&mut world, DT);
        assert!(controller.memory(bot).is_none());
    }

    #[test]
    fn test_players_are_not_driven() {
        let mut world = bare_world();
        let player = world.spawn_player("P", Skin::Rose);
        world.set_intent(player, 2.0, false);
        let mut controller = BotController::new(10);
        controller.update(&mut world, DT);
        assert_eq!(world.agent(player).unwrap().desired_heading, 2.0);
        assert!(controller.memory(player).is_none());
    }
}
