//! Entity construction with randomized cosmetic/physical attributes

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::state::{Agent, Consumable, ConsumableClass, EntityId, Hazard, Skin};
use super::torus::Torus;
use crate::heading_vec;
use crate::tuning::Tuning;

/// Names handed out to bots
pub const BOT_NAMES: [&str; 30] = [
    "Léo", "Mia", "Noah", "Lina", "Eli", "Nora", "Zoe", "Liam", "Ava", "Milo", "Enzo", "Léa",
    "Sacha", "Emma", "Noé", "Luna", "Maé", "Tom", "Nina", "Yanis", "Chloé", "Axel", "Iris", "Nolan",
    "Lola", "Maya", "Ethan", "Jade", "Yuna", "Adam",
];

pub fn random_bot_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    BOT_NAMES.choose(rng).copied().unwrap_or("Bot").to_string()
}

pub fn random_skin<R: Rng + ?Sized>(rng: &mut R) -> Skin {
    Skin::ALL.choose(rng).copied().unwrap_or_default()
}

/// Draw a class from the weighted class table
pub fn pick_class<R: Rng + ?Sized>(rng: &mut R) -> ConsumableClass {
    let total: u32 = ConsumableClass::ALL.iter().map(|c| c.traits().weight).sum();
    let mut roll = rng.random_range(0..total);
    for class in ConsumableClass::ALL {
        let weight = class.traits().weight;
        if roll < weight {
            return class;
        }
        roll -= weight;
    }
    ConsumableClass::Earth
}

/// A consumable at `pos` with random class and cosmetics
pub fn new_consumable<R: Rng + ?Sized>(rng: &mut R, id: EntityId, pos: Vec2) -> Consumable {
    let spin = rng.random_range(0.1..0.6);
    let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    Consumable {
        id,
        pos,
        radius: rng.random_range(5.0..9.0),
        class: pick_class(rng),
        hue: rng.random_range(0..360),
        ringed: rng.random_bool(0.55),
        tilt: rng.random_range(-0.6..0.6),
        spin_speed: spin * direction,
        spin_phase: rng.random_range(0.0..std::f32::consts::TAU),
    }
}

/// A gravity well at `pos` with a random scale
pub fn new_hazard<R: Rng + ?Sized>(rng: &mut R, id: EntityId, pos: Vec2, tuning: &Tuning) -> Hazard {
    Hazard {
        id,
        pos,
        scale: rng.random_range(tuning.hazard_scale_min..=tuning.hazard_scale_max),
    }
}

/// Minimum-length body trailing straight behind `head`, spaced evenly
pub fn lay_out_body(head: Vec2, heading: f32, tuning: &Tuning, torus: &Torus) -> Vec<Vec2> {
    let back = -heading_vec(heading) * tuning.segment_spacing;
    (0..tuning.min_length)
        .map(|i| torus.offset(head, back * i as f32))
        .collect()
}

/// A live agent at `head` facing `heading`
pub fn new_agent(
    id: EntityId,
    name: String,
    skin: Skin,
    head: Vec2,
    heading: f32,
    tuning: &Tuning,
    torus: &Torus,
) -> Agent {
    Agent {
        id,
        name,
        skin,
        segments: lay_out_body(head, heading, tuning, torus),
        heading,
        desired_heading: heading,
        boost: false,
        score: 0,
        pending_growth: 0,
        alive: true,
        invulnerable_until: 0.0,
        is_bot: false,
        death: None,
    }
}
