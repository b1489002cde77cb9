//! Collision tests on the torus
//!
//! All tests compare squared toroidal distances against squared radii.

use glam::Vec2;

use super::state::{Agent, Hazard};
use super::torus::Torus;
use crate::tuning::Tuning;

/// Result of a head-versus-body check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyHit {
    /// Index of the first body segment touched
    pub segment: usize,
    /// Contact point (the segment position)
    pub point: Vec2,
}

/// First segment of `body` (skipping its head) within `head_radius + body_radius` of `head`
pub fn head_body_collision(
    torus: &Torus,
    head: Vec2,
    body: &[Vec2],
    head_radius: f32,
    body_radius: f32,
) -> Option<BodyHit> {
    let reach = head_radius + body_radius;
    let reach2 = reach * reach;
    body.iter()
        .enumerate()
        .skip(1)
        .find(|(_, seg)| torus.distance_squared(head, **seg) < reach2)
        .map(|(segment, point)| BodyHit {
            segment,
            point: *point,
        })
}

/// Whether `attacker`'s head runs into `defender`'s body
///
/// An agent is never tested against itself.
pub fn agent_hits_agent(torus: &Torus, tuning: &Tuning, attacker: &Agent, defender: &Agent) -> bool {
    if attacker.id == defender.id {
        return false;
    }
    match attacker.head() {
        Some(head) => head_body_collision(
            torus,
            head,
            &defender.segments,
            tuning.head_radius,
            tuning.body_radius,
        )
        .is_some(),
        None => false,
    }
}

/// Whether a point lies inside a hazard's scaled lethal radius
pub fn inside_lethal_radius(torus: &Torus, tuning: &Tuning, point: Vec2, hazard: &Hazard) -> bool {
    let lethal = hazard.lethal_radius(tuning);
    torus.distance_squared(point, hazard.pos) < lethal * lethal
}

/// Whether a point lies within a consumable pickup radius
#[inline]
pub fn within_pickup(torus: &Torus, tuning: &Tuning, head: Vec2, item: Vec2) -> bool {
    torus.distance_squared(head, item) < tuning.pickup_radius * tuning.pickup_radius
}
