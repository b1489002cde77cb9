//! Spawn placement
//!
//! Agents spawn far from living heads and from gravity wells. Candidates are
//! drawn from a rotating 3×3 partition of the world so that successive spawns
//! land in different regions; each candidate is scored by the smaller of its
//! squared distance to the nearest head and to the nearest hazard, with ±10%
//! noise to break ties. The best candidate always wins: the engine never
//! fails, it just returns the least bad point on a crowded map.
//!
//! Hazards use a jittered grid with a minimum toroidal separation, falling
//! back to rejection sampling when the grid under-fills.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::torus::Torus;

/// Quadrant grid is SPAWN_GRID × SPAWN_GRID
pub const SPAWN_GRID: u32 = 3;

/// Candidates are kept away from cell borders by this fraction
const CELL_MARGIN: f32 = 0.1;

/// Jittered placements tried per hazard grid cell
const HAZARD_TRIES_PER_CELL: usize = 12;

/// Rejection attempts after the grid pass
const HAZARD_REJECTION_BUDGET: usize = 500;

/// Random point inside a cell, away from its borders
fn jitter_in_cell<R: Rng + ?Sized>(rng: &mut R, origin: Vec2, size: Vec2) -> Vec2 {
    let fx = rng.random_range(CELL_MARGIN..1.0 - CELL_MARGIN);
    let fy = rng.random_range(CELL_MARGIN..1.0 - CELL_MARGIN);
    origin + Vec2::new(fx * size.x, fy * size.y)
}

/// Uniform random point anywhere in the world
pub fn random_point<R: Rng + ?Sized>(rng: &mut R, torus: &Torus) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..torus.width),
        rng.random_range(0.0..torus.height),
    )
}

/// Squared toroidal distance to the closest of `points` (∞ if none)
fn nearest_distance_squared(torus: &Torus, p: Vec2, points: &[Vec2]) -> f32 {
    points
        .iter()
        .map(|q| torus.distance_squared(p, *q))
        .fold(f32::INFINITY, f32::min)
}

/// Separation score of a candidate before dispersion noise
pub fn spawn_score(torus: &Torus, candidate: Vec2, heads: &[Vec2], hazards: &[Vec2]) -> f32 {
    nearest_distance_squared(torus, candidate, heads)
        .min(nearest_distance_squared(torus, candidate, hazards))
}

/// Whether `p` keeps at least `min_dist` from every point in `placed`
fn is_separated(torus: &Torus, p: Vec2, placed: &[Vec2], min_dist: f32) -> bool {
    let min_d2 = min_dist * min_dist;
    placed.iter().all(|q| torus.distance_squared(p, *q) >= min_d2)
}

/// Agent spawn planner (owns the rotating quadrant cursor)
#[derive(Debug, Clone, Default)]
pub struct SpawnPlanner {
    next_quadrant: u32,
}

impl SpawnPlanner {
    /// Advance the cursor, returning the (column, row) of the quadrant to use
    pub fn next_quadrant(&mut self) -> (u32, u32) {
        let q = self.next_quadrant % (SPAWN_GRID * SPAWN_GRID);
        self.next_quadrant = (q + 1) % (SPAWN_GRID * SPAWN_GRID);
        (q % SPAWN_GRID, q / SPAWN_GRID)
    }

    /// Best of `samples` candidates in the next quadrant
    pub fn choose_agent_position<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        torus: &Torus,
        heads: &[Vec2],
        hazards: &[Vec2],
        samples: usize,
    ) -> Vec2 {
        let (qx, qy) = self.next_quadrant();
        let cell = Vec2::new(
            torus.width / SPAWN_GRID as f32,
            torus.height / SPAWN_GRID as f32,
        );
        let origin = Vec2::new(qx as f32 * cell.x, qy as f32 * cell.y);

        // Quadrant centre if every sample is somehow unusable
        let mut best = origin + cell * 0.5;
        let mut best_score = f32::NEG_INFINITY;
        for _ in 0..samples.max(1) {
            let candidate = jitter_in_cell(rng, origin, cell);
            let dispersion = rng.random_range(0.9..1.1);
            let score = spawn_score(torus, candidate, heads, hazards) * dispersion;
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
        torus.wrap(best)
    }
}

/// Lay out up to `count` hazard positions on a shuffled jittered grid
///
/// Cells are visited in random order so rows do not fill first; each cell
/// gets a few jittered tries to respect the minimum separation. If the grid
/// leaves gaps, plain rejection sampling with the same separation fills in.
/// The result may still hold fewer than `count` points on a cramped map.
pub fn plan_hazard_layout<R: Rng + ?Sized>(rng: &mut R, torus: &Torus, count: usize) -> Vec<Vec2> {
    let mut placed: Vec<Vec2> = Vec::with_capacity(count);
    if count == 0 {
        return placed;
    }

    let cells = ((count * 2) as f32).sqrt().ceil().max(1.0) as usize;
    let cell = Vec2::new(torus.width / cells as f32, torus.height / cells as f32);
    let min_dist = cell.x.min(cell.y) * 0.9;

    let mut order: Vec<(usize, usize)> = (0..cells)
        .flat_map(|gy| (0..cells).map(move |gx| (gx, gy)))
        .collect();
    order.shuffle(rng);

    for (gx, gy) in order {
        if placed.len() >= count {
            break;
        }
        let origin = Vec2::new(gx as f32 * cell.x, gy as f32 * cell.y);
        for _ in 0..HAZARD_TRIES_PER_CELL {
            let candidate = torus.wrap(jitter_in_cell(rng, origin, cell));
            if is_separated(torus, candidate, &placed, min_dist) {
                placed.push(candidate);
                break;
            }
        }
    }

    let mut attempts = 0;
    while placed.len() < count && attempts < HAZARD_REJECTION_BUDGET {
        attempts += 1;
        let candidate = random_point(rng, torus);
        if is_separated(torus, candidate, &placed, min_dist) {
            placed.push(candidate);
        }
    }
    placed
}

/// One extra hazard position keeping `min_dist` from `existing`
///
/// Returns None when `attempts` rejections all fail; the caller degrades to
/// an unconstrained placement.
pub fn place_separated<R: Rng + ?Sized>(
    rng: &mut R,
    torus: &Torus,
    existing: &[Vec2],
    min_dist: f32,
    attempts: usize,
) -> Option<Vec2> {
    (0..attempts)
        .map(|_| random_point(rng, torus))
        .find(|p| is_separated(torus, *p, existing, min_dist))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn torus() -> Torus {
        Torus::new(12_000.0, 12_000.0)
    }

    #[test]
    fn test_quadrants_rotate_in_raster_order() {
        let mut planner = SpawnPlanner::default();
        let seen: Vec<(u32, u32)> = (0..10).map(|_| planner.next_quadrant()).collect();
        assert_eq!(seen[0], (0, 0));
        assert_eq!(seen[1], (1, 0));
        assert_eq!(seen[3], (0, 1));
        assert_eq!(seen[8], (2, 2));
        assert_eq!(seen[9], (0, 0));
    }

    #[test]
    fn test_agent_spawn_stays_in_quadrant() {
        let t = torus();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut planner = SpawnPlanner::default();
        for q in 0..9u32 {
            let p = planner.choose_agent_position(&mut rng, &t, &[], &[], 16);
            let (qx, qy) = (q % 3, q / 3);
            assert!(p.x >= qx as f32 * 4000.0 && p.x < (qx + 1) as f32 * 4000.0);
            assert!(p.y >= qy as f32 * 4000.0 && p.y < (qy + 1) as f32 * 4000.0);
        }
    }

    #[test]
    fn test_agent_spawn_avoids_threats() {
        let t = torus();
        let mut rng = Pcg32::seed_from_u64(17);
        let mut planner = SpawnPlanner::default();
        // Hazard in the middle of quadrant (0, 0), head near its corner
        let hazards = [Vec2::new(2000.0, 2000.0)];
        let heads = [Vec2::new(500.0, 500.0)];
        let p = planner.choose_agent_position(&mut rng, &t, &heads, &hazards, 64);
        assert!(t.distance(p, hazards[0]) > 1000.0);
        assert!(t.distance(p, heads[0]) > 1000.0);
    }

    #[test]
    fn test_spawn_score_is_min_of_both() {
        let t = torus();
        let p = Vec2::new(100.0, 100.0);
        let score = spawn_score(&t, p, &[Vec2::new(130.0, 100.0)], &[Vec2::new(100.0, 500.0)]);
        assert!((score - 900.0).abs() < 1e-2);
        assert_eq!(spawn_score(&t, p, &[], &[]), f32::INFINITY);
    }

    #[test]
    fn test_hazard_layout_respects_separation() {
        let t = torus();
        let mut rng = Pcg32::seed_from_u64(99);
        let layout = plan_hazard_layout(&mut rng, &t, 5);
        assert_eq!(layout.len(), 5);
        // 5 hazards -> 4×4 grid -> cells of 3000 -> min separation 2700
        for (i, a) in layout.iter().enumerate() {
            assert!(t.contains(*a));
            for b in &layout[i + 1..] {
                assert!(t.distance(*a, *b) >= 2700.0 - 1e-2);
            }
        }
    }

    #[test]
    fn test_place_separated_gives_up_on_full_map() {
        let t = Torus::new(100.0, 100.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let existing = [Vec2::new(50.0, 50.0)];
        // Nothing on a 100×100 torus is 500 away from anything
        assert!(place_separated(&mut rng, &t, &existing, 500.0, 50).is_none());
        assert!(place_separated(&mut rng, &t, &existing, 1.0, 50).is_some());
    }
}
