//! In-match leaderboard
//!
//! Ranks agents by body length, recomputed from a world snapshot.

use serde::{Deserialize, Serialize};

use crate::sim::{EntityId, World};

/// Maximum number of standings kept
pub const MAX_STANDINGS: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub id: EntityId,
    pub name: String,
    /// Body length in segments
    pub length: usize,
    pub score: u64,
    /// Row of the controlled agent
    pub is_player: bool,
}

/// Top agents by length
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<Standing>,
}

impl Leaderboard {
    /// Rank every agent (longest first, ties by id) and keep the top ten
    pub fn from_world(world: &World, player: Option<EntityId>) -> Self {
        let mut entries: Vec<Standing> = world
            .agents()
            .iter()
            .map(|a| Standing {
                id: a.id,
                name: a.name.clone(),
                length: a.length(),
                score: a.score,
                is_player: Some(a.id) == player,
            })
            .collect();
        entries.sort_by(|a, b| b.length.cmp(&a.length).then(a.id.cmp(&b.id)));
        entries.truncate(MAX_STANDINGS);
        Self { entries }
    }

    /// 1-indexed rank of an agent, None if outside the top ten
    pub fn rank_of(&self, id: EntityId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id).map(|i| i + 1)
    }

    pub fn leader(&self) -> Option<&Standing> {
        self.entries.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
