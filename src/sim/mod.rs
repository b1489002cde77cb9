//! Arena simulation
//!
//! Everything that moves lives here. The module is headless and driven only
//! by `dt` and seeded RNGs:
//! - World clock, no wall-clock reads
//! - Stable iteration order (agents by entity ID)
//! - No rendering or platform dependencies

pub mod bots;
pub mod collision;
pub mod factory;
pub mod population;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod torus;

pub use bots::{BotController, BotIntent, BotMemory, Goal};
pub use collision::{BodyHit, agent_hits_agent, head_body_collision};
pub use population::PopulationManager;
pub use spawn::{SpawnPlanner, plan_hazard_layout};
pub use state::{
    Agent, AgentSpawn, ClassTraits, Consumable, ConsumableClass, DeathCause, DeathRecord,
    EntityId, Hazard, Skin, SpeedMode, World,
};
pub use torus::Torus;
