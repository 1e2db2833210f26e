//! Events emitted by a simulation tick.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// One landed melee hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// Tick on which the hit landed.
    pub tick: u64,
    /// Agent that swung.
    pub attacker: AgentId,
    /// Agent that was struck.
    pub target: AgentId,
    /// Health actually removed (capped by the target's remaining health).
    pub damage: f32,
    /// Whether this hit took the target to zero health.
    pub killing_blow: bool,
}

/// Everything that happened during one [`crate::scene::Scene::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Hits in resolution order.
    pub hits: Vec<HitEvent>,
    /// Agents that died this tick.
    pub deaths: Vec<AgentId>,
    /// Decals spawned this tick (hit splashes and bleeding).
    pub decals_spawned: u32,
}

impl TickEvents {
    /// True if nothing notable happened.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.hits.is_empty() && self.deaths.is_empty()
    }
}
