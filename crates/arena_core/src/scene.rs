//! The arena scene: roster, decals and the tick loop.
//!
//! A scene advances every agent once per tick in registration order, then
//! ages and prunes decals. It decides nothing about when a match stops;
//! callers poll [`Scene::is_match_over`].
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut scene = Scene::new(ArenaBounds::default(), StdRng::seed_from_u64(7));
//! scene.add_agent(PlayerData::new("1", "Alice", ""), PlayerClass::Knight).unwrap();
//! scene.add_agent(PlayerData::new("2", "Bob", ""), PlayerClass::Rogue).unwrap();
//!
//! while !scene.is_match_over() && scene.current_tick() < 10_000 {
//!     scene.tick();
//! }
//! assert!(scene.is_match_over() || scene.alive_count() == 2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::agent::{Agent, AgentId, AgentStats, Others, PlayerData, StatVariance, TickContext};
use crate::class::{PlayerClass, AGENT_RADIUS};
use crate::decal::{BloodDecal, DEFAULT_DECAL_LIFETIME};
use crate::error::{Result, SceneError};
use crate::events::TickEvents;
use crate::math::{ArenaBounds, Vec2};

/// Hard cap on live decals; the oldest are dropped first once exceeded.
pub const MAX_DECALS: usize = 4_000;

/// Owns the live roster and the decal list for one match.
#[derive(Debug, Clone)]
pub struct Scene {
    bounds: ArenaBounds,
    agents: Vec<Agent>,
    decals: Vec<BloodDecal>,
    decal_lifetime: u32,
    variance: StatVariance,
    rng: StdRng,
    tick: u64,
    tick_ceiling: Option<u64>,
}

impl Scene {
    /// Create an empty scene driven by `rng`.
    #[must_use]
    pub fn new(bounds: ArenaBounds, rng: StdRng) -> Self {
        Self {
            bounds,
            agents: Vec::new(),
            decals: Vec::new(),
            decal_lifetime: DEFAULT_DECAL_LIFETIME,
            variance: StatVariance::default(),
            rng,
            tick: 0,
            tick_ceiling: None,
        }
    }

    /// Stop the match after this many ticks even if several agents live.
    #[must_use]
    pub fn with_tick_ceiling(mut self, ceiling: u64) -> Self {
        self.tick_ceiling = Some(ceiling);
        self
    }

    /// Override how long decals stay visible.
    #[must_use]
    pub fn with_decal_lifetime(mut self, ticks: u32) -> Self {
        self.decal_lifetime = ticks;
        self
    }

    /// Override the spawn stat variance.
    #[must_use]
    pub fn with_variance(mut self, variance: StatVariance) -> Self {
        self.variance = variance;
        self
    }

    /// Drop every agent and decal and rewind to tick zero.
    pub fn reset(&mut self) {
        self.agents.clear();
        self.decals.clear();
        self.tick = 0;
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.tick > 0 {
            return Err(SceneError::RosterLocked(self.tick));
        }
        Ok(())
    }

    fn next_id(&self) -> AgentId {
        AgentId(self.agents.len() as u32)
    }

    /// Uniform random point where an agent fits inside the play area.
    pub fn random_spawn_position(&mut self) -> Vec2 {
        let r = AGENT_RADIUS;
        let min_x = self.bounds.sidebar_width + r;
        let max_x = (self.bounds.width - r).max(min_x);
        let max_y = (self.bounds.height - r).max(r);
        let x = if max_x > min_x { self.rng.gen_range(min_x..max_x) } else { min_x };
        let y = if max_y > r { self.rng.gen_range(r..max_y) } else { r };
        Vec2::new(x, y)
    }

    /// Register a player at a random position with randomized class stats.
    pub fn add_agent(&mut self, player: PlayerData, class: PlayerClass) -> Result<AgentId> {
        self.ensure_unlocked()?;
        if self.agent_by_player(&player.id).is_some() {
            return Err(SceneError::DuplicatePlayer(player.id));
        }
        let id = self.next_id();
        let position = self.random_spawn_position();
        let agent = Agent::spawn(id, player, class, position, self.variance, &mut self.rng);
        trace!(agent = %id, class = %class, x = position.x, y = position.y, "Agent registered");
        self.agents.push(agent);
        Ok(id)
    }

    /// Register a player with exact stats at an exact position.
    pub fn add_agent_with_stats(
        &mut self,
        player: PlayerData,
        class: PlayerClass,
        position: Vec2,
        stats: AgentStats,
    ) -> Result<AgentId> {
        self.ensure_unlocked()?;
        if self.agent_by_player(&player.id).is_some() {
            return Err(SceneError::DuplicatePlayer(player.id));
        }
        let id = self.next_id();
        let position = self.bounds.clamp(position, stats.radius);
        self.agents.push(Agent::with_stats(id, player, class, position, stats));
        Ok(id)
    }

    /// Re-seed a registered player's stats from a different class.
    ///
    /// Keeps the agent's id, registration slot and spawn position.
    pub fn replace_agent_class(&mut self, player_id: &str, class: PlayerClass) -> Result<()> {
        self.ensure_unlocked()?;
        let variance = self.variance;
        let index = self
            .agents
            .iter()
            .position(|a| a.player.id == player_id)
            .ok_or_else(|| SceneError::PlayerNotFound(player_id.to_string()))?;
        let old = &self.agents[index];
        let replacement = Agent::spawn(
            old.id,
            old.player.clone(),
            class,
            old.position,
            variance,
            &mut self.rng,
        );
        self.agents[index] = replacement;
        Ok(())
    }

    /// Advance every agent, then age and prune decals.
    pub fn tick(&mut self) -> TickEvents {
        self.tick += 1;
        let mut events = TickEvents::default();

        for index in 0..self.agents.len() {
            let Some((agent, mut others)) = Others::split(&mut self.agents, index) else {
                continue;
            };
            let mut ctx = TickContext {
                tick: self.tick,
                bounds: &self.bounds,
                rng: &mut self.rng,
                decals: &mut self.decals,
                events: &mut events,
            };
            agent.advance(&mut others, &mut ctx);
            debug_assert!(agent.position.is_finite(), "agent {} position is not finite", agent.id);
            debug_assert!(agent.health() >= 0.0 && agent.health() <= agent.max_health());
        }

        self.age_decals();

        for death in &events.deaths {
            debug!(tick = self.tick, agent = %death, alive = self.alive_count(), "Agent died");
        }
        events
    }

    fn age_decals(&mut self) {
        let lifetime = self.decal_lifetime;
        for decal in &mut self.decals {
            decal.age = decal.age.saturating_add(1);
        }
        self.decals.retain(|d| !d.is_faded(lifetime));
        if self.decals.len() > MAX_DECALS {
            let excess = self.decals.len() - MAX_DECALS;
            self.decals.drain(..excess);
        }
    }

    /// At most one agent alive, or the tick ceiling reached.
    #[must_use]
    pub fn is_match_over(&self) -> bool {
        self.alive_count() <= 1 || self.ceiling_reached()
    }

    /// Whether the configured tick ceiling has been hit.
    #[must_use]
    pub fn ceiling_reached(&self) -> bool {
        self.tick_ceiling.is_some_and(|ceiling| self.tick >= ceiling)
    }

    /// Number of living agents.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| !a.is_dead()).count()
    }

    /// Living agents in registration order.
    pub fn survivors(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| !a.is_dead())
    }

    /// Every agent in registration order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up an agent by id.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Look up an agent by player id.
    #[must_use]
    pub fn agent_by_player(&self, player_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.player.id == player_id)
    }

    /// Live decals, oldest first.
    #[must_use]
    pub fn decals(&self) -> &[BloodDecal] {
        &self.decals
    }

    /// Ticks a decal stays visible.
    #[must_use]
    pub const fn decal_lifetime(&self) -> u32 {
        self.decal_lifetime
    }

    /// Ticks elapsed.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Play area.
    #[must_use]
    pub const fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    /// Hash of all gameplay state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for agent in &self.agents {
            agent.id.hash(&mut hasher);
            agent.position.x.to_bits().hash(&mut hasher);
            agent.position.y.to_bits().hash(&mut hasher);
            agent.knockback.x.to_bits().hash(&mut hasher);
            agent.knockback.y.to_bits().hash(&mut hasher);
            agent.health().to_bits().hash(&mut hasher);
            agent.melee_cooldown_left().hash(&mut hasher);
            agent.target().hash(&mut hasher);
        }
        self.decals.len().hash(&mut hasher);
        hasher.finish()
    }
}
