//! The combat agent: physics, targeting AI and melee resolution.
//!
//! An agent is never removed mid-match. Death is the state `health == 0`;
//! a dead agent keeps decaying its knockback and is still drawn, but it no
//! longer moves, targets or attacks.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::class::{PlayerClass, AGENT_ACCELERATION, AGENT_MAX_HEALTH, AGENT_RADIUS};
use crate::decal::BloodDecal;
use crate::events::{HitEvent, TickEvents};
use crate::math::{calculate_vector, randomize_attribute, ArenaBounds, Vec2};

/// Fraction of knockback velocity kept each tick.
pub const KNOCKBACK_DECAY: f32 = 0.85;

/// Knockback components below this magnitude snap to zero.
pub const KNOCKBACK_EPSILON: f32 = 0.1;

/// Bleeding chance per tick at zero health; scales with missing health.
pub const BLEED_CHANCE: f32 = 0.07;

/// Stable identifier of an agent within one scene (registration index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registration data supplied by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    /// Platform user id, unique per match.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar image reference (URL or local path).
    pub avatar_url: String,
}

impl PlayerData {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// Width of the band used when randomizing spawn stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatVariance {
    /// Maximum relative deviation, e.g. `0.2` for ±20%.
    pub band: f32,
}

impl StatVariance {
    /// No randomization at all.
    pub const NONE: Self = Self { band: 0.0 };
}

impl Default for StatVariance {
    fn default() -> Self {
        Self { band: 0.2 }
    }
}

/// Resolved combat stats of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Collision radius.
    pub radius: f32,
    /// Top chase speed.
    pub max_speed: f32,
    /// Chase speed gained per tick.
    pub acceleration: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Reach beyond the target's radius.
    pub melee_range: f32,
    /// Ticks between hits.
    pub melee_cooldown: u32,
    /// Health at spawn.
    pub max_health: f32,
}

impl AgentStats {
    /// Unrandomized stats for a class.
    #[must_use]
    pub const fn for_class(class: PlayerClass) -> Self {
        let base = class.base_stats();
        Self {
            radius: AGENT_RADIUS,
            max_speed: base.max_speed,
            acceleration: AGENT_ACCELERATION,
            damage: base.damage,
            melee_range: base.melee_range,
            melee_cooldown: base.melee_cooldown,
            max_health: AGENT_MAX_HEALTH,
        }
    }

    /// Class stats with speed, damage, range and cooldown perturbed.
    pub fn randomized<R: Rng + ?Sized>(class: PlayerClass, variance: StatVariance, rng: &mut R) -> Self {
        let mut stats = Self::for_class(class);
        stats.max_speed = randomize_attribute(stats.max_speed, variance.band, rng);
        stats.damage = randomize_attribute(stats.damage, variance.band, rng);
        stats.melee_range = randomize_attribute(stats.melee_range, variance.band, rng);
        let cooldown = randomize_attribute(stats.melee_cooldown as f32, variance.band, rng);
        stats.melee_cooldown = cooldown.round().max(1.0) as u32;
        stats
    }
}

/// Mutable state threaded through one agent's tick.
pub struct TickContext<'a, R: Rng + ?Sized> {
    /// Current tick number.
    pub tick: u64,
    /// Play area.
    pub bounds: &'a ArenaBounds,
    /// Random source for targeting and cosmetic jitter.
    pub rng: &'a mut R,
    /// Decal sink.
    pub decals: &'a mut Vec<BloodDecal>,
    /// Event sink.
    pub events: &'a mut TickEvents,
}

impl<R: Rng + ?Sized> TickContext<'_, R> {
    fn spawn_decal(&mut self, decal: BloodDecal) {
        self.decals.push(decal);
        self.events.decals_spawned += 1;
    }
}

/// Every agent on the roster except the one currently advancing.
///
/// Built by splitting the roster slice around the current index, so the
/// advancing agent can mutate its target without aliasing.
pub struct Others<'a> {
    before: &'a mut [Agent],
    after: &'a mut [Agent],
}

impl<'a> Others<'a> {
    /// Split `agents` into the agent at `index` and everyone else.
    pub fn split(agents: &'a mut [Agent], index: usize) -> Option<(&'a mut Agent, Self)> {
        if index >= agents.len() {
            return None;
        }
        let (before, rest) = agents.split_at_mut(index);
        let (current, after) = rest.split_first_mut()?;
        Some((current, Self { before, after }))
    }

    /// Iterate the other agents in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.before.iter().chain(self.after.iter())
    }

    /// Look up another agent by id.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.iter().find(|a| a.id == id)
    }

    /// Look up another agent mutably by id.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.before
            .iter_mut()
            .chain(self.after.iter_mut())
            .find(|a| a.id == id)
    }

    /// Whether any other agent is still alive.
    #[must_use]
    pub fn any_alive(&self) -> bool {
        self.iter().any(|a| !a.is_dead())
    }

    /// Pick a living agent uniformly at random.
    pub fn random_alive<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AgentId> {
        let alive: Vec<AgentId> = self.iter().filter(|a| !a.is_dead()).map(|a| a.id).collect();
        alive.choose(rng).copied()
    }
}

/// A single simulated combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Roster id.
    pub id: AgentId,
    /// Who this agent represents.
    pub player: PlayerData,
    /// Class the stats were seeded from.
    pub class: PlayerClass,
    /// Centre position.
    pub position: Vec2,
    /// Knockback velocity, decays every tick.
    pub knockback: Vec2,
    /// Current chase speed, ramps toward `stats.max_speed`.
    pub chase_speed: f32,
    stats: AgentStats,
    health: f32,
    melee_cooldown_left: u32,
    target: Option<AgentId>,
    damage_dealt: f32,
    kills: u32,
}

impl Agent {
    /// Spawn an agent with class stats randomized within `variance`.
    pub fn spawn<R: Rng + ?Sized>(
        id: AgentId,
        player: PlayerData,
        class: PlayerClass,
        position: Vec2,
        variance: StatVariance,
        rng: &mut R,
    ) -> Self {
        let stats = AgentStats::randomized(class, variance, rng);
        Self::with_stats(id, player, class, position, stats)
    }

    /// Build an agent with exact stats.
    #[must_use]
    pub fn with_stats(
        id: AgentId,
        player: PlayerData,
        class: PlayerClass,
        position: Vec2,
        stats: AgentStats,
    ) -> Self {
        Self {
            id,
            player,
            class,
            position,
            knockback: Vec2::ZERO,
            chase_speed: 0.0,
            health: stats.max_health.max(0.0),
            stats,
            melee_cooldown_left: 0,
            target: None,
            damage_dealt: 0.0,
            kills: 0,
        }
    }

    /// Resolved combat stats.
    #[must_use]
    pub const fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.stats.radius
    }

    /// Current health, always within `[0, max_health]`.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.stats.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.stats.max_health).clamp(0.0, 1.0)
    }

    /// Ticks until the next hit may land.
    #[must_use]
    pub const fn melee_cooldown_left(&self) -> u32 {
        self.melee_cooldown_left
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<AgentId> {
        self.target
    }

    /// Total health removed from other agents.
    #[must_use]
    pub const fn damage_dealt(&self) -> f32 {
        self.damage_dealt
    }

    /// Killing blows landed.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// `health <= 0`.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Point this agent at another one.
    pub fn set_target(&mut self, target: AgentId) {
        self.target = Some(target);
    }

    /// Take a hit from `source`.
    ///
    /// Knocks the agent away from the source, interrupts its chase, removes
    /// health (never below zero) and returns the blood splash to spawn.
    pub fn apply_damage<R: Rng + ?Sized>(&mut self, source: Vec2, amount: f32, rng: &mut R) -> BloodDecal {
        let amount = amount.max(0.0);
        let towards_source = calculate_vector(self.position, source);
        self.knockback = (-towards_source.unit).scale(amount);
        self.chase_speed = 0.0;
        let size = amount + rng.gen::<f32>() * 4.0;
        self.health = (self.health - amount).max(0.0);
        BloodDecal::new(self.position, size)
    }

    /// Whether the agent is touching a wall of the play area.
    #[must_use]
    pub fn is_at_edge_of_arena(&self, bounds: &ArenaBounds) -> bool {
        bounds.touches_edge(self.position, self.stats.radius)
    }

    /// Advance this agent by one tick.
    pub fn advance<R: Rng + ?Sized>(&mut self, others: &mut Others<'_>, ctx: &mut TickContext<'_, R>) {
        self.update_knockback();

        if !self.is_dead() && others.any_alive() {
            self.update_ai(others, ctx);
        }

        self.position = ctx.bounds.clamp(self.position, self.stats.radius);
        self.update_bleeding(ctx);
    }

    fn update_knockback(&mut self) {
        self.knockback = self.knockback.scale(KNOCKBACK_DECAY);
        if self.knockback.x.abs() < KNOCKBACK_EPSILON {
            self.knockback.x = 0.0;
        }
        if self.knockback.y.abs() < KNOCKBACK_EPSILON {
            self.knockback.y = 0.0;
        }
        self.position += self.knockback;
    }

    fn update_ai<R: Rng + ?Sized>(&mut self, others: &mut Others<'_>, ctx: &mut TickContext<'_, R>) {
        let needs_target = self
            .target
            .and_then(|id| others.get(id))
            .map_or(true, Agent::is_dead);
        if needs_target {
            self.target = others.random_alive(ctx.rng);
        }
        let Some(target_id) = self.target else {
            return;
        };
        let Some(target) = others.get_mut(target_id) else {
            self.target = None;
            return;
        };

        let reach = self.stats.melee_range + target.radius();
        self.chase_speed = (self.chase_speed + self.stats.acceleration).min(self.stats.max_speed);
        let approach = calculate_vector(self.position, target.position);
        if approach.distance > reach {
            self.position += approach.unit.scale(self.chase_speed);
        }

        if calculate_vector(self.position, target.position).distance <= reach {
            self.chase_speed = 0.0;
            if self.melee_cooldown_left == 0 {
                self.strike(target, ctx);
                self.melee_cooldown_left = self.stats.melee_cooldown;
            }
        }

        self.melee_cooldown_left = self.melee_cooldown_left.saturating_sub(1);
    }

    fn strike<R: Rng + ?Sized>(&mut self, target: &mut Agent, ctx: &mut TickContext<'_, R>) {
        let was_alive = !target.is_dead();
        let before = target.health;
        let splash = target.apply_damage(self.position, self.stats.damage, ctx.rng);
        target.set_target(self.id);
        ctx.spawn_decal(splash);

        let dealt = before - target.health;
        let killing_blow = was_alive && target.is_dead();
        self.damage_dealt += dealt;
        if killing_blow {
            self.kills += 1;
            ctx.events.deaths.push(target.id);
        }
        ctx.events.hits.push(HitEvent {
            tick: ctx.tick,
            attacker: self.id,
            target: target.id,
            damage: dealt,
            killing_blow,
        });
    }

    fn update_bleeding<R: Rng + ?Sized>(&self, ctx: &mut TickContext<'_, R>) {
        let chance = (1.0 - self.health_fraction()) * BLEED_CHANCE;
        if chance > ctx.rng.gen::<f32>() {
            let size = 6.0 + ctx.rng.gen::<f32>() * 4.0;
            ctx.spawn_decal(BloodDecal::new(self.position, size));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn agent_at(id: u32, x: f32, y: f32) -> Agent {
        Agent::with_stats(
            AgentId(id),
            PlayerData::new(format!("p{id}"), format!("Player {id}"), ""),
            PlayerClass::Warrior,
            Vec2::new(x, y),
            AgentStats::for_class(PlayerClass::Warrior),
        )
    }

    #[test]
    fn test_apply_damage_pushes_away_and_clamps_health() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut agent = agent_at(0, 400.0, 200.0);
        agent.chase_speed = 2.0;

        let decal = agent.apply_damage(Vec2::new(390.0, 200.0), 10.0, &mut rng);
        assert_eq!(agent.knockback, Vec2::new(10.0, 0.0));
        assert_eq!(agent.chase_speed, 0.0);
        assert_eq!(agent.health(), 20.0);
        assert!(decal.size >= 10.0 && decal.size < 14.0);

        agent.apply_damage(Vec2::new(390.0, 200.0), 100.0, &mut rng);
        assert_eq!(agent.health(), 0.0);
        assert!(agent.is_dead());
    }

    #[test]
    fn test_knockback_decays_to_zero() {
        let mut agent = agent_at(0, 400.0, 200.0);
        agent.knockback = Vec2::new(5.0, -3.0);
        let mut previous = agent.knockback.length();
        let mut ticks = 0;
        while agent.knockback != Vec2::ZERO {
            agent.update_knockback();
            let current = agent.knockback.length();
            assert!(current < previous);
            previous = current;
            ticks += 1;
            assert!(ticks < 100, "knockback never settled");
        }
    }

    #[test]
    fn test_others_split_excludes_self() {
        let mut agents = vec![agent_at(0, 300.0, 100.0), agent_at(1, 350.0, 100.0), agent_at(2, 400.0, 100.0)];
        let (current, others) = Others::split(&mut agents, 1).unwrap();
        assert_eq!(current.id, AgentId(1));
        let ids: Vec<AgentId> = others.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(2)]);
        assert!(others.get(AgentId(1)).is_none());
    }

    #[test]
    fn test_randomized_stats_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(99);
        for class in PlayerClass::ALL {
            let base = AgentStats::for_class(class);
            let stats = AgentStats::randomized(class, StatVariance::default(), &mut rng);
            assert!(stats.damage >= base.damage * 0.8 && stats.damage <= base.damage * 1.2);
            assert!(stats.max_speed >= base.max_speed * 0.8 && stats.max_speed <= base.max_speed * 1.2);
            assert!(stats.melee_cooldown >= 1);
            assert_eq!(stats.max_health, base.max_health);
        }
    }
}
