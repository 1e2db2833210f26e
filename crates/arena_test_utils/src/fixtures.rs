//! Test fixtures and helpers.
//!
//! Pre-built scenes and agent configurations for consistent testing.
//! Everything here is seeded; nothing touches entropy.

use arena_core::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded RNG for tests.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Empty scene with default bounds and a seeded RNG.
#[must_use]
pub fn empty_scene(seed: u64) -> Scene {
    Scene::new(ArenaBounds::default(), seeded_rng(seed))
}

/// Player data with a predictable name and no avatar.
#[must_use]
pub fn test_player(id: &str) -> PlayerData {
    PlayerData::new(id, format!("Player {id}"), format!("file:///nonexistent/{id}.png"))
}

/// Unrandomized class stats with selected overrides.
#[derive(Debug, Clone, Copy)]
pub struct StatsBuilder {
    stats: AgentStats,
}

impl StatsBuilder {
    /// Start from the exact class table.
    #[must_use]
    pub const fn class(class: PlayerClass) -> Self {
        Self {
            stats: AgentStats::for_class(class),
        }
    }

    /// Override damage per hit.
    #[must_use]
    pub const fn damage(mut self, damage: f32) -> Self {
        self.stats.damage = damage;
        self
    }

    /// Override melee range.
    #[must_use]
    pub const fn melee_range(mut self, range: f32) -> Self {
        self.stats.melee_range = range;
        self
    }

    /// Override cooldown ticks.
    #[must_use]
    pub const fn cooldown(mut self, ticks: u32) -> Self {
        self.stats.melee_cooldown = ticks;
        self
    }

    /// Override maximum (and starting) health.
    #[must_use]
    pub const fn max_health(mut self, health: f32) -> Self {
        self.stats.max_health = health;
        self
    }

    /// Override top speed.
    #[must_use]
    pub const fn max_speed(mut self, speed: f32) -> Self {
        self.stats.max_speed = speed;
        self
    }

    /// Finished stats.
    #[must_use]
    pub const fn build(self) -> AgentStats {
        self.stats
    }
}

/// Two agents where the first kills the second with its first swing.
///
/// The striker deals 30 damage and reaches across the whole arena; the
/// victim has 30 health and deals no damage.
#[must_use]
pub fn one_hit_duel(seed: u64) -> Scene {
    let mut scene = empty_scene(seed);
    let striker = StatsBuilder::class(PlayerClass::Warrior)
        .damage(30.0)
        .melee_range(2_000.0)
        .build();
    let victim = StatsBuilder::class(PlayerClass::Warrior)
        .damage(0.0)
        .max_health(30.0)
        .build();
    scene
        .add_agent_with_stats(test_player("striker"), PlayerClass::Warrior, Vec2::new(300.0, 270.0), striker)
        .expect("fixture registration");
    scene
        .add_agent_with_stats(test_player("victim"), PlayerClass::Warrior, Vec2::new(700.0, 270.0), victim)
        .expect("fixture registration");
    scene
}

/// Two agents with fixed stats standing in each other's reach, for
/// cooldown counting. Only the first agent deals damage.
#[must_use]
pub fn sparring_pair(seed: u64, cooldown: u32) -> Scene {
    let mut scene = empty_scene(seed);
    let attacker = StatsBuilder::class(PlayerClass::Warrior)
        .damage(1.0)
        .melee_range(2_000.0)
        .cooldown(cooldown)
        .build();
    let dummy = StatsBuilder::class(PlayerClass::Warrior)
        .damage(0.0)
        .max_health(10_000.0)
        .build();
    scene
        .add_agent_with_stats(test_player("attacker"), PlayerClass::Warrior, Vec2::new(400.0, 270.0), attacker)
        .expect("fixture registration");
    scene
        .add_agent_with_stats(test_player("dummy"), PlayerClass::Warrior, Vec2::new(450.0, 270.0), dummy)
        .expect("fixture registration");
    scene
}

/// A full brawl: `count` agents cycling through every class, randomized stats.
#[must_use]
pub fn brawl(seed: u64, count: usize) -> Scene {
    let mut scene = empty_scene(seed);
    for (i, class) in PlayerClass::ALL.iter().cycle().take(count).enumerate() {
        scene
            .add_agent(test_player(&i.to_string()), *class)
            .expect("fixture registration");
    }
    scene
}
