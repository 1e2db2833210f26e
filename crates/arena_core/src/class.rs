//! Player classes and their seed stat tables.
//!
//! Every class shares the same agent behaviour. A class only changes the
//! base stats that get randomized when an agent spawns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collision radius shared by every agent, in pixels.
pub const AGENT_RADIUS: f32 = 16.0;

/// Chase acceleration per tick shared by every agent.
pub const AGENT_ACCELERATION: f32 = 0.1;

/// Maximum health shared by every agent.
pub const AGENT_MAX_HEALTH: f32 = 30.0;

/// Selectable combat class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerClass {
    /// Balanced reference stats.
    #[default]
    Warrior,
    /// Fast, light hits, short cooldown.
    Rogue,
    /// Slow, heavy hits.
    Knight,
    /// Very heavy hits, long cooldown.
    Berserker,
    /// Long reach, modest damage.
    Spearman,
}

/// Base stats seeded into an agent before randomization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Top chase speed in pixels per tick.
    pub max_speed: f32,
    /// Damage per landed hit.
    pub damage: f32,
    /// Reach beyond the target's radius, in pixels.
    pub melee_range: f32,
    /// Ticks between hits.
    pub melee_cooldown: u32,
}

impl PlayerClass {
    /// Every selectable class, in display order.
    pub const ALL: [Self; 5] = [
        Self::Warrior,
        Self::Rogue,
        Self::Knight,
        Self::Berserker,
        Self::Spearman,
    ];

    /// Seed stat table for this class.
    #[must_use]
    pub const fn base_stats(self) -> BaseStats {
        match self {
            Self::Warrior => BaseStats {
                max_speed: 3.0,
                damage: 5.0,
                melee_range: 24.0,
                melee_cooldown: 30,
            },
            Self::Rogue => BaseStats {
                max_speed: 4.0,
                damage: 3.0,
                melee_range: 20.0,
                melee_cooldown: 18,
            },
            Self::Knight => BaseStats {
                max_speed: 2.2,
                damage: 7.0,
                melee_range: 25.6,
                melee_cooldown: 40,
            },
            Self::Berserker => BaseStats {
                max_speed: 3.4,
                damage: 8.0,
                melee_range: 22.4,
                melee_cooldown: 45,
            },
            Self::Spearman => BaseStats {
                max_speed: 2.6,
                damage: 4.0,
                melee_range: 40.0,
                melee_cooldown: 32,
            },
        }
    }

    /// Lowercase tag used on the command surface.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Rogue => "rogue",
            Self::Knight => "knight",
            Self::Berserker => "berserker",
            Self::Spearman => "spearman",
        }
    }

    /// Tint used for placeholder avatars and sidebar accents (RGB).
    #[must_use]
    pub const fn color(self) -> [u8; 3] {
        match self {
            Self::Warrior => [196, 142, 62],
            Self::Rogue => [96, 168, 92],
            Self::Knight => [108, 132, 196],
            Self::Berserker => [190, 70, 60],
            Self::Spearman => [150, 110, 180],
        }
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a class tag does not name one of the five classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown player class '{0}'")]
pub struct ParseClassError(pub String);

impl FromStr for PlayerClass {
    type Err = ParseClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseClassError(s.to_string()))
    }
}
