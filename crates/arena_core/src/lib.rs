//! # Arena Core
//!
//! Melee arena simulation core.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No unseeded randomness inside the crate (callers inject a [`rand::rngs::StdRng`])
//!
//! This separation enables:
//! - Rendering and encoding tested independently of combat
//! - Seeded, reproducible matches in tests
//! - Benchmarks of raw tick throughput
//!
//! ## Crate Structure
//!
//! - [`agent`] - The combatant: physics, targeting AI, melee
//! - [`class`] - Player classes and their seed stat tables
//! - [`decal`] - Cosmetic blood decals
//! - [`scene`] - Roster, decals and the tick loop
//! - [`math`] - Vector and stat-randomization helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod class;
pub mod decal;
pub mod error;
pub mod events;
pub mod math;
pub mod scene;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentId, AgentStats, PlayerData, StatVariance};
    pub use crate::class::{ParseClassError, PlayerClass};
    pub use crate::decal::BloodDecal;
    pub use crate::error::{Result, SceneError};
    pub use crate::events::{HitEvent, TickEvents};
    pub use crate::math::{ArenaBounds, Vec2};
    pub use crate::scene::Scene;
}
