//! Error types for the arena simulation.

use thiserror::Error;

use crate::agent::AgentId;

/// Result type alias using [`SceneError`].
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors raised by roster operations on a [`crate::scene::Scene`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The match has already ticked; the roster is frozen.
    #[error("Roster is locked at tick {0}")]
    RosterLocked(u64),

    /// A player with this id is already on the roster.
    #[error("Player '{0}' is already registered")]
    DuplicatePlayer(String),

    /// No agent with this id exists.
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    /// No agent is registered for this player id.
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
}
