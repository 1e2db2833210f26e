//! Structured match outcome handed back to the orchestrator.

use std::path::PathBuf;

use arena_core::agent::Agent;
use arena_core::class::PlayerClass;
use arena_core::scene::Scene;
use serde::{Deserialize, Serialize};

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Fewer than two players registered; nothing was simulated.
    NoContest,
    /// Exactly one agent left standing.
    Winner {
        /// Winner's player id.
        player_id: String,
        /// Winner's display name.
        name: String,
    },
    /// The last agents fell on the same tick.
    Draw,
    /// The tick ceiling stopped a match with several agents still alive.
    TickCeiling {
        /// Player ids of everyone still standing.
        survivors: Vec<String>,
    },
}

/// Final state of one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Player id.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Class fought as.
    pub class: PlayerClass,
    /// Still standing at the end.
    pub alive: bool,
    /// Health at the end.
    pub health: f32,
    /// Total damage landed.
    pub damage_dealt: f32,
    /// Killing blows landed.
    pub kills: u32,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            player_id: agent.player.id.clone(),
            name: agent.player.name.clone(),
            class: agent.class,
            alive: !agent.is_dead(),
            health: agent.health(),
            damage_dealt: agent.damage_dealt(),
            kills: agent.kills(),
        }
    }
}

/// Result of one `run_game` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// How it ended.
    pub outcome: MatchOutcome,
    /// Ticks simulated (one frame per tick).
    pub duration_ticks: u64,
    /// Length of the video in seconds.
    pub duration_secs: f64,
    /// Finished video, if one was produced.
    pub video_path: Option<PathBuf>,
    /// Locale tag the orchestrator asked for.
    pub locale: String,
    /// Every participant in registration order.
    pub agents: Vec<AgentSummary>,
}

impl MatchReport {
    /// Report for a match that never started.
    #[must_use]
    pub fn no_contest(locale: &str, scene: &Scene) -> Self {
        Self {
            outcome: MatchOutcome::NoContest,
            duration_ticks: 0,
            duration_secs: 0.0,
            video_path: None,
            locale: locale.to_string(),
            agents: scene.agents().iter().map(AgentSummary::from).collect(),
        }
    }

    /// Report for a finished scene.
    #[must_use]
    pub fn from_scene(scene: &Scene, duration_secs: f64, video_path: Option<PathBuf>, locale: &str) -> Self {
        let survivors: Vec<&Agent> = scene.survivors().collect();
        let outcome = match survivors.as_slice() {
            [] => MatchOutcome::Draw,
            [winner] => MatchOutcome::Winner {
                player_id: winner.player.id.clone(),
                name: winner.player.name.clone(),
            },
            many => MatchOutcome::TickCeiling {
                survivors: many.iter().map(|a| a.player.id.clone()).collect(),
            },
        };
        Self {
            outcome,
            duration_ticks: scene.current_tick(),
            duration_secs,
            video_path,
            locale: locale.to_string(),
            agents: scene.agents().iter().map(AgentSummary::from).collect(),
        }
    }

    /// Winner's player id, if there was exactly one survivor.
    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        match &self.outcome {
            MatchOutcome::Winner { player_id, .. } => Some(player_id.as_str()),
            _ => None,
        }
    }

    /// Whether anything was simulated.
    #[must_use]
    pub fn was_contested(&self) -> bool {
        self.outcome != MatchOutcome::NoContest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_test_utils::fixtures::{empty_scene, one_hit_duel, test_player};

    #[test]
    fn test_outcome_from_survivors() {
        let mut scene = one_hit_duel(1);
        scene.tick();
        let report = MatchReport::from_scene(&scene, 1.0 / 60.0, None, "en");
        assert_eq!(report.winner(), Some("striker"));
        assert_eq!(report.duration_ticks, 1);
        assert_eq!(report.agents.len(), 2);
        assert!(!report.agents[1].alive);
        assert_eq!(report.agents[0].kills, 1);
    }

    #[test]
    fn test_several_survivors_is_ceiling() {
        let mut scene = empty_scene(2);
        scene.add_agent(test_player("a"), PlayerClass::Rogue).unwrap();
        scene.add_agent(test_player("b"), PlayerClass::Knight).unwrap();
        let report = MatchReport::from_scene(&scene, 0.0, None, "fi");
        assert_eq!(
            report.outcome,
            MatchOutcome::TickCeiling {
                survivors: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(report.locale, "fi");
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(MatchOutcome::Winner {
            player_id: "7".to_string(),
            name: "Seven".to_string(),
        })
        .unwrap();
        assert_eq!(json["result"], "winner");
        assert_eq!(json["player_id"], "7");
        let draw = serde_json::to_value(MatchOutcome::Draw).unwrap();
        assert_eq!(draw["result"], "draw");
    }
}
