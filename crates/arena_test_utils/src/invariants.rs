//! Per-tick invariant checking.
//!
//! Runs a scene tick by tick and checks, after every tick, that:
//!
//! - every agent's health is within `[0, max_health]`
//! - every agent lies inside the play area
//! - every position is finite
//! - no dead agent comes back to life
//!
//! Violations are collected rather than panicking so property tests can
//! report them through `prop_assert!`.

use arena_core::prelude::*;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Tick on which it was observed.
    pub tick: u64,
    /// Offending agent.
    pub agent: AgentId,
    /// What went wrong.
    pub message: String,
}

/// Outcome of a checked run.
#[derive(Debug, Clone, Default)]
pub struct CheckedRun {
    /// Ticks actually simulated.
    pub ticks: u64,
    /// Every hit observed, in order.
    pub hits: Vec<HitEvent>,
    /// Broken invariants (empty on success).
    pub violations: Vec<Violation>,
}

impl CheckedRun {
    /// Panic with every violation listed if any were recorded.
    ///
    /// # Panics
    ///
    /// Panics if any invariant was broken.
    pub fn assert_clean(&self) {
        assert!(
            self.violations.is_empty(),
            "{} invariant violation(s), first: {:?}",
            self.violations.len(),
            self.violations.first()
        );
    }
}

/// Check every invariant on the scene's current state.
#[must_use]
pub fn check_scene(scene: &Scene) -> Vec<Violation> {
    let bounds = scene.bounds();
    let tick = scene.current_tick();
    let mut out = Vec::new();
    for agent in scene.agents() {
        let mut fail = |message: String| {
            out.push(Violation {
                tick,
                agent: agent.id,
                message,
            });
        };
        if !(agent.health() >= 0.0 && agent.health() <= agent.max_health()) {
            fail(format!("health {} outside [0, {}]", agent.health(), agent.max_health()));
        }
        if !agent.position.is_finite() {
            fail(format!("non-finite position {:?}", agent.position));
        } else if !bounds.contains(agent.position, agent.radius()) {
            fail(format!("position {:?} outside arena", agent.position));
        }
    }
    out
}

/// Tick `scene` until the match is over or `max_ticks` pass, checking
/// invariants after every tick.
pub fn run_checked(scene: &mut Scene, max_ticks: u64) -> CheckedRun {
    let mut run = CheckedRun::default();
    let mut dead: Vec<AgentId> = Vec::new();

    while run.ticks < max_ticks && !scene.is_match_over() {
        let events = scene.tick();
        run.ticks += 1;
        run.hits.extend(events.hits);
        run.violations.extend(check_scene(scene));

        for id in &dead {
            if scene.agent(*id).is_some_and(|a| !a.is_dead()) {
                run.violations.push(Violation {
                    tick: scene.current_tick(),
                    agent: *id,
                    message: "dead agent revived".to_string(),
                });
            }
        }
        dead = scene.agents().iter().filter(|a| a.is_dead()).map(|a| a.id).collect();
    }

    tracing::debug!(ticks = run.ticks, hits = run.hits.len(), "Checked run finished");
    run
}
