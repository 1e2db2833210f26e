//! Match orchestration.
//!
//! A [`GameRunner`] owns one scene and walks it through
//! `Idle → Collecting → Running → Idle`: players register, pick classes,
//! then [`GameRunner::run_game`] simulates, renders and encodes the match.
//!
//! # Defensive Coding Principles (JPL-style)
//!
//! - The tick loop is bounded by the configured ceiling
//! - Frames are streamed, never accumulated
//! - Progress is logged at regular intervals
//! - Failure modes are explicit, not silent

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arena_core::agent::AgentId;
use arena_core::class::{ParseClassError, PlayerClass, AGENT_RADIUS};
use arena_core::error::SceneError;
use arena_core::prelude::PlayerData;
use arena_core::scene::Scene;
use arena_render::{load_avatars, AvatarSource, HttpAvatarSource, SceneRenderer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::config::MatchConfig;
use crate::encoder::{EncodeError, FfmpegEncoder, FrameSink};
use crate::match_result::MatchReport;

/// Most players one match accepts.
pub const MAX_PLAYER_COUNT: usize = 20;

/// Log progress every N ticks (10 seconds of video at 60 fps).
const PROGRESS_LOG_INTERVAL: u64 = 600;

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// No match set up.
    #[default]
    Idle,
    /// Accepting registrations.
    Collecting,
    /// Simulating and encoding.
    Running,
}

/// A registration request that was refused. The roster is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Player id already registered.
    #[error("Player '{0}' is already in the match")]
    DuplicatePlayer(String),
    /// No such player registered.
    #[error("Player '{0}' is not in the match")]
    UnknownPlayer(String),
    /// Class tag not recognised.
    #[error(transparent)]
    UnknownClass(#[from] ParseClassError),
    /// Roster is at [`MAX_PLAYER_COUNT`].
    #[error("Match is full ({0} players)")]
    RosterFull(usize),
    /// A match is running or has already been played on this roster.
    #[error("Match already in progress")]
    MatchInProgress,
}

impl From<SceneError> for RegistrationError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::RosterLocked(_) => Self::MatchInProgress,
            SceneError::DuplicatePlayer(id) => Self::DuplicatePlayer(id),
            SceneError::PlayerNotFound(id) => Self::UnknownPlayer(id),
            SceneError::AgentNotFound(id) => Self::UnknownPlayer(id.to_string()),
        }
    }
}

/// Why a match could not be completed.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Frames could not be turned into a video.
    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),
    /// `run_game` was called while a match was running.
    #[error("Match already in progress")]
    AlreadyRunning,
    /// The scene already played out; `initialize_game` starts a new one.
    #[error("Match already played after {ticks} ticks; initialize a new game first")]
    AlreadyPlayed {
        /// Ticks the finished match ran for.
        ticks: u64,
    },
}

/// One row of the participant listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    /// Player id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Selected class.
    pub class: PlayerClass,
}

impl fmt::Display for PlayerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class)
    }
}

/// Formats rows as one `name (class)` line each.
#[derive(Debug, Clone, Copy)]
pub struct PlayerList<'a>(pub &'a [PlayerRow]);

impl fmt::Display for PlayerList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

/// What [`run_match`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRun {
    /// Ticks simulated.
    pub ticks: u64,
    /// Frames handed to the sink.
    pub frames: u64,
    /// Finished video, if the sink made one.
    pub video_path: Option<PathBuf>,
}

/// Drive `scene` to completion, pushing one rendered frame per tick into
/// `sink`, then finish the sink.
///
/// Stops when the scene reports the match over or `config.max_ticks` ticks
/// have elapsed, whichever comes first.
pub async fn run_match<S: FrameSink>(
    scene: &mut Scene,
    renderer: &mut SceneRenderer,
    sink: &mut S,
    config: &MatchConfig,
) -> Result<MatchRun, EncodeError> {
    let started = Instant::now();
    info!(
        agents = scene.agents().len(),
        max_ticks = config.max_ticks,
        fps = config.fps,
        "Starting match simulation"
    );

    let mut frames = 0u64;
    while !scene.is_match_over() && scene.current_tick() < config.max_ticks {
        let events = scene.tick();
        let tick = scene.current_tick();

        for hit in &events.hits {
            trace!(tick, attacker = %hit.attacker, target = %hit.target, damage = hit.damage, "Hit");
        }
        if !events.deaths.is_empty() {
            debug!(tick, deaths = ?events.deaths, alive = scene.alive_count(), "Agents down");
        }

        let frame = renderer.render(scene);
        if let Err(err) = sink.push_frame(frame).await {
            error!(tick, error = %err, "Frame rejected, aborting match");
            return Err(err);
        }
        frames += 1;

        if tick % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                tick,
                alive = scene.alive_count(),
                decals = scene.decals().len(),
                "Match progress"
            );
        }
    }

    if !scene.is_match_over() {
        warn!(ticks = scene.current_tick(), "Tick ceiling reached with several agents alive");
    }

    let video_path = sink.finish().await?;
    info!(
        ticks = scene.current_tick(),
        frames,
        survivors = scene.alive_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Match simulation complete"
    );
    Ok(MatchRun {
        ticks: scene.current_tick(),
        frames,
        video_path,
    })
}

/// Registration and execution of one match at a time.
#[derive(Debug)]
pub struct GameRunner {
    config: MatchConfig,
    scene: Scene,
    state: RunnerState,
}

impl GameRunner {
    /// Runner whose randomness is seeded from the OS.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Runner with reproducible randomness.
    #[must_use]
    pub fn with_seed(config: MatchConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: MatchConfig, rng: StdRng) -> Self {
        let scene = Scene::new(config.bounds(), rng)
            .with_tick_ceiling(config.max_ticks)
            .with_decal_lifetime(config.decal_lifetime)
            .with_variance(config.variance());
        Self {
            config,
            scene,
            state: RunnerState::Idle,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// The scene as it currently stands.
    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Clear the roster and decals and start collecting players.
    pub fn initialize_game(&mut self) -> Result<(), RegistrationError> {
        if self.state == RunnerState::Running {
            return Err(RegistrationError::MatchInProgress);
        }
        self.scene.reset();
        self.state = RunnerState::Collecting;
        info!("Game initialized");
        Ok(())
    }

    /// Register a player with the default class.
    ///
    /// Duplicate ids and a full roster are refused without changing anything.
    pub fn add_player(&mut self, player: PlayerData) -> Result<AgentId, RegistrationError> {
        self.add_player_with_class(player, PlayerClass::default())
    }

    /// Register a player with a chosen class.
    pub fn add_player_with_class(
        &mut self,
        player: PlayerData,
        class: PlayerClass,
    ) -> Result<AgentId, RegistrationError> {
        if self.state == RunnerState::Running {
            return Err(RegistrationError::MatchInProgress);
        }
        if self.player_in_game(&player.id) {
            debug!(player = %player.id, "Duplicate registration ignored");
            return Err(RegistrationError::DuplicatePlayer(player.id));
        }
        if self.player_count() >= MAX_PLAYER_COUNT {
            debug!(player = %player.id, "Roster full, registration ignored");
            return Err(RegistrationError::RosterFull(MAX_PLAYER_COUNT));
        }
        let (id, name) = (player.id.clone(), player.name.clone());
        let agent = self.scene.add_agent(player, class)?;
        self.state = RunnerState::Collecting;
        info!(player = %id, name = %name, class = %class, agent = %agent, "Player joined");
        Ok(agent)
    }

    /// Switch a registered player's class, re-rolling their stats.
    pub fn set_player_class(&mut self, player_id: &str, class: PlayerClass) -> Result<(), RegistrationError> {
        if self.state == RunnerState::Running {
            return Err(RegistrationError::MatchInProgress);
        }
        self.scene.replace_agent_class(player_id, class)?;
        debug!(player = player_id, class = %class, "Class changed");
        Ok(())
    }

    /// Like [`GameRunner::set_player_class`] but from a user-typed tag.
    /// An unrecognised tag leaves the player's class as it was.
    pub fn set_player_class_tag(&mut self, player_id: &str, tag: &str) -> Result<(), RegistrationError> {
        let class: PlayerClass = tag.parse()?;
        self.set_player_class(player_id, class)
    }

    /// Players registered.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.scene.agents().len()
    }

    /// Whether a player id is registered.
    #[must_use]
    pub fn player_in_game(&self, player_id: &str) -> bool {
        self.scene.agent_by_player(player_id).is_some()
    }

    /// Registered players and their classes, in registration order.
    #[must_use]
    pub fn current_players_with_classes(&self) -> Vec<PlayerRow> {
        self.scene
            .agents()
            .iter()
            .map(|agent| PlayerRow {
                id: agent.player.id.clone(),
                name: agent.player.name.clone(),
                class: agent.class,
            })
            .collect()
    }

    fn ensure_fresh_scene(&self) -> Result<(), MatchError> {
        if self.state == RunnerState::Running {
            return Err(MatchError::AlreadyRunning);
        }
        match self.scene.current_tick() {
            0 => Ok(()),
            ticks => Err(MatchError::AlreadyPlayed { ticks }),
        }
    }

    /// Play the match: fetch avatars over HTTP or from disk, write frames to
    /// `input_dir` and encode the video into `output_dir`.
    ///
    /// With fewer than two players this returns a no-contest report without
    /// touching the filesystem.
    pub async fn run_game(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
        locale: &str,
    ) -> Result<MatchReport, MatchError> {
        self.ensure_fresh_scene()?;
        if self.player_count() <= 1 {
            info!(players = self.player_count(), "Not enough players, no contest");
            return Ok(MatchReport::no_contest(locale, &self.scene));
        }
        let source = HttpAvatarSource::new();
        let mut encoder = FfmpegEncoder::create(
            input_dir,
            output_dir,
            self.config.fps,
            self.config.encoder.clone(),
        )?;
        self.run_game_with(&source, &mut encoder, locale).await
    }

    /// Play the match with injected avatar and frame handling.
    pub async fn run_game_with<A, S>(
        &mut self,
        avatars: &A,
        sink: &mut S,
        locale: &str,
    ) -> Result<MatchReport, MatchError>
    where
        A: AvatarSource,
        S: FrameSink,
    {
        self.ensure_fresh_scene()?;
        if self.player_count() <= 1 {
            info!(players = self.player_count(), "Not enough players, no contest");
            return Ok(MatchReport::no_contest(locale, &self.scene));
        }
        self.state = RunnerState::Running;

        let diameter = (AGENT_RADIUS * 2.0).round() as u32;
        let cache = load_avatars(avatars, &self.scene, diameter).await;
        if !cache.fallbacks().is_empty() {
            warn!(count = cache.fallbacks().len(), "Some avatars replaced by placeholders");
        }
        let mut renderer =
            SceneRenderer::new(*self.scene.bounds(), self.config.layout.clone()).with_avatars(cache);

        let outcome = run_match(&mut self.scene, &mut renderer, sink, &self.config).await;
        self.state = RunnerState::Idle;

        let run = outcome?;
        let report = MatchReport::from_scene(
            &self.scene,
            self.config.ticks_to_secs(run.ticks),
            run.video_path,
            locale,
        );
        info!(
            outcome = ?report.outcome,
            ticks = report.duration_ticks,
            secs = report.duration_secs,
            "Game finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str) -> PlayerData {
        PlayerData::new(id, format!("Name {id}"), "")
    }

    #[test]
    fn test_lifecycle_states() {
        let mut runner = GameRunner::with_seed(MatchConfig::default(), 1);
        assert_eq!(runner.state(), RunnerState::Idle);
        runner.initialize_game().unwrap();
        assert_eq!(runner.state(), RunnerState::Collecting);
        runner.add_player(player("1")).unwrap();
        assert_eq!(runner.state(), RunnerState::Collecting);
    }

    #[test]
    fn test_duplicate_player_is_noop() {
        let mut runner = GameRunner::with_seed(MatchConfig::default(), 1);
        runner.add_player(player("1")).unwrap();
        runner.set_player_class("1", PlayerClass::Rogue).unwrap();
        let err = runner.add_player(player("1")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicatePlayer("1".to_string()));
        assert_eq!(runner.player_count(), 1);
        assert_eq!(runner.current_players_with_classes()[0].class, PlayerClass::Rogue);
    }

    #[test]
    fn test_roster_cap() {
        let mut runner = GameRunner::with_seed(MatchConfig::default(), 1);
        for i in 0..MAX_PLAYER_COUNT {
            runner.add_player(player(&i.to_string())).unwrap();
        }
        assert_eq!(
            runner.add_player(player("extra")),
            Err(RegistrationError::RosterFull(MAX_PLAYER_COUNT))
        );
        assert!(!runner.player_in_game("extra"));
    }

    #[test]
    fn test_player_list_display() {
        let rows = vec![
            PlayerRow {
                id: "1".to_string(),
                name: "Alice".to_string(),
                class: PlayerClass::Knight,
            },
            PlayerRow {
                id: "2".to_string(),
                name: "Bob".to_string(),
                class: PlayerClass::Spearman,
            },
        ];
        let text = PlayerList(&rows).to_string();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().next(), Some(format!("Alice ({})", PlayerClass::Knight).as_str()));
    }

    #[test]
    fn test_initialize_clears_roster() {
        let mut runner = GameRunner::with_seed(MatchConfig::default(), 1);
        runner.add_player(player("1")).unwrap();
        runner.add_player(player("2")).unwrap();
        runner.initialize_game().unwrap();
        assert_eq!(runner.player_count(), 0);
    }
}
