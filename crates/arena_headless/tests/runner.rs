//! End-to-end runner behaviour with in-memory frames and no network.

use std::future::Future;

use arena_core::prelude::*;
use arena_headless::{
    run_match, EncodeError, GameRunner, MatchConfig, MatchError, MatchOutcome, MatchReport,
    MemorySink, RegistrationError, RunnerState,
};
use arena_render::{AssetError, AvatarSource, RenderLayout, SceneRenderer};
use arena_test_utils::fixtures::{brawl, one_hit_duel};

/// Every fetch fails, so every agent gets a placeholder.
struct NoAvatars;

impl AvatarSource for NoAvatars {
    fn fetch(&self, _reference: &str) -> impl Future<Output = std::result::Result<Vec<u8>, AssetError>> + Send {
        std::future::ready(Err(AssetError::Empty))
    }
}

fn small_config() -> MatchConfig {
    MatchConfig {
        width: 480,
        height: 270,
        sidebar_width: 100,
        ..MatchConfig::default()
    }
}

fn player(id: &str) -> PlayerData {
    PlayerData::new(id, format!("Player {id}"), format!("https://example.invalid/{id}.png"))
}

// =============================================================================
// No contest
// =============================================================================

#[tokio::test]
async fn test_single_player_is_no_contest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");

    let mut runner = GameRunner::with_seed(small_config(), 1);
    runner.initialize_game().unwrap();
    runner.add_player(player("only")).unwrap();

    let report = runner.run_game(&input, &output, "en").await.unwrap();
    assert_eq!(report.outcome, MatchOutcome::NoContest);
    assert_eq!(report.video_path, None);
    assert_eq!(report.duration_ticks, 0);
    assert!(!input.exists());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_empty_roster_pushes_no_frames() {
    let mut runner = GameRunner::with_seed(small_config(), 1);
    let mut sink = MemorySink::new();
    let report = runner.run_game_with(&NoAvatars, &mut sink, "de").await.unwrap();
    assert!(!report.was_contested());
    assert_eq!(report.locale, "de");
    assert_eq!(sink.frame_count(), 0);
    assert!(!sink.is_finished());
}

// =============================================================================
// Full matches
// =============================================================================

#[tokio::test]
async fn test_match_runs_to_consistent_result() {
    let mut runner = GameRunner::with_seed(small_config(), 42);
    runner.initialize_game().unwrap();
    let classes = [PlayerClass::Warrior, PlayerClass::Rogue, PlayerClass::Knight, PlayerClass::Spearman];
    for (i, class) in classes.into_iter().enumerate() {
        runner.add_player_with_class(player(&i.to_string()), class).unwrap();
    }

    let mut sink = MemorySink::new();
    let report = runner.run_game_with(&NoAvatars, &mut sink, "en").await.unwrap();

    assert_eq!(runner.state(), RunnerState::Idle);
    assert!(sink.is_finished());
    assert_eq!(sink.frame_count(), report.duration_ticks);
    assert!(report.duration_ticks > 0);
    assert!((report.duration_secs - report.duration_ticks as f64 / 60.0).abs() < 1e-9);

    let alive: Vec<&str> = report
        .agents
        .iter()
        .filter(|a| a.alive)
        .map(|a| a.player_id.as_str())
        .collect();
    match &report.outcome {
        MatchOutcome::Winner { player_id, .. } => assert_eq!(alive, vec![player_id.as_str()]),
        MatchOutcome::Draw => assert!(alive.is_empty()),
        MatchOutcome::TickCeiling { survivors } => {
            assert!(survivors.len() > 1);
            assert_eq!(report.duration_ticks, small_config().max_ticks);
        }
        MatchOutcome::NoContest => panic!("four players is a contest"),
    }
    for agent in &report.agents {
        assert!(agent.health >= 0.0);
        assert_eq!(agent.alive, agent.health > 0.0);
    }
}

#[tokio::test]
async fn test_tick_ceiling_stops_match() {
    let config = MatchConfig {
        max_ticks: 5,
        ..small_config()
    };
    let mut runner = GameRunner::with_seed(config, 3);
    runner.add_player(player("a")).unwrap();
    runner.add_player(player("b")).unwrap();

    let mut sink = MemorySink::new();
    let report = runner.run_game_with(&NoAvatars, &mut sink, "en").await.unwrap();
    assert_eq!(report.duration_ticks, 5);
    assert_eq!(sink.frame_count(), 5);
    assert_eq!(
        report.outcome,
        MatchOutcome::TickCeiling {
            survivors: vec!["a".to_string(), "b".to_string()]
        }
    );
}

#[tokio::test]
async fn test_roster_locked_after_match_until_reinitialized() {
    let config = MatchConfig {
        max_ticks: 3,
        ..small_config()
    };
    let mut runner = GameRunner::with_seed(config, 3);
    runner.add_player(player("a")).unwrap();
    runner.add_player(player("b")).unwrap();
    runner
        .run_game_with(&NoAvatars, &mut MemorySink::new(), "en")
        .await
        .unwrap();

    assert_eq!(
        runner.set_player_class("a", PlayerClass::Rogue),
        Err(RegistrationError::MatchInProgress)
    );
    runner.initialize_game().unwrap();
    assert_eq!(runner.player_count(), 0);
    runner.add_player(player("c")).unwrap();
}

#[tokio::test]
async fn test_replaying_finished_match_is_refused() {
    let mut runner = GameRunner::with_seed(small_config(), 42);
    runner.add_player(player("a")).unwrap();
    runner.add_player(player("b")).unwrap();
    let first = runner
        .run_game_with(&NoAvatars, &mut MemorySink::new(), "en")
        .await
        .unwrap();

    let mut sink = MemorySink::new();
    let err = runner.run_game_with(&NoAvatars, &mut sink, "en").await.unwrap_err();
    assert!(matches!(err, MatchError::AlreadyPlayed { ticks } if ticks == first.duration_ticks));
    assert_eq!(sink.frame_count(), 0);
    assert!(!sink.is_finished());
    assert_eq!(runner.state(), RunnerState::Idle);

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let err = runner
        .run_game(&input, &dir.path().join("output"), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::AlreadyPlayed { .. }));
    assert!(!input.exists());

    runner.initialize_game().unwrap();
    runner.add_player(player("a")).unwrap();
    runner.add_player(player("b")).unwrap();
    let second = runner.run_game_with(&NoAvatars, &mut sink, "en").await.unwrap();
    assert_eq!(sink.frame_count(), second.duration_ticks);
}

// =============================================================================
// The one-hit duel, end to end
// =============================================================================

#[tokio::test]
async fn test_one_hit_duel_names_striker() {
    let config = MatchConfig::default();
    let mut scene = one_hit_duel(9);
    let mut renderer = SceneRenderer::new(*scene.bounds(), RenderLayout::default());
    let mut sink = MemorySink::retaining();

    let run = run_match(&mut scene, &mut renderer, &mut sink, &config).await.unwrap();
    assert_eq!(run.ticks, 1);
    assert_eq!(run.frames, 1);
    assert_eq!(run.video_path, None);

    let victim = scene.agent(AgentId(1)).unwrap();
    assert_eq!(victim.health(), 0.0);
    assert!(victim.is_dead());

    let report = MatchReport::from_scene(&scene, config.ticks_to_secs(run.ticks), run.video_path, "en");
    assert_eq!(report.winner(), Some("striker"));
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.frames()[0].dimensions(), (960, 540));
}

// =============================================================================
// Frame ordering and failures
// =============================================================================

#[tokio::test]
async fn test_frames_arrive_in_tick_order() {
    let config = MatchConfig {
        max_ticks: 120,
        ..MatchConfig::default()
    };
    let scene = brawl(17, 6);
    let mut replay = scene.clone();

    let mut live = scene;
    let mut renderer = SceneRenderer::new(*live.bounds(), RenderLayout::default());
    let mut sink = MemorySink::new();
    let run = run_match(&mut live, &mut renderer, &mut sink, &config).await.unwrap();

    let mut replay_renderer = SceneRenderer::new(*replay.bounds(), RenderLayout::default());
    let mut expected = Vec::new();
    for _ in 0..run.ticks {
        replay.tick();
        expected.push(MemorySink::checksum(replay_renderer.render(&replay)));
    }
    assert_eq!(sink.checksums(), expected.as_slice());
}

#[tokio::test]
async fn test_sink_failure_fails_match_and_resets_state() {
    let mut runner = GameRunner::with_seed(small_config(), 5);
    runner.add_player(player("a")).unwrap();
    runner.add_player(player("b")).unwrap();

    let mut sink = MemorySink::new().failing_at(4);
    let err = runner.run_game_with(&NoAvatars, &mut sink, "en").await.unwrap_err();
    assert!(matches!(err, MatchError::Encode(EncodeError::Rejected(4))));
    assert_eq!(sink.frame_count(), 3);
    assert!(!sink.is_finished());
    assert_eq!(runner.state(), RunnerState::Idle);
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_class_selection_round_trip() {
    let mut runner = GameRunner::with_seed(small_config(), 1);
    runner.initialize_game().unwrap();
    runner.add_player(player("1")).unwrap();
    runner.add_player(player("2")).unwrap();
    runner.set_player_class("2", PlayerClass::Berserker).unwrap();

    let rows = runner.current_players_with_classes();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "1");
    assert_eq!(rows[0].class, PlayerClass::default());
    assert_eq!(rows[1].id, "2");
    assert_eq!(rows[1].class, PlayerClass::Berserker);
    assert!(runner.player_in_game("2"));
    assert!(!runner.player_in_game("3"));
}

#[test]
fn test_unknown_class_tag_keeps_previous_class() {
    let mut runner = GameRunner::with_seed(small_config(), 1);
    runner.add_player(player("1")).unwrap();
    runner.set_player_class_tag("1", "spearman").unwrap();

    let err = runner.set_player_class_tag("1", "necromancer").unwrap_err();
    assert!(matches!(err, RegistrationError::UnknownClass(_)));
    assert_eq!(runner.current_players_with_classes()[0].class, PlayerClass::Spearman);
}

#[test]
fn test_class_change_for_unknown_player_is_refused() {
    let mut runner = GameRunner::with_seed(small_config(), 1);
    assert_eq!(
        runner.set_player_class("ghost", PlayerClass::Rogue),
        Err(RegistrationError::UnknownPlayer("ghost".to_string()))
    );
    assert_eq!(runner.player_count(), 0);
}
