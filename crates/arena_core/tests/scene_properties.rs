//! Scene-level properties: bounds, health, knockback, cooldown, duels.
//!
//! These drive the real `Scene::tick` with seeded RNGs and fixed stats.

use arena_core::prelude::*;
use arena_test_utils::determinism::strategies::{arb_damage, arb_roster_size, arb_seed};
use arena_test_utils::fixtures::{brawl, one_hit_duel, seeded_rng, sparring_pair, test_player, StatsBuilder};
use arena_test_utils::invariants::{check_scene, run_checked};
use proptest::prelude::*;

// =============================================================================
// Duels
// =============================================================================

#[test]
fn test_one_hit_duel_kills_victim_on_first_swing() {
    let mut scene = one_hit_duel(1);
    let events = scene.tick();

    assert_eq!(events.hits.len(), 1);
    let hit = events.hits[0];
    assert_eq!(hit.attacker, AgentId(0));
    assert_eq!(hit.target, AgentId(1));
    assert!(hit.killing_blow);
    assert_eq!(events.deaths, vec![AgentId(1)]);

    let victim = scene.agent(AgentId(1)).unwrap();
    assert_eq!(victim.health(), 0.0);
    assert!(victim.is_dead());

    assert!(scene.is_match_over());
    let survivors: Vec<&str> = scene.survivors().map(|a| a.player.id.as_str()).collect();
    assert_eq!(survivors, vec!["striker"]);
    assert_eq!(scene.agent(AgentId(0)).unwrap().kills(), 1);
}

#[test]
fn test_victim_retaliates_against_attacker() {
    let mut scene = sparring_pair(4, 30);
    scene.tick();
    let dummy = scene.agent(AgentId(1)).unwrap();
    assert_eq!(dummy.target(), Some(AgentId(0)));
}

#[test]
fn test_dead_agents_still_decay_knockback() {
    let mut scene = one_hit_duel(2);
    scene.tick();
    let pushed = scene.agent(AgentId(1)).unwrap().knockback;
    assert!(pushed.length() > 0.0);

    for _ in 0..200 {
        scene.tick();
    }
    let victim = scene.agent(AgentId(1)).unwrap();
    assert_eq!(victim.knockback, Vec2::ZERO);
    assert!(victim.is_dead());
}

// =============================================================================
// Cooldown
// =============================================================================

#[test]
fn test_cooldown_spaces_hits() {
    for cooldown in [1u32, 5, 18, 30, 45] {
        let mut scene = sparring_pair(7, cooldown);
        let mut hit_ticks = Vec::new();
        for _ in 0..400 {
            let events = scene.tick();
            hit_ticks.extend(
                events
                    .hits
                    .iter()
                    .filter(|h| h.attacker == AgentId(0))
                    .map(|h| h.tick),
            );
        }
        assert!(hit_ticks.len() > 2, "cooldown {cooldown}: too few hits");
        for pair in hit_ticks.windows(2) {
            assert!(
                pair[1] - pair[0] >= u64::from(cooldown),
                "cooldown {cooldown}: hits at {} and {}",
                pair[0],
                pair[1]
            );
        }
        let attacker = scene.agent(AgentId(0)).unwrap();
        assert!(attacker.melee_cooldown_left() < cooldown);
    }
}

// =============================================================================
// Knockback
// =============================================================================

#[test]
fn test_knockback_magnitude_strictly_decreases() {
    let mut scene = empty_two_agent_scene();
    scene.tick();

    let mut previous = f32::INFINITY;
    let mut settled_at = None;
    for tick in 0..200 {
        let kb = scene.agent(AgentId(1)).unwrap().knockback.length();
        if kb == 0.0 {
            settled_at = Some(tick);
            break;
        }
        assert!(kb < previous, "knockback grew: {previous} -> {kb}");
        previous = kb;
        scene.tick();
    }
    assert!(settled_at.is_some(), "knockback never reached zero");
}

fn empty_two_agent_scene() -> Scene {
    // Attacker hits once for 20, then waits a long cooldown.
    let mut scene = Scene::new(ArenaBounds::default(), seeded_rng(8));
    let attacker = StatsBuilder::class(PlayerClass::Knight)
        .damage(20.0)
        .melee_range(2_000.0)
        .cooldown(10_000)
        .build();
    let target = StatsBuilder::class(PlayerClass::Knight)
        .damage(0.0)
        .max_health(1_000.0)
        .max_speed(0.0)
        .build();
    scene
        .add_agent_with_stats(test_player("a"), PlayerClass::Knight, Vec2::new(500.0, 270.0), attacker)
        .unwrap();
    scene
        .add_agent_with_stats(test_player("b"), PlayerClass::Knight, Vec2::new(600.0, 270.0), target)
        .unwrap();
    scene
}

// =============================================================================
// Full matches
// =============================================================================

#[test]
fn test_brawl_runs_to_single_survivor() {
    let mut scene = brawl(21, 12);
    let run = run_checked(&mut scene, 50_000);
    run.assert_clean();
    assert!(scene.alive_count() <= 1);
    let total_kills: u32 = scene.agents().iter().map(Agent::kills).sum();
    assert_eq!(total_kills as usize, scene.agents().len() - scene.alive_count());
}

#[test]
fn test_decals_stay_bounded() {
    let mut scene = brawl(3, 20);
    for _ in 0..5_000 {
        scene.tick();
        assert!(scene.decals().len() <= arena_core::scene::MAX_DECALS);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_invariants_hold_every_tick(seed in arb_seed(), size in arb_roster_size()) {
        let mut scene = brawl(seed, size);
        let run = run_checked(&mut scene, 3_000);
        prop_assert!(run.violations.is_empty(), "{:?}", run.violations.first());
    }

    #[test]
    fn prop_huge_hits_never_escape_arena(seed in arb_seed(), damage in arb_damage()) {
        let mut scene = Scene::new(ArenaBounds::default(), seeded_rng(seed));
        let brute = StatsBuilder::class(PlayerClass::Berserker)
            .damage(damage)
            .melee_range(2_000.0)
            .cooldown(3)
            .build();
        let sack = StatsBuilder::class(PlayerClass::Rogue)
            .damage(0.0)
            .max_health(1.0e9)
            .build();
        scene.add_agent_with_stats(test_player("brute"), PlayerClass::Berserker, Vec2::new(580.0, 270.0), brute).unwrap();
        scene.add_agent_with_stats(test_player("sack"), PlayerClass::Rogue, Vec2::new(600.0, 280.0), sack).unwrap();
        for _ in 0..120 {
            scene.tick();
            let violations = check_scene(&scene);
            prop_assert!(violations.is_empty(), "{:?}", violations.first());
        }
    }
}
