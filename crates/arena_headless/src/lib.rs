//! Headless match runner for the arena.
//!
//! Turns a roster of players into a finished fight video and a JSON report:
//!
//! - **Registration**: [`GameRunner`] collects players and class picks
//! - **Simulation**: [`run_match`] ticks the scene and renders every frame
//! - **Encoding**: [`encoder::FfmpegEncoder`] turns frames into a video
//! - **Reporting**: [`MatchReport`] summarizes the outcome
//!
//! The binary in `main.rs` plays the orchestrator: it loads a roster file,
//! fills empty slots with bots, runs one match and prints the report.
//!
//! # Example
//!
//! ```bash
//! # Two humans and three bots, default config
//! cargo run -p arena_headless -- run --roster roster.json --bots 3
//!
//! # Custom config, reproducible seed
//! cargo run -p arena_headless -- run --roster roster.json --config configs/default.ron --seed 42
//! ```

pub mod bots;
pub mod config;
pub mod encoder;
pub mod game_runner;
pub mod match_result;

pub use bots::{bot_rng, create_new_bot_player, create_unique_bot_players, BotPlayer};
pub use config::{ConfigError, EncoderSettings, MatchConfig};
pub use encoder::{EncodeError, FfmpegEncoder, FrameSink, MemorySink};
pub use game_runner::{
    run_match, GameRunner, MatchError, MatchRun, PlayerList, PlayerRow, RegistrationError,
    RunnerState, MAX_PLAYER_COUNT,
};
pub use match_result::{AgentSummary, MatchOutcome, MatchReport};
