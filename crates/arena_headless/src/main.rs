//! Headless arena runner.
//!
//! Stands in for the chat-bot orchestrator: registers players from a roster
//! file, adds bots, plays one match and prints the report.
//!
//! # Usage
//!
//! ```bash
//! # Play a match from a roster file
//! cargo run -p arena_headless -- run --roster roster.json --bots 2
//!
//! # Print a bot roster to start from
//! cargo run -p arena_headless -- bots --count 4 > roster.json
//! ```
//!
//! # Output
//!
//! stdout: the JSON match report (or roster, for `bots`)
//! stderr: logs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{
    bot_rng, create_unique_bot_players, GameRunner, MatchConfig, PlayerList, RegistrationError,
    MAX_PLAYER_COUNT,
};
use arena_core::agent::PlayerData;

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena fight renderer")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match and encode it
    Run {
        /// JSON roster file
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// RON match config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bots to add after the roster
        #[arg(short, long, default_value = "0")]
        bots: usize,

        /// Directory for intermediate frames (removed afterwards)
        #[arg(long, default_value = "work/input")]
        input: PathBuf,

        /// Directory for the finished video
        #[arg(long, default_value = "work/output")]
        output: PathBuf,

        /// Locale tag recorded in the report
        #[arg(long, default_value = "en")]
        locale: String,

        /// Seed for reproducible matches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a roster of generated bot players
    Bots {
        /// How many bots
        #[arg(short, long, default_value = "4")]
        count: usize,
    },
}

/// One roster file entry.
#[derive(Debug, Serialize, Deserialize)]
struct RosterEntry {
    id: String,
    name: String,
    #[serde(default)]
    avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for the report)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            roster,
            config,
            bots,
            input,
            output,
            locale,
            seed,
        } => cmd_run(roster, config, bots, &input, &output, &locale, seed).await,
        Commands::Bots { count } => cmd_bots(count),
    }
}

fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read roster {}: {e}", path.display()))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse roster {}: {e}", path.display()))
}

fn register(runner: &mut GameRunner, entry: RosterEntry) {
    let player_id = entry.id.clone();
    let player = PlayerData::new(entry.id, entry.name, entry.avatar_url);
    if let Err(err) = runner.add_player(player) {
        warn!(player = %player_id, error = %err, "Registration skipped");
        return;
    }
    if let Some(tag) = entry.class {
        match runner.set_player_class_tag(&player_id, &tag) {
            Ok(()) => {}
            Err(RegistrationError::UnknownClass(err)) => {
                warn!(player = %player_id, error = %err, "Keeping default class");
            }
            Err(err) => warn!(player = %player_id, error = %err, "Class change refused"),
        }
    }
}

fn remove_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "Failed to clean up"),
    }
}

async fn cmd_run(
    roster: Option<PathBuf>,
    config: Option<PathBuf>,
    bots: usize,
    input: &Path,
    output: &Path,
    locale: &str,
    seed: Option<u64>,
) -> ExitCode {
    let config = match config {
        Some(path) => match MatchConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "Invalid config");
                return ExitCode::FAILURE;
            }
        },
        None => MatchConfig::default(),
    };

    let mut runner = match seed {
        Some(seed) => GameRunner::with_seed(config, seed),
        None => GameRunner::new(config),
    };
    if let Err(err) = runner.initialize_game() {
        error!(error = %err, "Could not start a game");
        return ExitCode::FAILURE;
    }

    if let Some(path) = roster {
        match load_roster(&path) {
            Ok(entries) => {
                for entry in entries {
                    register(&mut runner, entry);
                }
            }
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let free_slots = MAX_PLAYER_COUNT.saturating_sub(runner.player_count());
    let bots = create_unique_bot_players(bots.min(free_slots), &mut bot_rng(seed));
    for bot in bots {
        let id = bot.player.id.clone();
        if let Err(err) = runner.add_player_with_class(bot.player, bot.class) {
            warn!(player = %id, error = %err, "Bot skipped");
        }
    }

    let rows = runner.current_players_with_classes();
    info!(players = rows.len(), "Fight starting:\n{}", PlayerList(&rows));

    let result = runner.run_game(input, output, locale).await;
    remove_dir(input);

    match result {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(error = %err, "Failed to serialize report");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(error = %err, "Match failed");
            remove_dir(output);
            ExitCode::FAILURE
        }
    }
}

fn cmd_bots(count: usize) -> ExitCode {
    let roster: Vec<RosterEntry> = create_unique_bot_players(count, &mut bot_rng(None))
        .into_iter()
        .map(|bot| RosterEntry {
            id: bot.player.id,
            name: bot.player.name,
            avatar_url: bot.player.avatar_url,
            class: Some(bot.class.tag().to_string()),
        })
        .collect();
    match serde_json::to_string_pretty(&roster) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Failed to serialize roster");
            ExitCode::FAILURE
        }
    }
}
