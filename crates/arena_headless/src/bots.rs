//! Computer-controlled filler players.
//!
//! Bots are ordinary players with generated identities; the arena does not
//! treat them differently once registered.

use arena_core::agent::PlayerData;
use arena_core::class::PlayerClass;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Suffix appended to every bot name.
pub const BOT_NAME_SUFFIX: &str = "(BOT)";

/// Names bots are drawn from.
pub const BOT_NAMES: [&str; 31] = [
    "Aardwolf",
    "AbracMucid",
    "Ballyhoo",
    "Biltong",
    "Blatherskite",
    "Bourasque",
    "Bumpkin",
    "Catechectics",
    "Chimichanga",
    "Clapboard",
    "Equinox",
    "Glomerate",
    "Gumshoe",
    "Kyjb70Grog",
    "Lollapalooza",
    "Macaronic",
    "Miffedlien96",
    "Morassyobg",
    "Nincompoop",
    "Piddling",
    "Pollywog",
    "Sassafras",
    "Sousaphone",
    "Spodogenous",
    "Succubus",
    "Svengali",
    "Threptic",
    "Umpteenth",
    "Whorlking420",
    "Wishywashy",
    "YamorMammee",
];

/// Avatar images bots are drawn from.
pub const BOT_AVATAR_URLS: [&str; 15] = [
    "https://i.imgur.com/icWfRgb.png",
    "https://i.imgur.com/dusE0NZ.jpg",
    "https://i.imgur.com/hhtLmPS.png",
    "https://i.imgur.com/5V79CO5.jpg",
    "https://i.imgur.com/UkoIXoT.png",
    "https://i.imgur.com/tkzd4lr.png",
    "https://i.imgur.com/vgU5h3y.jpg",
    "https://i.imgur.com/vD1ANJZ.jpg",
    "https://i.imgur.com/rBleq5U.png",
    "https://i.imgur.com/M2BmdGT.png",
    "https://i.imgur.com/O7yE9Pr.png",
    "https://i.imgur.com/W5kBNQK.png",
    "https://i.imgur.com/nMT0sS2.jpg",
    "https://i.imgur.com/Aake5He.jpg",
    "https://i.imgur.com/GAsvHsm.png",
];

/// A generated player plus the class it wants.
#[derive(Debug, Clone, PartialEq)]
pub struct BotPlayer {
    /// Identity to register.
    pub player: PlayerData,
    /// Class to fight as.
    pub class: PlayerClass,
}

fn botify_name(name: &str) -> String {
    format!("{name}{BOT_NAME_SUFFIX}")
}

/// Random 8-digit decimal id.
pub fn generate_random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:08}", rng.gen_range(0..100_000_000u32))
}

fn random_class<R: Rng + ?Sized>(rng: &mut R) -> PlayerClass {
    PlayerClass::ALL[rng.gen_range(0..PlayerClass::ALL.len())]
}

/// One bot with a random name, avatar and class. Names may repeat across calls.
pub fn create_new_bot_player<R: Rng + ?Sized>(rng: &mut R) -> BotPlayer {
    let name = BOT_NAMES[rng.gen_range(0..BOT_NAMES.len())];
    let avatar = BOT_AVATAR_URLS[rng.gen_range(0..BOT_AVATAR_URLS.len())];
    BotPlayer {
        player: PlayerData::new(generate_random_id(rng), botify_name(name), avatar),
        class: random_class(rng),
    }
}

/// Offset from the match seed, so bot draws do not mirror the scene's.
const BOT_SEED_OFFSET: u64 = 0x0b07;

/// RNG for bot generation. A match seed makes the bot roster reproducible.
#[must_use]
pub fn bot_rng(match_seed: Option<u64>) -> StdRng {
    match match_seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(BOT_SEED_OFFSET)),
        None => StdRng::from_entropy(),
    }
}

/// `count` bots with distinct names, avatars and ids.
///
/// Names and avatars are drawn without replacement, so at most
/// `min(BOT_NAMES.len(), BOT_AVATAR_URLS.len())` bots are returned.
pub fn create_unique_bot_players<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<BotPlayer> {
    let count = count.min(BOT_NAMES.len()).min(BOT_AVATAR_URLS.len());
    let names: Vec<&str> = BOT_NAMES.choose_multiple(rng, count).copied().collect();
    let avatars: Vec<&str> = BOT_AVATAR_URLS.choose_multiple(rng, count).copied().collect();

    let mut ids: Vec<String> = Vec::with_capacity(count);
    let mut bots = Vec::with_capacity(count);
    for (name, avatar) in names.into_iter().zip(avatars) {
        let mut id = generate_random_id(rng);
        while ids.contains(&id) {
            id = generate_random_id(rng);
        }
        ids.push(id.clone());
        bots.push(BotPlayer {
            player: PlayerData::new(id, botify_name(name), avatar),
            class: random_class(rng),
        });
    }
    bots
}
