//! Game identity and session-wide rules.
//!
//! A [`GameMode`] identifies the exact game data the engine is running
//! (shareware Doom, registered Heretic, ...). Saves record the mode they were
//! made under and refuse to load under a different one. [`GameSession`] holds
//! the per-session values the save header carries: skill, map, rule flags,
//! the map timer and the random session id.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Family of games sharing the same playsim rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameVariant {
    Doom,
    Doom64,
    Heretic,
    Hexen,
}

/// Concrete game data set. The discriminant is what the save header stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum GameMode {
    DoomShareware = 0,
    DoomRegistered = 1,
    DoomRetail = 2,
    DoomCommercial = 3,
    Doom64 = 4,
    HereticShareware = 5,
    Heretic = 6,
    HereticExtended = 7,
    Hexen = 8,
}

impl GameMode {
    pub fn variant(self) -> GameVariant {
        match self {
            GameMode::DoomShareware
            | GameMode::DoomRegistered
            | GameMode::DoomRetail
            | GameMode::DoomCommercial => GameVariant::Doom,
            GameMode::Doom64 => GameVariant::Doom64,
            GameMode::HereticShareware | GameMode::Heretic | GameMode::HereticExtended => {
                GameVariant::Heretic
            }
            GameMode::Hexen => GameVariant::Hexen,
        }
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        Some(match v {
            0 => GameMode::DoomShareware,
            1 => GameMode::DoomRegistered,
            2 => GameMode::DoomRetail,
            3 => GameMode::DoomCommercial,
            4 => GameMode::Doom64,
            5 => GameMode::HereticShareware,
            6 => GameMode::Heretic,
            7 => GameMode::HereticExtended,
            8 => GameMode::Hexen,
            _ => return None,
        })
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Episode and map number of a level. Games without episodes use episode 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId {
    pub episode: u8,
    pub map: u8,
}

impl MapId {
    pub fn new(episode: u8, map: u8) -> Self {
        Self { episode, map }
    }
}

/// Rule flags chosen when the game was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameRules {
    pub skill: u8,
    pub fast_monsters: bool,
    pub deathmatch: u8,
    pub no_monsters: bool,
    pub respawn_monsters: bool,
}

/// Session-wide state outside the level itself.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameSession {
    pub mode: GameMode,
    pub rules: GameRules,
    pub map: MapId,
    /// Tics elapsed on the current map.
    pub map_time: i32,
    /// Random id shared by every save of this session.
    pub game_id: u32,
    /// Players are matched by net id instead of slot in a net game.
    pub netgame: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            mode: GameMode::DoomRegistered,
            rules: GameRules::default(),
            map: MapId::new(1, 1),
            map_time: 0,
            game_id: 0,
            netgame: false,
        }
    }
}

impl GameSession {
    /// Starts a fresh session on `map` with a new random game id.
    pub fn new_game(mode: GameMode, rules: GameRules, map: MapId, seed: u64) -> Self {
        Self {
            mode,
            rules,
            map,
            map_time: 0,
            game_id: new_game_id(seed),
            netgame: false,
        }
    }
}

/// Draws a nonzero session id from a seeded ChaCha stream.
pub fn new_game_id(seed: u64) -> u32 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(1..=u32::MAX)
}
