// ---------------------------------------------------------------------------
// save_header – the first section of the logical stream
// ---------------------------------------------------------------------------

use simulation::config::{MAXPLAYERS, SAVESTRINGSIZE};
use simulation::game_mode::GameRules;
use simulation::{GameMode, GameSession, MapId, Players};

use crate::game_profile::GameProfile;
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::save_version::{SaveVersion, SAVE_VERSION};

const FAST_MONSTERS_BIT: u8 = 0x80;

#[derive(Debug, Clone, PartialEq)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    /// Raw game mode; may name a mode this build does not know.
    pub mode: i32,
    pub description: String,
    pub rules: GameRules,
    pub map: MapId,
    pub map_time: i32,
    pub players_present: [bool; MAXPLAYERS],
    pub game_id: u32,
}

impl SaveHeader {
    pub fn new(
        session: &GameSession,
        profile: &GameProfile,
        players: &Players,
        save_players: bool,
        description: &str,
    ) -> Self {
        let mut players_present = [false; MAXPLAYERS];
        if save_players {
            for (i, _) in players.in_game() {
                players_present[i] = true;
            }
        }
        Self {
            magic: profile.magic,
            version: SAVE_VERSION,
            mode: session.mode.as_i32(),
            description: description.to_string(),
            rules: session.rules,
            map: session.map,
            map_time: session.map_time,
            players_present,
            game_id: session.game_id,
        }
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.magic);
        w.write_u32(self.version);
        w.write_i32(self.mode);
        w.write_name(&self.description, SAVESTRINGSIZE);
        let mut skill = self.rules.skill & !FAST_MONSTERS_BIT;
        if self.rules.fast_monsters {
            skill |= FAST_MONSTERS_BIT;
        }
        w.write_u8(skill);
        w.write_u8(self.map.episode);
        w.write_u8(self.map.map);
        w.write_u8(self.rules.deathmatch);
        w.write_bool(self.rules.no_monsters);
        w.write_bool(self.rules.respawn_monsters);
        w.write_i32(self.map_time);
        for present in self.players_present {
            w.write_bool(present);
        }
        w.write_u32(self.game_id);
    }

    /// Parses the header fields without judging them.
    pub fn read(r: &mut SaveReader<'_>) -> Self {
        let magic = r.read_u32();
        let version = r.read_u32();
        let mode = r.read_i32();
        let description = r.read_name(SAVESTRINGSIZE);
        let skill = r.read_u8();
        let episode = r.read_u8();
        let map = r.read_u8();
        let rules = GameRules {
            skill: skill & !FAST_MONSTERS_BIT,
            fast_monsters: skill & FAST_MONSTERS_BIT != 0,
            deathmatch: r.read_u8(),
            no_monsters: r.read_bool(),
            respawn_monsters: r.read_bool(),
        };
        let map_time = r.read_i32();
        let mut players_present = [false; MAXPLAYERS];
        for present in &mut players_present {
            *present = r.read_bool();
        }
        let game_id = r.read_u32();
        Self {
            magic,
            version,
            mode,
            description,
            rules,
            map: MapId::new(episode, map),
            map_time,
            players_present,
            game_id,
        }
    }

    /// Checks the header belongs to the running game and returns the stream
    /// version to read the rest with.
    pub fn validate(&self, profile: &GameProfile, mode: GameMode) -> Result<SaveVersion, SaveError> {
        if profile.client_magic == Some(self.magic) {
            return Err(SaveError::BadMagic(
                "this is a client save and cannot be loaded here".to_string(),
            ));
        }
        if self.magic != profile.magic {
            return Err(SaveError::BadMagic(format!(
                "header magic {:#010X} does not match {:#010X}",
                self.magic, profile.magic
            )));
        }
        let version = SaveVersion::check(self.version)?;
        if self.mode != mode.as_i32() {
            return Err(SaveError::GameModeMismatch {
                expected: mode.as_i32(),
                found: self.mode,
            });
        }
        Ok(version)
    }
}

/// Header summary for save-slot menus.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveInfo {
    pub header: SaveHeader,
    /// Whether the save can be loaded by the running game.
    pub loadable: bool,
}
