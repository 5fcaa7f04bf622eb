// ---------------------------------------------------------------------------
// save_config – where saves live and what goes into them
// ---------------------------------------------------------------------------

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use simulation::GameVariant;

/// File naming for save slots.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    pub dir: String,
    pub base_name: String,
    pub extension: String,
    pub slots: usize,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self::for_variant(GameVariant::Doom)
    }
}

impl SaveConfig {
    pub fn for_variant(variant: GameVariant) -> Self {
        let (base_name, extension) = match variant {
            GameVariant::Doom => ("DoomSav", "dsg"),
            GameVariant::Doom64 => ("D64Sav", "6sg"),
            GameVariant::Heretic => ("HticSav", "hsg"),
            GameVariant::Hexen => ("HexSav", "hxs"),
        };
        Self {
            dir: "savegame".to_string(),
            base_name: base_name.to_string(),
            extension: extension.to_string(),
            slots: 8,
        }
    }

    /// Path of save slot `slot`, e.g. `savegame/DoomSav0.dsg`.
    pub fn slot_path(&self, slot: usize) -> String {
        format!("{}/{}{}.{}", self.dir, self.base_name, slot, self.extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetRole {
    #[default]
    Server,
    Client,
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Archive player records and player-owned mobjs.
    pub save_players: bool,
    pub role: NetRole,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            save_players: true,
            role: NetRole::Server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_path_per_variant() {
        assert_eq!(SaveConfig::default().slot_path(0), "savegame/DoomSav0.dsg");
        assert_eq!(
            SaveConfig::for_variant(GameVariant::Heretic).slot_path(3),
            "savegame/HticSav3.hsg"
        );
        assert_eq!(
            SaveConfig::for_variant(GameVariant::Hexen).slot_path(5),
            "savegame/HexSav5.hxs"
        );
        assert_eq!(
            SaveConfig::for_variant(GameVariant::Doom64).slot_path(1),
            "savegame/D64Sav1.6sg"
        );
    }

    #[test]
    fn test_default_options_save_players_as_server() {
        let opts = SaveOptions::default();
        assert!(opts.save_players);
        assert_eq!(opts.role, NetRole::Server);
    }
}
