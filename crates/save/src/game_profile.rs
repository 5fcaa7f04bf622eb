// ---------------------------------------------------------------------------
// game_profile – per-game constants of the save format
// ---------------------------------------------------------------------------

use simulation::player::PlayerLayout;
use simulation::{GameMode, GameVariant};

/// Game-specific sections written after the thinker stream, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpilogueSection {
    Brain,
    SoundTargets,
    Scripts,
    Misc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameProfile {
    pub variant: GameVariant,
    pub magic: u32,
    /// Magic of client-side snapshot saves, which this engine does not load.
    pub client_magic: Option<u32>,
    pub consistency: u8,
    pub layout: PlayerLayout,
    pub epilogue: &'static [EpilogueSection],
    pub has_polyobjs: bool,
}

const HEXEN_MAGIC: u32 = u32::from_le_bytes(*b"HXS ");

impl GameProfile {
    pub fn for_mode(mode: GameMode) -> Self {
        let variant = mode.variant();
        let layout = PlayerLayout::for_variant(variant);
        match variant {
            GameVariant::Doom => Self {
                variant,
                magic: 0x1DEA_D666,
                client_magic: Some(0x2DEA_D666),
                consistency: 0x2c,
                layout,
                epilogue: &[EpilogueSection::Brain, EpilogueSection::SoundTargets],
                has_polyobjs: false,
            },
            GameVariant::Doom64 => Self {
                variant,
                magic: 0x1D64_20F4,
                client_magic: Some(0x2D64_20F4),
                consistency: 0x2c,
                layout,
                epilogue: &[EpilogueSection::SoundTargets],
                has_polyobjs: false,
            },
            GameVariant::Heretic => Self {
                variant,
                magic: 0x7D9A_12C5,
                client_magic: Some(0x1062_AF43),
                consistency: 0x9d,
                layout,
                epilogue: &[EpilogueSection::SoundTargets],
                has_polyobjs: false,
            },
            GameVariant::Hexen => Self {
                variant,
                magic: HEXEN_MAGIC,
                client_magic: None,
                consistency: 0x1d,
                layout,
                epilogue: &[EpilogueSection::Scripts, EpilogueSection::Misc],
                has_polyobjs: true,
            },
        }
    }
}
