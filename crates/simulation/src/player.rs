//! Player slots and per-player state.
//!
//! Array sizes differ between games, so every per-player collection is a
//! `Vec` sized from the game's [`PlayerLayout`].

use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::MAXPLAYERS;
use crate::game_mode::GameVariant;
use crate::mobj::StateId;
use crate::thinker::ThinkerId;

/// Pending weapon value meaning "keep the ready weapon".
pub const WEAPON_NO_CHANGE: i32 = -1;

/// Sizes of the variable-length player arrays for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLayout {
    pub powers: usize,
    pub keys: usize,
    pub frags: usize,
    pub weapons: usize,
    pub ammo_types: usize,
    pub psprites: usize,
    pub inventory_slots: usize,
    pub armor_types: usize,
}

impl PlayerLayout {
    pub fn for_variant(variant: GameVariant) -> Self {
        match variant {
            GameVariant::Doom | GameVariant::Doom64 => Self {
                powers: 6,
                keys: 6,
                frags: MAXPLAYERS,
                weapons: 9,
                ammo_types: 4,
                psprites: 2,
                inventory_slots: 0,
                armor_types: 1,
            },
            GameVariant::Heretic => Self {
                powers: 9,
                keys: 3,
                frags: MAXPLAYERS,
                weapons: 9,
                ammo_types: 6,
                psprites: 2,
                inventory_slots: 14,
                armor_types: 1,
            },
            GameVariant::Hexen => Self {
                powers: 9,
                keys: 11,
                frags: MAXPLAYERS,
                weapons: 4,
                ammo_types: 2,
                psprites: 2,
                inventory_slots: 33,
                armor_types: 4,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PlayerState {
    Live = 0,
    Dead = 1,
    Reborn = 2,
}

impl PlayerState {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(PlayerState::Live),
            1 => Some(PlayerState::Dead),
            2 => Some(PlayerState::Reborn),
            _ => None,
        }
    }
}

bitflags! {
    /// Client-side corrections to apply on the next tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PlayerFixup: u8 {
        const ANGLES = 0x01;
        const POSITION = 0x02;
        const MOMENTUM = 0x04;
        const REBORN = 0x08;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventorySlot {
    pub kind: i32,
    pub count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmmoSlot {
    pub owned: i32,
    pub max: i32,
}

/// Weapon sprite overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PSprite {
    pub state: Option<StateId>,
    pub tics: i32,
    pub pos: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub state: PlayerState,
    /// The player's body in the thinker list.
    pub mo: Option<ThinkerId>,
    pub view_z: f32,
    pub view_height: f32,
    pub view_height_delta: f32,
    pub look_dir: f32,
    pub bob: f32,
    pub fly_height: i32,
    pub health: i32,
    pub armor_points: Vec<i32>,
    pub armor_type: i32,
    pub inventory: Vec<InventorySlot>,
    pub ready_artifact: i32,
    pub powers: Vec<i32>,
    pub keys: Vec<bool>,
    pub backpack: bool,
    pub frags: Vec<i32>,
    pub ready_weapon: i32,
    pub pending_weapon: i32,
    pub weapons: Vec<bool>,
    pub ammo: Vec<AmmoSlot>,
    pub attack_down: bool,
    pub use_down: bool,
    pub cheats: i32,
    pub refire: i32,
    pub kill_count: i32,
    pub item_count: i32,
    pub secret_count: i32,
    pub damage_count: i32,
    pub bonus_count: i32,
    pub extra_light: i32,
    pub fixed_color_map: i32,
    pub color_map: i32,
    pub psprites: Vec<PSprite>,
    pub did_secret: bool,
    pub air_counter: i32,
    pub fixup: PlayerFixup,
}

impl Player {
    /// A player about to be reborn.
    pub fn new(layout: &PlayerLayout) -> Self {
        Self {
            state: PlayerState::Reborn,
            mo: None,
            view_z: 0.0,
            view_height: 41.0,
            view_height_delta: 0.0,
            look_dir: 0.0,
            bob: 0.0,
            fly_height: 0,
            health: 100,
            armor_points: vec![0; layout.armor_types],
            armor_type: 0,
            inventory: vec![InventorySlot::default(); layout.inventory_slots],
            ready_artifact: 0,
            powers: vec![0; layout.powers],
            keys: vec![false; layout.keys],
            backpack: false,
            frags: vec![0; layout.frags],
            ready_weapon: 0,
            pending_weapon: WEAPON_NO_CHANGE,
            weapons: vec![false; layout.weapons],
            ammo: vec![AmmoSlot::default(); layout.ammo_types],
            attack_down: false,
            use_down: false,
            cheats: 0,
            refire: 0,
            kill_count: 0,
            item_count: 0,
            secret_count: 0,
            damage_count: 0,
            bonus_count: 0,
            extra_light: 0,
            fixed_color_map: 0,
            color_map: 0,
            psprites: vec![PSprite::default(); layout.psprites],
            did_secret: false,
            air_counter: 0,
            fixup: PlayerFixup::empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    pub in_game: bool,
    /// Stable identity of the connected client, used to match saved slots.
    pub net_id: u32,
    pub player: Player,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Players {
    pub layout: PlayerLayout,
    pub slots: Vec<PlayerSlot>,
}

impl Default for Players {
    fn default() -> Self {
        Self::new(PlayerLayout::for_variant(GameVariant::Doom))
    }
}

impl Players {
    pub fn new(layout: PlayerLayout) -> Self {
        let slots = (0..MAXPLAYERS)
            .map(|_| PlayerSlot {
                in_game: false,
                net_id: 0,
                player: Player::new(&layout),
            })
            .collect();
        Self { layout, slots }
    }

    /// Marks `slot` as connected under `net_id`.
    pub fn join(&mut self, slot: usize, net_id: u32) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.in_game = true;
            s.net_id = net_id;
        }
    }

    pub fn in_game(&self) -> impl Iterator<Item = (usize, &PlayerSlot)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.in_game)
    }

    pub fn slot_by_net_id(&self, net_id: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.in_game && s.net_id == net_id)
    }

    /// A copy with the same connected clients but every player reset.
    pub fn fresh_copy(&self) -> Self {
        let mut fresh = Self::new(self.layout);
        for (i, slot) in self.in_game() {
            fresh.join(i, slot.net_id);
        }
        fresh
    }
}
