//! Moving objects ("mobjs"): players, monsters, projectiles and items.
//!
//! Static per-type defaults live in [`MobjInfoTable`]; animation states in
//! [`StateTable`]. A live [`Mobj`] refers to both by integer index so the
//! tables can be rebuilt between sessions without invalidating saves.

use bevy::prelude::*;
use bitflags::bitflags;

use crate::thinker::ThinkerId;

bitflags! {
    /// Primary behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MobjFlags: u32 {
        const SPECIAL = 0x0000_0001;
        const SOLID = 0x0000_0002;
        const SHOOTABLE = 0x0000_0004;
        const NOSECTOR = 0x0000_0008;
        const NOBLOCKMAP = 0x0000_0010;
        const AMBUSH = 0x0000_0020;
        const JUSTHIT = 0x0000_0040;
        const JUSTATTACKED = 0x0000_0080;
        const SPAWNCEILING = 0x0000_0100;
        const NOGRAVITY = 0x0000_0200;
        const DROPOFF = 0x0000_0400;
        const PICKUP = 0x0000_0800;
        const NOCLIP = 0x0000_1000;
        const SLIDE = 0x0000_2000;
        const FLOAT = 0x0000_4000;
        const TELEPORT = 0x0000_8000;
        const MISSILE = 0x0001_0000;
        const DROPPED = 0x0002_0000;
        const SHADOW = 0x0004_0000;
        const NOBLOOD = 0x0008_0000;
        const CORPSE = 0x0010_0000;
        const INFLOAT = 0x0020_0000;
        const COUNTKILL = 0x0040_0000;
        const COUNTITEM = 0x0080_0000;
        const SKULLFLY = 0x0100_0000;
        const NOTDMATCH = 0x0200_0000;
        const TRANSLATION = 0x0c00_0000;
        /// Bit retired in mobj format 6.
        const V6_OBSOLETE = 0x1000_0000;
        const BRIGHTSHADOW = 0x2000_0000;
        const BRIGHTEXPLODE = 0x4000_0000;
        const VIEWALIGN = 0x8000_0000;
    }
}

bitflags! {
    /// Secondary flags, introduced with mobj format 6.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MobjFlags2: u32 {
        const LOGRAV = 0x0000_0001;
        const WINDTHRUST = 0x0000_0002;
        const FLOORBOUNCE = 0x0000_0004;
        const THRUGHOST = 0x0000_0008;
        const FLY = 0x0000_0010;
        const FOOTCLIP = 0x0000_0020;
        const SPAWNFLOAT = 0x0000_0040;
        const NOTELEPORT = 0x0000_0080;
        const RIP = 0x0000_0100;
        const PUSHABLE = 0x0000_0200;
        const SLIDE = 0x0000_0400;
        const ONMOBJ = 0x0000_0800;
        const PASSMOBJ = 0x0000_1000;
        const CANNOTPUSH = 0x0000_2000;
        const BOSS = 0x0000_8000;
        const FIREDAMAGE = 0x0001_0000;
        const NODMGTHRUST = 0x0002_0000;
        const TELESTOMP = 0x0004_0000;
        const FLOATBOB = 0x0008_0000;
        const DONTDRAW = 0x0010_0000;
    }
}

bitflags! {
    /// Tertiary flags, introduced with mobj format 7.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MobjFlags3: u32 {
        const NOINFIGHT = 0x0000_0001;
        const CLIENTACTION = 0x0000_0002;
        const NOSPLASH = 0x0000_0004;
        const NOTARGET = 0x0000_0008;
    }
}

bitflags! {
    /// Engine-side hints derived from the gameplay flags after every restore.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DdFlags: u32 {
        const SOLID = 0x0000_0001;
        const NOBLOCKMAP = 0x0000_0002;
        const DONTDRAW = 0x0000_0004;
    }
}

/// Index into the [`StateTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StateId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub sprite: i32,
    pub frame: i32,
    pub tics: i32,
    pub next: StateId,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct StateTable {
    pub states: Vec<State>,
}

impl StateTable {
    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0 as usize)
    }

    /// Maps a stored state index back to a handle; negative means "no state".
    pub fn resolve(&self, index: i32) -> Option<StateId> {
        if index >= 0 && (index as usize) < self.states.len() {
            Some(StateId(index as u32))
        } else {
            None
        }
    }
}

/// Static defaults for one object type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MobjInfo {
    pub spawn_health: i32,
    pub spawn_state: StateId,
    pub radius: f32,
    pub height: f32,
    pub damage: i32,
    pub flags: MobjFlags,
    pub flags2: MobjFlags2,
    pub flags3: MobjFlags3,
    /// `special2` holds another mobj (Hexen lightning and holy spirit
    /// tails) rather than a counter.
    pub special2_is_mobj: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct MobjInfoTable {
    pub infos: Vec<MobjInfo>,
}

impl MobjInfoTable {
    pub fn get(&self, type_id: i32) -> Option<&MobjInfo> {
        usize::try_from(type_id).ok().and_then(|i| self.infos.get(i))
    }
}

/// Where and how the object was spawned, kept for nightmare respawns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnSpot {
    pub pos: [f32; 3],
    pub angle: u32,
    pub type_id: i32,
    pub flags: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mobj {
    pub pos: [f32; 3],
    pub angle: u32,
    pub sprite: i32,
    pub frame: i32,
    pub floor_z: f32,
    pub ceiling_z: f32,
    pub radius: f32,
    pub height: f32,
    pub mom: [f32; 3],
    pub valid: i32,
    pub type_id: i32,
    pub tics: i32,
    pub state: StateId,
    pub flags: MobjFlags,
    pub flags2: MobjFlags2,
    pub flags3: MobjFlags3,
    pub dd_flags: DdFlags,
    pub int_flags: i32,
    pub health: i32,
    pub move_dir: i32,
    pub move_count: i32,
    pub reaction_time: i32,
    pub threshold: i32,
    pub last_look: i32,
    pub target: Option<ThinkerId>,
    pub tracer: Option<ThinkerId>,
    pub on_mobj: Option<ThinkerId>,
    pub last_enemy: Option<ThinkerId>,
    pub generator: Option<ThinkerId>,
    /// Owning player slot.
    pub player: Option<usize>,
    pub spawn_spot: SpawnSpot,
    pub drop_off_z: f32,
    pub gear: i32,
    pub damage: i32,
    pub special1: i32,
    pub special2: i32,
    pub special3: i32,
    /// The mobj `special2` points at when the type's info says it does.
    pub special2_mobj: Option<ThinkerId>,
    pub translucency: u8,
    /// Translucency the renderer fades toward; -1 when not fading.
    pub vis_target: i16,
    pub floor_clip: f32,
    /// Sector the object is linked into.
    pub sector: usize,
}

impl Mobj {
    /// A fresh object of `type_id` using the type's defaults.
    pub fn from_info(type_id: i32, info: &MobjInfo, pos: [f32; 3]) -> Self {
        Self {
            pos,
            angle: 0,
            sprite: 0,
            frame: 0,
            floor_z: 0.0,
            ceiling_z: 0.0,
            radius: info.radius,
            height: info.height,
            mom: [0.0; 3],
            valid: 0,
            type_id,
            tics: 0,
            state: info.spawn_state,
            flags: info.flags,
            flags2: info.flags2,
            flags3: info.flags3,
            dd_flags: DdFlags::empty(),
            int_flags: 0,
            health: info.spawn_health,
            move_dir: 0,
            move_count: 0,
            reaction_time: 0,
            threshold: 0,
            last_look: 0,
            target: None,
            tracer: None,
            on_mobj: None,
            last_enemy: None,
            generator: None,
            player: None,
            spawn_spot: SpawnSpot::default(),
            drop_off_z: 0.0,
            gear: 0,
            damage: info.damage,
            special1: 0,
            special2: 0,
            special3: 0,
            special2_mobj: None,
            translucency: 0,
            vis_target: -1,
            floor_clip: 0.0,
            sector: 0,
        }
    }

    /// Recomputes the engine hints from the gameplay flags.
    pub fn update_dd_flags(&mut self) {
        let mut dd = DdFlags::empty();
        dd.set(DdFlags::SOLID, self.flags.contains(MobjFlags::SOLID));
        dd.set(DdFlags::NOBLOCKMAP, self.flags.contains(MobjFlags::NOBLOCKMAP));
        dd.set(DdFlags::DONTDRAW, self.flags2.contains(MobjFlags2::DONTDRAW));
        self.dd_flags = dd;
    }
}
