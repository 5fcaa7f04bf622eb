//! The running level: map state, thinkers and the game-specific extras that
//! live alongside them.

use bevy::prelude::*;

use crate::config::{MAXPLAYERS, MAX_ACS_MAP_VARS, MAX_ACS_WORLD_VARS};
use crate::map::{Map, SectorBusy};
use crate::mobj::Mobj;
use crate::thinker::{Thinker, ThinkerId, ThinkerKind, ThinkerList};

/// Spawn targets of the Doom II boss brain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainState {
    pub targets: Vec<ThinkerId>,
    /// Index of the next target to spit a cube at.
    pub target_on: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSlot {
    pub state: i16,
    pub wait_value: i16,
}

/// Script bookkeeping that outlives individual interpreter thinkers.
#[derive(Debug, Clone, PartialEq)]
pub struct AcsStore {
    pub scripts: Vec<ScriptSlot>,
    pub map_vars: [i32; MAX_ACS_MAP_VARS],
    pub world_vars: [i32; MAX_ACS_WORLD_VARS],
}

impl AcsStore {
    pub fn new(script_count: usize) -> Self {
        Self {
            scripts: vec![ScriptSlot::default(); script_count],
            map_vars: [0; MAX_ACS_MAP_VARS],
            world_vars: [0; MAX_ACS_WORLD_VARS],
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Level {
    pub map: Map,
    pub thinkers: ThinkerList,
    pub brain: BrainState,
    pub acs: AcsStore,
    /// Remaining earthquake tics felt by each player.
    pub local_quakes: [i32; MAXPLAYERS],
}

impl Default for Level {
    fn default() -> Self {
        Self::new(Map::default())
    }
}

impl Level {
    pub fn new(map: Map) -> Self {
        let acs = AcsStore::new(map.script_count);
        Self {
            map,
            thinkers: ThinkerList::default(),
            brain: BrainState::default(),
            acs,
            local_quakes: [0; MAXPLAYERS],
        }
    }

    /// Puts the mobj into the sector under its position and takes floor and
    /// ceiling heights from that sector. Returns false when no sector
    /// contains the point.
    pub fn link_mobj(&self, mo: &mut Mobj) -> bool {
        let Some(index) = self.map.sector_at(mo.pos[0], mo.pos[1]) else {
            return false;
        };
        let sector = &self.map.sectors[index];
        mo.sector = index;
        mo.floor_z = sector.floor.height;
        mo.ceiling_z = sector.ceiling.height;
        true
    }

    /// Links and adds a mobj. `None` when it lies outside the map.
    pub fn spawn_mobj(&mut self, mut mo: Mobj) -> Option<ThinkerId> {
        if !self.link_mobj(&mut mo) {
            return None;
        }
        mo.update_dd_flags();
        Some(self.thinkers.add(ThinkerKind::Mobj(Box::new(mo))))
    }

    /// Adds a non-mobj thinker, claiming its sector if it is a mover.
    pub fn add_special(&mut self, kind: ThinkerKind) -> Result<ThinkerId, SectorBusy> {
        let sector = kind.claimed_sector();
        let id = self.thinkers.add(kind);
        if let Some(sector) = sector {
            if let Err(busy) = self.map.claim_special(sector, id) {
                self.thinkers.remove(id);
                return Err(busy);
            }
        }
        Ok(id)
    }

    /// Removes a thinker, releasing any sector it owned.
    pub fn remove_thinker(&mut self, id: ThinkerId) -> Option<Thinker> {
        let thinker = self.thinkers.remove(id)?;
        if let Some(sector) = thinker.kind.claimed_sector() {
            self.map.release_special(sector, id);
        }
        Some(thinker)
    }
}
