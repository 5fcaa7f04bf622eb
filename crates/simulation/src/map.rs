//! Map geometry with the mutable per-sector and per-side state the playsim
//! changes at runtime.
//!
//! Static geometry is only modelled as far as the save engine needs it: each
//! sector carries an axis-aligned bounding box used to answer "which sector
//! contains this point" when a loaded mobj is linked back into the world.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;

use crate::config::MAXPLAYERS;
use crate::game_mode::MapId;
use crate::materials::MaterialId;
use crate::thinker::ThinkerId;

/// Floor or ceiling of a sector.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub height: f32,
    pub material: Option<MaterialId>,
    pub flags: i32,
    pub offset: [f32; 2],
    pub color: [f32; 3],
}

impl Plane {
    pub fn new(height: f32, material: Option<MaterialId>) -> Self {
        Self {
            height,
            material,
            flags: 0,
            offset: [0.0; 2],
            color: [1.0; 3],
        }
    }

    pub fn has_offset(&self) -> bool {
        self.offset[0] != 0.0 || self.offset[1] != 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Bounds {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min[0] && x < self.max[0] && y >= self.min[1] && y < self.max[1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub floor: Plane,
    pub ceiling: Plane,
    /// Light level in `[0, 1]`.
    pub light_level: f32,
    pub color: [f32; 3],
    pub special: i16,
    pub tag: i16,
    pub bounds: Bounds,
    /// The mover currently animating this sector, if any.
    pub special_data: Option<ThinkerId>,
    /// Last mobj that made a noise heard in this sector.
    pub sound_target: Option<ThinkerId>,
}

impl Sector {
    pub fn new(floor: Plane, ceiling: Plane, bounds: Bounds) -> Self {
        Self {
            floor,
            ceiling,
            light_level: 1.0,
            color: [1.0; 3],
            special: 0,
            tag: 0,
            bounds,
            special_data: None,
            sound_target: None,
        }
    }
}

/// One of the three wall sections of a side.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub material: Option<MaterialId>,
    pub offset: [f32; 2],
    pub flags: i32,
    pub color: [f32; 4],
}

impl Surface {
    pub fn new(material: Option<MaterialId>) -> Self {
        Self {
            material,
            offset: [0.0; 2],
            flags: 0,
            color: [1.0; 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub top: Surface,
    pub middle: Surface,
    pub bottom: Surface,
    pub blend_mode: i32,
    pub flags: i16,
}

impl Side {
    pub fn new(top: Surface, middle: Surface, bottom: Surface) -> Self {
        Self {
            top,
            middle,
            bottom,
            blend_mode: 0,
            flags: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub flags: i16,
    /// Whether each player's automap has revealed this line.
    pub mapped: [bool; MAXPLAYERS],
    pub special: i16,
    pub tag: i16,
    pub front: Option<usize>,
    pub back: Option<usize>,
}

impl Line {
    pub fn new(front: Option<usize>, back: Option<usize>) -> Self {
        Self {
            flags: 0,
            mapped: [false; MAXPLAYERS],
            special: 0,
            tag: 0,
            front,
            back,
        }
    }

    /// Side indices in front, back order, skipping missing sides.
    pub fn sides(&self) -> impl Iterator<Item = usize> {
        self.front.into_iter().chain(self.back)
    }
}

/// A movable polygonal wall group (Hexen).
#[derive(Debug, Clone, PartialEq)]
pub struct Polyobj {
    pub tag: i32,
    pub angle: u32,
    pub dest_angle: u32,
    pub pos: [f32; 2],
}

impl Polyobj {
    pub fn new(tag: i32, pos: [f32; 2]) -> Self {
        Self {
            tag,
            angle: 0,
            dest_angle: 0,
            pos,
        }
    }
}

/// A sector already has an active mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorBusy {
    pub sector: usize,
    pub owner: ThinkerId,
}

impl fmt::Display for SectorBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sector {} is already moved by thinker {}",
            self.sector, self.owner.0
        )
    }
}

impl std::error::Error for SectorBusy {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {
    pub sectors: Vec<Sector>,
    pub lines: Vec<Line>,
    pub sides: Vec<Side>,
    pub polyobjs: Vec<Polyobj>,
    /// Number of ACS scripts defined by the map's behavior lump.
    pub script_count: usize,
}

impl Map {
    /// First sector whose bounds contain the point.
    pub fn sector_at(&self, x: f32, y: f32) -> Option<usize> {
        self.sectors.iter().position(|s| s.bounds.contains(x, y))
    }

    /// Gives `owner` exclusive use of the sector's special-data slot.
    pub fn claim_special(&mut self, sector: usize, owner: ThinkerId) -> Result<(), SectorBusy> {
        let sec = &mut self.sectors[sector];
        match sec.special_data {
            Some(current) if current != owner => Err(SectorBusy {
                sector,
                owner: current,
            }),
            _ => {
                sec.special_data = Some(owner);
                Ok(())
            }
        }
    }

    /// Clears the slot if `owner` holds it.
    pub fn release_special(&mut self, sector: usize, owner: ThinkerId) {
        if let Some(sec) = self.sectors.get_mut(sector) {
            if sec.special_data == Some(owner) {
                sec.special_data = None;
            }
        }
    }

    pub fn polyobj_by_tag(&self, tag: i32) -> Option<usize> {
        self.polyobjs.iter().position(|p| p.tag == tag)
    }

    /// Drops every runtime link into the thinker list.
    pub fn clear_thinker_links(&mut self) {
        for sec in &mut self.sectors {
            sec.special_data = None;
            sec.sound_target = None;
        }
    }
}

/// Pristine copies of every map, used to start a level from scratch.
#[derive(Resource, Debug, Clone, Default)]
pub struct MapLibrary {
    maps: BTreeMap<MapId, Map>,
}

impl MapLibrary {
    pub fn insert(&mut self, id: MapId, map: Map) {
        self.maps.insert(id, map);
    }

    pub fn base_map(&self, id: MapId) -> Option<&Map> {
        self.maps.get(&id)
    }
}
