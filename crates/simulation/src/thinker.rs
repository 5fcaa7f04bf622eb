//! The active thinker list.
//!
//! Every object that receives a per-tick update lives here, tagged with its
//! [`ThinkerKind`]. Ids are handed out in creation order and never reused
//! within one list, so iteration order is stable between a save and the
//! following load.

use std::collections::BTreeMap;

use crate::mobj::Mobj;
use crate::specials::{
    AcsScript, Ceiling, Door, Flicker, FloorMover, FloorWaggle, Glow, HexenLight, LightBlink,
    LightFlash, Phase, Pillar, Plat, PolyDoor, PolyEvent, Strobe,
};

/// Handle of a thinker in a [`ThinkerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThinkerId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum ThinkerKind {
    Mobj(Box<Mobj>),
    Ceiling(Ceiling),
    Door(Door),
    Floor(FloorMover),
    Plat(Plat),
    Flash(LightFlash),
    Strobe(Strobe),
    Glow(Glow),
    Flicker(Flicker),
    Blink(LightBlink),
    Script(Box<AcsScript>),
    FloorWaggle(FloorWaggle),
    Light(HexenLight),
    Phase(Phase),
    Pillar(Pillar),
    RotatePoly(PolyEvent),
    MovePoly(PolyEvent),
    PolyDoor(PolyDoor),
}

impl ThinkerKind {
    /// Sector whose special-data slot this thinker owns while it runs.
    pub fn claimed_sector(&self) -> Option<usize> {
        match self {
            ThinkerKind::Ceiling(c) => Some(c.sector),
            ThinkerKind::Door(d) => Some(d.sector),
            ThinkerKind::Floor(f) => Some(f.sector),
            ThinkerKind::Plat(p) => Some(p.sector),
            ThinkerKind::Pillar(p) => Some(p.sector),
            ThinkerKind::FloorWaggle(w) => Some(w.sector),
            _ => None,
        }
    }

    pub fn as_mobj(&self) -> Option<&Mobj> {
        match self {
            ThinkerKind::Mobj(mo) => Some(mo),
            _ => None,
        }
    }

    pub fn as_mobj_mut(&mut self) -> Option<&mut Mobj> {
        match self {
            ThinkerKind::Mobj(mo) => Some(mo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thinker {
    pub kind: ThinkerKind,
    /// Present in the list but skipped when ticking.
    pub in_stasis: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ThinkerList {
    thinkers: BTreeMap<ThinkerId, Thinker>,
    next_id: u32,
}

impl ThinkerList {
    pub fn add(&mut self, kind: ThinkerKind) -> ThinkerId {
        let id = ThinkerId(self.next_id);
        self.next_id += 1;
        self.thinkers.insert(
            id,
            Thinker {
                kind,
                in_stasis: false,
            },
        );
        id
    }

    pub fn remove(&mut self, id: ThinkerId) -> Option<Thinker> {
        self.thinkers.remove(&id)
    }

    pub fn get(&self, id: ThinkerId) -> Option<&Thinker> {
        self.thinkers.get(&id)
    }

    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut Thinker> {
        self.thinkers.get_mut(&id)
    }

    pub fn mobj(&self, id: ThinkerId) -> Option<&Mobj> {
        self.get(id).and_then(|t| t.kind.as_mobj())
    }

    pub fn mobj_mut(&mut self, id: ThinkerId) -> Option<&mut Mobj> {
        self.get_mut(id).and_then(|t| t.kind.as_mobj_mut())
    }

    pub fn set_stasis(&mut self, id: ThinkerId, on: bool) -> bool {
        match self.thinkers.get_mut(&id) {
            Some(t) => {
                t.in_stasis = on;
                true
            }
            None => false,
        }
    }

    /// Every thinker in creation order, including those in stasis.
    pub fn iter(&self) -> impl Iterator<Item = (ThinkerId, &Thinker)> {
        self.thinkers.iter().map(|(id, t)| (*id, t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ThinkerId, &mut Thinker)> {
        self.thinkers.iter_mut().map(|(id, t)| (*id, t))
    }

    /// Thinkers that tick this frame.
    pub fn iter_active(&self) -> impl Iterator<Item = (ThinkerId, &Thinker)> {
        self.iter().filter(|(_, t)| !t.in_stasis)
    }

    pub fn mobjs(&self) -> impl Iterator<Item = (ThinkerId, &Mobj)> {
        self.iter()
            .filter_map(|(id, t)| t.kind.as_mobj().map(|mo| (id, mo)))
    }

    pub fn len(&self) -> usize {
        self.thinkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thinkers.is_empty()
    }

    pub fn clear(&mut self) {
        self.thinkers.clear();
    }
}
