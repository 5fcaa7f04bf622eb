// ---------------------------------------------------------------------------
// thing_archive – 1-based surrogate ids for mobjs during one save or load
// ---------------------------------------------------------------------------
//
// Id 0 means "no object". On write, ids are handed out on first reference
// to the lowest empty slot; the slot count is fixed up front from a census of
// the thinker list, so running out of slots means the census and the write
// pass disagree. On read, slots are bound as mobj records announce their own
// ids and references are resolved only after the whole stream is read.
//
// Records store ids as unsigned shorts, which caps an archive at 65535 mobjs.

use std::collections::HashMap;

use bevy::prelude::*;

use simulation::thinker::{ThinkerId, ThinkerList};

use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;

/// Most mobjs one save can archive.
pub const MAX_THINGS: usize = u16::MAX as usize;

/// Writes an id in its on-disk short form.
pub fn write_thing_id(w: &mut SaveWriter, id: u32) -> Result<(), SaveError> {
    let raw = u16::try_from(id).map_err(|_| SaveError::ArchiveExhausted {
        capacity: MAX_THINGS,
    })?;
    w.write_i16(raw as i16);
    Ok(())
}

pub fn read_thing_id(r: &mut SaveReader<'_>) -> u32 {
    u32::from(r.read_i16() as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingSlot {
    Empty,
    Bound(ThinkerId),
    /// The object was read but dropped (e.g. a player body nobody owns).
    Discarded,
}

#[derive(Debug, Clone)]
pub struct ThingArchive {
    slots: Vec<ThingSlot>,
    assigned: HashMap<ThinkerId, u32>,
    next_empty: usize,
    include_players: bool,
    /// False when the save writes no mobjs at all.
    tracked: bool,
}

impl ThingArchive {
    /// Sizes the archive for every mobj that will be written. Fails when
    /// there are more than [`MAX_THINGS`].
    pub fn for_write(thinkers: &ThinkerList, include_players: bool) -> Result<Self, SaveError> {
        let count = thinkers
            .mobjs()
            .filter(|(_, mo)| include_players || mo.player.is_none())
            .count();
        if count > MAX_THINGS {
            return Err(SaveError::Unsupported(format!(
                "{count} mobjs exceed the {MAX_THINGS} one save can hold"
            )));
        }
        Ok(Self {
            slots: vec![ThingSlot::Empty; count],
            assigned: HashMap::with_capacity(count),
            next_empty: 0,
            include_players,
            tracked: true,
        })
    }

    /// Archive for a save that writes no mobjs; every reference becomes 0.
    pub fn untracked() -> Self {
        Self {
            slots: Vec::new(),
            assigned: HashMap::new(),
            next_empty: 0,
            include_players: false,
            tracked: false,
        }
    }

    /// Empty archive sized by the count stored in the stream.
    pub fn for_read(count: usize) -> Result<Self, SaveError> {
        if count > MAX_THINGS {
            return Err(SaveError::corrupt(format!(
                "bad thing archive size {count} (at most {MAX_THINGS})"
            )));
        }
        Ok(Self {
            slots: vec![ThingSlot::Empty; count],
            assigned: HashMap::new(),
            next_empty: 0,
            include_players: true,
            tracked: true,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether player bodies get ids (and are therefore written at all).
    pub fn includes_players(&self) -> bool {
        self.include_players
    }

    /// Surrogate id for a reference, assigning one on first use. Non-mobjs
    /// and, when players are not saved, player bodies get 0.
    pub fn id_for(
        &mut self,
        thinkers: &ThinkerList,
        target: Option<ThinkerId>,
    ) -> Result<u32, SaveError> {
        let Some(target) = target.filter(|_| self.tracked) else {
            return Ok(0);
        };
        let Some(mo) = thinkers.mobj(target) else {
            return Ok(0);
        };
        if mo.player.is_some() && !self.include_players {
            return Ok(0);
        }
        if let Some(&id) = self.assigned.get(&target) {
            return Ok(id);
        }
        if self.next_empty >= self.slots.len() {
            return Err(SaveError::ArchiveExhausted {
                capacity: self.slots.len(),
            });
        }
        let index = self.next_empty;
        self.slots[index] = ThingSlot::Bound(target);
        self.next_empty += 1;
        let id = index as u32 + 1;
        self.assigned.insert(target, id);
        Ok(id)
    }

    fn slot_index(&self, id: u32) -> Result<Option<usize>, SaveError> {
        if id == 0 {
            return Ok(None);
        }
        let index = id as usize - 1;
        if index >= self.slots.len() {
            return Err(SaveError::corrupt(format!(
                "thing id {id} outside archive of {} slots",
                self.slots.len()
            )));
        }
        Ok(Some(index))
    }

    /// Binds the id a mobj record announced to the object just created.
    pub fn set_slot(&mut self, id: u32, thinker: ThinkerId) -> Result<(), SaveError> {
        if let Some(index) = self.slot_index(id)? {
            self.slots[index] = ThingSlot::Bound(thinker);
        }
        Ok(())
    }

    /// Marks an id whose object was dropped during the read.
    pub fn discard(&mut self, id: u32) -> Result<(), SaveError> {
        if let Some(index) = self.slot_index(id)? {
            self.slots[index] = ThingSlot::Discarded;
        }
        Ok(())
    }

    /// Turns a stored id back into a live reference.
    pub fn resolve(&self, id: u32) -> Result<Option<ThinkerId>, SaveError> {
        if id == 0 {
            return Ok(None);
        }
        match self.slots.get(id as usize - 1) {
            None => {
                warn!(
                    "Thing id {id} out of range ({} slots); reference cleared",
                    self.slots.len()
                );
                Ok(None)
            }
            Some(ThingSlot::Empty) => Err(SaveError::corrupt(format!(
                "thing id {id} is referenced but no object was archived under it"
            ))),
            Some(ThingSlot::Discarded) => Ok(None),
            Some(ThingSlot::Bound(t)) => Ok(Some(*t)),
        }
    }

    pub fn slot(&self, id: u32) -> Option<ThingSlot> {
        (id as usize).checked_sub(1).and_then(|i| self.slots.get(i).copied())
    }
}
