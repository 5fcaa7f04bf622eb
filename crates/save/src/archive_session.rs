// ---------------------------------------------------------------------------
// archive_session – per-operation state shared by every record codec
// ---------------------------------------------------------------------------
//
// One `ArchiveSession` lives for exactly one save or load. It owns both
// archives, the player slot translation and, on load, the references that
// cannot be resolved until every thinker exists.

use bevy::prelude::*;

use simulation::config::MAXPLAYERS;
use simulation::level::Level;
use simulation::materials::MaterialRegistry;
use simulation::mobj::{MobjInfoTable, StateTable};
use simulation::thinker::{ThinkerId, ThinkerKind, ThinkerList};
use simulation::Players;

use crate::material_archive::MaterialArchive;
use crate::mobj_migrate::{build_mobj_migrations, MobjMigrations};
use crate::save_config::NetRole;
use crate::save_error::SaveError;
use crate::save_version::SaveVersion;
use crate::thing_archive::ThingArchive;

/// Static game data the records are resolved against.
#[derive(Clone, Copy)]
pub struct GameTables<'a> {
    pub materials: &'a MaterialRegistry,
    pub infos: &'a MobjInfoTable,
    pub states: &'a StateTable,
}

/// A reference field holding a raw thing id until the stream is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefField {
    Target,
    Tracer,
    OnMobj,
    LastEnemy,
    Generator,
    /// Mobj kept in `special2` by types whose info says so.
    Special2,
    /// Activator of a running script.
    Activator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRef {
    pub owner: ThinkerId,
    pub field: RefField,
    pub raw: u32,
}

#[derive(Debug)]
pub struct ArchiveSession {
    pub version: SaveVersion,
    pub materials: MaterialArchive,
    pub things: ThingArchive,
    pub role: NetRole,
    pending: Vec<PendingRef>,
    /// Saved player slot to live player slot.
    player_map: [Option<usize>; MAXPLAYERS],
    migrations: MobjMigrations,
}

impl ArchiveSession {
    /// Prepares both archives from the live level before anything is written.
    pub fn for_write(
        level: &Level,
        materials: &MaterialRegistry,
        save_players: bool,
        role: NetRole,
    ) -> Result<Self, SaveError> {
        let mut player_map = [None; MAXPLAYERS];
        for (i, slot) in player_map.iter_mut().enumerate() {
            *slot = Some(i);
        }
        Ok(Self {
            version: SaveVersion::CURRENT,
            materials: MaterialArchive::prepare(&level.map, materials),
            things: match role {
                NetRole::Server => ThingArchive::for_write(&level.thinkers, save_players)?,
                NetRole::Client => ThingArchive::untracked(),
            },
            role,
            pending: Vec::new(),
            player_map,
            migrations: build_mobj_migrations(),
        })
    }

    /// `thing_count` is the archive size stored in the stream.
    pub fn for_read(
        version: SaveVersion,
        thing_count: usize,
        materials: MaterialArchive,
    ) -> Result<Self, SaveError> {
        Ok(Self {
            version,
            materials,
            things: ThingArchive::for_read(thing_count)?,
            role: NetRole::Server,
            pending: Vec::new(),
            player_map: [None; MAXPLAYERS],
            migrations: build_mobj_migrations(),
        })
    }

    pub fn migrations(&self) -> &MobjMigrations {
        &self.migrations
    }

    pub fn map_player(&mut self, saved: usize, real: Option<usize>) {
        if let Some(slot) = self.player_map.get_mut(saved) {
            *slot = real;
        }
    }

    /// Live slot of a saved player, if that player is present now.
    pub fn real_player(&self, saved: usize) -> Option<usize> {
        self.player_map.get(saved).copied().flatten()
    }

    /// Records a reference to fix up once every thinker exists.
    pub fn defer(&mut self, owner: ThinkerId, field: RefField, raw: u32) {
        if raw != 0 {
            self.pending.push(PendingRef { owner, field, raw });
        }
    }

    pub fn pending(&self) -> &[PendingRef] {
        &self.pending
    }

    /// Replaces every deferred raw id with the live thinker bound to it.
    pub fn resolve_pending(&mut self, thinkers: &mut ThinkerList) -> Result<usize, SaveError> {
        let pending = std::mem::take(&mut self.pending);
        let mut resolved = 0;
        for p in &pending {
            let target = self.things.resolve(p.raw)?;
            let Some(thinker) = thinkers.get_mut(p.owner) else {
                warn!("Deferred reference owner {} vanished", p.owner.0);
                continue;
            };
            let slot = match (&mut thinker.kind, p.field) {
                (ThinkerKind::Mobj(mo), RefField::Target) => &mut mo.target,
                (ThinkerKind::Mobj(mo), RefField::Tracer) => &mut mo.tracer,
                (ThinkerKind::Mobj(mo), RefField::OnMobj) => &mut mo.on_mobj,
                (ThinkerKind::Mobj(mo), RefField::LastEnemy) => &mut mo.last_enemy,
                (ThinkerKind::Mobj(mo), RefField::Generator) => &mut mo.generator,
                (ThinkerKind::Mobj(mo), RefField::Special2) => &mut mo.special2_mobj,
                (ThinkerKind::Script(script), RefField::Activator) => &mut script.activator,
                (_, field) => {
                    return Err(SaveError::corrupt(format!(
                        "{field:?} reference recorded for thinker {} of the wrong class",
                        p.owner.0
                    )))
                }
            };
            *slot = target;
            if target.is_some() {
                resolved += 1;
            }
        }
        Ok(resolved)
    }
}

/// Borrowed world state for writing records.
pub struct WriteContext<'a> {
    pub level: &'a Level,
    pub tables: GameTables<'a>,
    pub session: &'a mut ArchiveSession,
    /// Thinker whose record is being written.
    pub current: Option<ThinkerId>,
}

impl<'a> WriteContext<'a> {
    pub fn new(level: &'a Level, tables: GameTables<'a>, session: &'a mut ArchiveSession) -> Self {
        Self {
            level,
            tables,
            session,
            current: None,
        }
    }

    /// Thing id of a reference, assigning one on first use.
    pub fn thing_id(&mut self, target: Option<ThinkerId>) -> Result<u32, SaveError> {
        self.session.things.id_for(&self.level.thinkers, target)
    }
}

/// The level and players being rebuilt, plus the session driving it.
pub struct ReadContext<'a> {
    pub level: &'a mut Level,
    pub players: &'a mut Players,
    pub tables: GameTables<'a>,
    pub session: &'a mut ArchiveSession,
}

impl ReadContext<'_> {
    /// Validates a stored sector index against the map being loaded.
    pub fn sector_index(&self, raw: i32, what: &str) -> Result<usize, SaveError> {
        usize::try_from(raw)
            .ok()
            .filter(|&i| i < self.level.map.sectors.len())
            .ok_or_else(|| SaveError::corrupt(format!("{what}: bad sector number {raw}")))
    }
}
