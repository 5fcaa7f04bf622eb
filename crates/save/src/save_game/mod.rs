// ---------------------------------------------------------------------------
// save_game: the session controller that runs one save or one load
// ---------------------------------------------------------------------------
//
// ## Stream order
//
// The logical stream is written and read in a fixed order, one phase per
// group of segments:
//   - **Header**: magic, version, game mode, rules, map, players present
//   - **Materials**: thing archive size, then the material archive
//   - **Players**: player header with array counts, then the player records
//   - **World**: map header, sectors, lines, polyobjects
//   - **Thinkers**: the tagged thinker stream and reference resolution
//   - **Epilogue**: game-specific sections (brain, sound targets, ACS, quakes)
//   - **Finalize**: END segment and the consistency byte
//
// A load reads into a fresh copy of the base map and a fresh set of players;
// the caller swaps them in only when the whole stream has been accepted.

use bevy::prelude::*;

use simulation::map::MapLibrary;
use simulation::{GameMode, GameSession, Level, Players};

use crate::archive_session::{ArchiveSession, GameTables, ReadContext, WriteContext};
use crate::epilogue::{read_epilogue, write_epilogue};
use crate::file_header::{unwrap_container, wrap_container};
use crate::game_profile::GameProfile;
use crate::material_archive::MaterialArchive;
use crate::player_archive::{
    read_player_header, read_players, write_player_header, write_players, PlayerReconciliation,
};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_config::{NetRole, SaveOptions};
use crate::save_error::SaveError;
use crate::save_header::{SaveHeader, SaveInfo};
use crate::segments::{begin_segment, expect_segment, Segment};
use crate::thinker_stream::{read_thinkers, write_thinkers};
use crate::world_archive::{read_map_header, read_world, write_map_header, write_world};

#[cfg(test)]
mod tests_failures;
#[cfg(test)]
mod tests_legacy;
#[cfg(test)]
mod tests_roundtrip;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    HeaderDone,
    MaterialsDone,
    PlayersDone,
    WorldDone,
    ThinkersDone,
    EpilogueDone,
    Finalized,
    Complete,
    Failed,
}

impl SessionPhase {
    fn next(self) -> Option<SessionPhase> {
        use SessionPhase::*;
        match self {
            Idle => Some(HeaderDone),
            HeaderDone => Some(MaterialsDone),
            MaterialsDone => Some(PlayersDone),
            PlayersDone => Some(WorldDone),
            WorldDone => Some(ThinkersDone),
            ThinkersDone => Some(EpilogueDone),
            EpilogueDone => Some(Finalized),
            Finalized => Some(Complete),
            Complete | Failed => None,
        }
    }
}

/// Tracks progress through one operation. Phases only move forward, one at
/// a time; any error parks the controller in `Failed`.
#[derive(Debug)]
pub struct SessionController {
    phase: SessionPhase,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn advance(&mut self, to: SessionPhase) -> Result<(), SaveError> {
        if self.phase.next() != Some(to) {
            let err = SaveError::corrupt(format!(
                "session cannot move from {:?} to {:?}",
                self.phase, to
            ));
            self.phase = SessionPhase::Failed;
            return Err(err);
        }
        debug!("Session phase {:?} -> {:?}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Passes `result` through, moving to `Failed` on error.
    fn settle<T>(&mut self, result: Result<T, SaveError>) -> Result<T, SaveError> {
        if result.is_err() {
            self.phase = SessionPhase::Failed;
        }
        result
    }
}

fn check_overrun(r: &SaveReader<'_>, what: &str) -> Result<(), SaveError> {
    if r.overrun() {
        return Err(SaveError::corrupt(format!(
            "stream ended inside the {what} (at byte {})",
            r.position()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Everything a save reads from the live game.
pub struct SaveRequest<'a> {
    pub session: &'a GameSession,
    pub players: &'a Players,
    pub level: &'a Level,
    pub tables: GameTables<'a>,
    pub profile: &'a GameProfile,
    pub options: SaveOptions,
    pub description: &'a str,
}

fn write_stream(c: &mut SessionController, req: &SaveRequest<'_>) -> Result<Vec<u8>, SaveError> {
    let mut w = SaveWriter::new();

    // -- Header --
    let mut header = SaveHeader::new(
        req.session,
        req.profile,
        req.players,
        req.options.save_players,
        req.description,
    );
    if req.options.role == NetRole::Client {
        header.magic = req.profile.client_magic.unwrap_or(req.profile.magic);
    }
    header.write(&mut w);
    c.advance(SessionPhase::HeaderDone)?;

    // -- Archives --
    let mut archive = ArchiveSession::for_write(
        req.level,
        req.tables.materials,
        req.options.save_players,
        req.options.role,
    )?;
    w.write_i32(archive.things.capacity() as i32);
    begin_segment(&mut w, Segment::MaterialArchive);
    archive.materials.write(&mut w)?;
    c.advance(SessionPhase::MaterialsDone)?;

    // -- Players --
    write_player_header(&mut w, &req.players.layout);
    write_players(&mut w, req.players, &header.players_present);
    c.advance(SessionPhase::PlayersDone)?;

    // -- World --
    let mut ctx = WriteContext::new(req.level, req.tables, &mut archive);
    write_map_header(&mut w, req.level, req.session.map_time);
    write_world(&mut w, &ctx, req.profile.has_polyobjs);
    c.advance(SessionPhase::WorldDone)?;

    // -- Thinkers --
    let thinkers = write_thinkers(&mut w, &mut ctx)?;
    c.advance(SessionPhase::ThinkersDone)?;

    // -- Epilogue --
    write_epilogue(&mut w, &mut ctx, req.profile.epilogue)?;
    c.advance(SessionPhase::EpilogueDone)?;

    // -- Finalize --
    begin_segment(&mut w, Segment::End);
    w.write_u8(req.profile.consistency);
    c.advance(SessionPhase::Finalized)?;

    debug!(
        "Wrote {thinkers} thinkers, {} materials, {} thing ids",
        archive.materials.len(),
        archive.things.capacity()
    );
    Ok(w.into_bytes())
}

/// Serializes the live game into container bytes ready for disk.
pub fn save_game(req: &SaveRequest<'_>) -> Result<Vec<u8>, SaveError> {
    let mut controller = SessionController::new();
    let stream = write_stream(&mut controller, req);
    let stream = controller.settle(stream)?;
    let bytes = wrap_container(&stream);
    controller.advance(SessionPhase::Complete)?;
    info!(
        "Saved {:?} map {}/{} ({} bytes, {} compressed)",
        req.session.mode,
        req.session.map.episode,
        req.session.map.map,
        stream.len(),
        bytes.len()
    );
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// What a load needs from the running game.
pub struct LoadRequest<'a> {
    pub bytes: &'a [u8],
    /// The live session: game mode and net game flag.
    pub session: &'a GameSession,
    /// The live players: which slots are connected and under which net id.
    pub players: &'a Players,
    pub library: &'a MapLibrary,
    pub tables: GameTables<'a>,
    pub profile: &'a GameProfile,
}

/// A fully read save, not yet applied to the live game.
#[derive(Debug)]
pub struct LoadedGame {
    pub header: SaveHeader,
    pub session: GameSession,
    pub level: Level,
    pub players: Players,
    pub reconciliation: PlayerReconciliation,
    pub thinkers: usize,
}

fn read_stream(c: &mut SessionController, req: &LoadRequest<'_>) -> Result<LoadedGame, SaveError> {
    let stream = unwrap_container(req.bytes)?;
    let mut r = SaveReader::new(&stream);

    // -- Header --
    let header = SaveHeader::read(&mut r);
    check_overrun(&r, "save header")?;
    let version = header.validate(req.profile, req.session.mode)?;
    let base = req
        .library
        .base_map(header.map)
        .ok_or(SaveError::MissingMap(header.map))?;
    let mut level = Level::new(base.clone());
    let mut players = req.players.fresh_copy();
    c.advance(SessionPhase::HeaderDone)?;

    // -- Archives --
    let raw_things = r.read_i32();
    let thing_count = usize::try_from(raw_things)
        .map_err(|_| SaveError::corrupt(format!("bad thing archive size {raw_things}")))?;
    expect_segment(&mut r, Segment::MaterialArchive)?;
    let materials = MaterialArchive::read(&mut r, version.material_archive_version());
    check_overrun(&r, "material archive")?;
    let mut archive = ArchiveSession::for_read(version, thing_count, materials)?;
    c.advance(SessionPhase::MaterialsDone)?;

    let mut ctx = ReadContext {
        level: &mut level,
        players: &mut players,
        tables: req.tables,
        session: &mut archive,
    };

    // -- Players --
    let stored = read_player_header(&mut r)?;
    let reconciliation = read_players(
        &mut r,
        &mut ctx,
        &stored,
        &header.players_present,
        req.session.netgame,
    )?;
    check_overrun(&r, "player records")?;
    c.advance(SessionPhase::PlayersDone)?;

    // -- World --
    let map_time = read_map_header(&mut r, version, &ctx.level.map)?;
    read_world(&mut r, &mut ctx, req.profile.has_polyobjs)?;
    check_overrun(&r, "world")?;
    c.advance(SessionPhase::WorldDone)?;

    // -- Thinkers --
    let thinkers = read_thinkers(&mut r, &mut ctx)?;
    check_overrun(&r, "thinker stream")?;
    c.advance(SessionPhase::ThinkersDone)?;

    // -- Epilogue --
    read_epilogue(&mut r, &mut ctx, req.profile.epilogue)?;
    check_overrun(&r, "epilogue")?;
    c.advance(SessionPhase::EpilogueDone)?;

    // -- Finalize --
    expect_segment(&mut r, Segment::End)?;
    let consistency = r.read_u8();
    check_overrun(&r, "trailer")?;
    if consistency != req.profile.consistency {
        return Err(SaveError::corrupt(format!(
            "bad consistency byte {consistency:#04X} (expected {:#04X})",
            req.profile.consistency
        )));
    }
    c.advance(SessionPhase::Finalized)?;

    let session = GameSession {
        mode: req.session.mode,
        rules: header.rules,
        map: header.map,
        map_time,
        game_id: header.game_id,
        netgame: req.session.netgame,
    };
    Ok(LoadedGame {
        header,
        session,
        level,
        players,
        reconciliation,
        thinkers,
    })
}

/// Reads container bytes into a new level, players and session. The live
/// game is only read from, so a failed load leaves it as it was.
pub fn load_game(req: &LoadRequest<'_>) -> Result<LoadedGame, SaveError> {
    let mut controller = SessionController::new();
    let loaded = read_stream(&mut controller, req);
    let loaded = controller.settle(loaded)?;
    controller.advance(SessionPhase::Complete)?;
    info!(
        "Loaded \"{}\": {:?} map {}/{} at tic {}, {} thinkers",
        loaded.header.description,
        loaded.session.mode,
        loaded.session.map.episode,
        loaded.session.map.map,
        loaded.session.map_time,
        loaded.thinkers
    );
    Ok(loaded)
}

/// Header summary of a save file for slot menus.
pub fn read_save_info(bytes: &[u8], profile: &GameProfile, mode: GameMode) -> Result<SaveInfo, SaveError> {
    let stream = unwrap_container(bytes)?;
    let mut r = SaveReader::new(&stream);
    let header = SaveHeader::read(&mut r);
    check_overrun(&r, "save header")?;
    let loadable = match header.validate(profile, mode) {
        Ok(_) => true,
        Err(e) => {
            debug!("Save \"{}\" is not loadable: {e}", header.description);
            false
        }
    };
    Ok(SaveInfo { header, loadable })
}
