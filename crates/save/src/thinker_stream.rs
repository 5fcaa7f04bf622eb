// ---------------------------------------------------------------------------
// thinker_stream – the tagged THINKERS segment
// ---------------------------------------------------------------------------
//
// Each live thinker is written as (class tag, stasis byte, record) and the
// stream ends with the `End` tag. Reading rebuilds every thinker first and
// resolves mobj references in a second pass, since a record may point at an
// object archived after it.

use bevy::prelude::*;

use simulation::thinker::{ThinkerId, ThinkerKind};

use crate::archive_session::{ReadContext, WriteContext};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_config::NetRole;
use crate::save_error::SaveError;
use crate::segments::{begin_segment, expect_segment, Segment};
use crate::thinker_registry::{
    classify, info_for_class, info_for_tag, ReadOutcome, Restored, ThinkerClass,
    ThinkerClassFlags, ThinkerClassInfo,
};

/// Writes every archivable thinker and returns how many were written.
pub fn write_thinkers(w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<usize, SaveError> {
    begin_segment(w, Segment::Thinkers);
    let client = ctx.session.role == NetRole::Client;
    let include_players = ctx.session.things.includes_players();
    let level = ctx.level;

    let mut written = 0;
    for (id, thinker) in level.thinkers.iter() {
        let class = classify(&thinker.kind);
        let Some(info) = info_for_class(class) else {
            continue;
        };
        let Some(write) = info.write else {
            continue;
        };
        if client && info.flags.contains(ThinkerClassFlags::SERVER_ONLY) {
            continue;
        }
        if let ThinkerKind::Mobj(mo) = &thinker.kind {
            if mo.player.is_some() && !include_players {
                continue;
            }
        }
        ctx.current = Some(id);
        w.write_u8(class.tag());
        w.write_u8(u8::from(thinker.in_stasis));
        write(&thinker.kind, w, ctx)?;
        written += 1;
    }
    ctx.current = None;
    w.write_u8(ThinkerClass::End.tag());
    Ok(written)
}

/// Adds one restored thinker to the level and records what it still needs.
fn link_restored(
    ctx: &mut ReadContext<'_>,
    info: &ThinkerClassInfo,
    restored: Restored,
    stasis: bool,
) -> Result<ThinkerId, SaveError> {
    let Restored {
        kind,
        thing_id,
        refs,
        stasis: record_stasis,
    } = restored;
    let player = kind.as_mobj().and_then(|mo| mo.player);

    let id = if info.flags.contains(ThinkerClassFlags::SPECIAL) {
        ctx.level
            .add_special(kind)
            .map_err(|busy| SaveError::corrupt(format!("{} record: {busy}", info.name)))?
    } else {
        ctx.level.thinkers.add(kind)
    };
    if stasis || record_stasis {
        ctx.level.thinkers.set_stasis(id, true);
    }
    if thing_id != 0 {
        ctx.session.things.set_slot(thing_id, id)?;
    }
    for (field, raw) in refs {
        ctx.session.defer(id, field, raw);
    }
    if let Some(slot) = player.and_then(|p| ctx.players.slots.get_mut(p)) {
        slot.player.mo = Some(id);
    }
    Ok(id)
}

/// Reads the stream up to its terminator, then resolves every deferred
/// reference. Returns the number of thinkers restored.
pub fn read_thinkers(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<usize, SaveError> {
    expect_segment(r, Segment::Thinkers)?;
    let has_stasis_byte = ctx.session.version.has_stasis_byte();

    let mut restored = 0;
    let mut discarded = 0;
    loop {
        let tag = r.read_u8();
        if r.overrun() {
            return Err(SaveError::corrupt("thinker stream ends without a terminator"));
        }
        if tag == ThinkerClass::End.tag() {
            break;
        }
        let info = info_for_tag(tag)
            .ok_or_else(|| SaveError::corrupt(format!("unknown thinker class {tag}")))?;
        let stasis = has_stasis_byte && r.read_u8() != 0;
        match (info.read)(r, ctx)? {
            ReadOutcome::Restored(thinker) => {
                link_restored(ctx, info, thinker, stasis)?;
                restored += 1;
            }
            ReadOutcome::Discarded { thing_id } => {
                ctx.session.things.discard(thing_id)?;
                discarded += 1;
            }
        }
    }

    let resolved = ctx.session.resolve_pending(&mut ctx.level.thinkers)?;
    debug!("Restored {restored} thinkers ({discarded} discarded), resolved {resolved} references");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive_session::ArchiveSession;
    use crate::material_archive::MaterialArchive;
    use crate::save_version::SaveVersion;
    use crate::test_fixtures::Fixture;
    use simulation::specials::Door;
    use simulation::GameMode;

    fn save_stream(fx: &Fixture, save_players: bool, role: NetRole) -> (Vec<u8>, usize, usize) {
        let mut session = ArchiveSession::for_write(&fx.level, &fx.materials, save_players, role)
            .expect("session");
        let mut w = SaveWriter::new();
        let mut ctx = fx.write_ctx(&mut session);
        let written = write_thinkers(&mut w, &mut ctx).expect("write thinkers");
        (w.into_bytes(), session.things.capacity(), written)
    }

    fn load_stream(mode: GameMode, version: u32, bytes: &[u8], capacity: usize) -> Result<Fixture, SaveError> {
        let mut target = Fixture::new(mode);
        let materials = MaterialArchive::prepare(&target.level.map, &target.materials);
        let mut session = ArchiveSession::for_read(SaveVersion(version), capacity, materials)
            .expect("session");
        session.map_player(0, Some(0));
        let mut r = SaveReader::new(bytes);
        read_thinkers(&mut r, &mut target.read_ctx(&mut session))?;
        assert_eq!(r.remaining(), 0);
        Ok(target)
    }

    #[test]
    fn test_stream_restores_thinkers_and_references() {
        for mode in [GameMode::DoomRegistered, GameMode::Hexen] {
            let mut fx = Fixture::new(mode);
            fx.populate(7, 12);
            let (bytes, capacity, written) = save_stream(&fx, true, NetRole::Server);
            assert_eq!(written, fx.level.thinkers.len());

            let target = load_stream(mode, 7, &bytes, capacity).expect("load thinkers");
            let before: Vec<_> = fx.level.thinkers.iter().collect();
            let after: Vec<_> = target.level.thinkers.iter().collect();
            assert_eq!(before, after, "{mode:?}");
            for (a, b) in fx.level.map.sectors.iter().zip(&target.level.map.sectors) {
                assert_eq!(a.special_data, b.special_data);
            }
            assert_eq!(target.players.slots[0].player.mo, fx.players.slots[0].player.mo);
        }
    }

    #[test]
    fn test_unsaved_players_leave_no_bodies() {
        let mut fx = Fixture::new(GameMode::DoomRegistered);
        fx.populate(3, 6);
        let player_mo = fx.players.slots[0].player.mo;
        let (bytes, capacity, written) = save_stream(&fx, false, NetRole::Server);
        assert_eq!(written, fx.level.thinkers.len() - 1);

        let target = load_stream(GameMode::DoomRegistered, 7, &bytes, capacity).expect("load");
        assert!(target.level.thinkers.mobjs().all(|(_, mo)| mo.player.is_none()));
        // Anything that pointed at the player body now points at nothing.
        let pointed_at_player = fx
            .level
            .thinkers
            .mobjs()
            .filter(|(_, mo)| mo.target.is_some() && mo.target == player_mo)
            .count();
        let unresolved = target
            .level
            .thinkers
            .mobjs()
            .filter(|(_, mo)| mo.target.is_none())
            .count();
        assert_eq!(unresolved, pointed_at_player);
    }

    #[test]
    fn test_client_stream_has_no_mobjs() {
        let mut fx = Fixture::new(GameMode::DoomRegistered);
        fx.populate(11, 4);
        let (bytes, capacity, written) = save_stream(&fx, true, NetRole::Client);
        let specials = fx.level.thinkers.len() - fx.level.thinkers.mobjs().count();
        assert_eq!(written, specials);
        let target = load_stream(GameMode::DoomRegistered, 7, &bytes, capacity).expect("load");
        assert_eq!(target.level.thinkers.len(), specials);
    }

    #[test]
    fn test_unknown_class_and_missing_terminator() {
        let mut w = SaveWriter::new();
        begin_segment(&mut w, Segment::Thinkers);
        let mut bytes = w.into_bytes();

        let err = load_stream(GameMode::DoomRegistered, 7, &bytes, 0).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("without a terminator"), "got: {msg}");

        bytes.push(42);
        let msg = format!("{}", load_stream(GameMode::DoomRegistered, 7, &bytes, 0).unwrap_err());
        assert!(msg.contains("unknown thinker class 42"), "got: {msg}");
    }

    #[test]
    fn test_second_mover_on_sector_is_corrupt() {
        let mut fx = Fixture::new(GameMode::DoomRegistered);
        let door = Door {
            kind: 0,
            sector: 0,
            top_height: 100.0,
            speed: 2.0,
            state: 1,
            top_wait: 150,
            top_countdown: 0,
        };
        fx.level.add_special(ThinkerKind::Door(door.clone())).expect("first door");
        // Bypasses the sector claim, as a damaged save would.
        fx.level.thinkers.add(ThinkerKind::Door(door));
        let (bytes, capacity, _) = save_stream(&fx, true, NetRole::Server);

        let msg = format!(
            "{}",
            load_stream(GameMode::DoomRegistered, 7, &bytes, capacity).unwrap_err()
        );
        assert!(msg.contains("door record"), "got: {msg}");
    }

    #[test]
    fn test_v5_stream_has_no_stasis_byte() {
        let mut w = SaveWriter::new();
        begin_segment(&mut w, Segment::Thinkers);
        w.write_u8(ThinkerClass::Glow.tag());
        w.write_u8(1);
        for v in [1, 255, 40, -1] {
            w.write_i32(v);
        }
        w.write_u8(ThinkerClass::End.tag());
        let bytes = w.into_bytes();

        let target = load_stream(GameMode::DoomRegistered, 5, &bytes, 0).expect("v5 stream");
        let (_, glow) = target.level.thinkers.iter().next().expect("one thinker");
        assert!(!glow.in_stasis);
        match &glow.kind {
            ThinkerKind::Glow(g) => {
                assert_eq!(g.sector, 1);
                assert_eq!(g.direction, -1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
