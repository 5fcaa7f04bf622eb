// ---------------------------------------------------------------------------
// mobj_archive – the mobj record
// ---------------------------------------------------------------------------
//
// Layout (version 8): own id, target, tracer and on-mobj shorts; position,
// orientation and sprite; bounds and momentum; the gameplay counters; the
// owning player; the spawn spot; then the fields each later version added.
// Older records are read field by field under version gates and upgraded by
// the migration chain before the mobj is linked into the map.

use bevy::prelude::*;

use simulation::config::{ANG45, DDMAXINT, ONFLOORZ};
use simulation::mobj::{Mobj, MobjFlags, MobjFlags2, MobjFlags3, MobjInfo, SpawnSpot};

use crate::archive_session::{ReadContext, RefField, WriteContext};
use crate::mobj_migrate::{MIN_MOBJ_RECORD_VERSION, MOBJ_RECORD_VERSION};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::thing_archive::{read_thing_id, write_thing_id};
use crate::thinker_registry::{ReadOutcome, Restored};

/// Full-bright bit some old records kept in the frame number.
const FRAME_FULLBRIGHT: i32 = 0x8000;

pub fn write_mobj(mo: &Mobj, w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    let own = ctx.thing_id(ctx.current)?;
    let target = ctx.thing_id(mo.target)?;
    let tracer = ctx.thing_id(mo.tracer)?;
    let on_mobj = ctx.thing_id(mo.on_mobj)?;
    let last_enemy = ctx.thing_id(mo.last_enemy)?;
    let generator = ctx.thing_id(mo.generator)?;
    let links_special2 = ctx
        .tables
        .infos
        .get(mo.type_id)
        .is_some_and(|info| info.special2_is_mobj);
    // Corpses drop the link.
    let special2 = match links_special2 {
        true if mo.flags.contains(MobjFlags::CORPSE) => 0,
        true => ctx.thing_id(mo.special2_mobj)? as i32,
        false => mo.special2,
    };

    w.write_u8(MOBJ_RECORD_VERSION as u8);
    write_thing_id(w, own)?;
    write_thing_id(w, target)?;
    write_thing_id(w, tracer)?;
    write_thing_id(w, on_mobj)?;

    for v in mo.pos {
        w.write_fixed(v);
    }
    w.write_i32(mo.angle as i32);
    w.write_i32(mo.sprite);
    w.write_i32(mo.frame);
    w.write_fixed(mo.floor_z);
    w.write_fixed(mo.ceiling_z);
    w.write_fixed(mo.radius);
    w.write_fixed(mo.height);
    for v in mo.mom {
        w.write_fixed(v);
    }
    w.write_i32(mo.valid);
    w.write_i32(mo.type_id);
    w.write_i32(mo.tics);
    w.write_i32(mo.state.0 as i32);
    w.write_i32(mo.flags.bits() as i32);
    w.write_i32(mo.health);
    w.write_i32(mo.move_dir);
    w.write_i32(mo.move_count);
    w.write_i32(mo.reaction_time);
    w.write_i32(mo.threshold);
    w.write_i32(mo.player.map_or(0, |p| p as i32 + 1));
    w.write_i32(mo.last_look);

    for v in mo.spawn_spot.pos {
        w.write_fixed(v);
    }
    w.write_i32(mo.spawn_spot.angle as i32);
    w.write_i32(mo.spawn_spot.type_id);
    w.write_i32(mo.spawn_spot.flags);

    w.write_i32(mo.int_flags);
    w.write_fixed(mo.drop_off_z);
    w.write_i32(mo.gear);
    w.write_i32(mo.damage);
    w.write_i32(mo.flags2.bits() as i32);
    w.write_i32(mo.flags3.bits() as i32);
    w.write_u8(mo.translucency);
    w.write_u8((mo.vis_target + 1) as u8);
    w.write_fixed(mo.floor_clip);
    w.write_i32(mo.special1);
    w.write_i32(special2);
    w.write_i32(mo.special3);
    write_thing_id(w, last_enemy)?;
    write_thing_id(w, generator)?;
    Ok(())
}

/// Raw fields of one record before anything is resolved.
struct MobjFields {
    mo: Mobj,
    own: u32,
    refs: Vec<(RefField, u32)>,
    state_index: i32,
    player: i32,
}

fn read_fields(r: &mut SaveReader<'_>, version: u32, mut mo: Mobj) -> MobjFields {
    let mut refs = Vec::with_capacity(5);
    let mut own = 0;
    if version >= 2 {
        own = read_thing_id(r);
        refs.push((RefField::Target, read_thing_id(r)));
    }
    if version >= 5 {
        refs.push((RefField::Tracer, read_thing_id(r)));
        refs.push((RefField::OnMobj, read_thing_id(r)));
    }

    for v in &mut mo.pos {
        *v = r.read_fixed();
    }
    mo.angle = r.read_i32() as u32;
    mo.sprite = r.read_i32();
    mo.frame = r.read_i32() & !FRAME_FULLBRIGHT;
    mo.floor_z = r.read_fixed();
    mo.ceiling_z = r.read_fixed();
    mo.radius = r.read_fixed();
    mo.height = r.read_fixed();
    for v in &mut mo.mom {
        *v = r.read_fixed();
    }
    mo.valid = r.read_i32();
    mo.type_id = r.read_i32();
    mo.tics = r.read_i32();
    let state_index = r.read_i32();
    mo.flags = MobjFlags::from_bits_retain(r.read_i32() as u32);
    mo.health = r.read_i32();
    mo.move_dir = r.read_i32();
    mo.move_count = r.read_i32();
    mo.reaction_time = r.read_i32();
    mo.threshold = r.read_i32();
    let player = r.read_i32();
    mo.last_look = r.read_i32();

    mo.spawn_spot = if version >= 6 {
        let pos = [r.read_fixed(), r.read_fixed(), r.read_fixed()];
        SpawnSpot {
            pos,
            angle: r.read_i32() as u32,
            type_id: r.read_i32(),
            flags: r.read_i32(),
        }
    } else {
        let x = r.read_height();
        let y = r.read_height();
        let degrees = i32::from(r.read_i16());
        SpawnSpot {
            pos: [x, y, ONFLOORZ],
            angle: ANG45.wrapping_mul((degrees / 45) as u32),
            type_id: i32::from(r.read_i16()),
            flags: i32::from(r.read_i16()),
        }
    };

    if version >= 3 {
        mo.int_flags = r.read_i32();
        mo.drop_off_z = r.read_fixed();
        mo.gear = r.read_i32();
    }
    if version >= 6 {
        mo.damage = r.read_i32();
        mo.flags2 = MobjFlags2::from_bits_retain(r.read_i32() as u32);
    } else {
        mo.damage = DDMAXINT;
    }
    if version >= 7 {
        mo.flags3 = MobjFlags3::from_bits_retain(r.read_i32() as u32);
    }
    if version >= 4 {
        mo.translucency = r.read_u8();
    }
    if version >= 5 {
        mo.vis_target = i16::from(r.read_u8()) - 1;
        mo.floor_clip = r.read_fixed();
    }
    if version >= 8 {
        mo.special1 = r.read_i32();
        mo.special2 = r.read_i32();
        mo.special3 = r.read_i32();
        refs.push((RefField::LastEnemy, read_thing_id(r)));
        refs.push((RefField::Generator, read_thing_id(r)));
    }

    MobjFields {
        mo,
        own,
        refs,
        state_index,
        player,
    }
}

pub fn read_mobj(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError> {
    let version = u32::from(r.read_u8());
    if version > MOBJ_RECORD_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: MOBJ_RECORD_VERSION,
            found: version,
        });
    }
    if version < MIN_MOBJ_RECORD_VERSION {
        return Err(SaveError::UnsupportedVersion {
            what: "mobj record",
            found: version,
        });
    }

    // Fields old layouts leave out are filled from the type info by the
    // migration chain.
    let blank = Mobj::from_info(0, &MobjInfo::default(), [0.0; 3]);
    let MobjFields {
        mut mo,
        own,
        mut refs,
        state_index,
        player,
    } = read_fields(r, version, blank);

    let info = ctx
        .tables
        .infos
        .get(mo.type_id)
        .ok_or_else(|| SaveError::corrupt(format!("unknown mobj type {}", mo.type_id)))?;
    if info.special2_is_mobj && version >= 8 {
        refs.push((RefField::Special2, mo.special2 as u32));
        mo.special2 = 0;
    }
    mo.state = ctx.tables.states.resolve(state_index).ok_or_else(|| {
        SaveError::corrupt(format!("mobj state index {state_index} out of range"))
    })?;
    if version < 3 {
        mo.drop_off_z = mo.floor_z;
    }

    if player > 0 {
        let saved = (player - 1) as usize;
        match ctx.session.real_player(saved) {
            Some(real) => mo.player = Some(real),
            None => {
                debug!("Dropping body of saved player {saved}, who is not in this game");
                return Ok(ReadOutcome::Discarded { thing_id: own });
            }
        }
    }

    ctx.session.migrations().migrate(&mut mo, info, version)?;

    if !ctx.level.link_mobj(&mut mo) {
        return Err(SaveError::corrupt(format!(
            "mobj {own} at ({}, {}) lies outside every sector",
            mo.pos[0], mo.pos[1]
        )));
    }
    mo.update_dd_flags();

    Ok(ReadOutcome::Restored(Restored {
        kind: simulation::thinker::ThinkerKind::Mobj(Box::new(mo)),
        thing_id: own,
        refs,
        stasis: false,
    }))
}
