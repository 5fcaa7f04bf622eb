// ---------------------------------------------------------------------------
// special_records – sector movers and light effects
// ---------------------------------------------------------------------------
//
// One writer/reader pair per record. Every reader validates its sector index
// against the map being loaded; claiming the sector's special-data slot is
// left to the thinker stream, which owns the thinker list.

use bevy::prelude::*;

use simulation::materials::MaterialGroup;
use simulation::specials::{
    Ceiling, CeilingState, Door, Flicker, FloorMover, Glow, LightFlash, Plat, Strobe,
};

use crate::archive_session::{ReadContext, WriteContext};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::save_version::read_record_version;

const CEILING_VERSION: u8 = 2;
const DOOR_VERSION: u8 = 1;
const FLOOR_VERSION: u8 = 4;
const PLAT_VERSION: u8 = 1;
const LIGHT_VERSION: u8 = 1;

/// Version 5 saves stored "still moving" inside ceiling and plat records
/// instead of a stasis byte on the class tag.
fn read_legacy_active(r: &mut SaveReader<'_>, ctx: &ReadContext<'_>) -> bool {
    if ctx.session.version.has_stasis_byte() {
        false
    } else {
        r.read_u8() == 0
    }
}

fn read_sector(r: &mut SaveReader<'_>, ctx: &ReadContext<'_>, what: &str) -> Result<usize, SaveError> {
    ctx.sector_index(r.read_i32(), what)
}

// ---------------------------------------------------------------------------
// Ceiling
// ---------------------------------------------------------------------------

pub fn write_ceiling(c: &Ceiling, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(CEILING_VERSION);
    w.write_u8(c.kind);
    w.write_i32(c.sector as i32);
    w.write_height(c.bottom_height);
    w.write_height(c.top_height);
    w.write_fixed(c.speed);
    w.write_bool(c.crush);
    w.write_u8(c.state as u8);
    w.write_i32(c.tag);
    w.write_u8(c.old_state as u8);
    Ok(())
}

/// Returns the ceiling and whether it was in stasis.
pub fn read_ceiling(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(Ceiling, bool), SaveError> {
    let version = read_record_version(r, "ceiling record", CEILING_VERSION)?;
    let stasis = read_legacy_active(r, ctx);
    let kind = r.read_u8();
    let sector = read_sector(r, ctx, "ceiling")?;
    let bottom_height = r.read_height();
    let top_height = r.read_height();
    let speed = r.read_fixed();
    let crush = r.read_bool();
    let (state, tag, old_state) = if version >= 2 {
        let state = CeilingState::from_u8(r.read_u8());
        let tag = r.read_i32();
        (state, tag, CeilingState::from_u8(r.read_u8()))
    } else {
        let direction = |v: i32| {
            if v == -1 {
                CeilingState::Down
            } else {
                CeilingState::Up
            }
        };
        let state = direction(r.read_i32());
        let tag = r.read_i32();
        (state, tag, direction(r.read_i32()))
    };
    Ok((
        Ceiling {
            kind,
            sector,
            bottom_height,
            top_height,
            speed,
            crush,
            state,
            old_state,
            tag,
        },
        stasis,
    ))
}

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

pub fn write_door(d: &Door, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(DOOR_VERSION);
    w.write_u8(d.kind);
    w.write_i32(d.sector as i32);
    w.write_height(d.top_height);
    w.write_fixed(d.speed);
    w.write_i32(d.state);
    w.write_i32(d.top_wait);
    w.write_i32(d.top_countdown);
    Ok(())
}

pub fn read_door(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Door, SaveError> {
    read_record_version(r, "door record", DOOR_VERSION)?;
    Ok(Door {
        kind: r.read_u8(),
        sector: read_sector(r, ctx, "door")?,
        top_height: r.read_height(),
        speed: r.read_fixed(),
        state: r.read_i32(),
        top_wait: r.read_i32(),
        top_countdown: r.read_i32(),
    })
}

// ---------------------------------------------------------------------------
// Floor
// ---------------------------------------------------------------------------

pub fn write_floor(f: &FloorMover, w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    let material = ctx
        .session
        .materials
        .index_of(ctx.tables.materials, f.material, MaterialGroup::Flats);
    w.write_u8(FLOOR_VERSION);
    w.write_u8(f.kind);
    w.write_i32(f.sector as i32);
    w.write_bool(f.crush);
    w.write_i32(f.state);
    w.write_i32(f.new_special);
    w.write_i16(material as i16);
    w.write_height(f.dest_height);
    w.write_fixed(f.speed);
    w.write_i32(f.delay_count);
    w.write_i32(f.delay_total);
    w.write_fixed(f.stair_delay_height);
    w.write_fixed(f.stair_delay_delta);
    w.write_fixed(f.reset_height);
    w.write_i16(f.reset_delay);
    w.write_i16(f.reset_delay_count);
    Ok(())
}

pub fn read_floor(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<FloorMover, SaveError> {
    let version = read_record_version(r, "floor record", FLOOR_VERSION)?;
    let kind = r.read_u8();
    let sector = read_sector(r, ctx, "floor")?;
    let crush = r.read_bool();
    let state = r.read_i32();
    let new_special = r.read_i32();
    let raw_material = r.read_i16();
    let material = if version >= 2 {
        ctx.session
            .materials
            .resolve(ctx.tables.materials, raw_material, MaterialGroup::Flats)
    } else {
        warn!("Floor mover in sector {sector} keeps a pre-archive flat number {raw_material}; cleared");
        None
    };
    let dest_height = r.read_height();
    let speed = r.read_fixed();

    let mut floor = FloorMover {
        crush,
        state,
        new_special,
        material,
        ..FloorMover::new(kind, sector, dest_height, speed)
    };
    if version >= 4 {
        floor.delay_count = r.read_i32();
        floor.delay_total = r.read_i32();
        floor.stair_delay_height = r.read_fixed();
        floor.stair_delay_delta = r.read_fixed();
        floor.reset_height = r.read_fixed();
        floor.reset_delay = r.read_i16();
        floor.reset_delay_count = r.read_i16();
    }
    Ok(floor)
}

// ---------------------------------------------------------------------------
// Plat
// ---------------------------------------------------------------------------

pub fn write_plat(p: &Plat, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(PLAT_VERSION);
    w.write_u8(p.kind);
    w.write_i32(p.sector as i32);
    w.write_fixed(p.speed);
    w.write_height(p.low);
    w.write_height(p.high);
    w.write_i32(p.wait);
    w.write_i32(p.count);
    w.write_u8(p.state);
    w.write_u8(p.old_state);
    w.write_bool(p.crush);
    w.write_i32(p.tag);
    Ok(())
}

/// Returns the plat and whether it was in stasis.
pub fn read_plat(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(Plat, bool), SaveError> {
    read_record_version(r, "plat record", PLAT_VERSION)?;
    let stasis = read_legacy_active(r, ctx);
    let plat = Plat {
        kind: r.read_u8(),
        sector: read_sector(r, ctx, "plat")?,
        speed: r.read_fixed(),
        low: r.read_height(),
        high: r.read_height(),
        wait: r.read_i32(),
        count: r.read_i32(),
        state: r.read_u8(),
        old_state: r.read_u8(),
        crush: r.read_bool(),
        tag: r.read_i32(),
    };
    Ok((plat, stasis))
}

// ---------------------------------------------------------------------------
// Lights
// ---------------------------------------------------------------------------

/// Shared by the flash and blink classes.
pub fn write_light_flash(l: &LightFlash, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(LIGHT_VERSION);
    w.write_i32(l.sector as i32);
    w.write_i32(l.count);
    w.write_unit_i32(l.max_light);
    w.write_unit_i32(l.min_light);
    w.write_i32(l.max_time);
    w.write_i32(l.min_time);
    Ok(())
}

pub fn read_light_flash(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<LightFlash, SaveError> {
    read_record_version(r, "light flash record", LIGHT_VERSION)?;
    Ok(LightFlash {
        sector: read_sector(r, ctx, "light flash")?,
        count: r.read_i32(),
        max_light: r.read_unit_i32(),
        min_light: r.read_unit_i32(),
        max_time: r.read_i32(),
        min_time: r.read_i32(),
    })
}

pub fn write_strobe(s: &Strobe, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(LIGHT_VERSION);
    w.write_i32(s.sector as i32);
    w.write_i32(s.count);
    w.write_unit_i32(s.max_light);
    w.write_unit_i32(s.min_light);
    w.write_i32(s.dark_time);
    w.write_i32(s.bright_time);
    Ok(())
}

pub fn read_strobe(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Strobe, SaveError> {
    read_record_version(r, "strobe record", LIGHT_VERSION)?;
    Ok(Strobe {
        sector: read_sector(r, ctx, "strobe")?,
        count: r.read_i32(),
        max_light: r.read_unit_i32(),
        min_light: r.read_unit_i32(),
        dark_time: r.read_i32(),
        bright_time: r.read_i32(),
    })
}

pub fn write_glow(g: &Glow, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(LIGHT_VERSION);
    w.write_i32(g.sector as i32);
    w.write_unit_i32(g.max_light);
    w.write_unit_i32(g.min_light);
    w.write_i32(g.direction);
    Ok(())
}

pub fn read_glow(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Glow, SaveError> {
    read_record_version(r, "glow record", LIGHT_VERSION)?;
    Ok(Glow {
        sector: read_sector(r, ctx, "glow")?,
        max_light: r.read_unit_i32(),
        min_light: r.read_unit_i32(),
        direction: r.read_i32(),
    })
}

pub fn write_flicker(f: &Flicker, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(LIGHT_VERSION);
    w.write_i32(f.sector as i32);
    w.write_unit_i32(f.max_light);
    w.write_unit_i32(f.min_light);
    Ok(())
}

pub fn read_flicker(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Flicker, SaveError> {
    read_record_version(r, "flicker record", LIGHT_VERSION)?;
    Ok(Flicker {
        sector: read_sector(r, ctx, "flicker")?,
        max_light: r.read_unit_i32(),
        min_light: r.read_unit_i32(),
    })
}
