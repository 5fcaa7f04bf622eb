// ---------------------------------------------------------------------------
// world_archive – map header, sectors, lines and polyobjects
// ---------------------------------------------------------------------------
//
// Only the state the playsim changes is archived; static geometry comes from
// the base map the save is loaded onto. Sector and line records begin with a
// shape byte naming the record family, then the record version.

use bevy::prelude::*;

use simulation::config::MAXPLAYERS;
use simulation::map::{Line, Map, Sector, Side, Surface};
use simulation::materials::MaterialGroup;
use simulation::Level;

use crate::archive_session::{ReadContext, WriteContext};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::save_version::{read_record_version, SaveVersion};
use crate::segments::{begin_segment, expect_segment, Segment};

const SECTOR_VERSION: u8 = 3;
const LINE_VERSION: u8 = 3;
const POLYOBJ_VERSION: u8 = 1;

/// Line flag that meant "seen on the automap" before per-player mapping.
const LEGACY_MAPPED_FLAG: i16 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum SectorShape {
    Normal = 0,
    PlaneOffsets = 1,
    Generalized = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum LineShape {
    Normal = 0,
    Generalized = 1,
}

// ---------------------------------------------------------------------------
// Map header
// ---------------------------------------------------------------------------

pub fn write_map_header(w: &mut SaveWriter, level: &Level, map_time: i32) {
    begin_segment(w, Segment::MapHeader2);
    w.write_u8(SaveVersion::CURRENT.0 as u8);
    w.write_i32(map_time);
    let map = &level.map;
    w.write_i32(map.sectors.len() as i32);
    w.write_i32(map.lines.len() as i32);
    w.write_i32(map.polyobjs.len() as i32);
}

/// Checks the header against the map being loaded and returns the map time.
pub fn read_map_header(r: &mut SaveReader<'_>, version: SaveVersion, map: &Map) -> Result<i32, SaveError> {
    expect_segment(r, Segment::MapHeader2)?;
    let map_version = u32::from(r.read_u8());
    if map_version != version.0 {
        return Err(SaveError::corrupt(format!(
            "map header version {map_version} disagrees with save version {}",
            version.0
        )));
    }
    let map_time = r.read_i32();
    if version.has_map_counts() {
        let expected = [
            ("sector", map.sectors.len()),
            ("line", map.lines.len()),
            ("polyobj", map.polyobjs.len()),
        ];
        for (what, count) in expected {
            let stored = r.read_i32();
            if usize::try_from(stored).ok() != Some(count) {
                return Err(SaveError::corrupt(format!(
                    "save has {stored} {what}s but the map has {count}"
                )));
            }
        }
    }
    Ok(map_time)
}

// ---------------------------------------------------------------------------
// Sectors
// ---------------------------------------------------------------------------

fn write_rgb(w: &mut SaveWriter, rgb: &[f32]) {
    for &c in rgb {
        w.write_unit_u8(c);
    }
}

fn read_rgb<const N: usize>(r: &mut SaveReader<'_>, out: &mut [f32; N]) {
    for c in out.iter_mut() {
        *c = r.read_unit_u8();
    }
}

fn write_sector(w: &mut SaveWriter, sec: &Sector, ctx: &WriteContext<'_>) {
    let flat = |m| {
        ctx.session
            .materials
            .index_of(ctx.tables.materials, m, MaterialGroup::Flats) as i16
    };
    let shape = if sec.floor.has_offset() || sec.ceiling.has_offset() {
        SectorShape::PlaneOffsets
    } else {
        SectorShape::Normal
    };
    w.write_u8(shape as u8);
    w.write_u8(SECTOR_VERSION);
    w.write_height(sec.floor.height);
    w.write_height(sec.ceiling.height);
    w.write_i16(flat(sec.floor.material));
    w.write_i16(flat(sec.ceiling.material));
    w.write_i16(sec.floor.flags as i16);
    w.write_i16(sec.ceiling.flags as i16);
    w.write_unit_u8(sec.light_level);
    write_rgb(w, &sec.color);
    write_rgb(w, &sec.floor.color);
    write_rgb(w, &sec.ceiling.color);
    w.write_i16(sec.special);
    w.write_i16(sec.tag);
    if shape == SectorShape::PlaneOffsets {
        for v in sec.floor.offset.iter().chain(&sec.ceiling.offset) {
            w.write_f32(*v);
        }
    }
}

fn read_sector(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>, index: usize) -> Result<(), SaveError> {
    let shape = match r.read_u8() {
        0 => SectorShape::Normal,
        1 => SectorShape::PlaneOffsets,
        2 => SectorShape::Generalized,
        n => return Err(SaveError::corrupt(format!("sector {index}: unknown record shape {n}"))),
    };
    if shape == SectorShape::Generalized {
        return Err(SaveError::Unsupported(format!(
            "sector {index} carries extended generalized data"
        )));
    }
    let version = read_record_version(r, "sector record", SECTOR_VERSION)?;

    let registry = ctx.tables.materials;
    let materials = &ctx.session.materials;
    let sec = &mut ctx.level.map.sectors[index];
    sec.floor.height = r.read_height();
    sec.ceiling.height = r.read_height();
    sec.floor.material = materials.resolve(registry, r.read_i16(), MaterialGroup::Flats);
    sec.ceiling.material = materials.resolve(registry, r.read_i16(), MaterialGroup::Flats);
    if version >= 3 {
        sec.floor.flags = i32::from(r.read_i16());
        sec.ceiling.flags = i32::from(r.read_i16());
    }
    sec.light_level = r.read_unit_u8();
    read_rgb(r, &mut sec.color);
    if version >= 2 {
        read_rgb(r, &mut sec.floor.color);
        read_rgb(r, &mut sec.ceiling.color);
    }
    sec.special = r.read_i16();
    // The tag comes from the map.
    r.read_i16();
    if shape == SectorShape::PlaneOffsets {
        for v in sec.floor.offset.iter_mut().chain(sec.ceiling.offset.iter_mut()) {
            *v = r.read_f32();
        }
    }
    sec.special_data = None;
    sec.sound_target = None;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lines and sides
// ---------------------------------------------------------------------------

fn write_side(w: &mut SaveWriter, side: &Side, ctx: &WriteContext<'_>) {
    let tex = |s: &Surface| {
        ctx.session
            .materials
            .index_of(ctx.tables.materials, s.material, MaterialGroup::Textures) as i16
    };
    for surface in [&side.top, &side.middle, &side.bottom] {
        w.write_height(surface.offset[0]);
        w.write_height(surface.offset[1]);
    }
    for surface in [&side.top, &side.middle, &side.bottom] {
        w.write_i16(surface.flags as i16);
    }
    w.write_i16(tex(&side.top));
    w.write_i16(tex(&side.bottom));
    w.write_i16(tex(&side.middle));
    write_rgb(w, &side.top.color[..3]);
    write_rgb(w, &side.bottom.color[..3]);
    write_rgb(w, &side.middle.color);
    w.write_i32(side.blend_mode);
    w.write_i16(side.flags);
}

fn write_line(w: &mut SaveWriter, line: &Line, ctx: &WriteContext<'_>) {
    w.write_u8(LineShape::Normal as u8);
    w.write_u8(LINE_VERSION);
    w.write_i16(line.flags);
    for mapped in line.mapped {
        w.write_bool(mapped);
    }
    w.write_i16(line.special);
    w.write_i16(line.tag);
    for side in line.sides() {
        write_side(w, &ctx.level.map.sides[side], ctx);
    }
}

fn read_side(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>, index: usize, version: u8) {
    let registry = ctx.tables.materials;
    let materials = &ctx.session.materials;
    let side = &mut ctx.level.map.sides[index];
    if version >= 2 {
        for surface in [&mut side.top, &mut side.middle, &mut side.bottom] {
            surface.offset = [r.read_height(), r.read_height()];
        }
    } else {
        let offset = [r.read_height(), r.read_height()];
        for surface in [&mut side.top, &mut side.middle, &mut side.bottom] {
            surface.offset = offset;
        }
    }
    if version >= 3 {
        for surface in [&mut side.top, &mut side.middle, &mut side.bottom] {
            surface.flags = i32::from(r.read_i16());
        }
    }
    side.top.material = materials.resolve(registry, r.read_i16(), MaterialGroup::Textures);
    side.bottom.material = materials.resolve(registry, r.read_i16(), MaterialGroup::Textures);
    side.middle.material = materials.resolve(registry, r.read_i16(), MaterialGroup::Textures);
    if version >= 2 {
        let mut rgb = [0.0; 3];
        read_rgb(r, &mut rgb);
        side.top.color = [rgb[0], rgb[1], rgb[2], 1.0];
        read_rgb(r, &mut rgb);
        side.bottom.color = [rgb[0], rgb[1], rgb[2], 1.0];
        read_rgb(r, &mut side.middle.color);
        side.blend_mode = r.read_i32();
        side.flags = r.read_i16();
    }
}

fn read_line(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>, index: usize) -> Result<(), SaveError> {
    let shape = match r.read_u8() {
        0 => LineShape::Normal,
        1 => LineShape::Generalized,
        n => return Err(SaveError::corrupt(format!("line {index}: unknown record shape {n}"))),
    };
    if shape == LineShape::Generalized {
        return Err(SaveError::Unsupported(format!(
            "line {index} carries extended generalized data"
        )));
    }
    let version = read_record_version(r, "line record", LINE_VERSION)?;

    let line = &mut ctx.level.map.lines[index];
    line.flags = r.read_i16();
    if version >= 3 {
        for mapped in &mut line.mapped {
            *mapped = r.read_bool();
        }
    } else if line.flags & LEGACY_MAPPED_FLAG != 0 {
        line.flags &= !LEGACY_MAPPED_FLAG;
        line.mapped = [true; MAXPLAYERS];
    }
    line.special = r.read_i16();
    r.read_i16();

    let sides: Vec<usize> = line.sides().collect();
    for side in sides {
        read_side(r, ctx, side, version);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Polyobjects
// ---------------------------------------------------------------------------

fn write_polyobjs(w: &mut SaveWriter, map: &Map) {
    begin_segment(w, Segment::Polyobjs);
    w.write_i32(map.polyobjs.len() as i32);
    for po in &map.polyobjs {
        w.write_u8(POLYOBJ_VERSION);
        w.write_i32(po.tag);
        w.write_i32(po.angle as i32);
        w.write_fixed(po.pos[0]);
        w.write_fixed(po.pos[1]);
    }
}

fn read_polyobjs(r: &mut SaveReader<'_>, map: &mut Map) -> Result<(), SaveError> {
    expect_segment(r, Segment::Polyobjs)?;
    let count = r.read_i32();
    if usize::try_from(count).ok() != Some(map.polyobjs.len()) {
        return Err(SaveError::corrupt(format!(
            "bad polyobj count {count} (map has {})",
            map.polyobjs.len()
        )));
    }
    for _ in 0..count {
        read_record_version(r, "polyobj record", POLYOBJ_VERSION)?;
        let tag = r.read_i32();
        let index = map
            .polyobj_by_tag(tag)
            .ok_or_else(|| SaveError::corrupt(format!("unknown polyobj tag {tag}")))?;
        let angle = r.read_i32() as u32;
        let pos = [r.read_fixed(), r.read_fixed()];
        let po = &mut map.polyobjs[index];
        po.angle = angle;
        po.dest_angle = angle;
        po.pos = pos;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// World segment
// ---------------------------------------------------------------------------

pub fn write_world(w: &mut SaveWriter, ctx: &WriteContext<'_>, has_polyobjs: bool) {
    begin_segment(w, Segment::World);
    let map = &ctx.level.map;
    for sec in &map.sectors {
        write_sector(w, sec, ctx);
    }
    for line in &map.lines {
        write_line(w, line, ctx);
    }
    if has_polyobjs {
        write_polyobjs(w, map);
    }
}

pub fn read_world(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>, has_polyobjs: bool) -> Result<(), SaveError> {
    expect_segment(r, Segment::World)?;
    for index in 0..ctx.level.map.sectors.len() {
        read_sector(r, ctx, index)?;
    }
    for index in 0..ctx.level.map.lines.len() {
        read_line(r, ctx, index)?;
    }
    if has_polyobjs {
        read_polyobjs(r, &mut ctx.level.map)?;
    }
    debug!(
        "Restored {} sectors and {} lines",
        ctx.level.map.sectors.len(),
        ctx.level.map.lines.len()
    );
    Ok(())
}
