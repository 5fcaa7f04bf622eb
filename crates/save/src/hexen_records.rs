// ---------------------------------------------------------------------------
// hexen_records – Hexen lights, pillars, waggles, polyobject movers, scripts
// ---------------------------------------------------------------------------

use simulation::config::{ACS_STACK_DEPTH, MAX_ACS_SCRIPT_VARS};
use simulation::specials::{AcsScript, FloorWaggle, HexenLight, Phase, Pillar, PolyDoor, PolyEvent};

use crate::archive_session::{ReadContext, WriteContext};
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::save_version::read_record_version;

const RECORD_VERSION: u8 = 1;

fn read_sector(r: &mut SaveReader<'_>, ctx: &ReadContext<'_>, what: &str) -> Result<usize, SaveError> {
    ctx.sector_index(r.read_i32(), what)
}

fn read_polyobj(r: &mut SaveReader<'_>, ctx: &ReadContext<'_>, what: &str) -> Result<i32, SaveError> {
    let tag = r.read_i32();
    if ctx.level.map.polyobj_by_tag(tag).is_none() {
        return Err(SaveError::corrupt(format!("{what}: unknown polyobj tag {tag}")));
    }
    Ok(tag)
}

pub fn write_light(l: &HexenLight, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_u8(l.kind);
    w.write_i32(l.sector as i32);
    w.write_unit_i32(l.value1);
    w.write_unit_i32(l.value2);
    w.write_i32(l.tics1);
    w.write_i32(l.tics2);
    w.write_i32(l.count);
    Ok(())
}

pub fn read_light(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<HexenLight, SaveError> {
    read_record_version(r, "light record", RECORD_VERSION)?;
    Ok(HexenLight {
        kind: r.read_u8(),
        sector: read_sector(r, ctx, "light")?,
        value1: r.read_unit_i32(),
        value2: r.read_unit_i32(),
        tics1: r.read_i32(),
        tics2: r.read_i32(),
        count: r.read_i32(),
    })
}

pub fn write_phase(p: &Phase, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_i32(p.sector as i32);
    w.write_i32(p.index);
    w.write_unit_i32(p.base_value);
    Ok(())
}

pub fn read_phase(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Phase, SaveError> {
    read_record_version(r, "phase record", RECORD_VERSION)?;
    Ok(Phase {
        sector: read_sector(r, ctx, "phase")?,
        index: r.read_i32(),
        base_value: r.read_unit_i32(),
    })
}

pub fn write_pillar(p: &Pillar, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_i32(p.sector as i32);
    w.write_fixed(p.ceiling_speed);
    w.write_fixed(p.floor_speed);
    w.write_fixed(p.floor_dest);
    w.write_fixed(p.ceiling_dest);
    w.write_i32(p.direction);
    w.write_i32(p.crush);
    Ok(())
}

pub fn read_pillar(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<Pillar, SaveError> {
    read_record_version(r, "pillar record", RECORD_VERSION)?;
    Ok(Pillar {
        sector: read_sector(r, ctx, "pillar")?,
        ceiling_speed: r.read_fixed(),
        floor_speed: r.read_fixed(),
        floor_dest: r.read_fixed(),
        ceiling_dest: r.read_fixed(),
        direction: r.read_i32(),
        crush: r.read_i32(),
    })
}

pub fn write_floor_waggle(f: &FloorWaggle, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_i32(f.sector as i32);
    w.write_fixed(f.original_height);
    w.write_fixed(f.accumulator);
    w.write_fixed(f.acc_delta);
    w.write_fixed(f.target_scale);
    w.write_fixed(f.scale);
    w.write_fixed(f.scale_delta);
    w.write_i32(f.ticker);
    w.write_i32(f.state);
    Ok(())
}

pub fn read_floor_waggle(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<FloorWaggle, SaveError> {
    read_record_version(r, "floor waggle record", RECORD_VERSION)?;
    Ok(FloorWaggle {
        sector: read_sector(r, ctx, "floor waggle")?,
        original_height: r.read_fixed(),
        accumulator: r.read_fixed(),
        acc_delta: r.read_fixed(),
        target_scale: r.read_fixed(),
        scale: r.read_fixed(),
        scale_delta: r.read_fixed(),
        ticker: r.read_i32(),
        state: r.read_i32(),
    })
}

/// Shared by the rotate and move classes.
pub fn write_poly_event(p: &PolyEvent, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_i32(p.polyobj);
    w.write_i32(p.int_speed);
    w.write_i32(p.dist);
    w.write_i32(p.fangle);
    w.write_fixed(p.speed[0]);
    w.write_fixed(p.speed[1]);
    Ok(())
}

pub fn read_poly_event(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<PolyEvent, SaveError> {
    read_record_version(r, "polyobj mover record", RECORD_VERSION)?;
    Ok(PolyEvent {
        polyobj: read_polyobj(r, ctx, "polyobj mover")?,
        int_speed: r.read_i32(),
        dist: r.read_i32(),
        fangle: r.read_i32(),
        speed: [r.read_fixed(), r.read_fixed()],
    })
}

pub fn write_poly_door(d: &PolyDoor, w: &mut SaveWriter, _ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    w.write_u8(RECORD_VERSION);
    w.write_u8(d.kind);
    w.write_i32(d.polyobj);
    w.write_i32(d.int_speed);
    w.write_i32(d.dist);
    w.write_i32(d.total_dist);
    w.write_i32(d.direction);
    w.write_fixed(d.speed[0]);
    w.write_fixed(d.speed[1]);
    w.write_i32(d.tics);
    w.write_i32(d.wait_tics);
    w.write_bool(d.close);
    Ok(())
}

pub fn read_poly_door(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<PolyDoor, SaveError> {
    read_record_version(r, "polyobj door record", RECORD_VERSION)?;
    Ok(PolyDoor {
        kind: r.read_u8(),
        polyobj: read_polyobj(r, ctx, "polyobj door")?,
        int_speed: r.read_i32(),
        dist: r.read_i32(),
        total_dist: r.read_i32(),
        direction: r.read_i32(),
        speed: [r.read_fixed(), r.read_fixed()],
        tics: r.read_i32(),
        wait_tics: r.read_i32(),
        close: r.read_bool(),
    })
}

pub fn write_script(s: &AcsScript, w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    let activator = ctx.thing_id(s.activator)?;
    w.write_u8(RECORD_VERSION);
    w.write_i32(activator as i32);
    w.write_i32(s.line.map_or(-1, |l| l as i32));
    w.write_i32(s.side);
    w.write_i32(s.number);
    w.write_i32(s.info_index);
    w.write_i32(s.delay_count);
    for v in s.stack {
        w.write_i32(v);
    }
    w.write_i32(s.stack_ptr);
    for v in s.vars {
        w.write_i32(v);
    }
    w.write_i32(s.ip);
    Ok(())
}

/// Returns the script and the raw thing id of its activator.
pub fn read_script(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(AcsScript, u32), SaveError> {
    read_record_version(r, "script record", RECORD_VERSION)?;
    let activator = r.read_i32().max(0) as u32;
    let raw_line = r.read_i32();
    let line = match raw_line {
        -1 => None,
        n => Some(
            usize::try_from(n)
                .ok()
                .filter(|&i| i < ctx.level.map.lines.len())
                .ok_or_else(|| SaveError::corrupt(format!("script: bad line number {n}")))?,
        ),
    };
    let mut script = AcsScript::new(0, 0, 0);
    script.line = line;
    script.side = r.read_i32();
    script.number = r.read_i32();
    script.info_index = r.read_i32();
    script.delay_count = r.read_i32();
    let mut stack = [0; ACS_STACK_DEPTH];
    for v in &mut stack {
        *v = r.read_i32();
    }
    script.stack = stack;
    script.stack_ptr = r.read_i32();
    let mut vars = [0; MAX_ACS_SCRIPT_VARS];
    for v in &mut vars {
        *v = r.read_i32();
    }
    script.vars = vars;
    script.ip = r.read_i32();
    Ok((script, activator))
}
