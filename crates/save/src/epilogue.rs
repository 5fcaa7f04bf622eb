// ---------------------------------------------------------------------------
// epilogue – game-specific sections after the thinker stream
// ---------------------------------------------------------------------------

use bevy::prelude::*;

use simulation::config::{MAXPLAYERS, MAX_ACS_MAP_VARS, MAX_ACS_WORLD_VARS};

use crate::archive_session::{ReadContext, WriteContext};
use crate::game_profile::EpilogueSection;
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::segments::{begin_segment, expect_segment, Segment};
use crate::thing_archive::{read_thing_id, write_thing_id};

/// Boss brain spawn targets: count, next target, target ids.
fn write_brain(w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    begin_segment(w, Segment::Brain);
    let level = ctx.level;
    let brain = &level.brain;
    let count = brain.targets.len().min(u8::MAX as usize);
    w.write_u8(count as u8);
    w.write_u8(brain.target_on);
    for &target in &brain.targets[..count] {
        let id = ctx.thing_id(Some(target))?;
        write_thing_id(w, id)?;
    }
    Ok(())
}

fn read_brain(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(), SaveError> {
    expect_segment(r, Segment::Brain)?;
    let count = r.read_u8();
    ctx.level.brain.target_on = r.read_u8();
    let mut targets = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let raw = read_thing_id(r);
        match ctx.session.things.resolve(raw)? {
            Some(target) => targets.push(target),
            None => debug!("Brain target {raw} did not survive the load"),
        }
    }
    ctx.level.brain.targets = targets;
    Ok(())
}

/// The last mobj to make noise in each sector.
fn write_sound_targets(w: &mut SaveWriter, ctx: &mut WriteContext<'_>) -> Result<(), SaveError> {
    begin_segment(w, Segment::SoundTargets);
    let level = ctx.level;
    let mut entries = Vec::new();
    for (index, sector) in level.map.sectors.iter().enumerate() {
        let id = ctx.thing_id(sector.sound_target)?;
        if id != 0 {
            entries.push((index, id));
        }
    }
    w.write_i32(entries.len() as i32);
    for (index, id) in entries {
        w.write_i32(index as i32);
        write_thing_id(w, id)?;
    }
    Ok(())
}

fn read_sound_targets(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(), SaveError> {
    expect_segment(r, Segment::SoundTargets)?;
    let count = r.read_i32();
    for _ in 0..count.max(0) {
        let index = ctx.sector_index(r.read_i32(), "sound target")?;
        let raw = read_thing_id(r);
        ctx.level.map.sectors[index].sound_target = ctx.session.things.resolve(raw)?;
        if r.overrun() {
            break;
        }
    }
    Ok(())
}

/// ACS script states and the map and world variables.
fn write_scripts(w: &mut SaveWriter, ctx: &WriteContext<'_>) {
    begin_segment(w, Segment::Scripts);
    let acs = &ctx.level.acs;
    w.write_i32(acs.scripts.len() as i32);
    for script in &acs.scripts {
        w.write_i16(script.state);
        w.write_i16(script.wait_value);
    }
    for &v in acs.map_vars.iter().chain(&acs.world_vars) {
        w.write_i32(v);
    }
}

fn read_scripts(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(), SaveError> {
    expect_segment(r, Segment::Scripts)?;
    let count = r.read_i32();
    let acs = &mut ctx.level.acs;
    if usize::try_from(count).ok() != Some(acs.scripts.len()) {
        return Err(SaveError::corrupt(format!(
            "save has {count} scripts but the map has {}",
            acs.scripts.len()
        )));
    }
    for script in &mut acs.scripts {
        script.state = r.read_i16();
        script.wait_value = r.read_i16();
    }
    for v in acs.map_vars.iter_mut().chain(acs.world_vars.iter_mut()) {
        *v = r.read_i32();
    }
    debug!(
        "Restored {} scripts, {} map and {} world variables",
        acs.scripts.len(),
        MAX_ACS_MAP_VARS,
        MAX_ACS_WORLD_VARS
    );
    Ok(())
}

fn write_misc(w: &mut SaveWriter, ctx: &WriteContext<'_>) {
    begin_segment(w, Segment::Misc);
    for &tics in &ctx.level.local_quakes {
        w.write_i32(tics);
    }
}

fn read_misc(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<(), SaveError> {
    expect_segment(r, Segment::Misc)?;
    let mut quakes = [0; MAXPLAYERS];
    for tics in &mut quakes {
        *tics = r.read_i32();
    }
    ctx.level.local_quakes = quakes;
    Ok(())
}

/// Writes the sections the game profile lists, in order.
pub fn write_epilogue(
    w: &mut SaveWriter,
    ctx: &mut WriteContext<'_>,
    sections: &[EpilogueSection],
) -> Result<(), SaveError> {
    for section in sections {
        match section {
            EpilogueSection::Brain => write_brain(w, ctx)?,
            EpilogueSection::SoundTargets => write_sound_targets(w, ctx)?,
            EpilogueSection::Scripts => write_scripts(w, ctx),
            EpilogueSection::Misc => write_misc(w, ctx),
        }
    }
    Ok(())
}

/// Reads the sections back. Thing ids resolve against slots bound by the
/// thinker stream, so this runs after it.
pub fn read_epilogue(
    r: &mut SaveReader<'_>,
    ctx: &mut ReadContext<'_>,
    sections: &[EpilogueSection],
) -> Result<(), SaveError> {
    for section in sections {
        match section {
            EpilogueSection::Brain => read_brain(r, ctx)?,
            EpilogueSection::SoundTargets => read_sound_targets(r, ctx)?,
            EpilogueSection::Scripts => read_scripts(r, ctx)?,
            EpilogueSection::Misc => read_misc(r, ctx)?,
        }
    }
    Ok(())
}
