// ---------------------------------------------------------------------------
// player_archive – player header, player records and slot reconciliation
// ---------------------------------------------------------------------------
//
// Array lengths vary by game and engine version, so the header records the
// counts the writer used and the reader walks every array with those stored
// counts, keeping what fits the running layout.

use bevy::prelude::*;

use simulation::config::MAXPLAYERS;
use simulation::mobj::{StateId, StateTable};
use simulation::player::{
    AmmoSlot, InventorySlot, PSprite, Player, PlayerFixup, PlayerLayout, PlayerState,
    WEAPON_NO_CHANGE,
};
use simulation::Players;

use crate::archive_session::ReadContext;
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::save_version::read_record_version;
use crate::segments::{begin_segment, expect_segment, Segment};

const PLAYER_HEADER_VERSION: u8 = 2;
const PLAYER_RECORD_VERSION: u8 = 6;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

pub fn write_player_header(w: &mut SaveWriter, layout: &PlayerLayout) {
    begin_segment(w, Segment::PlayerHeader);
    w.write_u8(PLAYER_HEADER_VERSION);
    for count in [
        layout.powers,
        layout.keys,
        layout.frags,
        layout.weapons,
        layout.ammo_types,
        layout.psprites,
        layout.inventory_slots,
        layout.armor_types,
    ] {
        w.write_i32(count as i32);
    }
}

/// Returns the array counts the player records were written with.
pub fn read_player_header(r: &mut SaveReader<'_>) -> Result<PlayerLayout, SaveError> {
    expect_segment(r, Segment::PlayerHeader)?;
    read_record_version(r, "player header", PLAYER_HEADER_VERSION)?;
    let mut counts = [0usize; 8];
    for count in &mut counts {
        let raw = r.read_i32();
        *count = usize::try_from(raw)
            .ok()
            .filter(|&c| c <= 256)
            .ok_or_else(|| SaveError::corrupt(format!("bad player array count {raw}")))?;
    }
    let [powers, keys, frags, weapons, ammo_types, psprites, inventory_slots, armor_types] = counts;
    Ok(PlayerLayout {
        powers,
        keys,
        frags,
        weapons,
        ammo_types,
        psprites,
        inventory_slots,
        armor_types,
    })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

fn write_player(w: &mut SaveWriter, p: &Player) {
    w.write_u8(PLAYER_RECORD_VERSION);
    w.write_i32(p.state as i32);
    w.write_fixed(p.view_z);
    w.write_fixed(p.view_height);
    w.write_fixed(p.view_height_delta);
    w.write_f32(p.look_dir);
    w.write_fixed(p.bob);
    w.write_i32(p.fly_height);
    w.write_i32(p.health);
    for &points in &p.armor_points {
        w.write_i32(points);
    }
    w.write_i32(p.armor_type);
    for slot in &p.inventory {
        w.write_i32(slot.kind);
        w.write_i32(slot.count);
    }
    w.write_i32(p.ready_artifact);
    for &power in &p.powers {
        w.write_i32(power);
    }
    for &key in &p.keys {
        w.write_i32(i32::from(key));
    }
    w.write_i32(i32::from(p.backpack));
    for &frags in &p.frags {
        w.write_i32(frags);
    }
    w.write_i32(p.ready_weapon);
    w.write_i32(p.pending_weapon);
    for &owned in &p.weapons {
        w.write_i32(i32::from(owned));
    }
    for ammo in &p.ammo {
        w.write_i32(ammo.owned);
        w.write_i32(ammo.max);
    }
    for v in [
        i32::from(p.attack_down),
        i32::from(p.use_down),
        p.cheats,
        p.refire,
        p.kill_count,
        p.item_count,
        p.secret_count,
        p.damage_count,
        p.bonus_count,
        p.extra_light,
        p.fixed_color_map,
        p.color_map,
    ] {
        w.write_i32(v);
    }
    for psp in &p.psprites {
        w.write_i32(psp.state.map_or(-1, |s| s.0 as i32));
        w.write_i32(psp.tics);
        w.write_fixed(psp.pos[0]);
        w.write_fixed(psp.pos[1]);
    }
    w.write_i32(i32::from(p.did_secret));
    w.write_i32(p.air_counter);
}

/// Reads `stored` values into `out`; values past its end are dropped and
/// slots past `stored` keep what they held.
fn read_array<T>(
    r: &mut SaveReader<'_>,
    stored: usize,
    out: &mut [T],
    mut read: impl FnMut(&mut SaveReader<'_>) -> T,
) {
    for i in 0..stored {
        let value = read(r);
        if let Some(slot) = out.get_mut(i) {
            *slot = value;
        }
    }
}

fn read_psprite_state(index: i32, states: &StateTable) -> Option<StateId> {
    if index < 0 {
        return None;
    }
    let state = states.resolve(index);
    if state.is_none() {
        warn!("Weapon sprite state {index} out of range; cleared");
    }
    state
}

fn read_player(
    r: &mut SaveReader<'_>,
    p: &mut Player,
    stored: &PlayerLayout,
    states: &StateTable,
) -> Result<(), SaveError> {
    let version = read_record_version(r, "player record", PLAYER_RECORD_VERSION)?;
    let raw_state = r.read_i32();
    p.state = PlayerState::from_i32(raw_state)
        .ok_or_else(|| SaveError::corrupt(format!("bad player state {raw_state}")))?;
    p.view_z = r.read_fixed();
    p.view_height = r.read_fixed();
    p.view_height_delta = r.read_fixed();
    p.look_dir = r.read_f32();
    p.bob = r.read_fixed();
    p.fly_height = r.read_i32();
    p.health = r.read_i32();
    read_array(r, stored.armor_types, &mut p.armor_points, |r| r.read_i32());
    p.armor_type = r.read_i32();
    read_array(r, stored.inventory_slots, &mut p.inventory, |r| InventorySlot {
        kind: r.read_i32(),
        count: r.read_i32(),
    });
    p.ready_artifact = r.read_i32();
    read_array(r, stored.powers, &mut p.powers, |r| r.read_i32());
    read_array(r, stored.keys, &mut p.keys, |r| r.read_i32() != 0);
    p.backpack = r.read_i32() != 0;
    read_array(r, stored.frags, &mut p.frags, |r| r.read_i32());
    p.ready_weapon = r.read_i32();
    p.pending_weapon = if version >= 5 {
        r.read_i32()
    } else {
        WEAPON_NO_CHANGE
    };
    read_array(r, stored.weapons, &mut p.weapons, |r| r.read_i32() != 0);
    read_array(r, stored.ammo_types, &mut p.ammo, |r| AmmoSlot {
        owned: r.read_i32(),
        max: r.read_i32(),
    });
    p.attack_down = r.read_i32() != 0;
    p.use_down = r.read_i32() != 0;
    p.cheats = r.read_i32();
    p.refire = r.read_i32();
    p.kill_count = r.read_i32();
    p.item_count = r.read_i32();
    p.secret_count = r.read_i32();
    p.damage_count = r.read_i32();
    p.bonus_count = r.read_i32();
    p.extra_light = r.read_i32();
    p.fixed_color_map = r.read_i32();
    p.color_map = r.read_i32();
    read_array(r, stored.psprites, &mut p.psprites, |r| {
        let index = r.read_i32();
        PSprite {
            state: read_psprite_state(index, states),
            tics: r.read_i32(),
            pos: [r.read_fixed(), r.read_fixed()],
        }
    });
    p.did_secret = r.read_i32() != 0;
    if version >= 6 {
        p.air_counter = r.read_i32();
    }

    // The body is relinked by the thinker stream.
    p.mo = None;
    p.fixup = PlayerFixup::ANGLES | PlayerFixup::POSITION | PlayerFixup::MOMENTUM | PlayerFixup::REBORN;
    Ok(())
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// Writes one record for each slot flagged in `present`, keyed by net id.
pub fn write_players(w: &mut SaveWriter, players: &Players, present: &[bool; MAXPLAYERS]) {
    begin_segment(w, Segment::Players);
    for (slot, _) in players.slots.iter().zip(present).filter(|(_, saved)| **saved) {
        w.write_u32(slot.net_id);
        write_player(w, &slot.player);
    }
}

/// How the saved players were matched to the connected ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerReconciliation {
    /// Live slots that received a saved record.
    pub restored: Vec<usize>,
    /// Saved records with nobody to receive them.
    pub dropped: usize,
    /// Connected slots the save had no record for.
    pub missing: Vec<usize>,
}

/// Reads the saved records into `ctx.players`, recording the saved-to-live
/// slot mapping in the session for the mobj reader.
pub fn read_players(
    r: &mut SaveReader<'_>,
    ctx: &mut ReadContext<'_>,
    stored: &PlayerLayout,
    present: &[bool; MAXPLAYERS],
    netgame: bool,
) -> Result<PlayerReconciliation, SaveError> {
    expect_segment(r, Segment::Players)?;
    let mut report = PlayerReconciliation::default();
    let mut loaded = [false; MAXPLAYERS];

    for saved in (0..MAXPLAYERS).filter(|&i| present[i]) {
        let net_id = r.read_u32();
        let real = if netgame {
            ctx.players.slot_by_net_id(net_id)
        } else if saved == 0 && ctx.players.slots[0].in_game {
            Some(0)
        } else {
            None
        };
        let real = real.filter(|&i| !loaded[i]);
        ctx.session.map_player(saved, real);

        match real {
            Some(i) => {
                read_player(r, &mut ctx.players.slots[i].player, stored, ctx.tables.states)?;
                loaded[i] = true;
                report.restored.push(i);
            }
            None => {
                let mut dummy = Player::new(&ctx.players.layout);
                read_player(r, &mut dummy, stored, ctx.tables.states)?;
                debug!("Saved player {saved} (net id {net_id}) has no live slot; record dropped");
                report.dropped += 1;
            }
        }
    }

    for (i, _) in ctx.players.in_game() {
        if !loaded[i] {
            warn!("Player {i} was not in the saved game; keeping a fresh player");
            report.missing.push(i);
        }
    }
    Ok(report)
}
