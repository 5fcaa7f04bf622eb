// ---------------------------------------------------------------------------
// thinker_registry – class tags and per-class record codecs
// ---------------------------------------------------------------------------
//
// Every archivable thinker class has a one-byte tag on the wire and a row in
// `THINKER_CLASSES` pairing it with its writer and reader. Tags are part of
// the format and never renumbered.

use bitflags::bitflags;

use simulation::specials::{AcsScript, Ceiling, Plat};
use simulation::thinker::ThinkerKind;

use crate::archive_session::{ReadContext, RefField, WriteContext};
use crate::hexen_records;
use crate::mobj_archive;
use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;
use crate::special_records;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ThinkerClass {
    /// Stream terminator.
    End = 0,
    Mobj = 1,
    /// Written only by the external XG engine.
    XgMover = 2,
    Ceiling = 3,
    Door = 4,
    Floor = 5,
    Plat = 6,
    Flash = 7,
    Strobe = 8,
    Glow = 9,
    Flicker = 10,
    Blink = 11,
    InterpretAcs = 12,
    FloorWaggle = 13,
    Light = 14,
    Phase = 15,
    BuildPillar = 16,
    RotatePoly = 17,
    MovePoly = 18,
    PolyDoor = 19,
}

impl ThinkerClass {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        use ThinkerClass::*;
        Some(match tag {
            0 => End,
            1 => Mobj,
            2 => XgMover,
            3 => Ceiling,
            4 => Door,
            5 => Floor,
            6 => Plat,
            7 => Flash,
            8 => Strobe,
            9 => Glow,
            10 => Flicker,
            11 => Blink,
            12 => InterpretAcs,
            13 => FloorWaggle,
            14 => Light,
            15 => Phase,
            16 => BuildPillar,
            17 => RotatePoly,
            18 => MovePoly,
            19 => PolyDoor,
            _ => return None,
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThinkerClassFlags: u8 {
        /// Only the server archives this class.
        const SERVER_ONLY = 0x01;
        /// A map special that claims its sector's special-data slot.
        const SPECIAL = 0x02;
    }
}

/// A thinker rebuilt from one record, not yet in the thinker list.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub kind: ThinkerKind,
    /// Thing id the record announced for itself; 0 for non-mobjs.
    pub thing_id: u32,
    /// Raw thing ids to resolve once the stream is read.
    pub refs: Vec<(RefField, u32)>,
    pub stasis: bool,
}

impl Restored {
    pub fn new(kind: ThinkerKind) -> Self {
        Self {
            kind,
            thing_id: 0,
            refs: Vec::new(),
            stasis: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Restored(Restored),
    /// The record was valid but its object has no place in this game.
    Discarded { thing_id: u32 },
}

pub type WriteFn = fn(&ThinkerKind, &mut SaveWriter, &mut WriteContext<'_>) -> Result<(), SaveError>;
pub type ReadFn = fn(&mut SaveReader<'_>, &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError>;

pub struct ThinkerClassInfo {
    pub class: ThinkerClass,
    pub name: &'static str,
    pub flags: ThinkerClassFlags,
    /// `None` for classes this engine reads but never produces.
    pub write: Option<WriteFn>,
    pub read: ReadFn,
}

fn class_mismatch(expected: &str, found: &ThinkerKind) -> SaveError {
    SaveError::corrupt(format!(
        "{expected} writer handed a {:?} thinker",
        classify(found)
    ))
}

macro_rules! class_writer {
    ($name:ident, $variant:ident, $func:path) => {
        fn $name(
            kind: &ThinkerKind,
            w: &mut SaveWriter,
            ctx: &mut WriteContext<'_>,
        ) -> Result<(), SaveError> {
            match kind {
                ThinkerKind::$variant(v) => $func(v, w, ctx),
                other => Err(class_mismatch(stringify!($variant), other)),
            }
        }
    };
}

macro_rules! class_reader {
    ($name:ident, $variant:ident, $func:path) => {
        fn $name(
            r: &mut SaveReader<'_>,
            ctx: &mut ReadContext<'_>,
        ) -> Result<ReadOutcome, SaveError> {
            let value = $func(r, ctx)?;
            Ok(ReadOutcome::Restored(Restored::new(ThinkerKind::$variant(
                value,
            ))))
        }
    };
}

class_writer!(write_mobj, Mobj, mobj_archive::write_mobj);
class_writer!(write_ceiling, Ceiling, special_records::write_ceiling);
class_writer!(write_door, Door, special_records::write_door);
class_writer!(write_floor, Floor, special_records::write_floor);
class_writer!(write_plat, Plat, special_records::write_plat);
class_writer!(write_flash, Flash, special_records::write_light_flash);
class_writer!(write_strobe, Strobe, special_records::write_strobe);
class_writer!(write_glow, Glow, special_records::write_glow);
class_writer!(write_flicker, Flicker, special_records::write_flicker);
class_writer!(write_blink, Blink, special_records::write_light_flash);
class_writer!(write_script, Script, hexen_records::write_script);
class_writer!(write_waggle, FloorWaggle, hexen_records::write_floor_waggle);
class_writer!(write_light, Light, hexen_records::write_light);
class_writer!(write_phase, Phase, hexen_records::write_phase);
class_writer!(write_pillar, Pillar, hexen_records::write_pillar);
class_writer!(write_rotate_poly, RotatePoly, hexen_records::write_poly_event);
class_writer!(write_move_poly, MovePoly, hexen_records::write_poly_event);
class_writer!(write_poly_door, PolyDoor, hexen_records::write_poly_door);

class_reader!(read_door, Door, special_records::read_door);
class_reader!(read_floor, Floor, special_records::read_floor);
class_reader!(read_flash, Flash, special_records::read_light_flash);
class_reader!(read_strobe, Strobe, special_records::read_strobe);
class_reader!(read_glow, Glow, special_records::read_glow);
class_reader!(read_flicker, Flicker, special_records::read_flicker);
class_reader!(read_blink, Blink, special_records::read_light_flash);
class_reader!(read_waggle, FloorWaggle, hexen_records::read_floor_waggle);
class_reader!(read_light, Light, hexen_records::read_light);
class_reader!(read_phase, Phase, hexen_records::read_phase);
class_reader!(read_pillar, Pillar, hexen_records::read_pillar);
class_reader!(read_rotate_poly, RotatePoly, hexen_records::read_poly_event);
class_reader!(read_move_poly, MovePoly, hexen_records::read_poly_event);
class_reader!(read_poly_door, PolyDoor, hexen_records::read_poly_door);

fn with_stasis(kind: ThinkerKind, stasis: bool) -> ReadOutcome {
    ReadOutcome::Restored(Restored {
        stasis,
        ..Restored::new(kind)
    })
}

fn read_ceiling(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError> {
    let (ceiling, stasis): (Ceiling, bool) = special_records::read_ceiling(r, ctx)?;
    Ok(with_stasis(ThinkerKind::Ceiling(ceiling), stasis))
}

fn read_plat(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError> {
    let (plat, stasis): (Plat, bool) = special_records::read_plat(r, ctx)?;
    Ok(with_stasis(ThinkerKind::Plat(plat), stasis))
}

fn read_script(r: &mut SaveReader<'_>, ctx: &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError> {
    let (script, activator): (AcsScript, u32) = hexen_records::read_script(r, ctx)?;
    let mut restored = Restored::new(ThinkerKind::Script(Box::new(script)));
    restored.refs.push((RefField::Activator, activator));
    Ok(ReadOutcome::Restored(restored))
}

fn read_xg_mover(_: &mut SaveReader<'_>, _: &mut ReadContext<'_>) -> Result<ReadOutcome, SaveError> {
    Err(SaveError::Unsupported(
        "extended generalized movers belong to the XG engine".to_string(),
    ))
}

const SPECIAL: ThinkerClassFlags = ThinkerClassFlags::SPECIAL;
const NONE: ThinkerClassFlags = ThinkerClassFlags::empty();

/// Every archivable class, in tag order.
pub static THINKER_CLASSES: &[ThinkerClassInfo] = &[
    ThinkerClassInfo {
        class: ThinkerClass::Mobj,
        name: "mobj",
        flags: ThinkerClassFlags::SERVER_ONLY,
        write: Some(write_mobj),
        read: mobj_archive::read_mobj,
    },
    ThinkerClassInfo {
        class: ThinkerClass::XgMover,
        name: "xg mover",
        flags: SPECIAL,
        write: None,
        read: read_xg_mover,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Ceiling,
        name: "ceiling",
        flags: SPECIAL,
        write: Some(write_ceiling),
        read: read_ceiling,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Door,
        name: "door",
        flags: SPECIAL,
        write: Some(write_door),
        read: read_door,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Floor,
        name: "floor",
        flags: SPECIAL,
        write: Some(write_floor),
        read: read_floor,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Plat,
        name: "plat",
        flags: SPECIAL,
        write: Some(write_plat),
        read: read_plat,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Flash,
        name: "light flash",
        flags: NONE,
        write: Some(write_flash),
        read: read_flash,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Strobe,
        name: "strobe",
        flags: NONE,
        write: Some(write_strobe),
        read: read_strobe,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Glow,
        name: "glow",
        flags: NONE,
        write: Some(write_glow),
        read: read_glow,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Flicker,
        name: "flicker",
        flags: NONE,
        write: Some(write_flicker),
        read: read_flicker,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Blink,
        name: "light blink",
        flags: NONE,
        write: Some(write_blink),
        read: read_blink,
    },
    ThinkerClassInfo {
        class: ThinkerClass::InterpretAcs,
        name: "acs script",
        flags: NONE,
        write: Some(write_script),
        read: read_script,
    },
    ThinkerClassInfo {
        class: ThinkerClass::FloorWaggle,
        name: "floor waggle",
        flags: SPECIAL,
        write: Some(write_waggle),
        read: read_waggle,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Light,
        name: "light",
        flags: NONE,
        write: Some(write_light),
        read: read_light,
    },
    ThinkerClassInfo {
        class: ThinkerClass::Phase,
        name: "phase",
        flags: NONE,
        write: Some(write_phase),
        read: read_phase,
    },
    ThinkerClassInfo {
        class: ThinkerClass::BuildPillar,
        name: "pillar",
        flags: SPECIAL,
        write: Some(write_pillar),
        read: read_pillar,
    },
    ThinkerClassInfo {
        class: ThinkerClass::RotatePoly,
        name: "rotate poly",
        flags: NONE,
        write: Some(write_rotate_poly),
        read: read_rotate_poly,
    },
    ThinkerClassInfo {
        class: ThinkerClass::MovePoly,
        name: "move poly",
        flags: NONE,
        write: Some(write_move_poly),
        read: read_move_poly,
    },
    ThinkerClassInfo {
        class: ThinkerClass::PolyDoor,
        name: "poly door",
        flags: NONE,
        write: Some(write_poly_door),
        read: read_poly_door,
    },
];

/// Class of a live thinker.
pub fn classify(kind: &ThinkerKind) -> ThinkerClass {
    match kind {
        ThinkerKind::Mobj(_) => ThinkerClass::Mobj,
        ThinkerKind::Ceiling(_) => ThinkerClass::Ceiling,
        ThinkerKind::Door(_) => ThinkerClass::Door,
        ThinkerKind::Floor(_) => ThinkerClass::Floor,
        ThinkerKind::Plat(_) => ThinkerClass::Plat,
        ThinkerKind::Flash(_) => ThinkerClass::Flash,
        ThinkerKind::Strobe(_) => ThinkerClass::Strobe,
        ThinkerKind::Glow(_) => ThinkerClass::Glow,
        ThinkerKind::Flicker(_) => ThinkerClass::Flicker,
        ThinkerKind::Blink(_) => ThinkerClass::Blink,
        ThinkerKind::Script(_) => ThinkerClass::InterpretAcs,
        ThinkerKind::FloorWaggle(_) => ThinkerClass::FloorWaggle,
        ThinkerKind::Light(_) => ThinkerClass::Light,
        ThinkerKind::Phase(_) => ThinkerClass::Phase,
        ThinkerKind::Pillar(_) => ThinkerClass::BuildPillar,
        ThinkerKind::RotatePoly(_) => ThinkerClass::RotatePoly,
        ThinkerKind::MovePoly(_) => ThinkerClass::MovePoly,
        ThinkerKind::PolyDoor(_) => ThinkerClass::PolyDoor,
    }
}

pub fn info_for_class(class: ThinkerClass) -> Option<&'static ThinkerClassInfo> {
    THINKER_CLASSES.iter().find(|info| info.class == class)
}

pub fn info_for_tag(tag: u8) -> Option<&'static ThinkerClassInfo> {
    ThinkerClass::from_tag(tag).and_then(info_for_class)
}
