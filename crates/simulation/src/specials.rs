//! Sector, light, polyobject and script movers.
//!
//! Light values are normalized to `[0, 1]` like [`crate::map::Sector::light_level`].
//! Heights and speeds are map units.

use crate::config::{ACS_STACK_DEPTH, MAX_ACS_SCRIPT_VARS};
use crate::materials::MaterialId;
use crate::thinker::ThinkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CeilingState {
    Down = 0,
    Up = 1,
}

impl CeilingState {
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            CeilingState::Down
        } else {
            CeilingState::Up
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ceiling {
    pub kind: u8,
    pub sector: usize,
    pub bottom_height: f32,
    pub top_height: f32,
    pub speed: f32,
    pub crush: bool,
    pub state: CeilingState,
    pub old_state: CeilingState,
    pub tag: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub kind: u8,
    pub sector: usize,
    pub top_height: f32,
    pub speed: f32,
    /// -1 closing, 0 waiting, 1 opening, 2 initial wait.
    pub state: i32,
    pub top_wait: i32,
    pub top_countdown: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloorMover {
    pub kind: u8,
    pub sector: usize,
    pub crush: bool,
    pub state: i32,
    pub new_special: i32,
    pub material: Option<MaterialId>,
    pub dest_height: f32,
    pub speed: f32,
    pub delay_count: i32,
    pub delay_total: i32,
    pub stair_delay_height: f32,
    pub stair_delay_delta: f32,
    pub reset_height: f32,
    pub reset_delay: i16,
    pub reset_delay_count: i16,
}

impl FloorMover {
    pub fn new(kind: u8, sector: usize, dest_height: f32, speed: f32) -> Self {
        Self {
            kind,
            sector,
            crush: false,
            state: 0,
            new_special: 0,
            material: None,
            dest_height,
            speed,
            delay_count: 0,
            delay_total: 0,
            stair_delay_height: 0.0,
            stair_delay_delta: 0.0,
            reset_height: 0.0,
            reset_delay: 0,
            reset_delay_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plat {
    pub kind: u8,
    pub sector: usize,
    pub speed: f32,
    pub low: f32,
    pub high: f32,
    pub wait: i32,
    pub count: i32,
    pub state: u8,
    pub old_state: u8,
    pub crush: bool,
    pub tag: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightFlash {
    pub sector: usize,
    pub count: i32,
    pub max_light: f32,
    pub min_light: f32,
    pub max_time: i32,
    pub min_time: i32,
}

/// Same shape as [`LightFlash`], ticked with a regular on/off rhythm.
pub type LightBlink = LightFlash;

#[derive(Debug, Clone, PartialEq)]
pub struct Strobe {
    pub sector: usize,
    pub count: i32,
    pub max_light: f32,
    pub min_light: f32,
    pub dark_time: i32,
    pub bright_time: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glow {
    pub sector: usize,
    pub max_light: f32,
    pub min_light: f32,
    pub direction: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flicker {
    pub sector: usize,
    pub max_light: f32,
    pub min_light: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexenLight {
    pub kind: u8,
    pub sector: usize,
    pub value1: f32,
    pub value2: f32,
    pub tics1: i32,
    pub tics2: i32,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub sector: usize,
    pub index: i32,
    pub base_value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pillar {
    pub sector: usize,
    pub ceiling_speed: f32,
    pub floor_speed: f32,
    pub floor_dest: f32,
    pub ceiling_dest: f32,
    pub direction: i32,
    pub crush: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloorWaggle {
    pub sector: usize,
    pub original_height: f32,
    pub accumulator: f32,
    pub acc_delta: f32,
    pub target_scale: f32,
    pub scale: f32,
    pub scale_delta: f32,
    pub ticker: i32,
    pub state: i32,
}

/// Rotation or translation of a polyobject; which one is given by the
/// thinker kind it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyEvent {
    /// Tag of the polyobject being moved.
    pub polyobj: i32,
    pub int_speed: i32,
    pub dist: i32,
    pub fangle: i32,
    pub speed: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyDoor {
    pub kind: u8,
    pub polyobj: i32,
    pub int_speed: i32,
    pub dist: i32,
    pub total_dist: i32,
    pub direction: i32,
    pub speed: [f32; 2],
    pub tics: i32,
    pub wait_tics: i32,
    pub close: bool,
}

/// A running ACS script interpreter.
#[derive(Debug, Clone, PartialEq)]
pub struct AcsScript {
    pub activator: Option<ThinkerId>,
    pub line: Option<usize>,
    pub side: i32,
    pub number: i32,
    pub info_index: i32,
    pub delay_count: i32,
    pub stack: [i32; ACS_STACK_DEPTH],
    pub stack_ptr: i32,
    pub vars: [i32; MAX_ACS_SCRIPT_VARS],
    /// Offset of the next instruction within the behavior lump.
    pub ip: i32,
}

impl AcsScript {
    pub fn new(number: i32, info_index: i32, ip: i32) -> Self {
        Self {
            activator: None,
            line: None,
            side: 0,
            number,
            info_index,
            delay_count: 0,
            stack: [0; ACS_STACK_DEPTH],
            stack_ptr: 0,
            vars: [0; MAX_ACS_SCRIPT_VARS],
            ip,
        }
    }
}
