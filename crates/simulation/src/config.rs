/// Maximum number of player slots in a game session.
pub const MAXPLAYERS: usize = 16;

/// One unit in 16.16 fixed point.
pub const FRACUNIT: i32 = 1 << 16;

/// Binary angle for 45 degrees (a full turn is 2^32).
pub const ANG45: u32 = 0x2000_0000;

/// Spawn-spot z marker meaning "on the floor of whatever sector this lands in".
/// Equal to `i32::MIN` in fixed point so it survives a fixed-point round trip.
pub const ONFLOORZ: f32 = -32768.0;

/// Integer marker meaning "use the value from the type info".
pub const DDMAXINT: i32 = i32::MAX;

/// Fixed length of a material name in the lump directory.
pub const MATERIAL_NAME_LEN: usize = 8;

/// Length of the free-text save description.
pub const SAVESTRINGSIZE: usize = 24;

/// Depth of an ACS interpreter stack.
pub const ACS_STACK_DEPTH: usize = 32;
/// Local variables per running ACS script.
pub const MAX_ACS_SCRIPT_VARS: usize = 10;
/// Variables scoped to the current map.
pub const MAX_ACS_MAP_VARS: usize = 32;
/// Variables shared across every map of a hub.
pub const MAX_ACS_WORLD_VARS: usize = 64;

/// Converts a float to 16.16 fixed point, truncating toward zero.
pub fn flt_to_fix(value: f32) -> i32 {
    (value * FRACUNIT as f32) as i32
}

/// Converts a 16.16 fixed point value to a float.
pub fn fix_to_flt(value: i32) -> f32 {
    value as f32 / FRACUNIT as f32
}
