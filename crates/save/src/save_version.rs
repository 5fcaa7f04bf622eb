// ---------------------------------------------------------------------------
// save_version – top-level stream version and the features it gates
// ---------------------------------------------------------------------------

use crate::save_codec::SaveReader;
use crate::save_error::SaveError;

/// Version written by this build.
pub const SAVE_VERSION: u32 = 7;

/// Oldest version whose thinker stream ends with a class-tag terminator.
pub const MIN_SAVE_VERSION: u32 = 5;

/// Version of the stream being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SaveVersion(pub u32);

impl SaveVersion {
    pub const CURRENT: SaveVersion = SaveVersion(SAVE_VERSION);

    /// Accepts versions `MIN_SAVE_VERSION..=SAVE_VERSION`.
    pub fn check(found: u32) -> Result<Self, SaveError> {
        if found > SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected_max: SAVE_VERSION,
                found,
            });
        }
        if found < MIN_SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                what: "save",
                found,
            });
        }
        Ok(SaveVersion(found))
    }

    /// Material archive layout: 1 stores a group byte per entry, 0 stores
    /// separate flat and texture tables.
    pub fn material_archive_version(self) -> u8 {
        u8::from(self.0 >= 6)
    }

    /// Thinker records carry a stasis byte after the class tag.
    pub fn has_stasis_byte(self) -> bool {
        self.0 >= 6
    }

    /// The map header records sector, line and polyobj counts.
    pub fn has_map_counts(self) -> bool {
        self.0 >= 7
    }
}

/// Reads a record's leading version byte, accepting `1..=current`.
pub fn read_record_version(
    r: &mut SaveReader<'_>,
    what: &'static str,
    current: u8,
) -> Result<u8, SaveError> {
    let version = r.read_u8();
    if version == 0 || version > current {
        return Err(SaveError::UnsupportedVersion {
            what,
            found: u32::from(version),
        });
    }
    Ok(version)
}
