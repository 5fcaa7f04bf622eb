// ---------------------------------------------------------------------------
// SaveError: typed failures for save/load operations
// ---------------------------------------------------------------------------

use std::fmt;

use simulation::MapId;

/// Errors that can occur during save/load operations.
///
/// Degraded conditions (a missing material, an out-of-range thing id, a saved
/// player with nobody to receive it) are not errors; they are logged and
/// defaulted where they happen.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// LZ4 decompression failed.
    Compression(String),
    /// The file is not a save for this game (container or header magic).
    BadMagic(String),
    /// Save version is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Save version is older than the oldest layout this build can read.
    UnsupportedVersion { what: &'static str, found: u32 },
    /// Save was made under a different game mode.
    GameModeMismatch { expected: i32, found: i32 },
    /// Stream contents contradict themselves or the loaded map.
    CorruptSave(String),
    /// More trackable objects than thing archive slots.
    ArchiveExhausted { capacity: usize },
    /// No base map for the saved episode/map pair.
    MissingMap(MapId),
    /// Record kind this build knows about but cannot restore.
    Unsupported(String),
    /// No save data was available to load (e.g., no pending bytes).
    NoData,
    /// A required resource was missing from the ECS world.
    MissingResource(String),
}

impl SaveError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        SaveError::CorruptSave(msg.into())
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Compression(msg) => write!(f, "Decompression error: {msg}"),
            SaveError::BadMagic(msg) => write!(f, "Not a valid save: {msg}"),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: save is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::UnsupportedVersion { what, found } => {
                write!(f, "Unsupported {what} version {found}")
            }
            SaveError::GameModeMismatch { expected, found } => write!(
                f,
                "Game mode mismatch: save is for mode {found}, running mode {expected}"
            ),
            SaveError::CorruptSave(msg) => write!(f, "Corrupt save: {msg}"),
            SaveError::ArchiveExhausted { capacity } => {
                write!(f, "Thing archive exhausted ({capacity} slots)")
            }
            SaveError::MissingMap(map) => write!(
                f,
                "No map data for episode {} map {}",
                map.episode, map.map
            ),
            SaveError::Unsupported(msg) => write!(f, "Unsupported save content: {msg}"),
            SaveError::NoData => write!(f, "No save data available to load"),
            SaveError::MissingResource(name) => {
                write!(f, "Missing required resource: {name}")
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<lz4_flex::block::DecompressError> for SaveError {
    fn from(e: lz4_flex::block::DecompressError) -> Self {
        SaveError::Compression(e.to_string())
    }
}
