// ---------------------------------------------------------------------------
// segments – alignment markers between the sections of the logical stream
// ---------------------------------------------------------------------------

use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Segment {
    GameHeader = 101,
    MapHeader = 102,
    World = 103,
    Polyobjs = 104,
    Mobjs = 105,
    Thinkers = 106,
    Scripts = 107,
    Players = 108,
    Sounds = 109,
    Misc = 110,
    End = 111,
    MaterialArchive = 112,
    MapHeader2 = 113,
    PlayerHeader = 114,
    SoundTargets = 115,
    Brain = 116,
}

impl Segment {
    const ALL: [Segment; 16] = [
        Segment::GameHeader,
        Segment::MapHeader,
        Segment::World,
        Segment::Polyobjs,
        Segment::Mobjs,
        Segment::Thinkers,
        Segment::Scripts,
        Segment::Players,
        Segment::Sounds,
        Segment::Misc,
        Segment::End,
        Segment::MaterialArchive,
        Segment::MapHeader2,
        Segment::PlayerHeader,
        Segment::SoundTargets,
        Segment::Brain,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    /// The segment a marker names, including ids only older saves wrote.
    pub fn from_id(id: i32) -> Option<Segment> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

pub fn begin_segment(w: &mut SaveWriter, segment: Segment) {
    w.write_i32(segment.id());
}

/// Consumes the next segment marker and checks it is `segment`.
pub fn expect_segment(r: &mut SaveReader<'_>, segment: Segment) -> Result<(), SaveError> {
    let found = r.read_i32();
    if found != segment.id() {
        let seen = match Segment::from_id(found) {
            Some(other) => format!("{other:?} marker {found}"),
            None => format!("{found}"),
        };
        return Err(SaveError::corrupt(format!(
            "segment {} failed alignment check (found {seen})",
            segment.id()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_ids() {
        assert_eq!(Segment::GameHeader.id(), 101);
        assert_eq!(Segment::PlayerHeader.id(), 114);
        assert_eq!(Segment::Brain.id(), 116);
    }

    #[test]
    fn test_every_segment_id_maps_back() {
        for segment in Segment::ALL {
            assert_eq!(Segment::from_id(segment.id()), Some(segment));
        }
        assert_eq!(Segment::from_id(100), None);
        assert_eq!(Segment::from_id(117), None);
    }

    #[test]
    fn test_expect_segment_mismatch() {
        let mut w = SaveWriter::new();
        begin_segment(&mut w, Segment::World);
        let bytes = w.into_bytes();

        let mut r = SaveReader::new(&bytes);
        let err = expect_segment(&mut r, Segment::Thinkers).unwrap_err();
        let msg = format!("{err}");
        assert!(
            msg.contains("segment 106 failed alignment check (found World marker 103)"),
            "got: {msg}"
        );

        let bytes = 99i32.to_le_bytes();
        let err = expect_segment(&mut SaveReader::new(&bytes), Segment::World).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("(found 99)"), "got: {msg}");

        let mut r = SaveReader::new(&bytes);
        assert!(expect_segment(&mut r, Segment::World).is_ok());
    }
}
