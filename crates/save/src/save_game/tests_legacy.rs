use simulation::GameMode;

use super::tests_failures::restream;
use super::tests_roundtrip::{busy_game, load_fixture, save_fixture};
use super::*;
use crate::test_fixtures::Fixture;

/// Offset of the MAP_HEADER2 segment id in a current stream.
fn map_header_offset(stream: &[u8]) -> usize {
    let mut needle = Segment::MapHeader2.id().to_le_bytes().to_vec();
    needle.push(7);
    stream
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .expect("map header present")
}

/// Rewrites a current save as version 6: no sector, line and polyobj
/// counts after the map time.
fn downgrade_to_v6(bytes: &[u8]) -> Vec<u8> {
    restream(bytes, |s| {
        s[4..8].copy_from_slice(&6u32.to_le_bytes());
        let at = map_header_offset(s);
        s[at + 4] = 6;
        let counts = at + 4 + 1 + 4;
        s.drain(counts..counts + 12);
    })
}

#[test]
fn test_v6_save_loads_without_map_counts() {
    for mode in [GameMode::DoomRegistered, GameMode::Hexen] {
        let saved = busy_game(mode, 50);
        let old = downgrade_to_v6(&save_fixture(&saved, SaveOptions::default()));

        let loaded = load_fixture(&Fixture::new(mode), &old).expect("v6 load");
        assert_eq!(loaded.header.version, 6);
        assert_eq!(loaded.session.map_time, 4242);
        let before: Vec<_> = saved.level.thinkers.iter().collect();
        let after: Vec<_> = loaded.level.thinkers.iter().collect();
        assert_eq!(before, after, "{mode:?}");
    }
}

#[test]
fn test_v6_save_info_is_loadable() {
    let saved = busy_game(GameMode::Heretic, 51);
    let old = downgrade_to_v6(&save_fixture(&saved, SaveOptions::default()));
    let info = read_save_info(&old, &saved.profile, GameMode::Heretic).expect("info");
    assert!(info.loadable);
    assert_eq!(info.header.version, 6);
}

#[test]
fn test_map_header_version_must_match_save() {
    let saved = busy_game(GameMode::DoomRegistered, 52);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let bad = restream(&bytes, |s| {
        let at = map_header_offset(s);
        s[at + 4] = 6;
    });
    let live = Fixture::new(GameMode::DoomRegistered);
    let msg = format!("{}", load_fixture(&live, &bad).unwrap_err());
    assert!(
        msg.contains("map header version 6 disagrees with save version 7"),
        "got: {msg}"
    );
}
