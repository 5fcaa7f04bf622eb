use simulation::map::MapLibrary;
use simulation::GameMode;

use super::tests_roundtrip::{busy_game, load_fixture, save_fixture};
use super::*;
use crate::test_fixtures::{Fixture, FIXTURE_MAP};

/// Decompresses a save, edits the logical stream and wraps it again.
pub(super) fn restream(bytes: &[u8], edit: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut stream = unwrap_container(bytes).expect("unwrap");
    edit(&mut stream);
    wrap_container(&stream)
}

fn load_error(mode: GameMode, bytes: &[u8]) -> String {
    let live = Fixture::new(mode);
    format!("{}", load_fixture(&live, bytes).unwrap_err())
}

#[test]
fn test_wrong_game_mode_rejected() {
    let saved = busy_game(GameMode::DoomRegistered, 1);
    let bytes = save_fixture(&saved, SaveOptions::default());
    // Same magic, different mode.
    let msg = load_error(GameMode::DoomCommercial, &bytes);
    assert!(msg.contains("Game mode mismatch"), "got: {msg}");
    // Different game entirely.
    let msg = load_error(GameMode::Heretic, &bytes);
    assert!(msg.contains("Not a valid save"), "got: {msg}");
}

#[test]
fn test_client_save_cannot_be_loaded() {
    let saved = busy_game(GameMode::Heretic, 2);
    let options = SaveOptions {
        role: NetRole::Client,
        ..Default::default()
    };
    let bytes = save_fixture(&saved, options);
    let msg = load_error(GameMode::Heretic, &bytes);
    assert!(msg.contains("client save"), "got: {msg}");

    let info = read_save_info(&bytes, &saved.profile, GameMode::Heretic).expect("info");
    assert!(!info.loadable);
}

#[test]
fn test_hexen_client_save_uses_normal_magic() {
    let saved = busy_game(GameMode::Hexen, 3);
    let options = SaveOptions {
        role: NetRole::Client,
        ..Default::default()
    };
    let bytes = save_fixture(&saved, options);
    let loaded = load_fixture(&Fixture::new(GameMode::Hexen), &bytes).expect("load");
    // Only the server keeps mobjs and scripts.
    assert!(loaded.level.thinkers.mobjs().next().is_none());
    assert!(loaded.thinkers < saved.level.thinkers.len());
}

#[test]
fn test_missing_map_rejected() {
    let saved = busy_game(GameMode::DoomRegistered, 4);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let mut live = Fixture::new(GameMode::DoomRegistered);
    live.library = MapLibrary::default();
    let err = load_fixture(&live, &bytes).unwrap_err();
    assert!(matches!(err, SaveError::MissingMap(map) if map == FIXTURE_MAP));
}

#[test]
fn test_map_with_different_geometry_rejected() {
    let saved = busy_game(GameMode::Heretic, 5);
    let bytes = save_fixture(&saved, SaveOptions::default());

    let mut live = Fixture::new(GameMode::Heretic);
    let mut map = live.level.map.clone();
    map.sectors.push(map.sectors[0].clone());
    live.library.insert(FIXTURE_MAP, map);
    let msg = format!("{}", load_fixture(&live, &bytes).unwrap_err());
    assert!(msg.contains("save has 2 sectors but the map has 3"), "got: {msg}");
}

#[test]
fn test_version_limits() {
    let saved = busy_game(GameMode::DoomRegistered, 6);
    let bytes = save_fixture(&saved, SaveOptions::default());

    let newer = restream(&bytes, |s| s[4..8].copy_from_slice(&8u32.to_le_bytes()));
    let msg = load_error(GameMode::DoomRegistered, &newer);
    assert!(msg.contains("save is v8"), "got: {msg}");

    let older = restream(&bytes, |s| s[4..8].copy_from_slice(&4u32.to_le_bytes()));
    let msg = load_error(GameMode::DoomRegistered, &older);
    assert!(msg.contains("Unsupported save version 4"), "got: {msg}");
}

#[test]
fn test_bad_consistency_byte_rejected() {
    let saved = busy_game(GameMode::Hexen, 7);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let bad = restream(&bytes, |s| {
        if let Some(last) = s.last_mut() {
            *last ^= 0xff;
        }
    });
    let msg = load_error(GameMode::Hexen, &bad);
    assert!(msg.contains("bad consistency byte 0xE2"), "got: {msg}");
}

#[test]
fn test_truncated_streams_rejected() {
    let saved = busy_game(GameMode::DoomCommercial, 8);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let len = unwrap_container(&bytes).expect("unwrap").len();

    let short = restream(&bytes, |s| s.truncate(len - 1));
    let msg = load_error(GameMode::DoomCommercial, &short);
    assert!(msg.contains("stream ended inside the trailer"), "got: {msg}");

    for cut in [0, 10, 70, len / 3, len / 2, len - 6] {
        let short = restream(&bytes, |s| s.truncate(cut));
        let live = Fixture::new(GameMode::DoomCommercial);
        assert!(load_fixture(&live, &short).is_err(), "cut at {cut} loaded");
    }
}

#[test]
fn test_trailing_garbage_is_ignored() {
    let saved = busy_game(GameMode::DoomCommercial, 9);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let padded = restream(&bytes, |s| s.extend_from_slice(&[0; 16]));
    load_fixture(&Fixture::new(GameMode::DoomCommercial), &padded).expect("load");
}

#[test]
fn test_damaged_container_rejected() {
    let saved = busy_game(GameMode::DoomRegistered, 10);
    let mut bytes = save_fixture(&saved, SaveOptions::default());
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x55;
    let msg = load_error(GameMode::DoomRegistered, &bytes);
    assert!(msg.contains("checksum mismatch"), "got: {msg}");

    let msg = load_error(GameMode::DoomRegistered, &[]);
    assert!(!msg.is_empty());
}

#[test]
fn test_failed_load_leaves_live_game_alone() {
    let saved = busy_game(GameMode::Hexen, 11);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let bad = restream(&bytes, |s| {
        let last = s.len() - 1;
        s[last] = 0;
    });

    let live = busy_game(GameMode::Hexen, 12);
    let before = live.level.thinkers.len();
    let map_before = live.level.map.clone();
    assert!(load_fixture(&live, &bad).is_err());
    assert_eq!(live.level.thinkers.len(), before);
    assert_eq!(live.level.map, map_before);
    assert_eq!(live.players.slots[0].player.health, 73);
}

#[test]
fn test_oversized_thing_archive_rejected() {
    let saved = busy_game(GameMode::DoomCommercial, 13);
    let bytes = save_fixture(&saved, SaveOptions::default());
    let count = saved.level.thinkers.mobjs().count() as i32;
    let mut marker = count.to_le_bytes().to_vec();
    marker.extend_from_slice(&Segment::MaterialArchive.id().to_le_bytes());

    let bad = restream(&bytes, |s| {
        let at = s
            .windows(marker.len())
            .position(|win| win == marker.as_slice())
            .expect("thing archive size");
        s[at..at + 4].copy_from_slice(&i32::MAX.to_le_bytes());
    });
    let msg = load_error(GameMode::DoomCommercial, &bad);
    assert!(msg.contains("bad thing archive size"), "got: {msg}");
}

#[test]
fn test_save_with_too_many_mobjs_rejected() {
    let mut fx = Fixture::new(GameMode::DoomCommercial);
    for i in 0..=u16::MAX as usize {
        fx.spawn(2, [40.0 + (i % 200) as f32, 50.0, 0.0]);
    }
    let err = save_game(&SaveRequest {
        session: &fx.session,
        players: &fx.players,
        level: &fx.level,
        tables: fx.tables(),
        profile: &fx.profile,
        options: SaveOptions::default(),
        description: "crowded",
    })
    .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("65536 mobjs exceed the 65535"), "got: {msg}");
}
