use simulation::player::PlayerState;
use simulation::GameMode;

use super::*;
use crate::game_profile::EpilogueSection;
use crate::test_fixtures::Fixture;

pub(super) fn save_fixture(fx: &Fixture, options: SaveOptions) -> Vec<u8> {
    save_game(&SaveRequest {
        session: &fx.session,
        players: &fx.players,
        level: &fx.level,
        tables: fx.tables(),
        profile: &fx.profile,
        options,
        description: "fixture save",
    })
    .expect("save fixture")
}

pub(super) fn load_fixture(live: &Fixture, bytes: &[u8]) -> Result<LoadedGame, SaveError> {
    load_game(&LoadRequest {
        bytes,
        session: &live.session,
        players: &live.players,
        library: &live.library,
        tables: live.tables(),
        profile: &live.profile,
    })
}

/// A populated game with a few session and player fields moved off their
/// defaults.
pub(super) fn busy_game(mode: GameMode, seed: u64) -> Fixture {
    let mut fx = Fixture::new(mode);
    fx.populate(seed, 10);
    fx.session.map_time = 4242;
    fx.session.rules.no_monsters = true;
    let player = &mut fx.players.slots[0].player;
    player.health = 73;
    player.kill_count = 5;
    player.ready_weapon = 1;
    fx
}

fn assert_same_game(saved: &Fixture, loaded: &LoadedGame) {
    let mode = saved.session.mode;
    assert_eq!(loaded.session.mode, mode);
    assert_eq!(loaded.session.map, saved.session.map);
    assert_eq!(loaded.session.map_time, 4242);
    assert_eq!(loaded.session.rules, saved.session.rules);
    assert_eq!(loaded.session.game_id, saved.session.game_id);
    assert_eq!(loaded.header.description, "fixture save");

    let before: Vec<_> = saved.level.thinkers.iter().collect();
    let after: Vec<_> = loaded.level.thinkers.iter().collect();
    assert_eq!(before, after, "{mode:?} thinkers");
    assert_eq!(loaded.thinkers, saved.level.thinkers.len());

    // Polyobjects load at rest, and sound targets only travel where the
    // game keeps them.
    let mut expected = saved.level.map.clone();
    for po in &mut expected.polyobjs {
        po.dest_angle = po.angle;
    }
    if !saved.profile.epilogue.contains(&EpilogueSection::SoundTargets) {
        for sector in &mut expected.sectors {
            sector.sound_target = None;
        }
    }
    assert_eq!(loaded.level.map, expected, "{mode:?} map");

    if saved.profile.epilogue.contains(&EpilogueSection::Brain) {
        assert_eq!(loaded.level.brain, saved.level.brain);
    } else {
        assert!(loaded.level.brain.targets.is_empty());
    }
    assert_eq!(loaded.level.acs, saved.level.acs);
    assert_eq!(loaded.level.local_quakes, saved.level.local_quakes);

    let player = &loaded.players.slots[0].player;
    let original = &saved.players.slots[0].player;
    assert_eq!(player.state, PlayerState::Live);
    assert_eq!(player.health, 73);
    assert_eq!(player.kill_count, 5);
    assert_eq!(player.ready_weapon, original.ready_weapon);
    assert_eq!(player.mo, original.mo);
    assert_eq!(loaded.reconciliation.restored, vec![0]);
    assert!(loaded.reconciliation.missing.is_empty());
}

#[test]
fn test_roundtrip_every_game() {
    for (mode, seed) in [
        (GameMode::DoomRegistered, 1),
        (GameMode::DoomCommercial, 2),
        (GameMode::Doom64, 3),
        (GameMode::Heretic, 4),
        (GameMode::Hexen, 5),
    ] {
        let saved = busy_game(mode, seed);
        let bytes = save_fixture(&saved, SaveOptions::default());

        let mut live = Fixture::new(mode);
        live.session.game_id = 99;
        live.session.map_time = 1;
        let loaded = load_fixture(&live, &bytes).expect("load");
        assert_same_game(&saved, &loaded);
    }
}

#[test]
fn test_save_is_deterministic() {
    let fx = busy_game(GameMode::Heretic, 8);
    let a = save_fixture(&fx, SaveOptions::default());
    let b = save_fixture(&fx, SaveOptions::default());
    assert_eq!(a, b);
}

#[test]
fn test_resave_after_load_is_identical() {
    let saved = busy_game(GameMode::DoomRegistered, 12);
    let first = save_fixture(&saved, SaveOptions::default());
    let loaded = load_fixture(&Fixture::new(GameMode::DoomRegistered), &first).expect("load");

    let mut again = Fixture::new(GameMode::DoomRegistered);
    again.session = loaded.session;
    again.level = loaded.level;
    again.players = loaded.players;
    let second = save_fixture(&again, SaveOptions::default());
    assert_eq!(first, second);
}

#[test]
fn test_empty_level_roundtrip() {
    let fx = Fixture::new(GameMode::DoomRetail);
    let bytes = save_fixture(&fx, SaveOptions::default());
    let loaded = load_fixture(&Fixture::new(GameMode::DoomRetail), &bytes).expect("load");
    assert_eq!(loaded.thinkers, 0);
    assert!(loaded.level.thinkers.is_empty());
    assert_eq!(loaded.level.map, fx.level.map);
}

#[test]
fn test_without_players_bodies_are_left_out() {
    let saved = busy_game(GameMode::Heretic, 21);
    let options = SaveOptions {
        save_players: false,
        ..Default::default()
    };
    let bytes = save_fixture(&saved, options);
    let loaded = load_fixture(&Fixture::new(GameMode::Heretic), &bytes).expect("load");

    assert!(!loaded.header.players_present[0]);
    assert_eq!(loaded.thinkers, saved.level.thinkers.len() - 1);
    assert!(loaded.level.thinkers.mobjs().all(|(_, mo)| mo.player.is_none()));
    // The connected player was not in the save and keeps a fresh record.
    assert_eq!(loaded.reconciliation.missing, vec![0]);
    assert_eq!(loaded.players.slots[0].player.mo, None);
}

#[test]
fn test_netgame_matches_players_by_net_id() {
    let mut saved = busy_game(GameMode::DoomCommercial, 31);
    saved.session.netgame = true;
    saved.players.join(2, 77);
    saved.players.slots[2].player.health = 12;
    let bytes = save_fixture(&saved, SaveOptions::default());

    // Net id 77 now sits in slot 5, and net id 1 is gone.
    let mut live = Fixture::new(GameMode::DoomCommercial);
    live.session.netgame = true;
    live.players.slots[0].in_game = false;
    live.players.join(5, 77);
    let loaded = load_fixture(&live, &bytes).expect("load");

    assert_eq!(loaded.reconciliation.restored, vec![5]);
    assert_eq!(loaded.reconciliation.dropped, 1);
    assert_eq!(loaded.players.slots[5].player.health, 12);
    // Player 0's body had nobody to drive it.
    assert!(loaded.level.thinkers.mobjs().all(|(_, mo)| mo.player != Some(0)));
}

#[test]
fn test_save_info_reads_header_only() {
    let saved = busy_game(GameMode::Hexen, 40);
    let bytes = save_fixture(&saved, SaveOptions::default());

    let info = read_save_info(&bytes, &saved.profile, GameMode::Hexen).expect("info");
    assert!(info.loadable);
    assert_eq!(info.header.description, "fixture save");
    assert_eq!(info.header.map, saved.session.map);
    assert_eq!(info.header.map_time, 4242);

    let other = read_save_info(&bytes, &saved.profile, GameMode::DoomRegistered).expect("info");
    assert!(!other.loadable);
}
