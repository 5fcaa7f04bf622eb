use bevy::prelude::*;
use simulation::map::MapLibrary;
use simulation::notifications::{NotificationEvent, NotificationPriority};
use simulation::{GameSession, Players, SaveLoadState};

use crate::game_profile::GameProfile;
use crate::save_error::SaveError;
use crate::save_game::{load_game, LoadRequest, LoadedGame};
use crate::save_plugin::{game_tables, require, PendingLoadBytes};

/// Exclusive system that performs the entire load operation with full world
/// access.  The live game is only replaced once the whole save has been read.
/// Runs on `OnEnter(SaveLoadState::Loading)`, then transitions back to `Idle`.
pub(crate) fn exclusive_load(world: &mut World) {
    if let Err(e) = exclusive_load_inner(world) {
        let msg = format!("Load failed: {e}");
        error!("{msg}");
        world.send_event(NotificationEvent::warning(msg));
    }

    // Always transition back to Idle, even on error.
    world
        .resource_mut::<NextState<SaveLoadState>>()
        .set(SaveLoadState::Idle);
}

fn exclusive_load_inner(world: &mut World) -> Result<(), SaveError> {
    let bytes = world.resource_mut::<PendingLoadBytes>().0.take();
    let bytes = bytes.ok_or(SaveError::NoData)?;

    // -- Stage 1: Read the save into a fresh level and players --
    let loaded = {
        let session = require::<GameSession>(world)?;
        let profile = GameProfile::for_mode(session.mode);
        load_game(&LoadRequest {
            bytes: &bytes,
            session,
            players: require::<Players>(world)?,
            library: require::<MapLibrary>(world)?,
            tables: game_tables(world)?,
            profile: &profile,
        })?
    };

    // -- Stage 2: Swap the loaded game in --
    let LoadedGame {
        header,
        session,
        level,
        players,
        reconciliation,
        ..
    } = loaded;
    world.insert_resource(level);
    world.insert_resource(players);
    world.insert_resource(session);

    // -- Stage 3: Tell players who were not in the save --
    for slot in reconciliation.missing {
        world.send_event(NotificationEvent {
            text: "You were not in the saved game; starting fresh".to_string(),
            priority: NotificationPriority::Warning,
            player: Some(slot),
        });
    }
    world.send_event(NotificationEvent::info(format!(
        "Game loaded: {}",
        header.description
    )));

    Ok(())
}
