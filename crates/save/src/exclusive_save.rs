use bevy::prelude::*;
use simulation::notifications::NotificationEvent;
use simulation::{GameSession, Level, Players, SaveLoadState};

use crate::atomic_write::atomic_write;
use crate::game_profile::GameProfile;
use crate::save_config::{SaveConfig, SaveOptions};
use crate::save_error::SaveError;
use crate::save_game::{save_game, SaveRequest};
use crate::save_plugin::{game_tables, require, PendingSaveRequest};

/// Exclusive system that performs the entire save operation with full world
/// access.  Runs on `OnEnter(SaveLoadState::Saving)`, then transitions back
/// to `Idle`.
pub(crate) fn exclusive_save(world: &mut World) {
    match exclusive_save_inner(world) {
        Ok(msg) => {
            world.send_event(NotificationEvent::info(msg));
        }
        Err(e) => {
            let msg = format!("Save failed: {e}");
            error!("{msg}");
            world.send_event(NotificationEvent::warning(msg));
        }
    }

    // Always transition back to Idle, even on error.
    world
        .resource_mut::<NextState<SaveLoadState>>()
        .set(SaveLoadState::Idle);
}

fn exclusive_save_inner(world: &mut World) -> Result<String, SaveError> {
    let request = world
        .resource_mut::<PendingSaveRequest>()
        .0
        .take()
        .ok_or_else(|| SaveError::MissingResource("save request".to_string()))?;

    // -- Stage 1: Serialize the live game --
    let bytes = {
        let session = require::<GameSession>(world)?;
        let profile = GameProfile::for_mode(session.mode);
        save_game(&SaveRequest {
            session,
            players: require::<Players>(world)?,
            level: require::<Level>(world)?,
            tables: game_tables(world)?,
            profile: &profile,
            options: *require::<SaveOptions>(world)?,
            description: &request.description,
        })?
    };

    // -- Stage 2: Write the slot file --
    let path = require::<SaveConfig>(world)?.slot_path(request.slot);
    atomic_write(&path, &bytes)?;
    info!("Saved {} bytes to {path}", bytes.len());

    Ok(format!("Game saved: {}", request.description))
}
