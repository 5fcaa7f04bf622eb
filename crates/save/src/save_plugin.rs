use bevy::prelude::*;
use simulation::materials::MaterialRegistry;
use simulation::mobj::{MobjInfoTable, StateTable};
use simulation::notifications::NotificationEvent;
use simulation::SaveLoadState;

use crate::archive_session::GameTables;
use crate::save_config::{SaveConfig, SaveOptions};
use crate::save_error::SaveError;

// ---------------------------------------------------------------------------
// Buffer resources
// ---------------------------------------------------------------------------

/// Raw bytes read from a save slot, waiting for the exclusive load system.
#[derive(Resource, Default)]
pub(crate) struct PendingLoadBytes(pub(crate) Option<Vec<u8>>);

/// The save request the exclusive save system will serve.
#[derive(Resource, Default)]
pub(crate) struct PendingSaveRequest(pub(crate) Option<SaveGameEvent>);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone)]
pub struct SaveGameEvent {
    pub slot: usize,
    pub description: String,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LoadGameEvent {
    pub slot: usize,
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SaveGameEvent>()
            .add_event::<LoadGameEvent>()
            .init_resource::<SaveConfig>()
            .init_resource::<SaveOptions>()
            .init_resource::<PendingLoadBytes>()
            .init_resource::<PendingSaveRequest>();

        // Requests are only picked up during normal play.
        app.add_systems(
            Update,
            (detect_save_event, detect_load_event).run_if(in_state(SaveLoadState::Idle)),
        );

        // Each exclusive system runs once on entry, owns the world for the
        // whole operation and sends the state back to Idle.
        app.add_systems(
            OnEnter(SaveLoadState::Saving),
            crate::exclusive_save::exclusive_save,
        );
        app.add_systems(
            OnEnter(SaveLoadState::Loading),
            crate::exclusive_load::exclusive_load,
        );
    }
}

// ---------------------------------------------------------------------------
// Event detection systems (lightweight, run in Update)
// ---------------------------------------------------------------------------

fn check_slot(config: &SaveConfig, slot: usize) -> Result<(), SaveError> {
    if slot >= config.slots {
        return Err(SaveError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("there is no save slot {slot} (have {})", config.slots),
        )));
    }
    Ok(())
}

/// Detects `SaveGameEvent`, stores the request and transitions to `Saving`.
fn detect_save_event(
    mut events: EventReader<SaveGameEvent>,
    mut next_state: ResMut<NextState<SaveLoadState>>,
    mut pending: ResMut<PendingSaveRequest>,
    config: Res<SaveConfig>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    // Only the last request of a frame is served.
    let Some(request) = events.read().last().cloned() else {
        return;
    };
    if let Err(e) = check_slot(&config, request.slot) {
        let msg = format!("Save failed: {e}");
        error!("{msg}");
        notifications.send(NotificationEvent::warning(msg));
        return;
    }
    pending.0 = Some(request);
    next_state.set(SaveLoadState::Saving);
}

/// Detects `LoadGameEvent`, reads the slot file and transitions to
/// `Loading`. A missing or unreadable file never leaves `Idle`.
fn detect_load_event(
    mut events: EventReader<LoadGameEvent>,
    mut next_state: ResMut<NextState<SaveLoadState>>,
    mut pending: ResMut<PendingLoadBytes>,
    config: Res<SaveConfig>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let Some(request) = events.read().last().copied() else {
        return;
    };
    let read = check_slot(&config, request.slot).and_then(|()| {
        let path = config.slot_path(request.slot);
        std::fs::read(&path).map_err(SaveError::from)
    });
    match read {
        Ok(bytes) => {
            pending.0 = Some(bytes);
            next_state.set(SaveLoadState::Loading);
        }
        Err(e) => {
            let msg = format!("Load failed: {e}");
            error!("{msg}");
            notifications.send(NotificationEvent::warning(msg));
        }
    }
}

// ---------------------------------------------------------------------------
// World access helpers
// ---------------------------------------------------------------------------

pub(crate) fn require<R: Resource>(world: &World) -> Result<&R, SaveError> {
    world
        .get_resource::<R>()
        .ok_or_else(|| SaveError::MissingResource(std::any::type_name::<R>().to_string()))
}

pub(crate) fn game_tables(world: &World) -> Result<GameTables<'_>, SaveError> {
    Ok(GameTables {
        materials: require::<MaterialRegistry>(world)?,
        infos: require::<MobjInfoTable>(world)?,
        states: require::<StateTable>(world)?,
    })
}
