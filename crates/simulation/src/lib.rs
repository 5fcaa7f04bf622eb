use bevy::prelude::*;

pub mod config;
pub mod game_mode;
pub mod level;
pub mod map;
pub mod materials;
pub mod mobj;
pub mod notifications;
pub mod player;
pub mod save_load_state;
pub mod specials;
pub mod thinker;

pub use game_mode::{GameMode, GameSession, GameVariant, MapId};
pub use level::Level;
pub use player::Players;
pub use save_load_state::SaveLoadState;

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SaveLoadState>()
            .init_resource::<GameSession>()
            .init_resource::<materials::MaterialRegistry>()
            .init_resource::<mobj::MobjInfoTable>()
            .init_resource::<mobj::StateTable>()
            .init_resource::<map::MapLibrary>()
            .init_resource::<Level>()
            .init_resource::<Players>()
            .add_plugins(notifications::NotificationsPlugin)
            .add_systems(
                FixedUpdate,
                advance_map_time.run_if(in_state(SaveLoadState::Idle)),
            );
    }
}

fn advance_map_time(mut session: ResMut<GameSession>) {
    session.map_time += 1;
}
