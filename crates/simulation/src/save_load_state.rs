//! Global save/load state machine.
//!
//! [`SaveLoadState`] keeps gameplay and save/load apart. Play-simulation
//! systems run only while the state is [`SaveLoadState::Idle`]; the save
//! crate switches to `Saving` or `Loading` for exactly one exclusive system
//! run and always comes back to `Idle`.
//!
//! The state lives here rather than in `save` so simulation systems can add
//! `run_if(in_state(SaveLoadState::Idle))` guards without a dependency cycle.

use bevy::prelude::*;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveLoadState {
    /// Normal play.
    #[default]
    Idle,
    Saving,
    Loading,
}
