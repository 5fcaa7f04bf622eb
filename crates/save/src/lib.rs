pub mod archive_session;
mod atomic_write;
pub mod epilogue;
mod exclusive_load;
mod exclusive_save;
pub mod file_header;
pub mod game_profile;
mod hexen_records;
pub mod material_archive;
pub mod mobj_archive;
pub mod mobj_migrate;
pub mod player_archive;
pub mod save_codec;
pub mod save_config;
pub mod save_error;
pub mod save_game;
pub mod save_header;
mod save_plugin;
pub mod save_version;
pub mod segments;
mod special_records;
pub mod thing_archive;
pub mod thinker_registry;
pub mod thinker_stream;
pub mod world_archive;

#[cfg(test)]
mod test_fixtures;

pub use archive_session::GameTables;
pub use game_profile::GameProfile;
pub use save_config::{NetRole, SaveConfig, SaveOptions};
pub use save_error::SaveError;
pub use save_game::{load_game, read_save_info, save_game, LoadRequest, LoadedGame, SaveRequest};
pub use save_header::SaveInfo;
pub use save_plugin::{LoadGameEvent, SaveGameEvent, SavePlugin};
