//! Persistence: a single key-value `settings` table in SQLite holding the last
//! playlist and the display preferences.

mod connection;
mod settings;

pub use connection::{data_dir, ensure_schema, open_in_memory};
pub use settings::{
    get_setting, load_playlist, load_preferences, save_playlist, save_preferences, set_setting,
};
