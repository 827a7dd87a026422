//! Core library surface for the ChordPro viewer TUI.
//!
//! The modules below hold everything that does not need a terminal: playlist
//! loading, lyric formatting, layout, transposition and the timer-driven
//! playback model. The `ui` module wires them to ratatui, and `main.rs` only
//! parses flags and opens the store.
pub mod autoplay;
pub mod chordpro;
pub mod db;
pub mod error;
pub mod export;
pub mod input;
pub mod layout;
pub mod models;
pub mod playlist;
pub mod prefs;
pub mod scheduler;
pub mod scroll;
pub mod session;
pub mod transpose;
pub mod ui;

/// Convenience re-exports for the persistence layer, used by `main.rs` to
/// open the embedded SQLite store and restore the last session.
pub use db::{data_dir, ensure_schema, load_playlist, load_preferences};

/// The primary domain types other layers manipulate.
pub use error::PlaylistError;
pub use models::{Playlist, SongRecord};
pub use playlist::load_playlist_file;
pub use session::{Action, Session};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
