//! Ratatui front-end: the lyrics pane with its title bar, info panel and
//! footer, plus the playlist overlay and the open-file prompt.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
