//! Binary entry point that glues the SQLite-backed settings to the TUI: parse
//! flags, start logging, restore the last playlist and preferences, then drive
//! the Ratatui event loop until the user exits.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chordpro_viewer::export::playlist_to_html;
use chordpro_viewer::scroll::{ScrollConfig, DEFAULT_PREROLL_SECS};
use chordpro_viewer::{
    data_dir, ensure_schema, load_playlist, load_playlist_file, load_preferences, run_app, App,
    Session,
};
use clap::Parser;

const LOG_FILE_NAME: &str = "viewer.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal ChordPro setlist viewer", long_about = None)]
struct Cli {
    /// Playlist CSV to open; defaults to the last playlist loaded
    playlist: Option<PathBuf>,
    /// Seconds to count in before auto-scroll starts at the top of a song
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_PREROLL_SECS)]
    preroll: u64,
    /// Write the playlist as a standalone HTML file and exit
    #[arg(long, value_name = "OUT.html")]
    export_html: Option<PathBuf>,
    /// Directory for the settings database and log file
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = data_dir(cli.data_dir.as_deref())?;
    init_logging(&data_dir)?;
    log::info!("chordpro-viewer starting, data in {}", data_dir.display());

    let conn = ensure_schema(&data_dir)?;

    if let Some(out) = &cli.export_html {
        let playlist = match &cli.playlist {
            Some(path) => load_playlist_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => match load_playlist(&conn)? {
                Some(playlist) => playlist,
                None => bail!("no playlist given and none stored from a previous session"),
            },
        };
        fs::write(out, playlist_to_html(&playlist))
            .with_context(|| format!("failed to write {}", out.display()))?;
        log::info!("exported '{}' to {}", playlist.name, out.display());
        return Ok(());
    }

    let prefs = load_preferences(&conn)?;
    let mut session = Session::new(ScrollConfig::with_preroll_secs(cli.preroll), prefs);
    if let Some(playlist) = load_playlist(&conn)? {
        session.load_playlist(playlist, 0);
    }

    let mut app = App::new(conn, session);
    if let Some(path) = &cli.playlist {
        app.open_path(path);
    }
    run_app(&mut app)
}

/// Log to a file in the data directory; writing to stderr would tear the
/// alternate screen. Set `RUST_LOG=debug` for verbose output.
fn init_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;
    let log_path = data_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
