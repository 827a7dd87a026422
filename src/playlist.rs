//! CSV setlist loading. Parsing is delegated to the `csv` crate; this module
//! only normalizes headers, drops blank rows and decides whether the result is
//! usable at all. A load either produces a complete playlist or an error; there
//! is no partial recovery.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info, warn};

use crate::error::PlaylistError;
use crate::models::{normalize_column, Playlist, SongRecord};

/// Name shown when a playlist did not come from a named file.
pub const DEFAULT_PLAYLIST_NAME: &str = "Playlist";

/// Parse CSV text with a header row into song records.
pub fn parse_playlist(csv_text: &str) -> Result<Vec<SongRecord>, PlaylistError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_column)
        .collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(PlaylistError::Empty);
    }

    let mut rows = 0usize;
    let mut songs = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping unreadable CSV row {}: {err}", line + 2);
                continue;
            }
        };
        rows += 1;
        if record.iter().all(|value| value.trim().is_empty()) {
            debug!("dropping blank CSV row {}", line + 2);
            continue;
        }
        songs.push(SongRecord::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.as_str(), value)),
        ));
    }

    if rows == 0 {
        return Err(PlaylistError::Empty);
    }
    if songs.is_empty() {
        return Err(PlaylistError::NoSongs);
    }
    Ok(songs)
}

impl Playlist {
    /// Parse a playlist from CSV text that is already in memory (for example a
    /// copy restored from the settings store).
    pub fn from_csv(
        name: impl Into<String>,
        csv_text: impl Into<String>,
    ) -> Result<Self, PlaylistError> {
        let source = csv_text.into();
        let songs = parse_playlist(&source)?;
        Ok(Self {
            name: name.into(),
            songs,
            source,
        })
    }
}

/// Read and parse a `.csv` file from disk.
pub fn load_playlist_file(path: &Path) -> Result<Playlist, PlaylistError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(PlaylistError::NotCsv(path.to_path_buf()));
    }

    let text = fs::read_to_string(path).map_err(|source| PlaylistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let playlist = Playlist::from_csv(playlist_name_from_path(path), text)?;
    info!(
        "loaded playlist '{}' with {} songs from {}",
        playlist.name,
        playlist.len(),
        path.display()
    );
    Ok(playlist)
}

/// Turn `sunday-set_list.csv` into `sunday set list`.
pub fn playlist_name_from_path(path: &Path) -> String {
    let file_name = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return DEFAULT_PLAYLIST_NAME.to_string(),
    };
    let cut = file_name.len().saturating_sub(4);
    let stem = match file_name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".csv") => &file_name[..cut],
        _ => file_name,
    };
    let name = stem.replace(['-', '_'], " ");
    if name.trim().is_empty() {
        DEFAULT_PLAYLIST_NAME.to_string()
    } else {
        name
    }
}
