use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Playlist;
use crate::playlist::DEFAULT_PLAYLIST_NAME;
use crate::prefs::DisplayPreferences;

const PLAYLIST_CSV: &str = "playlist_csv";
const PLAYLIST_NAME: &str = "playlist_name";
const THEME_MODE: &str = "theme_mode";
const THEME_COLOR: &str = "theme_color";
const FONT_SIZE: &str = "font_size";
const LINE_HEIGHT: &str = "line_height";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read setting '{key}'"))
}

/// Insert or overwrite a single setting.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write setting '{key}'"))?;
    Ok(())
}

/// Store the playlist's raw CSV and name so it can be reopened at startup.
pub fn save_playlist(conn: &Connection, playlist: &Playlist) -> Result<()> {
    set_setting(conn, PLAYLIST_CSV, &playlist.source)?;
    set_setting(conn, PLAYLIST_NAME, &playlist.name)
}

/// The last stored playlist. A stored CSV that no longer parses is logged and
/// treated as absent.
pub fn load_playlist(conn: &Connection) -> Result<Option<Playlist>> {
    let Some(csv_text) = get_setting(conn, PLAYLIST_CSV)? else {
        return Ok(None);
    };
    let name = get_setting(conn, PLAYLIST_NAME)?
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string());

    match Playlist::from_csv(name, csv_text) {
        Ok(playlist) => Ok(Some(playlist)),
        Err(err) => {
            log::warn!("ignoring stored playlist: {err}");
            Ok(None)
        }
    }
}

pub fn save_preferences(conn: &Connection, prefs: &DisplayPreferences) -> Result<()> {
    set_setting(conn, THEME_MODE, prefs.theme.as_str())?;
    set_setting(conn, THEME_COLOR, prefs.accent.as_str())?;
    set_setting(conn, FONT_SIZE, &prefs.font_size.to_string())?;
    set_setting(conn, LINE_HEIGHT, &prefs.line_height.to_string())
}

/// Stored preferences, with defaults for anything missing or unparseable.
pub fn load_preferences(conn: &Connection) -> Result<DisplayPreferences> {
    let defaults = DisplayPreferences::default();
    let prefs = DisplayPreferences {
        font_size: parsed_setting(conn, FONT_SIZE)?.unwrap_or(defaults.font_size),
        line_height: parsed_setting(conn, LINE_HEIGHT)?.unwrap_or(defaults.line_height),
        theme: parsed_setting(conn, THEME_MODE)?.unwrap_or(defaults.theme),
        accent: parsed_setting(conn, THEME_COLOR)?.unwrap_or(defaults.accent),
    };
    Ok(prefs.sanitized())
}

fn parsed_setting<T: FromStr>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let Some(raw) = get_setting(conn, key)? else {
        return Ok(None);
    };
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        log::warn!("ignoring unparseable setting {key}={raw:?}");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::prefs::{Accent, ThemeMode, MAX_FONT_SIZE};

    #[test]
    fn settings_overwrite_in_place() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_setting(&conn, "x").unwrap(), None);
        set_setting(&conn, "x", "1").unwrap();
        set_setting(&conn, "x", "2").unwrap();
        assert_eq!(get_setting(&conn, "x").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn preferences_round_trip() {
        let conn = open_in_memory().unwrap();
        let prefs = DisplayPreferences {
            font_size: 24.0,
            line_height: 2.1,
            theme: ThemeMode::Light,
            accent: Accent::Cyan,
        };
        save_preferences(&conn, &prefs).unwrap();
        assert_eq!(load_preferences(&conn).unwrap(), prefs);
    }

    #[test]
    fn bad_stored_preferences_fall_back() {
        let conn = open_in_memory().unwrap();
        set_setting(&conn, FONT_SIZE, "huge").unwrap();
        set_setting(&conn, THEME_MODE, "sepia").unwrap();
        set_setting(&conn, LINE_HEIGHT, "99").unwrap();
        let prefs = load_preferences(&conn).unwrap();
        assert_eq!(prefs.font_size, DisplayPreferences::default().font_size);
        assert_eq!(prefs.theme, ThemeMode::Dark);
        assert_eq!(prefs.line_height, 3.0);
        assert!(prefs.font_size <= MAX_FONT_SIZE);
    }

    #[test]
    fn playlist_survives_a_restart() {
        let conn = open_in_memory().unwrap();
        assert!(load_playlist(&conn).unwrap().is_none());

        let playlist = Playlist::from_csv("Sunday Set", "title\nOne\nTwo\n").unwrap();
        save_playlist(&conn, &playlist).unwrap();
        let restored = load_playlist(&conn).unwrap().unwrap();
        assert_eq!(restored.name, "Sunday Set");
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn corrupt_stored_playlist_is_ignored() {
        let conn = open_in_memory().unwrap();
        set_setting(&conn, PLAYLIST_CSV, "title\n").unwrap();
        assert!(load_playlist(&conn).unwrap().is_none());
    }
}
