//! Domain models for a loaded setlist. A `SongRecord` keeps every CSV column
//! it was parsed from; the logical fields the viewer cares about are resolved
//! on demand through the synonym table on `Field`, so spreadsheets exported
//! from different tools (one says `bpm`, another says `tempo`) all work.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Tempo assumed when a song has no usable tempo column.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;
/// Song length assumed when a song has no usable duration column.
pub const DEFAULT_DURATION_SECS: f64 = 160.0;

/// Logical song attributes recognized by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Lyrics,
    Key,
    Tempo,
    Duration,
    Capo,
    Chords,
}

impl Field {
    /// Normalized column names for this field, highest priority first.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Title => &["title", "name", "song", "songname"],
            Field::Lyrics => &["lyrics", "content", "text", "chordpro", "song_content"],
            Field::Key => &["key", "songkey", "chord_key"],
            Field::Tempo => &["tempo", "bpm", "speed"],
            Field::Duration => &["duration", "length", "time"],
            Field::Capo => &["capo", "capo_fret"],
            Field::Chords => &["chords", "chord_progression", "chord_sequence"],
        }
    }
}

/// Normalize a CSV header so lookups ignore case and stray whitespace.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One row of the setlist, keyed by normalized column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongRecord {
    columns: HashMap<String, String>,
}

impl SongRecord {
    /// Build a record from `(column, value)` pairs. Column names are
    /// normalized here so callers can pass raw headers. When two columns
    /// normalize to the same name, the first non-blank value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut columns: HashMap<String, String> = HashMap::new();
        for (key, value) in pairs {
            let value = value.into();
            match columns.entry(normalize_column(key.as_ref())) {
                Entry::Occupied(mut slot) => {
                    if slot.get().trim().is_empty() && !value.trim().is_empty() {
                        slot.insert(value);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
        Self { columns }
    }

    /// Raw access to a column by (already normalized or raw) name.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(&normalize_column(name)).map(String::as_str)
    }

    /// Resolve a logical field: the first synonym with a non-blank value wins.
    pub fn get(&self, field: Field) -> Option<&str> {
        field
            .synonyms()
            .iter()
            .filter_map(|name| self.columns.get(*name))
            .map(String::as_str)
            .find(|value| !value.trim().is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.get(Field::Title).map(str::trim)
    }

    /// Title used in lists, falling back to a 1-based placeholder.
    pub fn display_title(&self, index: usize) -> String {
        match self.title() {
            Some(title) => title.to_string(),
            None => format!("Song {}", index + 1),
        }
    }

    pub fn lyrics(&self) -> Option<&str> {
        self.get(Field::Lyrics)
    }

    /// Tempo in beats per minute. Non-numeric or non-positive values fall back
    /// to [`DEFAULT_TEMPO_BPM`].
    pub fn tempo_bpm(&self) -> f64 {
        self.get(Field::Tempo)
            .and_then(leading_number)
            .filter(|bpm| *bpm > 0.0)
            .unwrap_or(DEFAULT_TEMPO_BPM)
    }

    /// Song length in seconds, when the duration column holds `SS` or `M:SS`.
    pub fn duration_secs(&self) -> Option<f64> {
        self.get(Field::Duration).and_then(parse_duration)
    }
}

/// Parse `SS`, `M:SS` or `H:MM:SS` into seconds.
pub fn parse_duration(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.contains(':') {
        let mut total = 0.0;
        for part in raw.split(':') {
            let value: f64 = part.trim().parse().ok()?;
            if value < 0.0 {
                return None;
            }
            total = total * 60.0 + value;
        }
        return Some(total);
    }
    leading_number(raw).filter(|secs| *secs >= 0.0)
}

/// Render seconds as `M:SS`. Returns an empty string when the value is not a
/// number, so the caller can simply skip the line.
pub fn format_duration(raw: &str) -> String {
    match parse_duration(raw) {
        Some(secs) => {
            let secs = secs.floor() as u64;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => String::new(),
    }
}

/// Parse the numeric prefix of a string (`"128 bpm"` -> 128).
fn leading_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(idx, ch)| !(ch.is_ascii_digit() || *ch == '.' || (*idx == 0 && *ch == '-')))
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// An ordered setlist. Replaced wholesale on every load.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub name: String,
    pub songs: Vec<SongRecord>,
    /// The CSV text the playlist was parsed from, kept so it can be persisted
    /// and reloaded at the next start.
    pub source: String,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SongRecord> {
        self.songs.get(index)
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
