//! Standalone HTML rendering of a whole playlist, for printing or for viewing
//! on a device without a terminal.

use std::fmt::Write as _;

use crate::chordpro::{escape_html, format_song};
use crate::models::{format_duration, Field, Playlist};

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:auto;line-height:1.6}\
.chord{color:#b36b00;font-weight:bold;padding:0 .15em}\
.section-header{font-weight:bold;letter-spacing:.05em;margin-bottom:.3em}\
.lyrics-section{padding:.6em 1em;margin:.4em 0}\
.section-light{background:#fff}.section-dark{background:#eee}\
.song{page-break-after:always}.meta{color:#666}";

/// Render every song of `playlist` into one HTML document.
pub fn playlist_to_html(playlist: &Playlist) -> String {
    let mut html = String::new();
    let title = escape_html(&playlist.name);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>\n<h1>{title}</h1>\n"
    );

    for (index, song) in playlist.songs.iter().enumerate() {
        let _ = write!(
            html,
            "<section class=\"song\"><h2>{}</h2>",
            escape_html(&song.display_title(index))
        );

        let mut meta = Vec::new();
        if let Some(key) = song.get(Field::Key) {
            meta.push(format!("Key {}", key.trim()));
        }
        if let Some(capo) = song.get(Field::Capo) {
            meta.push(format!("Capo {}", capo.trim()));
        }
        if let Some(tempo) = song.get(Field::Tempo) {
            meta.push(format!("{} BPM", tempo.trim()));
        }
        if let Some(duration) = song.get(Field::Duration).map(format_duration) {
            if !duration.is_empty() {
                meta.push(duration);
            }
        }
        if !meta.is_empty() {
            let _ = write!(html, "<p class=\"meta\">{}</p>", escape_html(&meta.join(" \u{b7} ")));
        }

        html.push_str(&format_song(song.lyrics()).to_html());
        html.push_str("</section>\n");
    }

    html.push_str("</body></html>\n");
    html
}
