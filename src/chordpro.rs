//! ChordPro-style lyric formatting.
//!
//! Lyrics arrive as one CSV cell, so line breaks are frequently escaped as a
//! literal backslash-n. The formatter turns that text into a small document
//! model (`RenderedSong`) which the terminal layout consumes, and which can
//! also be written out as inert HTML markup for the export command.

use std::fmt::Write as _;
use std::ops::Range;

/// Message shown in place of a song that has no lyrics column.
pub const NO_LYRICS_MESSAGE: &str = "No lyrics available for this song";

/// Alternating background assigned to sections by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    Light,
    Dark,
}

impl SectionStyle {
    /// Even positions are light, odd positions dark.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            SectionStyle::Light
        } else {
            SectionStyle::Dark
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            SectionStyle::Light => "section-light",
            SectionStyle::Dark => "section-dark",
        }
    }
}

/// A run of lyric text or an inline chord annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Chord(String),
}

/// One lyric line made of text and chord segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricLine {
    pub segments: Vec<Segment>,
}

impl LyricLine {
    /// Line text with chords written back in bracket form.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Chord(chord) => {
                    out.push('[');
                    out.push_str(chord);
                    out.push(']');
                }
            }
        }
        out
    }
}

/// A blank-line separated block of the song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub style: SectionStyle,
    /// Uppercased label taken from a leading `{label}` marker.
    pub header: Option<String>,
    pub lines: Vec<LyricLine>,
}

/// The formatted song. When `message` is set there are no sections and the
/// message is shown instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSong {
    pub sections: Vec<Section>,
    pub message: Option<&'static str>,
}

impl RenderedSong {
    fn placeholder() -> Self {
        Self {
            sections: Vec::new(),
            message: Some(NO_LYRICS_MESSAGE),
        }
    }

    /// Render the song as HTML fragments with the viewer's CSS classes.
    pub fn to_html(&self) -> String {
        if let Some(message) = self.message {
            return escape_html(message);
        }
        let mut html = String::new();
        for section in &self.sections {
            let _ = write!(
                html,
                "<div class=\"lyrics-section {}\">",
                section.style.css_class()
            );
            if let Some(header) = &section.header {
                let _ = write!(
                    html,
                    "<div class=\"section-header\">{}</div>",
                    escape_html(header)
                );
            }
            for (idx, line) in section.lines.iter().enumerate() {
                if idx > 0 {
                    html.push_str("<br>");
                }
                for segment in &line.segments {
                    match segment {
                        Segment::Text(text) => html.push_str(&escape_html(text)),
                        Segment::Chord(chord) => {
                            let _ = write!(
                                html,
                                "<span class=\"chord\">{}</span>",
                                escape_html(chord)
                            );
                        }
                    }
                }
            }
            html.push_str("</div>");
        }
        html
    }
}

/// Format a song's lyrics. `None` or blank input yields the placeholder.
pub fn format_song(lyrics: Option<&str>) -> RenderedSong {
    let Some(lyrics) = lyrics else {
        return RenderedSong::placeholder();
    };
    let normalized = normalize_newlines(lyrics);
    let text = normalized.trim();
    if text.is_empty() {
        return RenderedSong::placeholder();
    }

    let sections = split_sections(text)
        .into_iter()
        .enumerate()
        .map(|(index, block)| build_section(index, block))
        .collect();

    RenderedSong {
        sections,
        message: None,
    }
}

/// Turn escaped `\n` sequences and carriage returns into plain line breaks.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Split on blank lines (a newline, optional whitespace, a newline). Runs of
/// blank lines count as a single boundary.
fn split_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut block: Option<(usize, usize)> = None;
    let mut offset = 0;

    for line in text.split('\n') {
        let start = offset;
        let end = start + line.len();
        offset = end + 1;
        if line.trim().is_empty() {
            if let Some((from, to)) = block.take() {
                sections.push(&text[from..to]);
            }
        } else {
            block = Some(match block {
                Some((from, _)) => (from, end),
                None => (start, end),
            });
        }
    }
    if let Some((from, to)) = block {
        sections.push(&text[from..to]);
    }
    sections
}

fn build_section(index: usize, block: &str) -> Section {
    let mut content = block.trim();
    let mut header = None;

    if let Some((label, rest)) = split_label(content) {
        header = Some(clean_label(label));
        content = rest.trim_start();
    }

    let lines = if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').map(parse_line).collect()
    };

    Section {
        style: SectionStyle::for_index(index),
        header,
        lines,
    }
}

/// Split a leading `{label}` marker off a section.
fn split_label(content: &str) -> Option<(&str, &str)> {
    let inner = content.strip_prefix('{')?;
    let close = inner.find('}')?;
    if close == 0 {
        return None;
    }
    Some((&inner[..close], &inner[close + 1..]))
}

/// Uppercase a section label and drop a `C:` comment prefix.
fn clean_label(label: &str) -> String {
    let upper = label.to_uppercase();
    match upper.strip_prefix("C:") {
        Some(rest) => rest.trim_start().to_string(),
        None => upper,
    }
}

/// Locate the first well-formed `[chord]` token in `text`, returning the byte
/// range of the whole token and of the chord inside it. Empty brackets and
/// brackets that are reopened or cross a line break are not chords.
pub(crate) fn find_chord(text: &str) -> Option<(Range<usize>, Range<usize>)> {
    let mut search = 0;
    while let Some(found) = text[search..].find('[') {
        let inner = search + found + 1;
        let after = &text[inner..];
        match after.find([']', '[', '\n']) {
            Some(len) if len > 0 && after.as_bytes()[len] == b']' => {
                return Some((inner - 1..inner + len + 1, inner..inner + len));
            }
            _ => search = inner,
        }
    }
    None
}

/// Break a line into text and `[chord]` segments. Text outside brackets is
/// kept verbatim; malformed brackets stay literal.
pub fn parse_line(line: &str) -> LyricLine {
    let mut segments = Vec::new();
    let mut rest = line.trim_end();

    while let Some((token, chord)) = find_chord(rest) {
        if token.start > 0 {
            segments.push(Segment::Text(rest[..token.start].to_string()));
        }
        segments.push(Segment::Chord(rest[chord].to_string()));
        rest = &rest[token.end..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    LyricLine { segments }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
