//! Turns a [`RenderedSong`] into terminal rows.
//!
//! The terminal cannot change its font, so a larger text scale narrows the
//! wrap column instead, and line spacing is expressed as blank rows spread
//! evenly between lyric lines. Everything downstream (scroll offsets, section
//! jumps, auto-scroll pacing) counts these rows.

use crate::chordpro::{LyricLine, RenderedSong, Section, SectionStyle, Segment};
use crate::prefs::{DisplayPreferences, DEFAULT_FONT_SIZE};

/// Text scale at which the wrap width equals the pane width.
pub const BASE_TEXT_SCALE: f64 = DEFAULT_FONT_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Lyric,
    /// Extra row inserted by line spacing.
    Spacer,
    /// Blank row after a section.
    Separator,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub kind: RowKind,
    /// Background of the section this row belongs to.
    pub style: Option<SectionStyle>,
    pub segments: Vec<Segment>,
}

impl Row {
    fn blank(kind: RowKind, style: Option<SectionStyle>) -> Self {
        Self {
            kind,
            style,
            segments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongLayout {
    pub rows: Vec<Row>,
    /// First row of every section, ascending.
    pub section_starts: Vec<usize>,
    pub wrap_width: usize,
}

impl SongLayout {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// First section start more than `threshold` rows below `offset`.
    pub fn next_section_start(&self, offset: usize, threshold: usize) -> Option<usize> {
        self.section_starts
            .iter()
            .copied()
            .find(|start| *start > offset + threshold)
    }

    /// Last section start more than `threshold` rows above `offset`.
    pub fn previous_section_start(&self, offset: usize, threshold: usize) -> Option<usize> {
        self.section_starts
            .iter()
            .rev()
            .copied()
            .find(|start| start + threshold < offset)
    }
}

/// Columns available to text at the given pane width and text scale.
pub fn wrap_width(width: u16, font_size: f64) -> usize {
    let scale = if font_size.is_finite() && font_size > 0.0 {
        font_size
    } else {
        BASE_TEXT_SCALE
    };
    (f64::from(width) * BASE_TEXT_SCALE / scale).floor().max(1.0) as usize
}

pub fn layout_song(song: &RenderedSong, width: u16, prefs: &DisplayPreferences) -> SongLayout {
    let wrap = wrap_width(width, prefs.font_size);
    let mut layout = SongLayout {
        wrap_width: wrap,
        ..SongLayout::default()
    };

    if let Some(message) = song.message {
        let line = LyricLine {
            segments: vec![Segment::Text(message.to_string())],
        };
        for segments in wrap_line(&line, wrap) {
            layout.rows.push(Row {
                kind: RowKind::Message,
                style: None,
                segments,
            });
        }
        return layout;
    }

    let extra_per_line = (prefs.line_height - 1.0).max(0.0);
    let mut spacing = 0.0;
    for section in &song.sections {
        layout.section_starts.push(layout.rows.len());
        push_section(&mut layout.rows, section, wrap, extra_per_line, &mut spacing);
        layout.rows.push(Row::blank(RowKind::Separator, None));
    }
    layout
}

fn push_section(
    rows: &mut Vec<Row>,
    section: &Section,
    wrap: usize,
    extra_per_line: f64,
    spacing: &mut f64,
) {
    let style = Some(section.style);
    if let Some(header) = &section.header {
        rows.push(Row {
            kind: RowKind::Header,
            style,
            segments: vec![Segment::Text(header.clone())],
        });
    }
    for line in &section.lines {
        for segments in wrap_line(line, wrap) {
            rows.push(Row {
                kind: RowKind::Lyric,
                style,
                segments,
            });
        }
        *spacing += extra_per_line;
        while *spacing >= 1.0 {
            rows.push(Row::blank(RowKind::Spacer, style));
            *spacing -= 1.0;
        }
    }
}

enum Piece<'a> {
    Space(&'a str),
    Word(&'a str),
    Chord(&'a str),
}

impl Piece<'_> {
    fn width(&self) -> usize {
        match self {
            Piece::Space(text) | Piece::Word(text) => text.chars().count(),
            Piece::Chord(chord) => chord.chars().count() + 2,
        }
    }
}

fn pieces(line: &LyricLine) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    for segment in &line.segments {
        match segment {
            Segment::Chord(chord) => out.push(Piece::Chord(chord)),
            Segment::Text(text) => {
                let mut start = 0;
                let mut in_space = None;
                for (idx, ch) in text.char_indices() {
                    let space = ch.is_whitespace();
                    match in_space {
                        Some(prev) if prev != space => {
                            out.push(piece_of(&text[start..idx], prev));
                            start = idx;
                        }
                        _ => {}
                    }
                    in_space = Some(space);
                }
                if let Some(space) = in_space {
                    out.push(piece_of(&text[start..], space));
                }
            }
        }
    }
    out
}

fn piece_of(text: &str, space: bool) -> Piece<'_> {
    if space {
        Piece::Space(text)
    } else {
        Piece::Word(text)
    }
}

struct RowBuilder {
    width: usize,
    rows: Vec<Vec<Segment>>,
    current: Vec<Segment>,
    used: usize,
}

impl RowBuilder {
    fn push_text(&mut self, text: &str) {
        if let Some(Segment::Text(last)) = self.current.last_mut() {
            last.push_str(text);
        } else {
            self.current.push(Segment::Text(text.to_string()));
        }
        self.used += text.chars().count();
    }

    fn push_chord(&mut self, chord: &str) {
        self.current.push(Segment::Chord(chord.to_string()));
        self.used += chord.chars().count() + 2;
    }

    fn finish_row(&mut self) {
        if let Some(Segment::Text(last)) = self.current.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            if last.is_empty() {
                self.current.pop();
            }
        }
        self.rows.push(std::mem::take(&mut self.current));
        self.used = 0;
    }

    fn fits(&self, width: usize) -> bool {
        self.used + width <= self.width
    }
}

/// Greedy word wrap. Words longer than the row are split hard; chords are
/// never split.
fn wrap_line(line: &LyricLine, width: usize) -> Vec<Vec<Segment>> {
    let mut builder = RowBuilder {
        width: width.max(1),
        rows: Vec::new(),
        current: Vec::new(),
        used: 0,
    };

    for piece in pieces(line) {
        let piece_width = piece.width();
        match piece {
            Piece::Space(text) => {
                let continuation = builder.used == 0 && !builder.rows.is_empty();
                if continuation {
                    continue;
                }
                if builder.fits(piece_width) {
                    builder.push_text(text);
                } else {
                    builder.finish_row();
                }
            }
            Piece::Chord(chord) => {
                if !builder.fits(piece_width) && builder.used > 0 {
                    builder.finish_row();
                }
                builder.push_chord(chord);
            }
            Piece::Word(word) => {
                if !builder.fits(piece_width) && builder.used > 0 {
                    builder.finish_row();
                }
                if builder.fits(piece_width) {
                    builder.push_text(word);
                    continue;
                }
                let mut chunk = String::new();
                for ch in word.chars() {
                    if builder.used + chunk.chars().count() + 1 > builder.width {
                        builder.push_text(&chunk);
                        chunk.clear();
                        builder.finish_row();
                    }
                    chunk.push(ch);
                }
                builder.push_text(&chunk);
            }
        }
    }

    if !builder.current.is_empty() || builder.rows.is_empty() {
        builder.finish_row();
    }
    builder.rows
}
