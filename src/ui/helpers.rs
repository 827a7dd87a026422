use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::chordpro::{SectionStyle, Segment};
use crate::layout::{Row, RowKind};
use crate::prefs::{Accent, DisplayPreferences, ThemeMode};

/// Colors derived from the display preferences for one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Palette {
    pub(crate) text: Color,
    pub(crate) muted: Color,
    pub(crate) background: Color,
    pub(crate) light_section: Color,
    pub(crate) dark_section: Color,
    pub(crate) accent: Color,
}

impl Palette {
    pub(crate) fn from_prefs(prefs: &DisplayPreferences) -> Self {
        let accent = accent_color(prefs.accent);
        match prefs.theme {
            ThemeMode::Dark => Self {
                text: Color::White,
                muted: Color::Gray,
                background: Color::Black,
                light_section: Color::Black,
                dark_section: Color::Rgb(38, 38, 38),
                accent,
            },
            ThemeMode::Light => Self {
                text: Color::Black,
                muted: Color::DarkGray,
                background: Color::White,
                light_section: Color::White,
                dark_section: Color::Rgb(225, 225, 225),
                accent,
            },
        }
    }

    pub(crate) fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    fn section(&self, style: Option<SectionStyle>) -> Style {
        let bg = match style {
            Some(SectionStyle::Light) => self.light_section,
            Some(SectionStyle::Dark) => self.dark_section,
            None => self.background,
        };
        Style::default().fg(self.text).bg(bg)
    }
}

pub(crate) fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Amber => Color::Yellow,
        Accent::Cyan => Color::Cyan,
        Accent::Green => Color::Green,
        Accent::Magenta => Color::Magenta,
        Accent::Red => Color::Red,
        Accent::Blue => Color::Blue,
    }
}

/// Style one layout row. Chords keep their brackets so the row is exactly as
/// wide as the layout measured it.
pub(crate) fn row_to_line(row: &Row, palette: &Palette) -> Line<'static> {
    let base = palette.section(row.style);
    let accent = base.fg(palette.accent).add_modifier(Modifier::BOLD);

    let spans: Vec<Span<'static>> = row
        .segments
        .iter()
        .map(|segment| match (row.kind, segment) {
            (RowKind::Header, Segment::Text(text)) => {
                Span::styled(text.clone(), accent.add_modifier(Modifier::UNDERLINED))
            }
            (RowKind::Message, Segment::Text(text)) => {
                Span::styled(text.clone(), base.fg(palette.muted))
            }
            (_, Segment::Text(text)) => Span::styled(text.clone(), base),
            (_, Segment::Chord(chord)) => Span::styled(format!("[{chord}]"), accent),
        })
        .collect();

    Line::from(spans).style(base)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chords_are_accented_and_bracketed() {
        let palette = Palette::from_prefs(&DisplayPreferences::default());
        let row = Row {
            kind: RowKind::Lyric,
            style: Some(SectionStyle::Dark),
            segments: vec![Segment::Chord("G".into()), Segment::Text("Sing".into())],
        };
        let line = row_to_line(&row, &palette);
        assert_eq!(line.spans[0].content, "[G]");
        assert_eq!(line.spans[0].style.fg, Some(Color::Yellow));
        assert_eq!(line.spans[1].style.bg, Some(palette.dark_section));
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save");
        assert_eq!(surface_error(&err), "disk full");
    }
}
