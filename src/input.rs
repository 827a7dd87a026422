//! Key and mouse bindings. Translating events here keeps the draw loop free of
//! binding tables and lets the bindings be tested without a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::session::Action;

/// Horizontal drag distance, in columns, that counts as a swipe.
pub const SWIPE_COLUMNS: u16 = 8;
/// Rows moved by one wheel notch.
pub const WHEEL_ROWS: isize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ShowPlaylist,
    OpenFilePrompt,
    Session(Action),
}

/// Which part of the screen a mouse event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    TitleBar,
    Lyrics,
    /// The song info panel; a click there moves on to the next song.
    Info,
    Other,
}

/// Keys sent by a foot pedal. They win over every other binding outside the
/// open-file prompt.
pub fn pedal_action(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Char('3') => Action::ScrollToTop,
        KeyCode::Char('*') => Action::ToggleAutoPlay,
        KeyCode::Char('/') => Action::ToggleAutoScroll,
        KeyCode::Char('-') => Action::NextSection,
        KeyCode::Char('=') => Action::NextSong,
        _ => return None,
    };
    Some(action)
}

pub fn map_key(key: KeyEvent) -> Option<Command> {
    if let Some(action) = pedal_action(key.code) {
        return Some(Command::Session(action));
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Char('l') => return Some(Command::ShowPlaylist),
        KeyCode::Char('o') => return Some(Command::OpenFilePrompt),
        KeyCode::Left | KeyCode::Char('p') => Action::PreviousSong,
        KeyCode::Right | KeyCode::Char('n') => Action::NextSong,
        KeyCode::Up => Action::ScrollBy(-1),
        KeyCode::Down => Action::ScrollBy(1),
        KeyCode::PageUp => Action::Page(-1),
        KeyCode::PageDown => Action::Page(1),
        KeyCode::Home => Action::ScrollToTop,
        KeyCode::Tab => Action::NextSection,
        KeyCode::BackTab => Action::PreviousSection,
        KeyCode::Char(' ') => Action::ToggleAutoScroll,
        KeyCode::Char('a') => Action::ToggleAutoPlay,
        KeyCode::Char('>') | KeyCode::Char('+') => Action::TextScale(1),
        KeyCode::Char('<') => Action::TextScale(-1),
        KeyCode::Char(']') => Action::LineSpacing(1),
        KeyCode::Char('[') => Action::LineSpacing(-1),
        KeyCode::Char('t') => Action::Transpose(-1),
        KeyCode::Char('T') => Action::Transpose(1),
        KeyCode::Char('0') => Action::ResetTranspose,
        KeyCode::Char('m') => Action::ToggleTheme,
        KeyCode::Char('c') => Action::CycleAccent,
        _ => return None,
    };
    Some(Command::Session(action))
}

/// Remembers where a left-button press started so the release can tell a
/// tap from a swipe.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start: Option<(u16, u16)>,
}

impl SwipeTracker {
    pub fn map_mouse(&mut self, event: MouseEvent, region: Region) -> Option<Command> {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let alt = event.modifiers.contains(KeyModifiers::ALT);

        let action = match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                match region {
                    Region::TitleBar => return Some(Command::ShowPlaylist),
                    Region::Info => {
                        self.start = None;
                        return Some(Command::Session(Action::NextSong));
                    }
                    Region::Lyrics => self.start = Some((event.column, event.row)),
                    Region::Other => self.start = None,
                }
                return None;
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let (start_column, _) = self.start.take()?;
                let dx = i32::from(event.column) - i32::from(start_column);
                if dx.unsigned_abs() > u32::from(SWIPE_COLUMNS) {
                    if dx > 0 {
                        Action::PreviousSong
                    } else {
                        Action::NextSong
                    }
                } else if region == Region::Lyrics {
                    Action::ActivateLyrics
                } else {
                    return None;
                }
            }
            MouseEventKind::ScrollDown if ctrl => Action::TextScale(-1),
            MouseEventKind::ScrollUp if ctrl => Action::TextScale(1),
            MouseEventKind::ScrollDown if alt => Action::LineSpacing(-1),
            MouseEventKind::ScrollUp if alt => Action::LineSpacing(1),
            MouseEventKind::ScrollDown => Action::ScrollBy(WHEEL_ROWS),
            MouseEventKind::ScrollUp => Action::ScrollBy(-WHEEL_ROWS),
            _ => return None,
        };
        Some(Command::Session(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, modifiers: KeyModifiers) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row: 5,
            modifiers,
        }
    }

    #[test]
    fn pedal_keys_map_to_fixed_actions() {
        let cases = [
            ('3', Action::ScrollToTop),
            ('*', Action::ToggleAutoPlay),
            ('/', Action::ToggleAutoScroll),
            ('-', Action::NextSection),
            ('=', Action::NextSong),
        ];
        for (ch, action) in cases {
            assert_eq!(map_key(key(KeyCode::Char(ch))), Some(Command::Session(action)));
        }
    }

    #[test]
    fn pedal_keys_win_over_modifiers() {
        let shifted = KeyEvent::new(KeyCode::Char('*'), KeyModifiers::SHIFT);
        assert_eq!(map_key(shifted), Some(Command::Session(Action::ToggleAutoPlay)));
        let ctrl = KeyEvent::new(KeyCode::Char('='), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl), Some(Command::Session(Action::NextSong)));
    }

    #[test]
    fn keyboard_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(map_key(key(KeyCode::Char('l'))), Some(Command::ShowPlaylist));
        assert_eq!(
            map_key(key(KeyCode::Char('T'))),
            Some(Command::Session(Action::Transpose(1)))
        );
        assert_eq!(
            map_key(key(KeyCode::Left)),
            Some(Command::Session(Action::PreviousSong))
        );
        assert_eq!(map_key(key(KeyCode::F(5))), None);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c), Some(Command::Quit));
    }

    #[test]
    fn tap_on_lyrics_activates_them() {
        let mut tracker = SwipeTracker::default();
        let none = KeyModifiers::NONE;
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 10, none);
        assert_eq!(tracker.map_mouse(down, Region::Lyrics), None);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 12, none);
        assert_eq!(
            tracker.map_mouse(up, Region::Lyrics),
            Some(Command::Session(Action::ActivateLyrics))
        );
    }

    #[test]
    fn click_on_info_panel_moves_to_next_song() {
        let mut tracker = SwipeTracker::default();
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 100, KeyModifiers::NONE);
        assert_eq!(
            tracker.map_mouse(down, Region::Info),
            Some(Command::Session(Action::NextSong))
        );
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 100, KeyModifiers::NONE);
        assert_eq!(tracker.map_mouse(up, Region::Info), None);
    }

    #[test]
    fn horizontal_drags_are_swipes() {
        let mut tracker = SwipeTracker::default();
        let none = KeyModifiers::NONE;
        tracker.map_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 10, none), Region::Lyrics);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 30, none);
        assert_eq!(
            tracker.map_mouse(up, Region::Lyrics),
            Some(Command::Session(Action::PreviousSong))
        );

        tracker.map_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 30, none), Region::Lyrics);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 5, none);
        assert_eq!(
            tracker.map_mouse(up, Region::Other),
            Some(Command::Session(Action::NextSong))
        );
    }

    #[test]
    fn title_bar_click_opens_playlist() {
        let mut tracker = SwipeTracker::default();
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 1, KeyModifiers::NONE);
        assert_eq!(tracker.map_mouse(down, Region::TitleBar), Some(Command::ShowPlaylist));
    }

    #[test]
    fn wheel_scrolls_and_modifiers_resize() {
        let mut tracker = SwipeTracker::default();
        let wheel = mouse(MouseEventKind::ScrollDown, 0, KeyModifiers::NONE);
        assert_eq!(
            tracker.map_mouse(wheel, Region::Lyrics),
            Some(Command::Session(Action::ScrollBy(WHEEL_ROWS)))
        );
        let zoom = mouse(MouseEventKind::ScrollUp, 0, KeyModifiers::CONTROL);
        assert_eq!(
            tracker.map_mouse(zoom, Region::Lyrics),
            Some(Command::Session(Action::TextScale(1)))
        );
        let spacing = mouse(MouseEventKind::ScrollDown, 0, KeyModifiers::ALT);
        assert_eq!(
            tracker.map_mouse(spacing, Region::Lyrics),
            Some(Command::Session(Action::LineSpacing(-1)))
        );
    }
}
