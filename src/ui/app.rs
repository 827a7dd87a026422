use std::mem;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;

use crate::autoplay::AutoPlayState;
use crate::db::{save_playlist, save_preferences};
use crate::error::PlaylistError;
use crate::input::{map_key, pedal_action, Command, Region, SwipeTracker};
use crate::models::Playlist;
use crate::playlist::load_playlist_file;
use crate::scroll::ScrollPhase;
use crate::session::{Action, Session, SessionEvent};

use super::forms::PathForm;
use super::helpers::{centered_rect, row_to_line, surface_error, Palette};
use super::screens::{PickerItem, PlaylistPicker};

/// Title bar with playlist name, cue light and clock.
const TITLE_HEIGHT: u16 = 1;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const INFO_WIDTH: u16 = 32;
/// Below this width the info panel is dropped in favor of the lyrics.
const INFO_MIN_TOTAL_WIDTH: u16 = 90;

/// Fine-grained modes layered over the lyrics screen.
enum Mode {
    Normal,
    Playlist(PlaylistPicker),
    OpeningFile(PathForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Screen areas for one terminal size. Drawing and mouse hit-testing both
/// derive from this so they never disagree.
struct Regions {
    title: Rect,
    lyrics: Rect,
    info: Option<Rect>,
    footer: Rect,
}

impl Regions {
    fn split(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TITLE_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        let body = chunks[1];
        let (lyrics, info) = if body.width >= INFO_MIN_TOTAL_WIDTH {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(INFO_WIDTH)])
                .split(body);
            (columns[0], Some(columns[1]))
        } else {
            (body, None)
        };

        Self {
            title: chunks[0],
            lyrics,
            info,
            footer: chunks[2],
        }
    }

    fn region_at(&self, column: u16, row: u16) -> Region {
        let position = Position::new(column, row);
        if self.title.contains(position) {
            Region::TitleBar
        } else if self.lyrics.contains(position) {
            Region::Lyrics
        } else if self.info.is_some_and(|info| info.contains(position)) {
            Region::Info
        } else {
            Region::Other
        }
    }
}

/// The open-file prompt starts in the working directory.
fn prompt_start() -> String {
    std::env::current_dir()
        .map(|dir| format!("{}/", dir.display()))
        .unwrap_or_default()
}

fn lyrics_block() -> Block<'static> {
    Block::default().borders(Borders::ALL)
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    session: Session,
    mode: Mode,
    status: Option<StatusMessage>,
    swipe: SwipeTracker,
    started: Instant,
}

impl App {
    pub fn new(conn: Connection, session: Session) -> Self {
        Self {
            conn,
            session,
            mode: Mode::Normal,
            status: None,
            swipe: SwipeTracker::default(),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the app started; the clock every timer runs on.
    pub(crate) fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Load a playlist file given on the command line. Failures are shown in
    /// the footer and leave the current playlist in place.
    pub fn open_path(&mut self, path: &Path) {
        if let Err(err) = self.try_open(path) {
            self.report_load_error(path, &err);
        }
    }

    fn report_load_error(&mut self, path: &Path, err: &PlaylistError) {
        if err.is_selection_error() {
            log::info!("not loading {}: {err}", path.display());
        } else {
            log::warn!("could not parse {}: {err}", path.display());
        }
        self.set_status(err.to_string(), StatusKind::Error);
    }

    fn try_open(&mut self, path: &Path) -> Result<(), PlaylistError> {
        let playlist = load_playlist_file(path)?;
        self.install_playlist(playlist);
        Ok(())
    }

    fn install_playlist(&mut self, playlist: Playlist) {
        if let Err(err) = save_playlist(&self.conn, &playlist) {
            log::error!("failed to persist playlist: {err:#}");
        }
        let message = format!("Loaded '{}' ({} songs)", playlist.name, playlist.len());
        let now = self.now_ms();
        self.session.load_playlist(playlist, now);
        self.set_status(message, StatusKind::Info);
    }

    /// Keep the session's idea of the lyrics pane in step with the terminal.
    pub(crate) fn sync_size(&mut self, area: Rect) {
        let regions = Regions::split(area);
        let inner = lyrics_block().inner(regions.lyrics);
        self.session.resize(inner.width, usize::from(inner.height));
    }

    /// Run due timers and report what they did.
    pub(crate) fn tick(&mut self) {
        let now = self.now_ms();
        for event in self.session.tick(now) {
            match event {
                SessionEvent::ScrollStarted => self.clear_status(),
                SessionEvent::ScrollFinished => {
                    if self.session.autoplay_enabled() && self.session.countdown_ms(now).is_some() {
                        self.set_status("End of song. Next song coming up.", StatusKind::Info);
                    }
                }
                SessionEvent::SongAdvanced(index) => {
                    let title = self.song_title(index);
                    self.set_status(format!("Now playing: {title}"), StatusKind::Info);
                }
                SessionEvent::EndOfPlaylist => {
                    self.set_status("End of playlist. Auto-play is off.", StatusKind::Info);
                }
            }
        }
    }

    fn song_title(&self, index: usize) -> String {
        self.session
            .playlist()
            .and_then(|playlist| playlist.get(index))
            .map(|song| song.display_title(index))
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(key, &mut exit)?,
            Mode::Playlist(picker) => self.handle_playlist_key(key.code, picker)?,
            Mode::OpeningFile(form) => self.handle_file_key(key.code, form)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, key: KeyEvent, exit: &mut bool) -> Result<Mode> {
        match map_key(key) {
            Some(command) => self.run_command(command, exit),
            None => Ok(Mode::Normal),
        }
    }

    fn run_command(&mut self, command: Command, exit: &mut bool) -> Result<Mode> {
        match command {
            Command::Quit => *exit = true,
            Command::ShowPlaylist => {
                let current = (self.session.song_count() > 0).then(|| self.session.current_index());
                return Ok(Mode::Playlist(PlaylistPicker::new(
                    self.session.titles(),
                    current,
                )));
            }
            Command::OpenFilePrompt => {
                return Ok(Mode::OpeningFile(PathForm::with_value(prompt_start())));
            }
            Command::Session(action) => self.apply(action),
        }
        Ok(Mode::Normal)
    }

    fn handle_playlist_key(&mut self, code: KeyCode, mut picker: PlaylistPicker) -> Result<Mode> {
        if let Some(action) = pedal_action(code) {
            self.apply(action);
            return Ok(Mode::Normal);
        }
        match code {
            KeyCode::Esc | KeyCode::Char('l') | KeyCode::Char('q') => Ok(Mode::Normal),
            KeyCode::Up | KeyCode::Char('k') => {
                picker.move_selection(-1);
                Ok(Mode::Playlist(picker))
            }
            KeyCode::Down | KeyCode::Char('j') => {
                picker.move_selection(1);
                Ok(Mode::Playlist(picker))
            }
            KeyCode::PageUp => {
                picker.move_selection(-10);
                Ok(Mode::Playlist(picker))
            }
            KeyCode::PageDown => {
                picker.move_selection(10);
                Ok(Mode::Playlist(picker))
            }
            KeyCode::Home => {
                picker.select_first();
                Ok(Mode::Playlist(picker))
            }
            KeyCode::End => {
                picker.select_last();
                Ok(Mode::Playlist(picker))
            }
            KeyCode::Enter => match picker.current_item() {
                Some(PickerItem::Song { index, .. }) => {
                    self.apply(Action::LoadSong(*index));
                    Ok(Mode::Normal)
                }
                Some(PickerItem::LoadPlaylist) => {
                    Ok(Mode::OpeningFile(PathForm::with_value(prompt_start())))
                }
                None => Ok(Mode::Normal),
            },
            _ => Ok(Mode::Playlist(picker)),
        }
    }

    fn handle_file_key(&mut self, code: KeyCode, mut form: PathForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Enter => {
                let path = match form.parse_path() {
                    Ok(path) => path,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Ok(Mode::OpeningFile(form));
                    }
                };
                // A wrong path keeps the prompt open for another try; a file
                // that was read but is unusable is reported in the footer.
                match self.try_open(&path) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.report_load_error(&path, &err);
                        if err.is_selection_error() {
                            form.error = Some(err.to_string());
                            Ok(Mode::OpeningFile(form))
                        } else {
                            Ok(Mode::Normal)
                        }
                    }
                }
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::OpeningFile(form))
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Ok(Mode::OpeningFile(form))
            }
            _ => Ok(Mode::OpeningFile(form)),
        }
    }

    /// Route a mouse event. Overlays swallow the mouse.
    pub(crate) fn handle_mouse(&mut self, event: MouseEvent, area: Rect) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        let region = Regions::split(area).region_at(event.column, event.row);
        if let Some(command) = self.swipe.map_mouse(event, region) {
            let mut exit = false;
            self.mode = self.run_command(command, &mut exit)?;
        }
        Ok(())
    }

    /// Apply a session action, persist preference changes and describe the
    /// result in the footer.
    fn apply(&mut self, action: Action) {
        let now = self.now_ms();
        let before = *self.session.prefs();
        let changed = self.session.apply(action, now);

        if *self.session.prefs() != before {
            if let Err(err) = save_preferences(&self.conn, self.session.prefs()) {
                log::error!("failed to persist preferences: {err:#}");
                self.set_status(
                    format!("Could not save preferences: {}", surface_error(&err)),
                    StatusKind::Error,
                );
                return;
            }
        }

        if let Some((text, kind)) = self.describe(action, changed, now) {
            self.set_status(text, kind);
        }
    }

    fn describe(&self, action: Action, changed: bool, now: u64) -> Option<(String, StatusKind)> {
        let session = &self.session;
        if session.song_count() == 0 {
            return match action {
                Action::ToggleTheme | Action::CycleAccent => None,
                _ => Some((
                    "No playlist loaded. Press 'o' to open a CSV file.".to_string(),
                    StatusKind::Error,
                )),
            };
        }

        let text = match action {
            Action::NextSong if !changed => "Already at the last song.".to_string(),
            Action::PreviousSong if !changed => "Already at the first song.".to_string(),
            Action::ToggleAutoScroll | Action::ActivateLyrics => match session.scroll_phase() {
                ScrollPhase::Armed { .. } => {
                    let secs = session.countdown_ms(now).unwrap_or(0).div_ceil(1_000);
                    format!("Auto-scroll starts in {secs}s")
                }
                ScrollPhase::Scrolling { .. } => "Auto-scroll on.".to_string(),
                ScrollPhase::Idle if matches!(action, Action::ActivateLyrics) => return None,
                ScrollPhase::Idle => "Auto-scroll off.".to_string(),
            },
            Action::ToggleAutoPlay => {
                if session.autoplay_enabled() {
                    "Auto-play on.".to_string()
                } else {
                    "Auto-play off.".to_string()
                }
            }
            Action::Transpose(_) | Action::ResetTranspose => match session.transpose_offset() {
                0 => "Original key.".to_string(),
                offset => format!("Transposed {offset:+} semitones."),
            },
            Action::TextScale(_) if changed => format!("Text size {}", session.prefs().font_size),
            Action::TextScale(_) => "Text size limit reached.".to_string(),
            Action::LineSpacing(_) if changed => {
                format!("Line spacing {:.1}", session.prefs().line_height)
            }
            Action::LineSpacing(_) => "Line spacing limit reached.".to_string(),
            Action::ToggleTheme => format!("{} theme", session.prefs().theme.as_str()),
            Action::CycleAccent => format!("Accent color: {}", session.prefs().accent),
            _ => return None,
        };
        Some((text, StatusKind::Info))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let regions = Regions::split(area);
        let palette = Palette::from_prefs(self.session.prefs());
        let now = self.now_ms();

        frame.render_widget(Block::default().style(palette.base()), area);
        self.draw_title(frame, regions.title, &palette, now);
        self.draw_lyrics(frame, regions.lyrics, &palette);
        if let Some(info) = regions.info {
            self.draw_info(frame, info, &palette);
        }
        self.draw_footer(frame, regions.footer);

        match &self.mode {
            Mode::Playlist(picker) => self.draw_playlist(frame, area, picker),
            Mode::OpeningFile(form) => self.draw_file_prompt(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect, palette: &Palette, now: u64) {
        let name = self
            .session
            .playlist()
            .map(|playlist| playlist.name.clone())
            .unwrap_or_else(|| "ChordPro Viewer".to_string());
        let left = Line::from(vec![
            Span::styled(
                format!(" {name} "),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled("(l: playlist)", Style::default().fg(palette.muted)),
        ]);
        frame.render_widget(Paragraph::new(left), area);

        let mut right = Vec::new();
        let cue_style = if self.session.pulse_lit(now) {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        if let Some(remaining) = self.session.countdown_ms(now) {
            right.push(Span::styled(
                format!("\u{25cf} {} ", remaining.div_ceil(1_000)),
                cue_style,
            ));
        }
        if self.session.scroll_phase() != ScrollPhase::Idle {
            right.push(Span::styled("SCROLL ", Style::default().fg(palette.accent)));
        }
        let autoplay = match self.session.autoplay_state() {
            AutoPlayState::Off => None,
            AutoPlayState::On => Some("AUTO "),
            AutoPlayState::Waiting { .. } => Some("NEXT "),
        };
        if let Some(flag) = autoplay {
            right.push(Span::styled(flag, Style::default().fg(palette.accent)));
        }
        if self.session.transpose_offset() != 0 {
            right.push(Span::raw(format!("T{:+} ", self.session.transpose_offset())));
        }
        right.push(Span::raw(format!("{} ", Local::now().format("%H:%M"))));
        frame.render_widget(
            Paragraph::new(Line::from(right)).alignment(Alignment::Right),
            area,
        );
    }

    fn draw_lyrics(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let title = match self.session.song_info() {
            Some(info) => format!(" {} ", info.title),
            None => " No playlist ".to_string(),
        };
        let block = lyrics_block()
            .title(title)
            .border_style(Style::default().fg(palette.muted));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.session.song_count() == 0 {
            let message = Paragraph::new("No playlist loaded. Press 'o' to open a CSV file.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.muted))
                .wrap(Wrap { trim: true });
            frame.render_widget(message, inner);
            return;
        }

        let lines: Vec<Line> = self
            .session
            .layout()
            .rows
            .iter()
            .skip(self.session.offset())
            .take(usize::from(inner.height))
            .map(|row| row_to_line(row, palette))
            .collect();
        frame.render_widget(Paragraph::new(lines).style(palette.base()), inner);

        let viewport = self.session.viewport();
        if viewport.max_offset() > 0 {
            let mut state = ScrollbarState::new(viewport.content_height)
                .viewport_content_length(viewport.visible_height)
                .position(viewport.offset);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None)
                .track_symbol(Some("\u{2502}"))
                .thumb_symbol("\u{2588}")
                .track_style(Style::default().fg(palette.muted))
                .thumb_style(Style::default().fg(palette.accent));
            let track = area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            });
            frame.render_stateful_widget(scrollbar, track, &mut state);
        }
    }

    fn draw_info(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .title(" Song ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(info) = self.session.song_info() else {
            return;
        };
        let label = Style::default().fg(palette.muted);
        let value = Style::default().fg(palette.text);
        let field = |name: &str, text: String| {
            Line::from(vec![
                Span::styled(format!("{name}: "), label),
                Span::styled(text, value),
            ])
        };

        let mut lines = vec![
            Line::from(Span::styled(
                info.title.clone(),
                value.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(info.position.clone(), label)),
            Line::from(""),
        ];
        let optional = [
            ("Key", info.key.clone()),
            ("Capo", info.capo.clone()),
            ("Tempo", info.tempo.clone()),
            ("Length", info.duration.clone()),
            ("Chords", info.chords.clone()),
        ];
        for (name, text) in optional {
            if let Some(text) = text {
                lines.push(field(name, text));
            }
        }
        lines.push(Line::from(""));
        lines.push(field("Next", info.next_title.clone()));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let text = match self.mode {
            Mode::Normal => {
                "\u{2190}/\u{2192} song \u{2022} Space scroll \u{2022} a auto-play \u{2022} \
                 Tab section \u{2022} </> size \u{2022} [/] spacing \u{2022} \
                 t/T transpose \u{2022} m theme \u{2022} c color \u{2022} l playlist \u{2022} \
                 o open \u{2022} q quit"
            }
            Mode::Playlist(_) => {
                "\u{2191}/\u{2193} select \u{2022} Enter open \u{2022} Esc close"
            }
            Mode::OpeningFile(_) => "Enter load \u{2022} Esc cancel",
        };
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }

    fn draw_playlist(&self, frame: &mut Frame, area: Rect, picker: &PlaylistPicker) {
        let popup_area = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);

        let title = match self.session.playlist() {
            Some(playlist) => format!(" {} ", playlist.name),
            None => " Playlist ".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = picker
            .items
            .iter()
            .map(|item| {
                let style = match item {
                    PickerItem::Song { index, .. } if Some(*index) == picker.current => {
                        Style::default().add_modifier(Modifier::BOLD)
                    }
                    PickerItem::LoadPlaylist => Style::default().fg(Color::Cyan),
                    PickerItem::Song { .. } => Style::default(),
                };
                ListItem::new(item.label()).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("\u{25b6} ");

        let mut list_state = ListState::default();
        list_state.select(Some(picker.selected));
        frame.render_stateful_widget(list, inner, &mut list_state);
    }

    fn draw_file_prompt(&self, frame: &mut Frame, area: Rect, form: &PathForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Open Playlist ")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line("Path"), Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to load \u{2022} Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = "Path: ".len() as u16;
        let cursor_x = (inner.x + prefix + form.value_len() as u16)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
