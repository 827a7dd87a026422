//! The viewer's application state. Every user gesture and every timer firing
//! goes through [`Session::apply`] or [`Session::tick`], so the whole playback
//! model can be driven from tests with a fake clock.

use crate::autoplay::{Advance, AutoPlay, AutoPlayState};
use crate::chordpro::{format_song, RenderedSong};
use crate::layout::{layout_song, SongLayout};
use crate::models::{format_duration, Field, Playlist, SongRecord, DEFAULT_DURATION_SECS};
use crate::prefs::{DisplayPreferences, FONT_STEP, LINE_HEIGHT_STEP};
use crate::scheduler::{Scheduler, TimerId};
use crate::scroll::{
    beat_ms, pulse_on, AutoScroll, ScrollConfig, ScrollPhase, TickOutcome, Viewport,
};
use crate::transpose::{transpose_chord_list, transpose_key, transpose_lyrics};

/// Share of the visible height moved by a page or a section jump when the
/// song has no sections.
const PAGE_PERCENT: usize = 80;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const END_OF_PLAYLIST: &str = "End of Playlist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextSong,
    PreviousSong,
    LoadSong(usize),
    NextSection,
    PreviousSection,
    ScrollToTop,
    ScrollBy(isize),
    /// Page down for positive values, up for negative.
    Page(isize),
    ToggleAutoScroll,
    ToggleAutoPlay,
    /// A click or tap on the lyrics pane.
    ActivateLyrics,
    /// Text scale steps, positive is larger.
    TextScale(i32),
    LineSpacing(i32),
    Transpose(i32),
    ResetTranspose,
    ToggleTheme,
    CycleAccent,
}

/// Things that happened on their own during [`Session::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ScrollStarted,
    ScrollFinished,
    SongAdvanced(usize),
    EndOfPlaylist,
}

/// Data for the song info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub title: String,
    pub position: String,
    pub key: Option<String>,
    pub capo: Option<String>,
    pub chords: Option<String>,
    pub tempo: Option<String>,
    pub duration: Option<String>,
    pub next_title: String,
}

#[derive(Debug)]
pub struct Session {
    playlist: Option<Playlist>,
    current: usize,
    transpose: i32,
    prefs: DisplayPreferences,
    rendered: RenderedSong,
    layout: SongLayout,
    width: u16,
    viewport: Viewport,
    scroll: AutoScroll,
    autoplay: AutoPlay,
    sched: Scheduler,
}

impl Session {
    pub fn new(config: ScrollConfig, prefs: DisplayPreferences) -> Self {
        Self {
            playlist: None,
            current: 0,
            transpose: 0,
            prefs: prefs.sanitized(),
            rendered: format_song(None),
            layout: SongLayout::default(),
            width: 80,
            viewport: Viewport::default(),
            scroll: AutoScroll::new(config),
            autoplay: AutoPlay::default(),
            sched: Scheduler::new(),
        }
    }

    pub fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    pub fn song_count(&self) -> usize {
        self.playlist.as_ref().map_or(0, Playlist::len)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_song(&self) -> Option<&SongRecord> {
        self.playlist.as_ref()?.get(self.current)
    }

    pub fn transpose_offset(&self) -> i32 {
        self.transpose
    }

    pub fn prefs(&self) -> &DisplayPreferences {
        &self.prefs
    }

    pub fn layout(&self) -> &SongLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn offset(&self) -> usize {
        self.viewport.offset
    }

    pub fn scroll_phase(&self) -> ScrollPhase {
        self.scroll.phase()
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub fn autoplay_state(&self) -> AutoPlayState {
        self.autoplay.state()
    }

    /// Whether the tempo cue is lit: during the pre-roll, and while auto-play
    /// waits to load the next song.
    pub fn pulse_lit(&self, now_ms: u64) -> bool {
        if self.scroll.cue_lit(now_ms) {
            return true;
        }
        match (self.autoplay.waiting_since(), self.current_song()) {
            (Some(since), Some(song)) => pulse_on(since, beat_ms(song.tempo_bpm()), now_ms),
            _ => false,
        }
    }

    /// Milliseconds until the pre-roll ends or auto-play loads the next song.
    pub fn countdown_ms(&self, now_ms: u64) -> Option<u64> {
        self.sched
            .remaining_ms(TimerId::Preroll, now_ms)
            .or_else(|| self.sched.remaining_ms(TimerId::AutoAdvance, now_ms))
    }

    /// Replace the playlist wholesale and show its first song.
    pub fn load_playlist(&mut self, playlist: Playlist, now_ms: u64) {
        log::info!("playlist '{}' loaded with {} songs", playlist.name, playlist.len());
        self.scroll.cancel(&mut self.sched);
        self.autoplay.cancel_pending(&mut self.sched);
        self.playlist = Some(playlist);
        self.current = 0;
        self.show_song(0, now_ms);
    }

    /// Show song `index`. Out-of-range indexes are ignored.
    pub fn load_song(&mut self, index: usize, now_ms: u64) -> bool {
        if index >= self.song_count() {
            log::warn!("ignoring request for song {index} of {}", self.song_count());
            return false;
        }
        self.show_song(index, now_ms);
        true
    }

    fn show_song(&mut self, index: usize, now_ms: u64) {
        self.scroll.cancel(&mut self.sched);
        self.autoplay.cancel_pending(&mut self.sched);
        self.current = index;
        self.transpose = 0;
        self.viewport.offset = 0;
        self.render();
        self.relayout(false);
        log::debug!("showing song {} of {}", index + 1, self.song_count());
        if self.autoplay.is_enabled() {
            self.start_autoscroll(now_ms);
        }
    }

    pub fn next_song(&mut self, now_ms: u64) -> bool {
        self.load_song(self.current + 1, now_ms)
    }

    pub fn previous_song(&mut self, now_ms: u64) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.load_song(index, now_ms),
            None => false,
        }
    }

    /// Tell the session the size of the lyrics pane.
    pub fn resize(&mut self, width: u16, visible_height: usize) {
        if width == self.width && visible_height == self.viewport.visible_height {
            return;
        }
        self.width = width;
        self.viewport.visible_height = visible_height;
        self.relayout(true);
    }

    fn render(&mut self) {
        let lyrics = self
            .current_song()
            .and_then(SongRecord::lyrics)
            .map(|text| transpose_lyrics(text, self.transpose));
        self.rendered = format_song(lyrics.as_deref());
    }

    /// Lay the song out again. With `keep_position` the offset keeps its
    /// relative place in the song.
    fn relayout(&mut self, keep_position: bool) {
        let old_height = self.layout.height();
        self.layout = layout_song(&self.rendered, self.width, &self.prefs);
        let new_height = self.layout.height();
        if keep_position && old_height > 0 {
            self.viewport.offset = self.viewport.offset * new_height / old_height;
        }
        self.viewport.content_height = new_height;
        self.viewport.offset = self.viewport.offset.min(self.viewport.max_offset());
        self.scroll.recompute_step(self.viewport);
    }

    fn set_offset(&mut self, offset: usize) {
        self.viewport.offset = offset.min(self.viewport.max_offset());
        self.scroll.recompute_step(self.viewport);
    }

    pub fn scroll_to_top(&mut self) {
        self.set_offset(0);
    }

    pub fn scroll_by(&mut self, rows: isize) {
        self.set_offset(self.viewport.offset.saturating_add_signed(rows));
    }

    fn page_rows(&self) -> usize {
        (self.viewport.visible_height * PAGE_PERCENT / 100).max(1)
    }

    pub fn page(&mut self, direction: isize) {
        let rows = self.page_rows() as isize;
        self.scroll_by(rows * direction.signum());
    }

    pub fn next_section(&mut self) {
        if self.layout.section_starts.is_empty() {
            self.page(1);
            return;
        }
        let threshold = self.scroll.config().top_threshold;
        if let Some(start) = self.layout.next_section_start(self.viewport.offset, threshold) {
            self.set_offset(start);
        }
    }

    pub fn previous_section(&mut self) {
        if self.layout.section_starts.is_empty() {
            self.page(-1);
            return;
        }
        let threshold = self.scroll.config().top_threshold;
        if let Some(start) = self
            .layout
            .previous_section_start(self.viewport.offset, threshold)
        {
            self.set_offset(start);
        }
    }

    fn start_autoscroll(&mut self, now_ms: u64) {
        self.autoplay.cancel_pending(&mut self.sched);
        let Some(song) = self.current_song() else {
            return;
        };
        let tempo = song.tempo_bpm();
        let duration = song.duration_secs().unwrap_or(DEFAULT_DURATION_SECS);
        self.scroll
            .start(&mut self.sched, now_ms, self.viewport, tempo, duration);
    }

    /// Start or stop auto-scroll. Returns whether it is running afterwards.
    pub fn toggle_autoscroll(&mut self, now_ms: u64) -> bool {
        if self.scroll.is_active() || self.autoplay.waiting_since().is_some() {
            self.scroll.cancel(&mut self.sched);
            self.autoplay.cancel_pending(&mut self.sched);
            return false;
        }
        self.start_autoscroll(now_ms);
        self.scroll.is_active()
    }

    /// Turn auto-play on or off. Enabling it while nothing scrolls starts
    /// auto-scroll; disabling it stops auto-scroll too.
    pub fn toggle_autoplay(&mut self, now_ms: u64) -> bool {
        let enabled = self.autoplay.toggle(&mut self.sched);
        if enabled {
            if !self.scroll.is_active() {
                self.start_autoscroll(now_ms);
            }
        } else {
            self.scroll.cancel(&mut self.sched);
        }
        log::info!("auto-play {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// A tap on the lyrics: stop a running scroll, move on from the bottom
    /// of a song, or start scrolling.
    pub fn activate_lyrics(&mut self, now_ms: u64) {
        if self.scroll.is_active() {
            self.scroll.cancel(&mut self.sched);
        } else if self.viewport.at_bottom() {
            self.next_song(now_ms);
        } else {
            self.start_autoscroll(now_ms);
        }
    }

    pub fn adjust_text_scale(&mut self, steps: i32) -> bool {
        let changed = self.prefs.adjust_font(f64::from(steps) * FONT_STEP);
        if changed {
            self.relayout(true);
        }
        changed
    }

    pub fn adjust_line_spacing(&mut self, steps: i32) -> bool {
        let changed = self
            .prefs
            .adjust_line_height(f64::from(steps) * LINE_HEIGHT_STEP);
        if changed {
            self.relayout(true);
        }
        changed
    }

    /// Shift the current song by `semitones`, kept within one octave.
    pub fn transpose_by(&mut self, semitones: i32) {
        self.set_transpose((self.transpose + semitones % 12) % 12);
    }

    pub fn set_transpose(&mut self, semitones: i32) {
        if semitones == self.transpose {
            return;
        }
        self.transpose = semitones;
        self.render();
        self.relayout(true);
    }

    pub fn apply(&mut self, action: Action, now_ms: u64) -> bool {
        match action {
            Action::NextSong => return self.next_song(now_ms),
            Action::PreviousSong => return self.previous_song(now_ms),
            Action::LoadSong(index) => return self.load_song(index, now_ms),
            Action::NextSection => self.next_section(),
            Action::PreviousSection => self.previous_section(),
            Action::ScrollToTop => self.scroll_to_top(),
            Action::ScrollBy(rows) => self.scroll_by(rows),
            Action::Page(direction) => self.page(direction),
            Action::ToggleAutoScroll => {
                self.toggle_autoscroll(now_ms);
            }
            Action::ToggleAutoPlay => {
                self.toggle_autoplay(now_ms);
            }
            Action::ActivateLyrics => self.activate_lyrics(now_ms),
            Action::TextScale(steps) => return self.adjust_text_scale(steps),
            Action::LineSpacing(steps) => return self.adjust_line_spacing(steps),
            Action::Transpose(semitones) => self.transpose_by(semitones),
            Action::ResetTranspose => self.set_transpose(0),
            Action::ToggleTheme => self.prefs.toggle_theme(),
            Action::CycleAccent => self.prefs.cycle_accent(),
        }
        true
    }

    /// Run every timer that is due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for fired in self.sched.poll(now_ms) {
            match fired.id {
                TimerId::Preroll => {
                    self.scroll
                        .on_preroll_elapsed(&mut self.sched, now_ms, self.viewport);
                    if self.scroll.is_scrolling() {
                        events.push(SessionEvent::ScrollStarted);
                    }
                }
                TimerId::ScrollTick => {
                    match self.scroll.on_tick(&mut self.sched, self.viewport, fired.count) {
                        Some(TickOutcome::Moved(offset)) => self.viewport.offset = offset,
                        Some(TickOutcome::Finished(offset)) => {
                            self.viewport.offset = offset;
                            events.push(SessionEvent::ScrollFinished);
                            self.autoplay.on_scroll_finished(&mut self.sched, now_ms);
                        }
                        None => {}
                    }
                }
                TimerId::AutoAdvance => {
                    let len = self.song_count();
                    match self.autoplay.on_advance_elapsed(self.current, len) {
                        Some(Advance::LoadNext(index)) => {
                            self.load_song(index, now_ms);
                            events.push(SessionEvent::SongAdvanced(index));
                        }
                        Some(Advance::Disarm) => {
                            log::info!("auto-play reached the end of the playlist");
                            events.push(SessionEvent::EndOfPlaylist);
                        }
                        None => {}
                    }
                }
            }
        }
        events
    }

    /// Titles for the playlist overlay.
    pub fn titles(&self) -> Vec<String> {
        self.playlist
            .iter()
            .flat_map(|playlist| playlist.songs.iter().enumerate())
            .map(|(index, song)| song.display_title(index))
            .collect()
    }

    pub fn song_info(&self) -> Option<SongInfo> {
        let song = self.current_song()?;
        let non_empty = |value: String| Some(value).filter(|v| !v.is_empty());
        let field = |field: Field| song.get(field).map(|value| value.trim().to_string());

        let next_title = match self.playlist.as_ref()?.get(self.current + 1) {
            Some(next) => next.display_title(self.current + 1),
            None => END_OF_PLAYLIST.to_string(),
        };

        Some(SongInfo {
            title: song.title().unwrap_or(UNKNOWN_TITLE).to_string(),
            position: format!("{} of {}", self.current + 1, self.song_count()),
            key: field(Field::Key).map(|key| transpose_key(&key, self.transpose)),
            capo: field(Field::Capo),
            chords: field(Field::Chords)
                .map(|chords| transpose_chord_list(&chords, self.transpose)),
            tempo: field(Field::Tempo),
            duration: song
                .get(Field::Duration)
                .map(format_duration)
                .and_then(non_empty),
            next_title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::ADVANCE_DELAY_MS;
    use crate::scroll::TICK_MS;

    const CSV: &str = "title,lyrics,duration,key,tempo\n\
        First,\"{Verse}\\nline one\\nline two\\n\\n{Chorus}\\nchorus line\",0:20,G,120\n\
        Second,[C]short,0:10,C,90\n";

    fn session(visible: usize) -> Session {
        let prefs = DisplayPreferences {
            line_height: 1.0,
            ..DisplayPreferences::default()
        };
        let mut session = Session::new(ScrollConfig::with_preroll_secs(2), prefs);
        session.resize(40, visible);
        let playlist = Playlist::from_csv("Test", CSV).unwrap();
        session.load_playlist(playlist, 0);
        session
    }

    fn run_until(session: &mut Session, from: u64, to: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut now = from;
        while now <= to {
            events.extend(session.tick(now));
            now += TICK_MS;
        }
        events
    }

    #[test]
    fn loading_resets_offset_and_transpose() {
        let mut session = session(2);
        session.scroll_by(3);
        session.transpose_by(2);
        assert_eq!(session.offset(), 3);
        assert!(session.load_song(1, 0));
        assert_eq!(session.offset(), 0);
        assert_eq!(session.transpose_offset(), 0);
    }

    #[test]
    fn navigation_does_not_wrap() {
        let mut session = session(2);
        assert!(!session.previous_song(0));
        assert!(session.next_song(0));
        assert!(!session.next_song(0));
        assert_eq!(session.current_index(), 1);
        assert!(!session.load_song(9, 0));
    }

    #[test]
    fn section_jumps_follow_layout() {
        let mut session = session(2);
        assert_eq!(session.layout().section_starts, vec![0, 4]);
        session.next_section();
        assert_eq!(session.offset(), 4);
        session.previous_section();
        assert_eq!(session.offset(), 0);
    }

    #[test]
    fn autoscroll_waits_for_preroll_then_reaches_bottom() {
        let mut session = session(2);
        assert!(session.toggle_autoscroll(0));
        assert!(matches!(session.scroll_phase(), ScrollPhase::Armed { .. }));

        let events = run_until(&mut session, 0, 20_000);
        assert!(events.contains(&SessionEvent::ScrollStarted));
        assert!(events.contains(&SessionEvent::ScrollFinished));
        assert_eq!(session.offset(), session.viewport().max_offset());
        assert_eq!(session.scroll_phase(), ScrollPhase::Idle);
    }

    #[test]
    fn autoplay_advances_then_disarms_at_the_end() {
        let mut session = session(2);
        assert!(session.toggle_autoplay(0));
        assert!(session.scroll_phase() != ScrollPhase::Idle);

        let events = run_until(&mut session, 0, 40_000);
        assert!(events.contains(&SessionEvent::SongAdvanced(1)));
        assert_eq!(session.current_index(), 1);

        let events = run_until(&mut session, 40_100, 80_000);
        assert!(events.contains(&SessionEvent::EndOfPlaylist));
        assert!(!session.autoplay_enabled());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn activating_lyrics_stops_or_starts_scrolling() {
        let mut session = session(2);
        session.activate_lyrics(0);
        assert!(matches!(session.scroll_phase(), ScrollPhase::Armed { .. }));
        session.activate_lyrics(10);
        assert_eq!(session.scroll_phase(), ScrollPhase::Idle);

        session.scroll_by(100);
        session.activate_lyrics(20);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn disabling_autoplay_stops_scroll() {
        let mut session = session(2);
        session.toggle_autoplay(0);
        session.toggle_autoplay(10);
        assert_eq!(session.scroll_phase(), ScrollPhase::Idle);
        assert!(session.tick(60_000).is_empty());
    }

    #[test]
    fn transposition_reaches_lyrics_and_info() {
        let mut session = session(2);
        session.load_song(1, 0);
        session.apply(Action::Transpose(2), 0);
        let info = session.song_info().unwrap();
        assert_eq!(info.key.as_deref(), Some("D"));
        assert_eq!(info.position, "2 of 2");
        assert_eq!(info.next_title, END_OF_PLAYLIST);
        assert_eq!(info.duration.as_deref(), Some("0:10"));
        assert_eq!(
            session.layout().rows[0].segments[0],
            crate::chordpro::Segment::Chord("D".into())
        );

        session.apply(Action::ResetTranspose, 0);
        assert_eq!(session.song_info().unwrap().key.as_deref(), Some("C"));
    }

    #[test]
    fn transposition_stays_within_an_octave() {
        let mut session = session(2);
        for _ in 0..13 {
            session.transpose_by(1);
        }
        assert_eq!(session.transpose_offset(), 1);
        session.transpose_by(-3);
        assert_eq!(session.transpose_offset(), -2);
    }

    #[test]
    fn larger_text_keeps_relative_position() {
        let mut session = session(2);
        session.scroll_by(2);
        let before = session.layout().height();
        assert!(session.apply(Action::TextScale(9), 0));
        assert!(session.layout().height() >= before);
        assert!(session.offset() <= session.viewport().max_offset());
    }

    /// Tick until auto-play is waiting to load the next song.
    fn finish_with_autoplay(session: &mut Session) -> u64 {
        assert!(session.toggle_autoplay(0));
        let mut now = 0;
        while !matches!(session.autoplay_state(), AutoPlayState::Waiting { .. }) {
            now += TICK_MS;
            session.tick(now);
            assert!(now < 60_000, "auto-scroll never reached the bottom");
        }
        now
    }

    #[test]
    fn replaying_an_ending_drops_the_pending_advance() {
        let mut session = session(2);
        let now = finish_with_autoplay(&mut session);
        assert!(session.countdown_ms(now).is_some());

        session.scroll_by(-3);
        session.activate_lyrics(now);
        assert!(session.scroll_phase() != ScrollPhase::Idle);
        assert_eq!(session.autoplay_state(), AutoPlayState::On);

        let events = run_until(&mut session, now, now + ADVANCE_DELAY_MS + 1_000);
        assert!(!events.contains(&SessionEvent::SongAdvanced(1)));
        assert_eq!(session.current_index(), 0);
        assert!(session.scroll_phase() != ScrollPhase::Idle);
    }

    #[test]
    fn space_while_waiting_cancels_the_advance() {
        let mut session = session(2);
        let now = finish_with_autoplay(&mut session);

        assert!(!session.toggle_autoscroll(now));
        assert_eq!(session.autoplay_state(), AutoPlayState::On);
        assert_eq!(session.countdown_ms(now), None);
        assert!(run_until(&mut session, now, now + ADVANCE_DELAY_MS * 2).is_empty());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn spacing_change_while_scrolling_reseeds_the_step() {
        let mut session = session(2);
        session.toggle_autoscroll(0);
        let events = run_until(&mut session, 0, 2_000);
        assert!(events.contains(&SessionEvent::ScrollStarted));
        let ScrollPhase::Scrolling { step: before, .. } = session.scroll_phase() else {
            panic!("auto-scroll should be moving after the pre-roll");
        };
        let height = session.layout().height();

        assert!(session.apply(Action::LineSpacing(20), 2_000));
        assert!(session.layout().height() > height);
        let ScrollPhase::Scrolling { step: after, .. } = session.scroll_phase() else {
            panic!("a spacing change must not stop auto-scroll");
        };
        assert!(after > before, "step {after} should grow past {before}");
    }
}
