//! Auto-scroll engine.
//!
//! The engine is an explicit three-state machine:
//!
//! * `Idle`: no timers armed.
//! * `Armed`: the song is at the top and a pre-roll timeout is pending. The UI
//!   pulses a cue at the song's tempo so the performer can count in.
//! * `Scrolling`: a fixed-rate tick moves a float accumulator by a constant
//!   step chosen so the bottom is reached when the song should end.
//!
//! Every transition into `Armed` or `Scrolling` starts by cancelling both
//! timers, so two scroll loops can never overlap.

use crate::scheduler::{Scheduler, TimerId};

/// Auto-scroll tick period.
pub const TICK_MS: u64 = 100;
/// Pre-roll before motion starts when auto-scroll is armed at the top.
pub const DEFAULT_PREROLL_SECS: u64 = 12;
/// Offsets at or below this many rows count as "at the top".
pub const TOP_THRESHOLD_ROWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    pub preroll_ms: u64,
    pub tick_ms: u64,
    pub top_threshold: usize,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            preroll_ms: DEFAULT_PREROLL_SECS * 1_000,
            tick_ms: TICK_MS,
            top_threshold: TOP_THRESHOLD_ROWS,
        }
    }
}

impl ScrollConfig {
    pub fn with_preroll_secs(secs: u64) -> Self {
        Self {
            preroll_ms: secs.saturating_mul(1_000),
            ..Self::default()
        }
    }

    fn preroll_secs(&self) -> f64 {
        self.preroll_ms as f64 / 1_000.0
    }
}

/// What the lyrics pane currently shows, measured in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset: usize,
    pub content_height: usize,
    pub visible_height: usize,
}

impl Viewport {
    pub fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.visible_height)
    }

    pub fn at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollPhase {
    Idle,
    Armed {
        since_ms: u64,
        beat_ms: u64,
    },
    Scrolling {
        position: f64,
        step: f64,
        ticks: u64,
    },
}

/// Result of applying scroll ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Moved(usize),
    /// The bottom was reached; the engine is idle again.
    Finished(usize),
}

/// Per-tick distance so that `distance` rows are covered in the time left
/// after the pre-roll. Zero when no time is left.
pub fn compute_scroll_step(
    distance: f64,
    total_duration_secs: f64,
    preroll_secs: f64,
    tick_ms: u64,
) -> f64 {
    let remaining_secs = (total_duration_secs - preroll_secs).max(0.0);
    let intervals = remaining_secs * 1_000.0 / tick_ms.max(1) as f64;
    if intervals > 0.0 && distance > 0.0 {
        distance / intervals
    } else {
        0.0
    }
}

/// Length of one beat in milliseconds.
pub fn beat_ms(tempo_bpm: f64) -> u64 {
    let bpm = if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
        tempo_bpm
    } else {
        crate::models::DEFAULT_TEMPO_BPM
    };
    ((60.0 / bpm) * 1_000.0).round().max(1.0) as u64
}

/// Whether a cue pulsing once per beat since `since_ms` is lit at `now_ms`.
pub fn pulse_on(since_ms: u64, beat_ms: u64, now_ms: u64) -> bool {
    let half = (beat_ms / 2).max(1);
    (now_ms.saturating_sub(since_ms) / half) % 2 == 0
}

#[derive(Debug)]
pub struct AutoScroll {
    config: ScrollConfig,
    phase: ScrollPhase,
    /// Expected song length used to pace the current run.
    duration_secs: f64,
}

impl AutoScroll {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            phase: ScrollPhase::Idle,
            duration_secs: crate::models::DEFAULT_DURATION_SECS,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, ScrollPhase::Idle)
    }

    pub fn is_scrolling(&self) -> bool {
        matches!(self.phase, ScrollPhase::Scrolling { .. })
    }

    /// Start auto-scroll. At the top of the song this arms the pre-roll;
    /// anywhere else motion begins immediately.
    pub fn start(
        &mut self,
        sched: &mut Scheduler,
        now_ms: u64,
        viewport: Viewport,
        tempo_bpm: f64,
        duration_secs: f64,
    ) -> ScrollPhase {
        self.cancel(sched);
        self.duration_secs = duration_secs;

        if viewport.offset <= self.config.top_threshold {
            sched.arm_timeout(TimerId::Preroll, now_ms, self.config.preroll_ms);
            self.phase = ScrollPhase::Armed {
                since_ms: now_ms,
                beat_ms: beat_ms(tempo_bpm),
            };
        } else {
            self.begin(sched, now_ms, viewport);
        }
        self.phase
    }

    /// The pre-roll timeout fired.
    pub fn on_preroll_elapsed(&mut self, sched: &mut Scheduler, now_ms: u64, viewport: Viewport) {
        if matches!(self.phase, ScrollPhase::Armed { .. }) {
            self.begin(sched, now_ms, viewport);
        }
    }

    fn begin(&mut self, sched: &mut Scheduler, now_ms: u64, viewport: Viewport) {
        sched.cancel(TimerId::Preroll);
        sched.cancel(TimerId::ScrollTick);
        let distance = viewport.max_offset().saturating_sub(viewport.offset) as f64;
        let step = compute_scroll_step(
            distance,
            self.duration_secs,
            self.config.preroll_secs(),
            self.config.tick_ms,
        );
        log::debug!(
            "auto-scroll started: {distance} rows over {:.0}s, step {step:.4}",
            self.duration_secs
        );
        sched.arm_interval(TimerId::ScrollTick, now_ms, self.config.tick_ms);
        self.phase = ScrollPhase::Scrolling {
            position: viewport.offset as f64,
            step,
            ticks: 0,
        };
    }

    /// Apply `count` elapsed ticks. Returns `None` when not scrolling.
    pub fn on_tick(
        &mut self,
        sched: &mut Scheduler,
        viewport: Viewport,
        count: u32,
    ) -> Option<TickOutcome> {
        let ScrollPhase::Scrolling {
            position,
            step,
            ticks,
        } = self.phase
        else {
            return None;
        };

        let max = viewport.max_offset();
        let position = position + step * f64::from(count);
        let applied = position.round().max(0.0) as usize;
        if applied >= max {
            sched.cancel(TimerId::ScrollTick);
            self.phase = ScrollPhase::Idle;
            return Some(TickOutcome::Finished(max));
        }

        self.phase = ScrollPhase::Scrolling {
            position,
            step,
            ticks: ticks + u64::from(count),
        };
        Some(TickOutcome::Moved(applied))
    }

    /// Recompute the step after the content height changed (text scale, line
    /// spacing, resize) or the user moved the view by hand. The accumulator is
    /// re-seeded from the applied offset.
    pub fn recompute_step(&mut self, viewport: Viewport) {
        if let ScrollPhase::Scrolling { ticks, .. } = self.phase {
            let elapsed_secs = (ticks * self.config.tick_ms) as f64 / 1_000.0;
            let distance = viewport.max_offset().saturating_sub(viewport.offset) as f64;
            let step = compute_scroll_step(
                distance,
                self.duration_secs - elapsed_secs,
                self.config.preroll_secs(),
                self.config.tick_ms,
            );
            self.phase = ScrollPhase::Scrolling {
                position: viewport.offset as f64,
                step,
                ticks,
            };
        }
    }

    /// Stop everything. Safe to call in any state.
    pub fn cancel(&mut self, sched: &mut Scheduler) -> bool {
        let had_preroll = sched.cancel(TimerId::Preroll);
        let had_tick = sched.cancel(TimerId::ScrollTick);
        let was_active = self.is_active();
        self.phase = ScrollPhase::Idle;
        had_preroll || had_tick || was_active
    }

    /// Whether the pre-roll cue is lit. Always false outside `Armed`.
    pub fn cue_lit(&self, now_ms: u64) -> bool {
        match self.phase {
            ScrollPhase::Armed { since_ms, beat_ms } => pulse_on(since_ms, beat_ms, now_ms),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(offset: usize, content: usize, visible: usize) -> Viewport {
        Viewport {
            offset,
            content_height: content,
            visible_height: visible,
        }
    }

    #[test]
    fn step_matches_duration_pacing() {
        let step = compute_scroll_step(1000.0, 160.0, 12.0, 100);
        assert_eq!(step, 1000.0 / ((160.0 - 12.0) * 10.0));
    }

    #[test]
    fn step_is_zero_without_remaining_time() {
        assert_eq!(compute_scroll_step(1000.0, 12.0, 12.0, 100), 0.0);
        assert_eq!(compute_scroll_step(1000.0, 5.0, 12.0, 100), 0.0);
        assert_eq!(compute_scroll_step(-3.0, 160.0, 12.0, 100), 0.0);
        assert!(!compute_scroll_step(1000.0, f64::NAN, 12.0, 100).is_nan());
    }

    #[test]
    fn beats_follow_tempo() {
        assert_eq!(beat_ms(120.0), 500);
        assert_eq!(beat_ms(60.0), 1_000);
        assert_eq!(beat_ms(0.0), 500);
        assert!(pulse_on(0, 500, 0));
        assert!(!pulse_on(0, 500, 250));
        assert!(pulse_on(0, 500, 500));
    }

    #[test]
    fn starting_at_top_arms_preroll() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::default());
        let phase = engine.start(&mut sched, 0, viewport(0, 200, 50), 90.0, 160.0);
        assert!(matches!(phase, ScrollPhase::Armed { beat_ms: 667, .. }));
        assert!(sched.is_armed(TimerId::Preroll));
        assert!(!sched.is_armed(TimerId::ScrollTick));

        engine.on_preroll_elapsed(&mut sched, 12_000, viewport(0, 200, 50));
        assert!(engine.is_scrolling());
        assert!(!sched.is_armed(TimerId::Preroll));
        assert!(sched.is_armed(TimerId::ScrollTick));
    }

    #[test]
    fn starting_mid_song_scrolls_immediately() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::default());
        engine.start(&mut sched, 0, viewport(20, 200, 50), 120.0, 160.0);
        assert!(engine.is_scrolling());
        assert!(!sched.is_armed(TimerId::Preroll));
    }

    #[test]
    fn restarting_never_leaves_two_loops() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::default());
        engine.start(&mut sched, 0, viewport(20, 200, 50), 120.0, 160.0);
        engine.start(&mut sched, 10, viewport(0, 200, 50), 120.0, 160.0);
        assert!(sched.is_armed(TimerId::Preroll));
        assert!(!sched.is_armed(TimerId::ScrollTick));
    }

    #[test]
    fn ticks_reach_bottom_and_go_idle() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::with_preroll_secs(0));
        // 100 rows over 10 seconds at 100ms ticks is one row per tick.
        engine.start(&mut sched, 0, viewport(5, 155, 50), 120.0, 10.0);
        let ScrollPhase::Scrolling { step, .. } = engine.phase() else {
            panic!("expected scrolling");
        };
        assert!((step - 1.0).abs() < 1e-9);

        let outcome = engine.on_tick(&mut sched, viewport(5, 155, 50), 3);
        assert_eq!(outcome, Some(TickOutcome::Moved(8)));

        let outcome = engine.on_tick(&mut sched, viewport(8, 155, 50), 500);
        assert_eq!(outcome, Some(TickOutcome::Finished(105)));
        assert!(!engine.is_active());
        assert!(sched.is_idle());
    }

    #[test]
    fn recompute_follows_new_content_height() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::with_preroll_secs(0));
        engine.start(&mut sched, 0, viewport(10, 110, 10), 120.0, 10.0);
        engine.recompute_step(viewport(10, 210, 10));
        let ScrollPhase::Scrolling { step, position, .. } = engine.phase() else {
            panic!("expected scrolling");
        };
        assert_eq!(position, 10.0);
        assert!((step - 1.9).abs() < 1e-9);
    }

    #[test]
    fn cancel_when_idle_changes_nothing() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::default());
        assert!(!engine.cancel(&mut sched));
        assert!(!engine.cancel(&mut sched));
        assert_eq!(engine.phase(), ScrollPhase::Idle);
        assert!(sched.is_idle());
    }

    #[test]
    fn cancel_clears_both_timers() {
        let mut sched = Scheduler::new();
        let mut engine = AutoScroll::new(ScrollConfig::default());
        engine.start(&mut sched, 0, viewport(0, 200, 50), 120.0, 160.0);
        assert!(engine.cancel(&mut sched));
        assert!(sched.is_idle());
        assert!(!engine.cue_lit(0));
    }
}
