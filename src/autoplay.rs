//! Auto-play: when auto-scroll reaches the bottom of a song, wait a moment and
//! load the next one. At the end of the playlist auto-play switches itself off
//! instead of wrapping around.

use crate::scheduler::{Scheduler, TimerId};

/// Pause between the end of one song and loading the next.
pub const ADVANCE_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoPlayState {
    #[default]
    Off,
    On,
    /// The advance timeout is pending.
    Waiting { since_ms: u64 },
}

/// What to do when the advance timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    LoadNext(usize),
    /// No song left; auto-play has been switched off.
    Disarm,
}

#[derive(Debug, Default)]
pub struct AutoPlay {
    state: AutoPlayState,
}

impl AutoPlay {
    pub fn state(&self) -> AutoPlayState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.state, AutoPlayState::Off)
    }

    /// Flip auto-play and return the new enabled flag. Switching off drops a
    /// pending advance.
    pub fn toggle(&mut self, sched: &mut Scheduler) -> bool {
        if self.is_enabled() {
            self.disable(sched);
            false
        } else {
            self.state = AutoPlayState::On;
            true
        }
    }

    pub fn disable(&mut self, sched: &mut Scheduler) {
        sched.cancel(TimerId::AutoAdvance);
        self.state = AutoPlayState::Off;
    }

    /// Auto-scroll hit the bottom. Arms the advance when enabled.
    pub fn on_scroll_finished(&mut self, sched: &mut Scheduler, now_ms: u64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        sched.arm_timeout(TimerId::AutoAdvance, now_ms, ADVANCE_DELAY_MS);
        self.state = AutoPlayState::Waiting { since_ms: now_ms };
        true
    }

    /// Drop a pending advance without switching auto-play off (the user
    /// navigated by hand).
    pub fn cancel_pending(&mut self, sched: &mut Scheduler) {
        sched.cancel(TimerId::AutoAdvance);
        if matches!(self.state, AutoPlayState::Waiting { .. }) {
            self.state = AutoPlayState::On;
        }
    }

    /// The advance timeout fired while `current` of `len` songs is showing.
    pub fn on_advance_elapsed(&mut self, current: usize, len: usize) -> Option<Advance> {
        if !matches!(self.state, AutoPlayState::Waiting { .. }) {
            return None;
        }
        if current + 1 < len {
            self.state = AutoPlayState::On;
            Some(Advance::LoadNext(current + 1))
        } else {
            self.state = AutoPlayState::Off;
            Some(Advance::Disarm)
        }
    }

    pub fn waiting_since(&self) -> Option<u64> {
        match self.state {
            AutoPlayState::Waiting { since_ms } => Some(since_ms),
            _ => None,
        }
    }
}
