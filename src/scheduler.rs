//! Single-threaded timer bookkeeping. The event loop owns a monotonic
//! millisecond clock and calls [`Scheduler::poll`] every frame; nothing here
//! sleeps or spawns. Each [`TimerId`] has at most one live timer, and arming an
//! id always replaces whatever was armed under it before.

use std::collections::BTreeMap;

/// The timers the viewer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerId {
    /// Delay between arming auto-scroll at the top of a song and motion.
    Preroll,
    /// Fixed-rate auto-scroll tick.
    ScrollTick,
    /// Pause between the end of a song and auto-play loading the next one.
    AutoAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Timeout { deadline_ms: u64 },
    Interval { period_ms: u64, next_ms: u64 },
}

/// A timer that came due during a poll. `count` is how many periods of an
/// interval elapsed since the last poll (always 1 for a timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<TimerId, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `id` once, `delay_ms` after `now_ms`.
    pub fn arm_timeout(&mut self, id: TimerId, now_ms: u64, delay_ms: u64) {
        self.timers.insert(
            id,
            Timer::Timeout {
                deadline_ms: now_ms.saturating_add(delay_ms),
            },
        );
    }

    /// Fire `id` every `period_ms`, first at `now_ms + period_ms`.
    pub fn arm_interval(&mut self, id: TimerId, now_ms: u64, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.timers.insert(
            id,
            Timer::Interval {
                period_ms,
                next_ms: now_ms.saturating_add(period_ms),
            },
        );
    }

    /// Cancel `id`. Returns whether anything was armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Milliseconds until `id` next fires, if armed.
    pub fn remaining_ms(&self, id: TimerId, now_ms: u64) -> Option<u64> {
        self.timers.get(&id).map(|timer| match timer {
            Timer::Timeout { deadline_ms } => deadline_ms.saturating_sub(now_ms),
            Timer::Interval { next_ms, .. } => next_ms.saturating_sub(now_ms),
        })
    }

    /// Collect every timer that is due at `now_ms`. Timeouts are disarmed as
    /// they fire; intervals are advanced past `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Fired> {
        let mut fired = Vec::new();
        let mut expired = Vec::new();

        for (id, timer) in self.timers.iter_mut() {
            match timer {
                Timer::Timeout { deadline_ms } => {
                    if now_ms >= *deadline_ms {
                        fired.push(Fired { id: *id, count: 1 });
                        expired.push(*id);
                    }
                }
                Timer::Interval { period_ms, next_ms } => {
                    if now_ms >= *next_ms {
                        let periods = (now_ms - *next_ms) / *period_ms + 1;
                        *next_ms += periods * *period_ms;
                        fired.push(Fired {
                            id: *id,
                            count: u32::try_from(periods).unwrap_or(u32::MAX),
                        });
                    }
                }
            }
        }

        for id in expired {
            self.timers.remove(&id);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_fires_once() {
        let mut sched = Scheduler::new();
        sched.arm_timeout(TimerId::Preroll, 1_000, 500);
        assert!(sched.poll(1_499).is_empty());
        assert_eq!(
            sched.poll(1_500),
            vec![Fired {
                id: TimerId::Preroll,
                count: 1
            }]
        );
        assert!(sched.poll(5_000).is_empty());
        assert!(sched.is_idle());
    }

    #[test]
    fn interval_catches_up_after_slow_frames() {
        let mut sched = Scheduler::new();
        sched.arm_interval(TimerId::ScrollTick, 0, 100);
        assert!(sched.poll(99).is_empty());
        assert_eq!(sched.poll(100)[0].count, 1);
        assert_eq!(sched.poll(450)[0].count, 3);
        assert_eq!(sched.remaining_ms(TimerId::ScrollTick, 450), Some(50));
    }

    #[test]
    fn rearming_replaces_previous_timer() {
        let mut sched = Scheduler::new();
        sched.arm_timeout(TimerId::AutoAdvance, 0, 100);
        sched.arm_timeout(TimerId::AutoAdvance, 0, 1_000);
        assert!(sched.poll(500).is_empty());
        assert_eq!(sched.poll(1_000).len(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sched = Scheduler::new();
        assert!(!sched.cancel(TimerId::ScrollTick));
        sched.arm_interval(TimerId::ScrollTick, 0, 100);
        assert!(sched.cancel(TimerId::ScrollTick));
        assert!(!sched.cancel(TimerId::ScrollTick));
        assert!(sched.is_idle());
    }
}
